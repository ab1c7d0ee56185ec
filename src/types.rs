use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;

use crate::error::ConvertError;

/// One Pascal VOC annotation file.
///
/// Leaf values are kept as the text found in the file so that a rewritten
/// annotation reproduces untouched fields verbatim. Geometry is parsed on demand.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename = "annotation", default)]
pub struct AnnotationRecord {
    pub folder: String,
    pub filename: String,
    /// Image path as recorded by the labelling tool, either separator convention
    pub path: String,
    pub source: Source,
    pub size: ImageSize,
    pub segmented: String,
    /// Only the first `<object>` block of a file is kept
    #[serde(deserialize_with = "first_object")]
    pub object: ObjectEntry,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Source {
    pub database: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct ImageSize {
    pub width: String,
    pub height: String,
    pub depth: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct ObjectEntry {
    pub name: String,
    pub pose: String,
    pub truncated: String,
    pub difficult: String,
    pub bndbox: BoundingBox,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct BoundingBox {
    pub xmin: String,
    pub ymin: String,
    pub xmax: String,
    pub ymax: String,
}

/// Bounding box corners in pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelBox {
    pub xmin: i64,
    pub ymin: i64,
    pub xmax: i64,
    pub ymax: i64,
}

fn first_object<'de, D>(deserializer: D) -> Result<ObjectEntry, D::Error>
where
    D: Deserializer<'de>,
{
    let objects: Vec<ObjectEntry> = Vec::deserialize(deserializer)?;
    Ok(objects.into_iter().next().unwrap_or_default())
}

fn parse_field(path: &Path, field: &'static str, value: &str) -> Result<i64, ConvertError> {
    value
        .trim()
        .parse::<i64>()
        .map_err(|_| ConvertError::InvalidNumber {
            path: path.to_path_buf(),
            field,
            value: value.to_string(),
        })
}

fn positive_field(path: &Path, field: &'static str, value: &str) -> Result<i64, ConvertError> {
    match parse_field(path, field, value)? {
        n if n > 0 => Ok(n),
        _ => Err(ConvertError::InvalidNumber {
            path: path.to_path_buf(),
            field,
            value: value.to_string(),
        }),
    }
}

impl AnnotationRecord {
    /// A record with every field empty; the decoder produced nothing usable.
    pub fn is_empty(&self) -> bool {
        *self == AnnotationRecord::default()
    }
}

impl BoundingBox {
    /// Parse the four corners. `path` is only used for error reporting.
    pub fn pixels(&self, path: &Path) -> Result<PixelBox, ConvertError> {
        Ok(PixelBox {
            xmin: parse_field(path, "xmin", &self.xmin)?,
            ymin: parse_field(path, "ymin", &self.ymin)?,
            xmax: parse_field(path, "xmax", &self.xmax)?,
            ymax: parse_field(path, "ymax", &self.ymax)?,
        })
    }
}

impl ImageSize {
    /// Parse `(width, height)`, both strictly positive. `path` is only used
    /// for error reporting.
    pub fn dimensions(&self, path: &Path) -> Result<(i64, i64), ConvertError> {
        Ok((
            positive_field(path, "width", &self.width)?,
            positive_field(path, "height", &self.height)?,
        ))
    }
}

// Struct to hold processing statistics
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ProcessingStats {
    pub total_files_processed: usize,
    pub successful_conversions: usize,
    pub skipped_missing_image: usize,
    pub skipped_unreadable: usize,
    pub background_images: usize,
}

impl ProcessingStats {
    pub fn increment_total(&mut self) {
        self.total_files_processed += 1;
    }

    pub fn increment_successful(&mut self) {
        self.successful_conversions += 1;
    }

    pub fn increment_skipped_missing_image(&mut self) {
        self.skipped_missing_image += 1;
    }

    pub fn increment_skipped_unreadable(&mut self) {
        self.skipped_unreadable += 1;
    }

    pub fn increment_background(&mut self) {
        self.background_images += 1;
    }

    pub fn print_summary(&self) {
        log::info!("=== Processing Summary ===");
        log::info!("Annotation files processed: {}", self.total_files_processed);
        log::info!("Successful conversions: {}", self.successful_conversions);
        log::info!("Skipped (image not found): {}", self.skipped_missing_image);
        log::info!("Skipped (unreadable annotation): {}", self.skipped_unreadable);
        log::info!("Unlabelled images copied: {}", self.background_images);

        let total_skipped = self.skipped_missing_image + self.skipped_unreadable;
        if total_skipped > 0 {
            log::warn!(
                "Total skipped annotations: {} (image not found: {}, unreadable: {})",
                total_skipped,
                self.skipped_missing_image,
                self.skipped_unreadable
            );
        }
    }
}
