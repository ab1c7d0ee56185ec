use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::fs;
use std::io::BufReader;
use std::path::{Component, Path, PathBuf};

use crate::error::ConvertError;
use crate::types::AnnotationRecord;

/// Character references the XML writer may leave behind for embedded
/// newlines and tabs; downstream readers expect plain text.
const CONTROL_ESCAPES: &[&str] = &["&#xA;", "&#x9;", "&#10;", "&#9;"];

/// Read and parse a single VOC XML file into an AnnotationRecord.
///
/// The file is decoded from a buffered stream. Malformed markup is returned as
/// [`ConvertError::Decode`] and a record with no content at all as
/// [`ConvertError::EmptyRecord`]; the caller decides whether to skip or abort.
pub fn read_and_parse_xml(path: &Path) -> Result<AnnotationRecord, ConvertError> {
    let file = fs::File::open(path).map_err(|e| ConvertError::io(path, e))?;

    let record: AnnotationRecord =
        quick_xml::de::from_reader(BufReader::new(file)).map_err(|e| ConvertError::Decode {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    if record.is_empty() {
        return Err(ConvertError::EmptyRecord {
            path: path.to_path_buf(),
        });
    }
    Ok(record)
}

/// Serialize a record with two-space indentation and strip control escapes
pub fn encode_annotation(record: &AnnotationRecord, path: &Path) -> Result<String, ConvertError> {
    let mut buffer = String::new();
    let mut serializer = quick_xml::se::Serializer::new(&mut buffer);
    serializer.indent(' ', 2);
    record
        .serialize(serializer)
        .map_err(|e| ConvertError::Encode {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
    Ok(strip_control_escapes(&buffer))
}

pub fn strip_control_escapes(xml: &str) -> String {
    CONTROL_ESCAPES
        .iter()
        .fold(xml.to_string(), |acc, escape| acc.replace(escape, ""))
}

/// Path that leads from directory `from` to directory `to`.
///
/// Both are expected to share a root; the result is empty when they are equal.
pub fn relative_path(from: &Path, to: &Path) -> PathBuf {
    let from: Vec<Component> = from.components().collect();
    let to: Vec<Component> = to.components().collect();
    let common = from
        .iter()
        .zip(to.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut relative = PathBuf::new();
    for _ in common..from.len() {
        relative.push("..");
    }
    for component in &to[common..] {
        relative.push(component.as_os_str());
    }
    relative
}

/// Create a progress bar with the given length and label
pub fn create_progress_bar(len: u64, label: &str) -> ProgressBar {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(&format!(
                "{{spinner:.green}} [{}] [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} ({{eta}})",
                label
            ))
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb
}

/// Delete the directory if present and recreate it empty
pub fn create_output_directory(path: &Path) -> std::io::Result<PathBuf> {
    if path.exists() {
        log::warn!(
            "Directory {:?} already exists. Deleting and recreating it.",
            path
        );
        fs::remove_dir_all(path).and_then(|_| fs::create_dir_all(path))?;
    } else {
        fs::create_dir_all(path)?;
    }
    Ok(path.to_path_buf())
}
