use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Command-line arguments for sorting a VOC dataset into class folders or YOLO labels.
#[derive(Parser, Debug, Clone)]
#[command(version, long_about = None)]
pub struct Args {
    /// Dataset root, searched recursively for annotation files
    #[arg(short = 'd', long = "dataset_dir", default_value = "dataset")]
    pub dataset_dir: PathBuf,

    /// Image root searched first and swept for unlabelled images [default: <dataset_dir>/images]
    #[arg(long = "images_dir")]
    pub images_dir: Option<PathBuf>,

    /// Image root searched when the primary root has no match [default: <dataset_dir>/allimages]
    #[arg(long = "fallback_images_dir")]
    pub fallback_images_dir: Option<PathBuf>,

    /// Root of the sorted output tree
    #[arg(short = 'o', long = "output_dir", default_value = "output")]
    pub output_dir: PathBuf,

    /// Output format: 'voc' keeps rewritten annotations, 'yolo' writes normalized labels
    #[arg(
        long = "output_format",
        visible_alias = "format",
        value_enum,
        default_value = "yolo"
    )]
    pub output_format: Format,

    /// Extension that marks annotation files
    #[arg(long = "annotation_ext", default_value = "xml", value_parser = validate_extension)]
    pub annotation_ext: String,

    /// Abort the whole run on an unreadable annotation instead of skipping it
    #[arg(long = "strict")]
    pub strict: bool,

    /// Delete and recreate the output directory before converting
    #[arg(long = "clean")]
    pub clean: bool,

    /// Do not copy images that have no annotation
    #[arg(long = "skip_background")]
    pub skip_background: bool,
}

// Enumeration for the output format
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
pub enum Format {
    Voc,
    Yolo,
}

/// What to do with an annotation that cannot be decoded
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub enum UnreadablePolicy {
    #[default]
    Skip,
    Abort,
}

/// Resolved locations and options for one run
#[derive(Debug, Clone)]
pub struct DatasetLayout {
    pub dataset_dir: PathBuf,
    pub images_dir: PathBuf,
    pub fallback_images_dir: PathBuf,
    pub output_dir: PathBuf,
    pub annotation_ext: String,
    pub unreadable: UnreadablePolicy,
    pub include_background: bool,
}

impl DatasetLayout {
    /// Standard layout: `<dataset>/images` and `<dataset>/allimages`
    pub fn new(dataset_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        let dataset_dir = dataset_dir.into();
        Self {
            images_dir: dataset_dir.join("images"),
            fallback_images_dir: dataset_dir.join("allimages"),
            dataset_dir,
            output_dir: output_dir.into(),
            annotation_ext: "xml".to_string(),
            unreadable: UnreadablePolicy::Skip,
            include_background: true,
        }
    }
}

impl Args {
    pub fn layout(&self) -> DatasetLayout {
        let mut layout = DatasetLayout::new(&self.dataset_dir, &self.output_dir);
        if let Some(images_dir) = &self.images_dir {
            layout.images_dir = images_dir.clone();
        }
        if let Some(fallback) = &self.fallback_images_dir {
            layout.fallback_images_dir = fallback.clone();
        }
        layout.annotation_ext = self.annotation_ext.clone();
        layout.unreadable = if self.strict {
            UnreadablePolicy::Abort
        } else {
            UnreadablePolicy::Skip
        };
        layout.include_background = !self.skip_background;
        layout
    }
}

// Accept "xml" or ".xml", reject anything that is not a bare extension
fn validate_extension(s: &str) -> Result<String, String> {
    let ext = s.trim_start_matches('.');
    if ext.is_empty() || ext.contains(['/', '\\', '*']) {
        Err("EXT must be a file extension such as 'xml'".to_string())
    } else {
        Ok(ext.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_extension() {
        assert_eq!(validate_extension("xml").unwrap(), "xml");
        assert_eq!(validate_extension(".xml").unwrap(), "xml");
        assert!(validate_extension("").is_err());
        assert!(validate_extension("a/b").is_err());
        assert!(validate_extension("*").is_err());
    }

    #[test]
    fn test_default_args_layout() {
        let args = Args::parse_from(["voc2yolo"]);
        assert_eq!(args.output_format, Format::Yolo);

        let layout = args.layout();
        assert_eq!(layout.images_dir, PathBuf::from("dataset/images"));
        assert_eq!(layout.fallback_images_dir, PathBuf::from("dataset/allimages"));
        assert_eq!(layout.output_dir, PathBuf::from("output"));
        assert_eq!(layout.unreadable, UnreadablePolicy::Skip);
        assert!(layout.include_background);
    }

    #[test]
    fn test_args_override_layout() {
        let args = Args::parse_from([
            "voc2yolo",
            "-d",
            "data",
            "--images_dir",
            "pics",
            "--format",
            "voc",
            "--strict",
            "--skip_background",
        ]);
        assert_eq!(args.output_format, Format::Voc);

        let layout = args.layout();
        assert_eq!(layout.images_dir, PathBuf::from("pics"));
        assert_eq!(layout.fallback_images_dir, PathBuf::from("data/allimages"));
        assert_eq!(layout.unreadable, UnreadablePolicy::Abort);
        assert!(!layout.include_background);
    }
}
