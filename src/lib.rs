//! Pascal VOC dataset sorter
//!
//! This library reorganizes a VOC-annotated object-detection dataset into
//! per-class folders, either keeping rewritten VOC annotations or emitting
//! YOLO label files, and sweeps unlabelled images into the same tree.

pub mod classify;
pub mod config;
pub mod context;
pub mod conversion;
pub mod dataset;
pub mod error;
pub mod io;
pub mod types;
pub mod utils;

// Re-export commonly used types and functions
pub use classify::{classify, index_of, Class};
pub use config::{Args, DatasetLayout, Format, UnreadablePolicy};
pub use context::RunContext;
pub use conversion::{normalize_box, strategy_for, OutputStrategy, VocRewriter, YoloNormalizer};
pub use dataset::process_dataset;
pub use error::ConvertError;
pub use io::{ImageResolver, OutputNamer};
pub use types::{AnnotationRecord, ProcessingStats};
