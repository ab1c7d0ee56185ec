use std::path::{Path, PathBuf};
use thiserror::Error;

/// Everything that can go wrong while converting a dataset.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode annotation {}: {message}", .path.display())]
    Decode { path: PathBuf, message: String },

    #[error("Cannot read annotation {}: record is empty", .path.display())]
    EmptyRecord { path: PathBuf },

    #[error("Invalid {field} value {value:?} in {}", .path.display())]
    InvalidNumber {
        path: PathBuf,
        field: &'static str,
        value: String,
    },

    #[error("Failed to encode annotation {}: {message}", .path.display())]
    Encode { path: PathBuf, message: String },

    #[error("Invalid annotation search pattern: {0}")]
    Pattern(String),
}

impl ConvertError {
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        ConvertError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Decode failures and empty records; these can be skipped per file.
    pub fn is_unreadable(&self) -> bool {
        matches!(
            self,
            ConvertError::Decode { .. } | ConvertError::EmptyRecord { .. }
        )
    }
}
