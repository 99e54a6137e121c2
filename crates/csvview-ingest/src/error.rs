//! Error types for CSV ingestion.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while detecting or reading a CSV file.
#[derive(Debug, Error)]
pub enum IngestError {
    // === File System Errors ===
    /// CSV file not found. Raised before any read attempt.
    #[error("CSV file not found: {path}")]
    FileNotFound { path: PathBuf },

    // === Read Errors ===
    /// Decode, I/O or CSV failure while reading the file.
    #[error("failed to read CSV {path}: {message}")]
    Read { path: PathBuf, message: String },

    /// No candidate encoding decoded the sample and the reader was configured to fail.
    #[error("could not detect encoding of {path}")]
    EncodingUndetected { path: PathBuf },

    // === Configuration Errors ===
    /// Encoding label is not one of the supported encodings.
    #[error("unknown encoding '{label}'")]
    UnknownEncoding { label: String },

    /// Delimiter cannot be used as a single-byte CSV separator.
    #[error("unsupported delimiter {delimiter:?}")]
    UnsupportedDelimiter { delimiter: char },
}

impl IngestError {
    pub(crate) fn read(path: &Path, message: impl ToString) -> Self {
        Self::Read {
            path: path.to_path_buf(),
            message: message.to_string(),
        }
    }
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;
