use arrow::error::ArrowError;
use parquet::errors::ParquetError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while encoding or persisting batches.
#[derive(Debug, Error)]
pub enum FileError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),

    #[error("Parquet error: {0}")]
    Parquet(#[from] ParquetError),

    /// A batch or an existing file does not match the table's schema.
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    /// The target file exists and the policy forbids touching it.
    #[error("Output file already exists: {}", .0.display())]
    OutputExists(PathBuf),

    /// The target file exists but cannot be read back as Parquet.
    #[error("Existing output {} is not readable: {reason}", .path.display())]
    UnreadableOutput { path: PathBuf, reason: String },

    /// A cell cannot be represented in its column's Arrow type.
    #[error("Column `{column}` cannot hold value {value}")]
    UnsupportedValue { column: String, value: String },
}
