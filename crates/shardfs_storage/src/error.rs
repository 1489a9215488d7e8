//! Error types for storage operations.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A file was created in a directory that does not exist.
    #[error("parent directory does not exist: {}", path.display())]
    ParentMissing {
        /// The file that could not be created.
        path: PathBuf,
    },
}
