//! Error types for shardfs core.

use crate::writer::WriterStatus;
use std::io;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur while writing a fileset.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Storage error (directory creation, file open, write, sync, close).
    #[error("storage error: {0}")]
    Storage(#[from] shardfs_storage::StorageError),

    /// Record encoding error.
    #[error("codec error: {0}")]
    Codec(#[from] shardfs_codec::CodecError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Operation not permitted in the writer's current state.
    #[error("cannot {operation}: writer is {status}")]
    InvalidState {
        /// The attempted operation.
        operation: &'static str,
        /// State the writer was in.
        status: WriterStatus,
    },

    /// An earlier write to the open block failed; it cannot be committed.
    #[error("cannot {operation}: an earlier write failed and the block is abandoned")]
    Poisoned {
        /// The attempted operation.
        operation: &'static str,
    },

    /// A time value cannot be represented as signed 64-bit nanoseconds.
    #[error("out of range: {message}")]
    OutOfRange {
        /// Description of the value.
        message: String,
    },
}

impl CoreError {
    /// Creates an invalid state error.
    pub fn invalid_state(operation: &'static str, status: WriterStatus) -> Self {
        Self::InvalidState { operation, status }
    }

    /// Creates an out of range error.
    pub fn out_of_range(message: impl Into<String>) -> Self {
        Self::OutOfRange {
            message: message.into(),
        }
    }
}
