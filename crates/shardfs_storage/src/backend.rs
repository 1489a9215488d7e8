//! Filesystem trait definitions.

use crate::error::StorageResult;
use std::path::Path;

/// A file opened for sequential writing.
///
/// Sinks are append-only byte stores. They do not interpret what is
/// written; the fileset writer owns all format decisions.
///
/// # Invariants
///
/// - `append` returns the offset where the data starts
/// - `size` is the offset where the next `append` will write
/// - `close` surfaces any error from pushing buffered bytes to the OS
/// - Dropping a sink without `close` releases it and discards the error
pub trait FileSink: Send {
    /// Path the sink was opened at.
    fn path(&self) -> &Path;

    /// Appends data to the end of the file.
    ///
    /// Returns the offset where the data was written.
    ///
    /// # Errors
    ///
    /// Returns an error if an I/O error occurs.
    fn append(&mut self, data: &[u8]) -> StorageResult<u64>;

    /// Pushes buffered bytes to the OS.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush fails.
    fn flush(&mut self) -> StorageResult<()>;

    /// Flushes and syncs data and metadata to durable storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the sync fails.
    fn sync(&mut self) -> StorageResult<()>;

    /// Returns the number of bytes appended so far.
    fn size(&self) -> u64;

    /// Flushes buffered bytes and releases the handle.
    ///
    /// # Errors
    ///
    /// Returns the flush error; the handle is released either way.
    fn close(self: Box<Self>) -> StorageResult<()>;
}

/// The directory and file operations the fileset writer needs.
///
/// # Implementors
///
/// - [`super::OsFilesystem`] - Real files via `std::fs`
/// - [`super::MemoryFilesystem`] - For testing
pub trait Filesystem: Send + Sync {
    /// Creates `path` and any missing ancestors with the given permission bits.
    ///
    /// An existing directory is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if any directory cannot be created.
    fn create_dir_all(&self, path: &Path, mode: u32) -> StorageResult<()>;

    /// Creates `path` for writing, truncating existing content.
    ///
    /// `mode` applies when the file is newly created.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    fn create_truncate(&self, path: &Path, mode: u32) -> StorageResult<Box<dyn FileSink>>;

    /// Returns whether a file or directory exists at `path`.
    fn exists(&self, path: &Path) -> bool;

    /// Removes the file at `path`.
    ///
    /// Returns `false` if there was no file to remove.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing file cannot be removed.
    fn remove_file(&self, path: &Path) -> StorageResult<bool>;

    /// Makes directory entry changes under `path` durable.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be synced.
    fn sync_dir(&self, path: &Path) -> StorageResult<()>;
}
