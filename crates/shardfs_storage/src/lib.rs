//! # shardfs Storage
//!
//! The file abstraction the fileset writer writes through.
//!
//! Sinks are **opaque byte stores**: they append, flush, sync and close,
//! and know nothing about info, index or data file formats.
//!
//! ## Available Filesystems
//!
//! - [`OsFilesystem`] - Persistent files using OS APIs
//! - [`MemoryFilesystem`] - Shared in-memory files for tests
//!
//! ## Example
//!
//! ```rust
//! use shardfs_storage::{Filesystem, MemoryFilesystem};
//! use std::path::Path;
//!
//! let fs = MemoryFilesystem::new();
//! fs.create_dir_all(Path::new("/db"), 0o755).unwrap();
//! let mut sink = fs.create_truncate(Path::new("/db/f"), 0o666).unwrap();
//! let offset = sink.append(b"hello world").unwrap();
//! assert_eq!(offset, 0);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod memory;

pub use backend::{FileSink, Filesystem};
pub use error::{StorageError, StorageResult};
pub use file::{OsFile, OsFilesystem};
pub use memory::{MemoryFile, MemoryFilesystem};
