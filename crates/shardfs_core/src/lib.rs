//! # shardfs Core
//!
//! Crash-consistent fileset writer for time-series blocks.
//!
//! A shard-block (one shard over one time window) is persisted as four
//! files in the shard's directory:
//!
//! - `<start>-info.db`: block start, block size and entry count
//! - `<start>-index.db`: one record per entry, in write order
//! - `<start>-data.db`: entry bytes, concatenated
//! - `<start>-checkpoint.db`: empty commit marker
//!
//! The checkpoint is created last, only after the other three files have
//! been written and closed without error. Its presence is the single
//! signal that a block is durable; see [`fileset_status`].
//!
//! ## Usage
//!
//! ```rust
//! use shardfs_core::{fileset_status, BlockStart, FilesetWriter, ShardId, WriterOptions};
//! use shardfs_storage::OsFilesystem;
//! use std::time::Duration;
//!
//! let dir = tempfile::tempdir().unwrap();
//! let options = WriterOptions::new().with_new_file_mode(0o640);
//! let mut writer = FilesetWriter::new(Duration::from_secs(3600), dir.path(), Some(options));
//!
//! let start = BlockStart::from_unix_nanos(1_700_000_000_000_000_000);
//! writer.open(ShardId::new(0), start).unwrap();
//! writer.write("host1.cpu", &[1, 2, 3]).unwrap();
//! writer.close().unwrap();
//!
//! let status = fileset_status(&OsFilesystem, dir.path(), ShardId::new(0), start);
//! assert!(status.is_durable());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod durability;
mod error;
mod handles;
mod layout;
mod options;
mod types;
mod writer;

pub use durability::{fileset_status, FilesetStatus};
pub use error::{CoreError, CoreResult};
pub use handles::{close_all, open_all};
pub use layout::{fileset_path, shard_dir_path, FileKind, FilesetPaths};
pub use options::{WriterOptions, DEFAULT_NEW_DIRECTORY_MODE, DEFAULT_NEW_FILE_MODE};
pub use types::{duration_nanos, BlockStart, ShardId};
pub use writer::{FilesetWriter, WriterStatus};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
