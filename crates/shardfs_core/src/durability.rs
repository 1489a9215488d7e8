//! Durability of a shard-block on disk.
//!
//! The checkpoint file is the only commit marker. A block with all
//! three data files but no checkpoint was torn mid-write and must not be
//! read.

use crate::layout::{FileKind, FilesetPaths};
use crate::types::{BlockStart, ShardId};
use shardfs_storage::Filesystem;
use std::fmt;
use std::path::Path;

/// What a reader may assume about a shard-block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilesetStatus {
    /// The checkpoint exists; info, index and data are complete.
    Durable,
    /// Some fileset files exist but the checkpoint does not.
    Incomplete,
    /// No fileset files exist.
    Missing,
}

impl FilesetStatus {
    /// Returns true if the block may be read.
    #[must_use]
    pub fn is_durable(self) -> bool {
        self == FilesetStatus::Durable
    }
}

impl fmt::Display for FilesetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FilesetStatus::Durable => "durable",
            FilesetStatus::Incomplete => "incomplete",
            FilesetStatus::Missing => "missing",
        };
        f.write_str(s)
    }
}

/// Classifies the fileset for `(shard, block_start)` under `root`.
pub fn fileset_status(
    fs: &dyn Filesystem,
    root: &Path,
    shard: ShardId,
    block_start: BlockStart,
) -> FilesetStatus {
    let paths = FilesetPaths::new(root, shard, block_start);
    if fs.exists(&paths.checkpoint) {
        return FilesetStatus::Durable;
    }
    let any = FileKind::ALL
        .iter()
        .any(|kind| fs.exists(paths.get(*kind)));
    if any {
        FilesetStatus::Incomplete
    } else {
        FilesetStatus::Missing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::FilesetWriter;
    use shardfs_storage::MemoryFilesystem;
    use std::sync::Arc;
    use std::time::Duration;

    const START: BlockStart = BlockStart::from_unix_nanos(3_600_000_000_000);

    fn writer(fs: &MemoryFilesystem) -> FilesetWriter {
        FilesetWriter::with_filesystem(
            Duration::from_secs(3600),
            "/db",
            None,
            Arc::new(fs.clone()),
        )
    }

    #[test]
    fn missing_when_nothing_written() {
        let fs = MemoryFilesystem::new();
        let status = fileset_status(&fs, Path::new("/db"), ShardId::new(1), START);
        assert_eq!(status, FilesetStatus::Missing);
        assert!(!status.is_durable());
    }

    #[test]
    fn incomplete_while_open() {
        let fs = MemoryFilesystem::new();
        let mut w = writer(&fs);
        w.open(ShardId::new(1), START).unwrap();
        w.write("k", b"v").unwrap();
        assert_eq!(
            fileset_status(&fs, Path::new("/db"), ShardId::new(1), START),
            FilesetStatus::Incomplete
        );
    }

    #[test]
    fn durable_after_close() {
        let fs = MemoryFilesystem::new();
        let mut w = writer(&fs);
        w.open(ShardId::new(1), START).unwrap();
        w.close().unwrap();
        let status = fileset_status(&fs, Path::new("/db"), ShardId::new(1), START);
        assert!(status.is_durable());
        assert_eq!(status.to_string(), "durable");

        // Other blocks of the same shard are unaffected.
        let other = BlockStart::from_unix_nanos(0);
        assert_eq!(
            fileset_status(&fs, Path::new("/db"), ShardId::new(1), other),
            FilesetStatus::Missing
        );
    }
}
