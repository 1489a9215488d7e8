//! Fileset path layout.
//!
//! ```text
//! <root>/
//! └─ <shard>/
//!    ├─ <block-start-nanos>-info.db        # Info record
//!    ├─ <block-start-nanos>-index.db       # Index records, write order
//!    ├─ <block-start-nanos>-data.db        # Concatenated entry bytes
//!    └─ <block-start-nanos>-checkpoint.db  # Empty; present once committed
//! ```

use crate::types::{BlockStart, ShardId};
use std::path::{Path, PathBuf};

/// The four files of a fileset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    /// Summary record.
    Info,
    /// Per-entry index records.
    Index,
    /// Entry bytes.
    Data,
    /// Commit marker.
    Checkpoint,
}

impl FileKind {
    /// All kinds, in the order the writer opens them.
    pub const ALL: [FileKind; 4] = [
        FileKind::Info,
        FileKind::Index,
        FileKind::Data,
        FileKind::Checkpoint,
    ];

    /// File name suffix for this kind.
    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            FileKind::Info => "info",
            FileKind::Index => "index",
            FileKind::Data => "data",
            FileKind::Checkpoint => "checkpoint",
        }
    }
}

/// Returns the directory holding every fileset of `shard`.
#[must_use]
pub fn shard_dir_path(root: &Path, shard: ShardId) -> PathBuf {
    root.join(shard.as_u32().to_string())
}

/// Returns the path of one fileset file inside a shard directory.
#[must_use]
pub fn fileset_path(shard_dir: &Path, block_start: BlockStart, kind: FileKind) -> PathBuf {
    shard_dir.join(format!(
        "{}-{}.db",
        block_start.as_unix_nanos(),
        kind.suffix()
    ))
}

/// Resolved paths for one shard-block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilesetPaths {
    /// Shard directory.
    pub shard_dir: PathBuf,
    /// Info file.
    pub info: PathBuf,
    /// Index file.
    pub index: PathBuf,
    /// Data file.
    pub data: PathBuf,
    /// Checkpoint marker.
    pub checkpoint: PathBuf,
}

impl FilesetPaths {
    /// Resolves the paths for `(shard, block_start)` under `root`.
    #[must_use]
    pub fn new(root: &Path, shard: ShardId, block_start: BlockStart) -> Self {
        let shard_dir = shard_dir_path(root, shard);
        Self {
            info: fileset_path(&shard_dir, block_start, FileKind::Info),
            index: fileset_path(&shard_dir, block_start, FileKind::Index),
            data: fileset_path(&shard_dir, block_start, FileKind::Data),
            checkpoint: fileset_path(&shard_dir, block_start, FileKind::Checkpoint),
            shard_dir,
        }
    }

    /// Returns the path of one file.
    #[must_use]
    pub fn get(&self, kind: FileKind) -> &Path {
        match kind {
            FileKind::Info => &self.info,
            FileKind::Index => &self.index,
            FileKind::Data => &self.data,
            FileKind::Checkpoint => &self.checkpoint,
        }
    }
}
