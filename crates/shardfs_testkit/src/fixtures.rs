//! Test fixtures for writing filesets.

use crate::inspect::FilesetContents;
use shardfs_core::{BlockStart, CoreResult, FilesetPaths, FilesetWriter, ShardId, WriterOptions};
use shardfs_storage::{Filesystem, MemoryFilesystem};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// Block size used by fixtures unless a test picks its own.
pub const TEST_BLOCK_SIZE: Duration = Duration::from_secs(2 * 60 * 60);

/// One entry to write: a key and its segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestEntry {
    /// Series key.
    pub key: String,
    /// Segments concatenated into the entry's bytes.
    pub segments: Vec<Vec<u8>>,
}

impl TestEntry {
    /// Creates an entry.
    pub fn new(key: impl Into<String>, segments: Vec<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            segments,
        }
    }

    /// Total byte length across segments.
    #[must_use]
    pub fn size(&self) -> usize {
        self.segments.iter().map(Vec::len).sum()
    }

    /// The segments concatenated.
    #[must_use]
    pub fn bytes(&self) -> Vec<u8> {
        self.segments.concat()
    }
}

/// A temporary root directory removed on drop.
pub struct TestRoot {
    dir: TempDir,
}

impl TestRoot {
    /// Creates a fresh empty root.
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Root path.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// A writer rooted here with the given options.
    pub fn writer(&self, options: Option<WriterOptions>) -> FilesetWriter {
        FilesetWriter::new(TEST_BLOCK_SIZE, self.path(), options)
    }

    /// Paths of a fileset under this root.
    pub fn paths(&self, shard: ShardId, block_start: BlockStart) -> FilesetPaths {
        FilesetPaths::new(self.path(), shard, block_start)
    }

    /// Reads back a fileset under this root.
    pub fn contents(&self, shard: ShardId, block_start: BlockStart) -> FilesetContents {
        FilesetContents::read(&self.paths(shard, block_start))
            .expect("Failed to read fileset")
    }
}

impl Default for TestRoot {
    fn default() -> Self {
        Self::new()
    }
}

/// Root used for in-memory filesets.
pub fn memory_root() -> PathBuf {
    PathBuf::from("/shardfs")
}

/// A writer over `fs` rooted at [`memory_root`].
pub fn writer_on(fs: Arc<dyn Filesystem>, options: Option<WriterOptions>) -> FilesetWriter {
    FilesetWriter::with_filesystem(TEST_BLOCK_SIZE, memory_root(), options, fs)
}

/// A fresh in-memory filesystem and a writer over it.
pub fn memory_writer(options: Option<WriterOptions>) -> (MemoryFilesystem, FilesetWriter) {
    let fs = MemoryFilesystem::new();
    let writer = writer_on(Arc::new(fs.clone()), options);
    (fs, writer)
}

/// Opens `writer`, writes `entries` in order and closes it.
///
/// # Errors
///
/// Returns the first error from open, write or close.
pub fn write_block(
    writer: &mut FilesetWriter,
    shard: ShardId,
    block_start: BlockStart,
    entries: &[TestEntry],
) -> CoreResult<()> {
    writer.open(shard, block_start)?;
    for entry in entries {
        writer.write_all(&entry.key, entry.segments.as_slice())?;
    }
    writer.close()
}

/// Runs `f` with a fresh temporary root.
///
/// # Example
///
/// ```rust
/// use shardfs_testkit::fixtures::with_temp_root;
///
/// with_temp_root(|root| {
///     assert!(root.path().exists());
/// });
/// ```
pub fn with_temp_root<F, R>(f: F) -> R
where
    F: FnOnce(&TestRoot) -> R,
{
    let root = TestRoot::new();
    f(&root)
}
