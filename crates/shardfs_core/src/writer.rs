//! The fileset writer.
//!
//! A [`FilesetWriter`] persists one shard-block as four files:
//!
//! ```text
//! open ──► write_all* ──► close
//!  │           │            ├─ info record framed into the info file
//!  │           │            ├─ info, index, data synced and closed
//!  │           │            └─ empty checkpoint file created  ◄── commit point
//!  │           ├─ index entry appended to the index file
//!  │           └─ segment bytes appended to the data file
//!  ├─ shard directory created
//!  └─ info, index, data created and truncated
//! ```
//!
//! Readers must treat a fileset without a checkpoint file as not durable,
//! whatever the other three files contain.

use crate::error::{CoreError, CoreResult};
use crate::handles::OpenFileset;
use crate::layout::FilesetPaths;
use crate::options::WriterOptions;
use crate::types::{duration_nanos, BlockStart, ShardId};
use shardfs_codec::{IndexRecord, InfoRecord};
use shardfs_storage::{Filesystem, OsFilesystem};
use std::fmt;
use std::mem;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Lifecycle state of a [`FilesetWriter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterStatus {
    /// Constructed; `open` not yet called or not yet successful.
    Unopened,
    /// Accepting writes.
    Open,
    /// `close` was called. Terminal.
    Closed,
}

impl fmt::Display for WriterStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WriterStatus::Unopened => "unopened",
            WriterStatus::Open => "open",
            WriterStatus::Closed => "closed",
        };
        f.write_str(s)
    }
}

enum State {
    Unopened,
    Open(OpenBlock),
    Closed,
}

struct OpenBlock {
    shard: ShardId,
    start: BlockStart,
    block_size_nanos: i64,
    files: OpenFileset,
    data_offset: u64,
    index_buf: Vec<u8>,
    poisoned: bool,
}

impl OpenBlock {
    fn append_entry<S: AsRef<[u8]>>(&mut self, record: &IndexRecord, segments: &[S]) -> CoreResult<()> {
        self.index_buf.clear();
        record.encode_entry(&mut self.index_buf)?;
        self.files.index.append(&self.index_buf)?;
        for segment in segments {
            self.files.data.append(segment.as_ref())?;
        }
        Ok(())
    }
}

/// Writes one shard-block as an info/index/data/checkpoint fileset.
///
/// # Lifecycle
///
/// `open` once, any number of `write`/`write_all`, then `close` once. A
/// writer is single-use: after `close` (successful or not) every further
/// call fails with [`CoreError::InvalidState`].
///
/// # Exclusivity
///
/// The writer does not lock anything on disk. Callers must ensure that at
/// most one writer targets a given `(root, shard, block_start)` at a time;
/// two writers on the same path set truncate and interleave each other's
/// files.
///
/// # Abandonment
///
/// Dropping an open writer releases its handles without writing the info
/// record or the checkpoint, so the block is never reported durable.
///
/// # Example
///
/// ```rust
/// use shardfs_core::{BlockStart, FilesetWriter, ShardId};
/// use std::time::Duration;
///
/// let dir = tempfile::tempdir().unwrap();
/// let mut writer = FilesetWriter::new(Duration::from_secs(7200), dir.path(), None);
///
/// writer.open(ShardId::new(3), BlockStart::from_unix_nanos(0)).unwrap();
/// writer.write("cpu.user", b"0123456789").unwrap();
/// writer.write_all("cpu.sys", &[b"01234".as_slice(), b"56789".as_slice()]).unwrap();
/// writer.close().unwrap();
///
/// assert!(writer.paths().unwrap().checkpoint.exists());
/// ```
pub struct FilesetWriter {
    block_size: Duration,
    root: PathBuf,
    options: WriterOptions,
    fs: Arc<dyn Filesystem>,
    state: State,
    entries: u64,
    paths: Option<FilesetPaths>,
}

impl FilesetWriter {
    /// Creates a writer for filesets under `root` on the OS filesystem.
    ///
    /// `None` options resolve to [`WriterOptions::default`].
    pub fn new(block_size: Duration, root: impl Into<PathBuf>, options: Option<WriterOptions>) -> Self {
        Self::with_filesystem(block_size, root, options, Arc::new(OsFilesystem))
    }

    /// Creates a writer over an arbitrary [`Filesystem`].
    pub fn with_filesystem(
        block_size: Duration,
        root: impl Into<PathBuf>,
        options: Option<WriterOptions>,
        fs: Arc<dyn Filesystem>,
    ) -> Self {
        Self {
            block_size,
            root: root.into(),
            options: options.unwrap_or_default(),
            fs,
            state: State::Unopened,
            entries: 0,
            paths: None,
        }
    }

    /// Returns the writer's lifecycle state.
    #[must_use]
    pub fn status(&self) -> WriterStatus {
        match self.state {
            State::Unopened => WriterStatus::Unopened,
            State::Open(_) => WriterStatus::Open,
            State::Closed => WriterStatus::Closed,
        }
    }

    /// Number of entries written since `open`.
    #[must_use]
    pub fn entries_written(&self) -> u64 {
        self.entries
    }

    /// Paths of the fileset, once `open` has succeeded.
    #[must_use]
    pub fn paths(&self) -> Option<&FilesetPaths> {
        self.paths.as_ref()
    }

    /// Root directory filesets are written under.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Block size recorded in the info record.
    #[must_use]
    pub fn block_size(&self) -> Duration {
        self.block_size
    }

    /// Options the writer was built with.
    #[must_use]
    pub fn options(&self) -> WriterOptions {
        self.options
    }

    /// Prepares the writer for `(shard, block_start)`.
    ///
    /// Creates the shard directory if missing and removes any checkpoint
    /// left by an earlier write of the same block, then creates
    /// (truncating) the info, index and data files. If any file fails to
    /// open, the others are released and the writer stays unopened.
    ///
    /// # Errors
    ///
    /// - [`CoreError::InvalidState`] if the writer was already opened
    /// - [`CoreError::OutOfRange`] if the block size exceeds i64 nanoseconds
    /// - [`CoreError::Storage`] if the directory or a file cannot be
    ///   created, or a stale checkpoint cannot be removed
    pub fn open(&mut self, shard: ShardId, block_start: BlockStart) -> CoreResult<()> {
        if !matches!(self.state, State::Unopened) {
            return Err(CoreError::invalid_state("open", self.status()));
        }
        let block_size_nanos = duration_nanos(self.block_size)?;

        let paths = FilesetPaths::new(&self.root, shard, block_start);
        self.fs
            .create_dir_all(&paths.shard_dir, self.options.new_directory_mode())?;
        if self.fs.remove_file(&paths.checkpoint)? {
            debug!(%shard, %block_start, "removed checkpoint of previous write");
            if self.options.sync_on_close() {
                self.fs.sync_dir(&paths.shard_dir)?;
            }
        }
        let files = OpenFileset::open(self.fs.as_ref(), &paths, self.options.new_file_mode())?;

        debug!(%shard, %block_start, dir = %paths.shard_dir.display(), "fileset opened");

        self.entries = 0;
        self.paths = Some(paths);
        self.state = State::Open(OpenBlock {
            shard,
            start: block_start,
            block_size_nanos,
            files,
            data_offset: 0,
            index_buf: Vec::new(),
            poisoned: false,
        });
        Ok(())
    }

    /// Writes one entry with a single segment.
    ///
    /// # Errors
    ///
    /// See [`FilesetWriter::write_all`].
    pub fn write(&mut self, key: &str, data: &[u8]) -> CoreResult<()> {
        self.write_all(key, &[data])
    }

    /// Writes one entry whose bytes are the concatenation of `segments`.
    ///
    /// An entry with zero total bytes is skipped: nothing is written and
    /// the entry counter does not advance.
    ///
    /// Otherwise the index entry is appended to the index file and the
    /// segments, in order, to the data file. A failure part way through
    /// leaves the files partially written and poisons the block: later
    /// writes fail and `close` releases the files without a checkpoint.
    ///
    /// # Errors
    ///
    /// - [`CoreError::InvalidState`] if the writer is not open
    /// - [`CoreError::Poisoned`] if an earlier write failed
    /// - [`CoreError::Storage`] on the first failed index or data write
    pub fn write_all<S: AsRef<[u8]>>(&mut self, key: &str, segments: &[S]) -> CoreResult<()> {
        let status = self.status();
        let State::Open(block) = &mut self.state else {
            return Err(CoreError::invalid_state("write", status));
        };
        if block.poisoned {
            return Err(CoreError::Poisoned { operation: "write" });
        }

        let size: u64 = segments.iter().map(|s| s.as_ref().len() as u64).sum();
        if size == 0 {
            return Ok(());
        }

        let record = IndexRecord {
            index: self.entries,
            size,
            offset: block.data_offset,
            key: key.to_string(),
        };
        if let Err(err) = block.append_entry(&record, segments) {
            block.poisoned = true;
            return Err(err);
        }

        block.data_offset += size;
        self.entries += 1;
        Ok(())
    }

    /// Finishes the fileset and commits it.
    ///
    /// Writes the info record, closes info, index and data (in that order,
    /// syncing first when [`WriterOptions::sync_on_close`] is set), then
    /// creates the empty checkpoint file. The checkpoint is only created
    /// when everything before it succeeded. A failed directory sync after
    /// that point is logged, not returned, since the block is committed.
    ///
    /// The writer is closed afterwards whether or not this succeeds.
    ///
    /// # Errors
    ///
    /// - [`CoreError::InvalidState`] if the writer is not open
    /// - [`CoreError::Poisoned`] if a write failed; the files are released
    ///   and no checkpoint is created
    /// - The first storage or codec failure; the checkpoint is then absent
    pub fn close(&mut self) -> CoreResult<()> {
        let block = match mem::replace(&mut self.state, State::Closed) {
            State::Open(block) => block,
            other => {
                self.state = other;
                return Err(CoreError::invalid_state("close", self.status()));
            }
        };
        let OpenBlock {
            shard,
            start,
            block_size_nanos,
            mut files,
            poisoned,
            ..
        } = block;

        if poisoned {
            if let Err(err) = files.close(false) {
                warn!(%shard, %start, error = %err, "failed to release abandoned fileset");
            }
            warn!(%shard, %start, entries = self.entries, "fileset abandoned after failed write");
            return Err(CoreError::Poisoned { operation: "close" });
        }

        let info_record = InfoRecord {
            start: start.as_unix_nanos(),
            block_size: block_size_nanos,
            entries: self.entries,
        };
        let info_written = info_record
            .encode_framed()
            .map_err(CoreError::from)
            .and_then(|bytes| files.info.append(&bytes).map_err(CoreError::from));

        let sync = self.options.sync_on_close();
        let closed = files.close(sync);
        info_written?;
        closed?;

        let Some(paths) = self.paths.as_ref() else {
            return Err(CoreError::invalid_state("close", WriterStatus::Unopened));
        };
        self.fs
            .create_truncate(&paths.checkpoint, self.options.new_file_mode())?
            .close()?;
        if sync {
            if let Err(err) = self.fs.sync_dir(&paths.shard_dir) {
                warn!(
                    %shard,
                    %start,
                    error = %err,
                    "shard directory sync failed after checkpoint"
                );
            }
        }

        info!(%shard, %start, entries = self.entries, "fileset checkpointed");
        Ok(())
    }
}

impl fmt::Debug for FilesetWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilesetWriter")
            .field("root", &self.root)
            .field("block_size", &self.block_size)
            .field("options", &self.options)
            .field("status", &self.status())
            .field("entries", &self.entries)
            .finish_non_exhaustive()
    }
}

impl Drop for FilesetWriter {
    fn drop(&mut self) {
        if let State::Open(block) = &self.state {
            warn!(
                shard = %block.shard,
                block_start = %block.start,
                entries = self.entries,
                "fileset writer dropped while open; block left uncommitted"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shardfs_codec::{decode_index_entries, InfoRecord};
    use shardfs_storage::MemoryFilesystem;
    use tempfile::tempdir;

    const BLOCK: Duration = Duration::from_secs(7200);
    const T: BlockStart = BlockStart::from_unix_nanos(1_700_000_000_000_000_000);

    fn memory_writer(options: Option<WriterOptions>) -> (MemoryFilesystem, FilesetWriter) {
        let fs = MemoryFilesystem::new();
        let writer = FilesetWriter::with_filesystem(BLOCK, "/db", options, Arc::new(fs.clone()));
        (fs, writer)
    }

    #[test]
    fn new_writer_is_unopened() {
        let (_, writer) = memory_writer(None);
        assert_eq!(writer.status(), WriterStatus::Unopened);
        assert_eq!(writer.entries_written(), 0);
        assert!(writer.paths().is_none());
        assert_eq!(writer.options(), WriterOptions::default());
    }

    #[test]
    fn open_creates_shard_dir_and_files() {
        let (fs, mut writer) = memory_writer(None);
        writer.open(ShardId::new(3), T).unwrap();

        let paths = writer.paths().unwrap().clone();
        assert_eq!(fs.dir_mode(&paths.shard_dir), Some(0o755));
        for path in [&paths.info, &paths.index, &paths.data] {
            assert_eq!(fs.contents(path).unwrap(), Vec::<u8>::new());
            assert_eq!(fs.file_mode(path), Some(0o666));
        }
        assert!(!fs.exists(&paths.checkpoint));
        assert_eq!(writer.status(), WriterStatus::Open);
    }

    #[test]
    fn open_truncates_stale_files() {
        let (fs, mut writer) = memory_writer(None);
        let paths = FilesetPaths::new(Path::new("/db"), ShardId::new(1), T);
        fs.create_dir_all(&paths.shard_dir, 0o755).unwrap();
        fs.put_file(&paths.data, b"left over from a torn write");

        writer.open(ShardId::new(1), T).unwrap();
        assert!(fs.contents(&paths.data).unwrap().is_empty());
    }

    #[test]
    fn concrete_scenario() {
        let (fs, mut writer) = memory_writer(None);
        writer.open(ShardId::new(3), T).unwrap();
        writer.write_all("seriesA", &[vec![1u8; 10]]).unwrap();
        writer.write_all("seriesB", &[Vec::<u8>::new()]).unwrap();
        writer
            .write_all("seriesC", &[vec![2u8; 5], vec![3u8; 5]])
            .unwrap();
        writer.close().unwrap();

        let paths = writer.paths().unwrap();
        let (info, _) = InfoRecord::decode_framed(&fs.contents(&paths.info).unwrap()).unwrap();
        assert_eq!(info.start, T.as_unix_nanos());
        assert_eq!(info.block_size, 7_200_000_000_000);
        assert_eq!(info.entries, 2);

        let index = decode_index_entries(&fs.contents(&paths.index).unwrap()).unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!((index[0].index, index[0].size, index[0].offset), (0, 10, 0));
        assert_eq!((index[1].index, index[1].size, index[1].offset), (1, 10, 10));
        assert_eq!(index[0].key, "seriesA");
        assert_eq!(index[1].key, "seriesC");

        let data = fs.contents(&paths.data).unwrap();
        assert_eq!(data.len(), 20);
        assert_eq!(&data[10..15], &[2u8; 5]);
        assert_eq!(&data[15..], &[3u8; 5]);

        assert_eq!(fs.contents(&paths.checkpoint).unwrap(), Vec::<u8>::new());
        assert_eq!(writer.status(), WriterStatus::Closed);
    }

    #[test]
    fn empty_write_does_not_advance_counter() {
        let (fs, mut writer) = memory_writer(None);
        writer.open(ShardId::new(0), T).unwrap();
        writer.write("a", b"").unwrap();
        writer.write_all::<&[u8]>("b", &[]).unwrap();
        writer.write_all("c", &[b"".as_slice(), b"".as_slice()]).unwrap();
        assert_eq!(writer.entries_written(), 0);

        let paths = writer.paths().unwrap().clone();
        assert!(fs.contents(&paths.index).unwrap().is_empty());
        assert!(fs.contents(&paths.data).unwrap().is_empty());

        writer.write("d", b"x").unwrap();
        let index = decode_index_entries(&fs.contents(&paths.index).unwrap()).unwrap();
        assert_eq!(index[0].index, 0);
    }

    #[test]
    fn duplicate_keys_produce_duplicate_records() {
        let (fs, mut writer) = memory_writer(None);
        writer.open(ShardId::new(0), T).unwrap();
        writer.write("same", b"1").unwrap();
        writer.write("same", b"22").unwrap();
        writer.close().unwrap();

        let index =
            decode_index_entries(&fs.contents(&writer.paths().unwrap().index).unwrap()).unwrap();
        assert_eq!(index.len(), 2);
        assert!(index.iter().all(|r| r.key == "same"));
    }

    #[test]
    fn close_without_writes_commits_empty_block() {
        let (fs, mut writer) = memory_writer(None);
        writer.open(ShardId::new(0), T).unwrap();
        writer.close().unwrap();

        let paths = writer.paths().unwrap();
        let (info, _) = InfoRecord::decode_framed(&fs.contents(&paths.info).unwrap()).unwrap();
        assert_eq!(info.entries, 0);
        assert!(fs.exists(&paths.checkpoint));
    }

    #[test]
    fn write_before_open_is_rejected() {
        let (fs, mut writer) = memory_writer(None);
        let err = writer.write("k", b"v").unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidState {
                operation: "write",
                status: WriterStatus::Unopened
            }
        ));
        assert!(fs.file_paths().is_empty());
    }

    #[test]
    fn close_before_open_is_rejected() {
        let (_, mut writer) = memory_writer(None);
        assert!(matches!(
            writer.close(),
            Err(CoreError::InvalidState {
                operation: "close",
                ..
            })
        ));
        assert_eq!(writer.status(), WriterStatus::Unopened);
    }

    #[test]
    fn double_open_is_rejected() {
        let (fs, mut writer) = memory_writer(None);
        writer.open(ShardId::new(0), T).unwrap();
        writer.write("k", b"v").unwrap();

        let err = writer.open(ShardId::new(1), T).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidState {
                operation: "open",
                status: WriterStatus::Open
            }
        ));
        // The first block is untouched and still writable.
        writer.write("k2", b"v").unwrap();
        assert_eq!(writer.entries_written(), 2);
        assert!(!fs.exists(&FilesetPaths::new(Path::new("/db"), ShardId::new(1), T).shard_dir));
    }

    #[test]
    fn closed_writer_rejects_everything() {
        let (_, mut writer) = memory_writer(None);
        writer.open(ShardId::new(0), T).unwrap();
        writer.close().unwrap();

        assert!(matches!(
            writer.write("k", b"v"),
            Err(CoreError::InvalidState {
                status: WriterStatus::Closed,
                ..
            })
        ));
        assert!(writer.open(ShardId::new(0), T).is_err());
        assert!(writer.close().is_err());
        assert_eq!(writer.status(), WriterStatus::Closed);
    }

    #[test]
    fn oversized_block_size_fails_before_touching_disk() {
        let fs = MemoryFilesystem::new();
        let mut writer = FilesetWriter::with_filesystem(
            Duration::from_secs(u64::MAX),
            "/db",
            None,
            Arc::new(fs.clone()),
        );
        assert!(matches!(
            writer.open(ShardId::new(0), T),
            Err(CoreError::OutOfRange { .. })
        ));
        assert!(!fs.exists(Path::new("/db")));
        assert_eq!(writer.status(), WriterStatus::Unopened);
    }

    #[test]
    fn configured_modes_are_used() {
        let options = WriterOptions::new()
            .with_new_file_mode(0o600)
            .with_new_directory_mode(0o700);
        let (fs, mut writer) = memory_writer(Some(options));
        writer.open(ShardId::new(2), T).unwrap();
        writer.close().unwrap();

        let paths = writer.paths().unwrap();
        assert_eq!(fs.dir_mode(&paths.shard_dir), Some(0o700));
        assert_eq!(fs.file_mode(&paths.data), Some(0o600));
        assert_eq!(fs.file_mode(&paths.checkpoint), Some(0o600));
    }

    #[test]
    fn sync_on_close_controls_fsync() {
        let (fs, mut writer) = memory_writer(None);
        writer.open(ShardId::new(0), T).unwrap();
        writer.close().unwrap();
        let paths = writer.paths().unwrap().clone();
        assert_eq!(fs.sync_count(&paths.data), 1);
        assert_eq!(fs.sync_count(&paths.shard_dir), 1);

        let (fs, mut writer) = memory_writer(Some(WriterOptions::new().with_sync_on_close(false)));
        writer.open(ShardId::new(0), T).unwrap();
        writer.close().unwrap();
        assert_eq!(fs.sync_count(&paths.data), 0);
        assert_eq!(fs.sync_count(&paths.shard_dir), 0);
    }

    #[test]
    fn dropped_open_writer_leaves_no_checkpoint() {
        let (fs, mut writer) = memory_writer(None);
        writer.open(ShardId::new(0), T).unwrap();
        writer.write("k", b"value").unwrap();
        let paths = writer.paths().unwrap().clone();
        drop(writer);

        assert!(!fs.exists(&paths.checkpoint));
        assert!(fs.contents(&paths.info).unwrap().is_empty());
    }

    #[test]
    fn failed_write_poisons_block() {
        let (fs, mut writer) = memory_writer(None);
        writer.open(ShardId::new(0), T).unwrap();
        writer.write("a", b"0123456789").unwrap();
        let paths = writer.paths().unwrap().clone();

        fs.remove_file(&paths.data).unwrap();
        assert!(matches!(writer.write("b", b"lost"), Err(CoreError::Storage(_))));
        fs.put_file(&paths.data, b"0123456789");

        let err = writer.write("c", b"after").unwrap_err();
        assert!(matches!(err, CoreError::Poisoned { operation: "write" }));
        assert!(matches!(
            writer.write("d", b""),
            Err(CoreError::Poisoned { .. })
        ));
        assert_eq!(writer.entries_written(), 1);

        let err = writer.close().unwrap_err();
        assert!(matches!(err, CoreError::Poisoned { operation: "close" }));
        assert_eq!(writer.status(), WriterStatus::Closed);
        assert!(!fs.exists(&paths.checkpoint));
        assert!(fs.contents(&paths.info).unwrap().is_empty());
    }

    #[test]
    fn reopen_removes_previous_checkpoint() {
        let (fs, mut writer) = memory_writer(None);
        writer.open(ShardId::new(2), T).unwrap();
        writer.write("k", b"first").unwrap();
        writer.close().unwrap();
        let paths = writer.paths().unwrap().clone();
        assert!(fs.exists(&paths.checkpoint));
        assert_eq!(fs.sync_count(&paths.shard_dir), 1);

        let mut again =
            FilesetWriter::with_filesystem(BLOCK, "/db", None, Arc::new(fs.clone()));
        again.open(ShardId::new(2), T).unwrap();
        assert!(!fs.exists(&paths.checkpoint));
        assert_eq!(fs.sync_count(&paths.shard_dir), 2);
        drop(again);

        assert!(!fs.exists(&paths.checkpoint));
        assert!(fs.contents(&paths.info).unwrap().is_empty());
    }

    #[test]
    fn writes_real_files() {
        let dir = tempdir().unwrap();
        let mut writer = FilesetWriter::new(BLOCK, dir.path(), None);
        writer.open(ShardId::new(7), T).unwrap();
        writer.write("a", b"hello").unwrap();
        writer.write_all("b", &[b" ".as_slice(), b"world".as_slice()]).unwrap();
        writer.close().unwrap();

        let paths = writer.paths().unwrap();
        assert_eq!(std::fs::read(&paths.data).unwrap(), b"hello world");
        assert_eq!(std::fs::metadata(&paths.checkpoint).unwrap().len(), 0);
        let (info, _) = InfoRecord::decode_framed(&std::fs::read(&paths.info).unwrap()).unwrap();
        assert_eq!(info.entries, 2);
        assert!(paths.shard_dir.ends_with("7"));
    }
}
