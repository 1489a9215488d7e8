//! Fault injection for fileset writers.
//!
//! [`FaultyFilesystem`] wraps another [`Filesystem`] and fails chosen
//! operations on chosen fileset files, or simulates a process crash after
//! a number of bytes have been appended.
//!
//! ## Usage
//!
//! ```rust
//! use shardfs_core::{FileKind, FilesetWriter, ShardId, BlockStart};
//! use shardfs_storage::MemoryFilesystem;
//! use shardfs_testkit::faults::{Fault, FaultyFilesystem};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let mem = MemoryFilesystem::new();
//! let faulty = FaultyFilesystem::new(Arc::new(mem.clone()));
//! faulty.fail(Fault::Close, FileKind::Data);
//!
//! let mut writer = FilesetWriter::with_filesystem(
//!     Duration::from_secs(60), "/db", None, Arc::new(faulty.clone()));
//! writer.open(ShardId::new(0), BlockStart::from_unix_nanos(0)).unwrap();
//! assert!(writer.close().is_err());
//! assert!(!mem.file_paths().iter().any(|p| p.ends_with("0-checkpoint.db")));
//! ```

use parking_lot::Mutex;
use shardfs_core::FileKind;
use shardfs_storage::{FileSink, Filesystem, StorageError, StorageResult};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// An operation that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// `create_truncate` of the file.
    Open,
    /// Any append to the file.
    Append,
    /// `sync` of the file.
    Sync,
    /// `close` of the file.
    Close,
}

#[derive(Debug)]
struct FaultPlan {
    faults: Mutex<Vec<(Fault, FileKind)>>,
    crash_after_bytes: AtomicUsize,
    bytes_written: AtomicUsize,
    crashed: AtomicBool,
    dir_sync_fails: AtomicBool,
    open_handles: AtomicUsize,
}

impl FaultPlan {
    fn should_fail(&self, fault: Fault, kind: Option<FileKind>) -> bool {
        kind.is_some_and(|kind| self.faults.lock().contains(&(fault, kind)))
    }
}

fn injected(what: &str, path: &Path) -> StorageError {
    StorageError::Io(std::io::Error::new(
        std::io::ErrorKind::Other,
        format!("injected {what} failure: {}", path.display()),
    ))
}

fn crashed(path: &Path) -> StorageError {
    StorageError::Io(std::io::Error::new(
        std::io::ErrorKind::Other,
        format!("simulated crash: {}", path.display()),
    ))
}

/// Returns the fileset file kind a path names, if any.
#[must_use]
pub fn kind_of(path: &Path) -> Option<FileKind> {
    let name = path.file_name()?.to_str()?;
    FileKind::ALL
        .into_iter()
        .find(|kind| name.ends_with(&format!("-{}.db", kind.suffix())))
}

/// A filesystem wrapper that injects failures.
///
/// Clones share the fault plan, so a test can keep one clone to arm
/// faults and inspect counters while the writer owns another.
#[derive(Clone)]
pub struct FaultyFilesystem {
    inner: Arc<dyn Filesystem>,
    plan: Arc<FaultPlan>,
}

impl FaultyFilesystem {
    /// Wraps `inner` with no faults armed.
    pub fn new(inner: Arc<dyn Filesystem>) -> Self {
        Self {
            inner,
            plan: Arc::new(FaultPlan {
                faults: Mutex::new(Vec::new()),
                crash_after_bytes: AtomicUsize::new(usize::MAX),
                bytes_written: AtomicUsize::new(0),
                crashed: AtomicBool::new(false),
                dir_sync_fails: AtomicBool::new(false),
                open_handles: AtomicUsize::new(0),
            }),
        }
    }

    /// Makes `fault` fail on every file of `kind`.
    pub fn fail(&self, fault: Fault, kind: FileKind) {
        self.plan.faults.lock().push((fault, kind));
    }

    /// Makes every `sync_dir` fail.
    pub fn fail_dir_sync(&self) {
        self.plan.dir_sync_fails.store(true, Ordering::SeqCst);
    }

    /// Crashes once `bytes` bytes have been appended across all files.
    ///
    /// The append that crosses the threshold writes only the bytes before
    /// it. Every operation after the crash fails.
    pub fn crash_after(&self, bytes: usize) {
        self.plan.crash_after_bytes.store(bytes, Ordering::SeqCst);
    }

    /// Disarms all faults and clears the crash.
    pub fn reset(&self) {
        self.plan.faults.lock().clear();
        self.plan.crash_after_bytes.store(usize::MAX, Ordering::SeqCst);
        self.plan.bytes_written.store(0, Ordering::SeqCst);
        self.plan.crashed.store(false, Ordering::SeqCst);
        self.plan.dir_sync_fails.store(false, Ordering::SeqCst);
    }

    /// Returns whether the simulated crash has happened.
    #[must_use]
    pub fn has_crashed(&self) -> bool {
        self.plan.crashed.load(Ordering::SeqCst)
    }

    /// Number of file handles created and not yet released.
    #[must_use]
    pub fn open_handles(&self) -> usize {
        self.plan.open_handles.load(Ordering::SeqCst)
    }
}

impl Filesystem for FaultyFilesystem {
    fn create_dir_all(&self, path: &Path, mode: u32) -> StorageResult<()> {
        if self.has_crashed() {
            return Err(crashed(path));
        }
        self.inner.create_dir_all(path, mode)
    }

    fn create_truncate(&self, path: &Path, mode: u32) -> StorageResult<Box<dyn FileSink>> {
        if self.has_crashed() {
            return Err(crashed(path));
        }
        let kind = kind_of(path);
        if self.plan.should_fail(Fault::Open, kind) {
            return Err(injected("open", path));
        }
        let inner = self.inner.create_truncate(path, mode)?;
        self.plan.open_handles.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FaultySink {
            inner: Some(inner),
            kind,
            plan: Arc::clone(&self.plan),
        }))
    }

    fn exists(&self, path: &Path) -> bool {
        self.inner.exists(path)
    }

    fn remove_file(&self, path: &Path) -> StorageResult<bool> {
        if self.has_crashed() {
            return Err(crashed(path));
        }
        self.inner.remove_file(path)
    }

    fn sync_dir(&self, path: &Path) -> StorageResult<()> {
        if self.has_crashed() {
            return Err(crashed(path));
        }
        if self.plan.dir_sync_fails.load(Ordering::SeqCst) {
            return Err(injected("directory sync", path));
        }
        self.inner.sync_dir(path)
    }
}

struct FaultySink {
    inner: Option<Box<dyn FileSink>>,
    kind: Option<FileKind>,
    plan: Arc<FaultPlan>,
}

impl FaultySink {
    fn inner(&mut self) -> StorageResult<&mut Box<dyn FileSink>> {
        self.inner.as_mut().ok_or_else(|| {
            StorageError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "handle already closed",
            ))
        })
    }

    fn path_buf(&self) -> std::path::PathBuf {
        self.inner
            .as_ref()
            .map(|s| s.path().to_path_buf())
            .unwrap_or_default()
    }
}

impl FileSink for FaultySink {
    fn path(&self) -> &Path {
        self.inner
            .as_ref()
            .map_or_else(|| Path::new(""), |s| s.path())
    }

    fn append(&mut self, data: &[u8]) -> StorageResult<u64> {
        let path = self.path_buf();
        if self.plan.crashed.load(Ordering::SeqCst) {
            return Err(crashed(&path));
        }
        if self.plan.should_fail(Fault::Append, self.kind) {
            return Err(injected("append", &path));
        }

        let current = self.plan.bytes_written.fetch_add(data.len(), Ordering::SeqCst);
        let threshold = self.plan.crash_after_bytes.load(Ordering::SeqCst);
        if current.saturating_add(data.len()) > threshold {
            self.plan.crashed.store(true, Ordering::SeqCst);
            let partial = threshold.saturating_sub(current);
            if partial > 0 {
                let _ = self.inner()?.append(&data[..partial]);
            }
            return Err(crashed(&path));
        }
        self.inner()?.append(data)
    }

    fn flush(&mut self) -> StorageResult<()> {
        self.inner()?.flush()
    }

    fn sync(&mut self) -> StorageResult<()> {
        let path = self.path_buf();
        if self.plan.crashed.load(Ordering::SeqCst) {
            return Err(crashed(&path));
        }
        if self.plan.should_fail(Fault::Sync, self.kind) {
            return Err(injected("sync", &path));
        }
        self.inner()?.sync()
    }

    fn size(&self) -> u64 {
        self.inner.as_ref().map_or(0, |s| s.size())
    }

    fn close(mut self: Box<Self>) -> StorageResult<()> {
        let path = self.path_buf();
        let inner = self.inner.take();
        if self.plan.crashed.load(Ordering::SeqCst) {
            return Err(crashed(&path));
        }
        if self.plan.should_fail(Fault::Close, self.kind) {
            return Err(injected("close", &path));
        }
        match inner {
            Some(inner) => inner.close(),
            None => Ok(()),
        }
    }
}

impl Drop for FaultySink {
    fn drop(&mut self) {
        self.plan.open_handles.fetch_sub(1, Ordering::SeqCst);
    }
}
