//! In-memory filesystem for testing.

use crate::backend::{FileSink, Filesystem};
use crate::error::{StorageError, StorageResult};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// An in-memory filesystem.
///
/// Clones share state, so a test can hand one clone to a writer and
/// inspect the files through another. Each file and directory remembers
/// the mode it was created with, and syncs are counted per path.
///
/// # Example
///
/// ```rust
/// use shardfs_storage::{Filesystem, MemoryFilesystem};
/// use std::path::Path;
///
/// let fs = MemoryFilesystem::new();
/// fs.create_dir_all(Path::new("/db/1"), 0o755).unwrap();
/// let mut file = fs.create_truncate(Path::new("/db/1/0-data.db"), 0o644).unwrap();
/// file.append(b"hello").unwrap();
/// file.close().unwrap();
///
/// assert_eq!(fs.contents(Path::new("/db/1/0-data.db")).unwrap(), b"hello");
/// assert_eq!(fs.file_mode(Path::new("/db/1/0-data.db")), Some(0o644));
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryFilesystem {
    state: Arc<Mutex<MemoryState>>,
}

#[derive(Debug, Default)]
struct MemoryState {
    dirs: BTreeMap<PathBuf, u32>,
    files: BTreeMap<PathBuf, MemoryNode>,
    syncs: BTreeMap<PathBuf, usize>,
}

#[derive(Debug)]
struct MemoryNode {
    data: Vec<u8>,
    mode: u32,
}

impl MemoryFilesystem {
    /// Creates an empty filesystem.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of a file's content.
    #[must_use]
    pub fn contents(&self, path: &Path) -> Option<Vec<u8>> {
        self.state.lock().files.get(path).map(|n| n.data.clone())
    }

    /// Returns the mode a file was created with.
    #[must_use]
    pub fn file_mode(&self, path: &Path) -> Option<u32> {
        self.state.lock().files.get(path).map(|n| n.mode)
    }

    /// Returns the mode a directory was created with.
    #[must_use]
    pub fn dir_mode(&self, path: &Path) -> Option<u32> {
        self.state.lock().dirs.get(path).copied()
    }

    /// Returns every file path, sorted.
    #[must_use]
    pub fn file_paths(&self) -> Vec<PathBuf> {
        self.state.lock().files.keys().cloned().collect()
    }

    /// Number of times `path` (file or directory) was synced.
    #[must_use]
    pub fn sync_count(&self, path: &Path) -> usize {
        self.state.lock().syncs.get(path).copied().unwrap_or(0)
    }

    /// Writes a whole file, creating it if needed.
    ///
    /// Lets tests plant stale content before a writer runs.
    pub fn put_file(&self, path: &Path, data: &[u8]) {
        self.state.lock().files.insert(
            path.to_path_buf(),
            MemoryNode {
                data: data.to_vec(),
                mode: 0o666,
            },
        );
    }
}

impl Filesystem for MemoryFilesystem {
    fn create_dir_all(&self, path: &Path, mode: u32) -> StorageResult<()> {
        let mut state = self.state.lock();
        for dir in path.ancestors() {
            if dir.as_os_str().is_empty() {
                continue;
            }
            if state.files.contains_key(dir) {
                return Err(StorageError::Io(std::io::Error::new(
                    std::io::ErrorKind::AlreadyExists,
                    format!("{} is a file", dir.display()),
                )));
            }
            state.dirs.entry(dir.to_path_buf()).or_insert(mode);
        }
        Ok(())
    }

    fn create_truncate(&self, path: &Path, mode: u32) -> StorageResult<Box<dyn FileSink>> {
        let mut state = self.state.lock();
        let parent_ok = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => state.dirs.contains_key(parent),
            _ => true,
        };
        if !parent_ok {
            return Err(StorageError::ParentMissing {
                path: path.to_path_buf(),
            });
        }
        state
            .files
            .entry(path.to_path_buf())
            .and_modify(|n| n.data.clear())
            .or_insert(MemoryNode {
                data: Vec::new(),
                mode,
            });
        Ok(Box::new(MemoryFile {
            state: Arc::clone(&self.state),
            path: path.to_path_buf(),
            size: 0,
        }))
    }

    fn exists(&self, path: &Path) -> bool {
        let state = self.state.lock();
        state.files.contains_key(path) || state.dirs.contains_key(path)
    }

    fn remove_file(&self, path: &Path) -> StorageResult<bool> {
        Ok(self.state.lock().files.remove(path).is_some())
    }

    fn sync_dir(&self, path: &Path) -> StorageResult<()> {
        *self.state.lock().syncs.entry(path.to_path_buf()).or_insert(0) += 1;
        Ok(())
    }
}

/// A handle to a file in a [`MemoryFilesystem`]. Appends are visible immediately.
#[derive(Debug)]
pub struct MemoryFile {
    state: Arc<Mutex<MemoryState>>,
    path: PathBuf,
    size: u64,
}

impl FileSink for MemoryFile {
    fn path(&self) -> &Path {
        &self.path
    }

    fn append(&mut self, data: &[u8]) -> StorageResult<u64> {
        let offset = self.size;
        let mut state = self.state.lock();
        let node = state.files.get_mut(&self.path).ok_or_else(|| {
            StorageError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} was removed", self.path.display()),
            ))
        })?;
        node.data.extend_from_slice(data);
        self.size += data.len() as u64;
        Ok(offset)
    }

    fn flush(&mut self) -> StorageResult<()> {
        Ok(())
    }

    fn sync(&mut self) -> StorageResult<()> {
        *self.state.lock().syncs.entry(self.path.clone()).or_insert(0) += 1;
        Ok(())
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn close(self: Box<Self>) -> StorageResult<()> {
        Ok(())
    }
}
