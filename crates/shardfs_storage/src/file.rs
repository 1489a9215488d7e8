//! OS-backed filesystem.

use crate::backend::{FileSink, Filesystem};
use crate::error::StorageResult;
use std::fs::{DirBuilder, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Filesystem backed by `std::fs`.
///
/// Permission bits are applied through the Unix open/mkdir calls and are
/// subject to the process umask. They are ignored on other platforms.
///
/// # Example
///
/// ```no_run
/// use shardfs_storage::{Filesystem, OsFilesystem};
/// use std::path::Path;
///
/// let fs = OsFilesystem;
/// fs.create_dir_all(Path::new("data/3"), 0o755).unwrap();
/// let mut file = fs.create_truncate(Path::new("data/3/0-data.db"), 0o666).unwrap();
/// file.append(b"payload").unwrap();
/// file.close().unwrap();
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFilesystem;

impl Filesystem for OsFilesystem {
    fn create_dir_all(&self, path: &Path, mode: u32) -> StorageResult<()> {
        let mut builder = DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(mode);
        }
        #[cfg(not(unix))]
        let _ = mode;
        builder.create(path)?;
        Ok(())
    }

    fn create_truncate(&self, path: &Path, mode: u32) -> StorageResult<Box<dyn FileSink>> {
        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(mode);
        }
        #[cfg(not(unix))]
        let _ = mode;
        let file = options.open(path)?;
        Ok(Box::new(OsFile {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
            size: 0,
        }))
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn remove_file(&self, path: &Path) -> StorageResult<bool> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    #[cfg(unix)]
    fn sync_dir(&self, path: &Path) -> StorageResult<()> {
        // fsync on a directory persists its entries.
        File::open(path)?.sync_all()?;
        Ok(())
    }

    #[cfg(not(unix))]
    fn sync_dir(&self, _path: &Path) -> StorageResult<()> {
        // NTFS journals metadata; directories cannot be fsynced here.
        Ok(())
    }
}

/// A buffered, write-only OS file.
#[derive(Debug)]
pub struct OsFile {
    path: PathBuf,
    writer: BufWriter<File>,
    size: u64,
}

impl FileSink for OsFile {
    fn path(&self) -> &Path {
        &self.path
    }

    fn append(&mut self, data: &[u8]) -> StorageResult<u64> {
        let offset = self.size;
        if data.is_empty() {
            return Ok(offset);
        }
        self.writer.write_all(data)?;
        self.size += data.len() as u64;
        Ok(offset)
    }

    fn flush(&mut self) -> StorageResult<()> {
        self.writer.flush()?;
        Ok(())
    }

    fn sync(&mut self) -> StorageResult<()> {
        self.writer.flush()?;
        self.writer.get_ref().sync_all()?;
        Ok(())
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn close(self: Box<Self>) -> StorageResult<()> {
        let OsFile { mut writer, .. } = *self;
        writer.flush()?;
        Ok(())
    }
}
