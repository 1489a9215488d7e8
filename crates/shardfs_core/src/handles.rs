//! Scoped acquisition and release of file handles.
//!
//! A fileset is only usable when all of its files are open. [`open_all`]
//! either returns every handle or releases the ones it managed to open;
//! [`close_all`] closes every handle it is given even after a failure and
//! reports the first error.

use crate::error::{CoreError, CoreResult};
use crate::layout::FilesetPaths;
use shardfs_storage::{FileSink, Filesystem};
use std::path::Path;
use tracing::{debug, warn};

/// Opens (creating and truncating) each path in order.
///
/// # Errors
///
/// Returns the first open failure. Handles opened before it are closed
/// before returning.
pub fn open_all(
    fs: &dyn Filesystem,
    paths: &[&Path],
    mode: u32,
) -> CoreResult<Vec<Box<dyn FileSink>>> {
    let mut opened: Vec<Box<dyn FileSink>> = Vec::with_capacity(paths.len());
    for path in paths {
        match fs.create_truncate(path, mode) {
            Ok(sink) => opened.push(sink),
            Err(e) => {
                for sink in opened {
                    let released = sink.path().to_path_buf();
                    if let Err(close_err) = sink.close() {
                        warn!(
                            path = %released.display(),
                            error = %close_err,
                            "failed to release handle after open failure"
                        );
                    }
                }
                return Err(e.into());
            }
        }
    }
    Ok(opened)
}

/// Closes every handle in order, optionally syncing each first.
///
/// # Errors
///
/// Returns the first sync or close failure. Later handles are still
/// synced and closed.
pub fn close_all(sinks: Vec<Box<dyn FileSink>>, sync: bool) -> CoreResult<()> {
    let mut first_err: Option<CoreError> = None;
    for mut sink in sinks {
        debug!(path = %sink.path().display(), sync, "closing");
        if sync {
            if let Err(e) = sink.sync() {
                first_err.get_or_insert(e.into());
            }
        }
        if let Err(e) = sink.close() {
            first_err.get_or_insert(e.into());
        }
    }
    first_err.map_or(Ok(()), Err)
}

/// The three open data-bearing files of a fileset.
pub(crate) struct OpenFileset {
    pub(crate) info: Box<dyn FileSink>,
    pub(crate) index: Box<dyn FileSink>,
    pub(crate) data: Box<dyn FileSink>,
}

impl OpenFileset {
    /// Opens the info, index and data files, all or none.
    pub(crate) fn open(fs: &dyn Filesystem, paths: &FilesetPaths, mode: u32) -> CoreResult<Self> {
        let targets = [
            paths.info.as_path(),
            paths.index.as_path(),
            paths.data.as_path(),
        ];
        let mut sinks = open_all(fs, &targets, mode)?.into_iter();
        match (sinks.next(), sinks.next(), sinks.next()) {
            (Some(info), Some(index), Some(data)) => Ok(Self { info, index, data }),
            // open_all returns one handle per path.
            _ => Err(CoreError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "fileset opened with missing handles",
            ))),
        }
    }

    /// Closes info, index and data in that order.
    pub(crate) fn close(self, sync: bool) -> CoreResult<()> {
        close_all(vec![self.info, self.index, self.data], sync)
    }
}
