//! Reading filesets back for verification.

use shardfs_codec::{decode_index_entries, IndexRecord, InfoRecord};
use shardfs_core::{CoreResult, FilesetPaths};
use shardfs_storage::MemoryFilesystem;
use std::fs;
use std::io;
use std::path::Path;

/// Decoded contents of the four files of one fileset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilesetContents {
    /// The info record, if the info file holds one.
    pub info: Option<InfoRecord>,
    /// Index records in file order.
    pub index: Vec<IndexRecord>,
    /// The data file.
    pub data: Vec<u8>,
    /// Whether the checkpoint file exists.
    pub checkpoint: bool,
}

impl FilesetContents {
    /// Reads a fileset from disk. Missing files read as empty.
    ///
    /// # Errors
    ///
    /// Returns an error if a present file cannot be read or decoded.
    pub fn read(paths: &FilesetPaths) -> CoreResult<Self> {
        Self::decode(
            read_optional(&paths.info)?,
            read_optional(&paths.index)?,
            read_optional(&paths.data)?,
            paths.checkpoint.exists(),
        )
    }

    /// Reads a fileset from a [`MemoryFilesystem`]. Missing files read as empty.
    ///
    /// # Errors
    ///
    /// Returns an error if a present file cannot be decoded.
    pub fn read_memory(fs: &MemoryFilesystem, paths: &FilesetPaths) -> CoreResult<Self> {
        Self::decode(
            fs.contents(&paths.info),
            fs.contents(&paths.index),
            fs.contents(&paths.data),
            fs.contents(&paths.checkpoint).is_some(),
        )
    }

    fn decode(
        info: Option<Vec<u8>>,
        index: Option<Vec<u8>>,
        data: Option<Vec<u8>>,
        checkpoint: bool,
    ) -> CoreResult<Self> {
        let info = match info {
            Some(bytes) if !bytes.is_empty() => Some(InfoRecord::decode_framed(&bytes)?.0),
            _ => None,
        };
        let index = decode_index_entries(&index.unwrap_or_default())?;
        Ok(Self {
            info,
            index,
            data: data.unwrap_or_default(),
            checkpoint,
        })
    }

    /// Returns the bytes of entry `i`, located through its index record.
    #[must_use]
    pub fn entry(&self, i: usize) -> Option<&[u8]> {
        let record = self.index.get(i)?;
        let start = usize::try_from(record.offset).ok()?;
        let end = start.checked_add(usize::try_from(record.size).ok()?)?;
        self.data.get(start..end)
    }

    /// Returns the keys of all entries, in write order.
    #[must_use]
    pub fn keys(&self) -> Vec<&str> {
        self.index.iter().map(|r| r.key.as_str()).collect()
    }

    /// Checks the relationships a committed fileset guarantees.
    ///
    /// # Errors
    ///
    /// Returns a description of the first violated relationship.
    pub fn check_consistency(&self) -> Result<(), String> {
        let info = self.info.ok_or("info record missing")?;
        if info.entries != self.index.len() as u64 {
            return Err(format!(
                "info says {} entries, index has {}",
                info.entries,
                self.index.len()
            ));
        }
        let mut offset = 0u64;
        for (position, record) in self.index.iter().enumerate() {
            if record.index != position as u64 {
                return Err(format!("record at {position} has index {}", record.index));
            }
            if record.size == 0 {
                return Err(format!("record {position} is empty"));
            }
            if record.offset != offset {
                return Err(format!(
                    "record {position} starts at {}, expected {offset}",
                    record.offset
                ));
            }
            offset += record.size;
        }
        if offset != self.data.len() as u64 {
            return Err(format!(
                "index covers {offset} bytes, data has {}",
                self.data.len()
            ));
        }
        Ok(())
    }
}

fn read_optional(path: &Path) -> io::Result<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shardfs_core::{BlockStart, ShardId};

    fn record(index: u64, size: u64, offset: u64) -> IndexRecord {
        IndexRecord {
            index,
            size,
            offset,
            key: format!("k{index}"),
        }
    }

    fn contents(index: Vec<IndexRecord>, data_len: usize) -> FilesetContents {
        FilesetContents {
            info: Some(InfoRecord {
                start: 0,
                block_size: 1,
                entries: index.len() as u64,
            }),
            index,
            data: vec![0; data_len],
            checkpoint: true,
        }
    }

    #[test]
    fn consistent_fileset_passes() {
        let c = contents(vec![record(0, 3, 0), record(1, 2, 3)], 5);
        assert_eq!(c.check_consistency(), Ok(()));
        assert_eq!(c.entry(1).unwrap().len(), 2);
        assert_eq!(c.keys(), vec!["k0", "k1"]);
    }

    #[test]
    fn gaps_and_mismatches_are_reported() {
        assert!(contents(vec![record(0, 3, 0), record(2, 2, 3)], 5)
            .check_consistency()
            .is_err());
        assert!(contents(vec![record(0, 3, 0), record(1, 2, 4)], 6)
            .check_consistency()
            .is_err());
        assert!(contents(vec![record(0, 3, 0)], 4).check_consistency().is_err());

        let mut no_info = contents(vec![], 0);
        no_info.info = None;
        assert!(no_info.check_consistency().is_err());
    }

    #[test]
    fn missing_files_read_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let paths = FilesetPaths::new(dir.path(), ShardId::new(0), BlockStart::from_unix_nanos(0));
        let c = FilesetContents::read(&paths).unwrap();
        assert_eq!(c.info, None);
        assert!(c.index.is_empty());
        assert!(c.data.is_empty());
        assert!(!c.checkpoint);
    }
}
