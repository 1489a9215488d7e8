//! Write command implementation.

use serde::Deserialize;
use shardfs_core::{BlockStart, FilesetWriter, ShardId, WriterOptions};
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// One input line.
#[derive(Debug, Deserialize)]
pub struct InputEntry {
    /// Series key.
    pub key: String,
    /// Segments, written as UTF-8 bytes in order.
    #[serde(default)]
    pub segments: Vec<String>,
}

/// Target and options for a write.
#[derive(Debug, Clone)]
pub struct WriteArgs {
    /// Root directory.
    pub root: PathBuf,
    /// Shard ID.
    pub shard: u32,
    /// Block start in Unix nanoseconds.
    pub block_start: i64,
    /// Block size in seconds.
    pub block_size: u64,
    /// Permission bits for new files.
    pub file_mode: u32,
    /// Permission bits for new directories.
    pub dir_mode: u32,
    /// Whether to fsync on close.
    pub sync: bool,
}

/// Outcome of a write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteSummary {
    /// Lines read from the input.
    pub lines: usize,
    /// Entries recorded in the fileset.
    pub entries: u64,
    /// Checkpoint file path.
    pub checkpoint: PathBuf,
}

impl fmt::Display for WriteSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "wrote {} entries ({} skipped as empty), checkpoint {}",
            self.entries,
            self.lines as u64 - self.entries,
            self.checkpoint.display()
        )
    }
}

/// Runs the write command.
pub fn run(args: &WriteArgs, input: &Path) -> Result<WriteSummary, Box<dyn std::error::Error>> {
    let reader = BufReader::new(
        File::open(input).map_err(|e| format!("cannot open {}: {e}", input.display()))?,
    );

    let options = WriterOptions::new()
        .with_new_file_mode(args.file_mode)
        .with_new_directory_mode(args.dir_mode)
        .with_sync_on_close(args.sync);
    let mut writer = FilesetWriter::new(
        Duration::from_secs(args.block_size),
        &args.root,
        Some(options),
    );
    writer.open(
        ShardId::new(args.shard),
        BlockStart::from_unix_nanos(args.block_start),
    )?;

    let mut lines = 0;
    for (number, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let entry: InputEntry = serde_json::from_str(&line)
            .map_err(|e| format!("{}:{}: {e}", input.display(), number + 1))?;
        let segments: Vec<&[u8]> = entry.segments.iter().map(String::as_bytes).collect();
        writer.write_all(&entry.key, segments.as_slice())?;
        lines += 1;
    }
    debug!(lines, "input consumed");

    writer.close()?;

    let checkpoint = writer
        .paths()
        .map(|p| p.checkpoint.clone())
        .unwrap_or_default();
    Ok(WriteSummary {
        lines,
        entries: writer.entries_written(),
        checkpoint,
    })
}
