//! Status command implementation.

use serde::Serialize;
use shardfs_core::{fileset_status, BlockStart, FilesetPaths, ShardId};
use shardfs_storage::OsFilesystem;
use std::path::Path;

/// Status report for one shard-block.
#[derive(Debug, Serialize)]
pub struct StatusReport {
    /// Shard ID.
    pub shard: u32,
    /// Block start in Unix nanoseconds.
    pub block_start: i64,
    /// `durable`, `incomplete` or `missing`.
    pub status: String,
    /// Shard directory.
    pub shard_dir: String,
}

/// Builds the report for `(shard, block_start)` under `root`.
pub fn report(root: &Path, shard: u32, block_start: i64) -> StatusReport {
    let shard_id = ShardId::new(shard);
    let start = BlockStart::from_unix_nanos(block_start);
    let status = fileset_status(&OsFilesystem, root, shard_id, start);
    StatusReport {
        shard,
        block_start,
        status: status.to_string(),
        shard_dir: FilesetPaths::new(root, shard_id, start)
            .shard_dir
            .display()
            .to_string(),
    }
}

/// Runs the status command.
pub fn run(
    root: &Path,
    shard: u32,
    block_start: i64,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let report = report(root, shard, block_start);
    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        "text" => println!(
            "shard {} block {}: {} ({})",
            report.shard, report.block_start, report.status, report.shard_dir
        ),
        other => return Err(format!("unknown format: {other}").into()),
    }
    Ok(())
}
