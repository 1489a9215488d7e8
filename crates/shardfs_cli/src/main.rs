//! shardfs CLI
//!
//! Command-line tools for writing and checking shardfs filesets.
//!
//! # Commands
//!
//! - `write` - Write one shard-block from a JSON lines file
//! - `status` - Report whether a shard-block is durable
//! - `version` - Show version information

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// shardfs command-line fileset tools.
#[derive(Parser)]
#[command(name = "shardfs")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write one shard-block from a JSON lines file
    Write {
        /// Root directory holding shard directories
        #[arg(short, long)]
        root: PathBuf,

        /// Shard to write
        #[arg(short, long)]
        shard: u32,

        /// Block start, in nanoseconds since the Unix epoch
        #[arg(long, allow_negative_numbers = true)]
        block_start: i64,

        /// Block size in seconds
        #[arg(long)]
        block_size: u64,

        /// Input file, one {"key": ..., "segments": [...]} object per line
        #[arg(short, long)]
        input: PathBuf,

        /// Octal permission bits for new files
        #[arg(long, default_value = "666", value_parser = commands::parse_mode)]
        file_mode: u32,

        /// Octal permission bits for new directories
        #[arg(long, default_value = "755", value_parser = commands::parse_mode)]
        dir_mode: u32,

        /// Skip fsync of files and the shard directory on close
        #[arg(long)]
        no_sync: bool,
    },

    /// Report whether a shard-block is durable
    Status {
        /// Root directory holding shard directories
        #[arg(short, long)]
        root: PathBuf,

        /// Shard to check
        #[arg(short, long)]
        shard: u32,

        /// Block start, in nanoseconds since the Unix epoch
        #[arg(long, allow_negative_numbers = true)]
        block_start: i64,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Write {
            root,
            shard,
            block_start,
            block_size,
            input,
            file_mode,
            dir_mode,
            no_sync,
        } => {
            let args = commands::write::WriteArgs {
                root,
                shard,
                block_start,
                block_size,
                file_mode,
                dir_mode,
                sync: !no_sync,
            };
            let summary = commands::write::run(&args, &input)?;
            println!("{summary}");
        }
        Commands::Status {
            root,
            shard,
            block_start,
            format,
        } => {
            commands::status::run(&root, shard, block_start, &format)?;
        }
        Commands::Version => {
            println!("shardfs CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("shardfs Core v{}", shardfs_core::VERSION);
        }
    }

    Ok(())
}
