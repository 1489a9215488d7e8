//! # shardfs Testkit
//!
//! Test utilities for shardfs.
//!
//! This crate provides:
//! - Temporary roots and in-memory writers
//! - Property-based test generators using proptest
//! - A fault-injecting filesystem for crash and failure tests
//! - A reader that decodes filesets back for verification
//!
//! ## Usage
//!
//! ```rust
//! use shardfs_core::{BlockStart, ShardId};
//! use shardfs_testkit::prelude::*;
//!
//! with_temp_root(|root| {
//!     let mut writer = root.writer(None);
//!     let start = BlockStart::from_unix_nanos(0);
//!     write_block(&mut writer, ShardId::new(0), start, &[TestEntry::new("k", vec![vec![1]])]).unwrap();
//!     root.contents(ShardId::new(0), start).check_consistency().unwrap();
//! });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod faults;
pub mod fixtures;
pub mod generators;
pub mod inspect;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::faults::*;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::inspect::*;
}

pub use faults::{Fault, FaultyFilesystem};
pub use fixtures::*;
pub use generators::*;
pub use inspect::FilesetContents;
