//! Shared helpers for shardfs benchmarks.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod utils;
