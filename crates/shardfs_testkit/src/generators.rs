//! Property-based test generators using proptest.

use crate::fixtures::TestEntry;
use proptest::prelude::*;
use shardfs_core::{BlockStart, ShardId};

/// Strategy for series keys.
pub fn key_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9_.]{0,23}").expect("Invalid regex")
}

/// Strategy for segment lists, including empty lists and empty segments.
pub fn segments_strategy() -> impl Strategy<Value = Vec<Vec<u8>>> {
    prop::collection::vec(prop::collection::vec(any::<u8>(), 0..64), 0..4)
}

/// Strategy for entries.
pub fn entry_strategy() -> impl Strategy<Value = TestEntry> {
    (key_strategy(), segments_strategy()).prop_map(|(key, segments)| TestEntry { key, segments })
}

/// Strategy for the entries of one block.
pub fn entries_strategy(max: usize) -> impl Strategy<Value = Vec<TestEntry>> {
    prop::collection::vec(entry_strategy(), 0..max)
}

/// Strategy for shard IDs.
pub fn shard_strategy() -> impl Strategy<Value = ShardId> {
    (0u32..4096).prop_map(ShardId::new)
}

/// Strategy for block starts, both sides of the epoch.
pub fn block_start_strategy() -> impl Strategy<Value = BlockStart> {
    any::<i64>().prop_map(BlockStart::from_unix_nanos)
}

/// Strategy for permission bits a writer may be configured with.
pub fn mode_strategy() -> impl Strategy<Value = u32> {
    prop::sample::select(vec![0o600, 0o640, 0o644, 0o660, 0o666])
}
