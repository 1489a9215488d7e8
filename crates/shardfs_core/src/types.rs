//! Identifier types for shard-blocks.

use crate::error::{CoreError, CoreResult};
use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Identifier of a shard (a horizontal partition of the keyspace).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ShardId(pub u32);

impl ShardId {
    /// Creates a new shard ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ShardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "shard:{}", self.0)
    }
}

/// Start of a block, in nanoseconds since the Unix epoch.
///
/// Pre-epoch starts are negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockStart(pub i64);

impl BlockStart {
    /// Creates a block start from Unix nanoseconds.
    #[must_use]
    pub const fn from_unix_nanos(nanos: i64) -> Self {
        Self(nanos)
    }

    /// Converts a wall-clock time.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::OutOfRange`] if the time is more than ~292 years
    /// from the epoch.
    pub fn from_system_time(time: SystemTime) -> CoreResult<Self> {
        let nanos = match time.duration_since(UNIX_EPOCH) {
            Ok(after) => duration_nanos(after)?,
            Err(before) => duration_nanos(before.duration())?
                .checked_neg()
                .ok_or_else(|| CoreError::out_of_range("block start before epoch"))?,
        };
        Ok(Self(nanos))
    }

    /// Returns the raw nanosecond value.
    #[must_use]
    pub const fn as_unix_nanos(self) -> i64 {
        self.0
    }
}

impl fmt::Display for BlockStart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ns", self.0)
    }
}

/// Converts a duration to signed nanoseconds.
///
/// # Errors
///
/// Returns [`CoreError::OutOfRange`] if the duration exceeds `i64::MAX` nanoseconds.
pub fn duration_nanos(duration: Duration) -> CoreResult<i64> {
    i64::try_from(duration.as_nanos()).map_err(|_| {
        CoreError::out_of_range(format!("duration {duration:?} exceeds i64 nanoseconds"))
    })
}
