//! Monotonic-epoch timestamp helper used to stamp frames at write time (§3).

use std::time::{SystemTime, UNIX_EPOCH};

/// Returns the current time as nanoseconds since the Unix epoch.
///
/// Falls back to 0 if the system clock reports a time before the epoch
/// (practically unreachable, but `SystemTime` makes no such guarantee).
#[must_use]
pub fn timestamp_ns() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}
