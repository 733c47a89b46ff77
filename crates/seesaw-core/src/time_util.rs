//! Millisecond wall-clock timestamps.
//!
//! Exchange history queries and fill records use milliseconds since the Unix
//! epoch, so every cursor in the system is a plain `u64` in that unit.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Current time as **milliseconds** since Unix epoch.
#[inline]
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Convert a `Duration` to whole milliseconds, saturating at `u64::MAX`.
#[inline]
pub fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
