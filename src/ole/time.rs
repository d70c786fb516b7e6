//! FILETIME conversion.
//!
//! A FILETIME counts 100-nanosecond ticks since 1601-01-01T00:00:00Z.

use chrono::{DateTime, Utc};

/// Ticks per second
pub const TICKS_PER_SECOND: u64 = 10_000_000;

/// Seconds between 1601-01-01 and 1970-01-01
pub const EPOCH_DIFFERENCE_SECS: i64 = 11_644_473_600;

/// Convert a FILETIME given as its two 32-bit halves to Unix seconds.
///
/// Sub-second ticks are truncated. Total for every input.
///
/// # Examples
///
/// ```
/// use olecf::ole::ticks_to_unix_time;
/// assert_eq!(ticks_to_unix_time(0, 0), -11_644_473_600);
/// ```
#[inline]
pub fn ticks_to_unix_time(low: u32, high: u32) -> i64 {
    filetime_to_unix_time(u64::from(low) | (u64::from(high) << 32))
}

/// Convert a 64-bit FILETIME to Unix seconds.
#[inline]
pub fn filetime_to_unix_time(filetime: u64) -> i64 {
    // u64::MAX / TICKS_PER_SECOND fits comfortably in an i64.
    (filetime / TICKS_PER_SECOND) as i64 - EPOCH_DIFFERENCE_SECS
}

/// Convert a FILETIME to a UTC date-time, keeping sub-second precision.
///
/// Zero means "not set" in directory entries and property sets and maps to
/// `None`, as do values chrono cannot represent.
pub fn filetime_to_datetime(filetime: u64) -> Option<DateTime<Utc>> {
    if filetime == 0 {
        return None;
    }
    let nanos = ((filetime % TICKS_PER_SECOND) * 100) as u32;
    DateTime::from_timestamp(filetime_to_unix_time(filetime), nanos)
}

/// Convert Unix seconds to a UTC date-time.
pub fn unix_time_to_datetime(secs: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0)
}
