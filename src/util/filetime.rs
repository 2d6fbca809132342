//! FILETIME conversion utilities.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

// FILETIME epoch: January 1, 1601
// Unix epoch: January 1, 1970
// Difference: 11644473600 seconds
const FILETIME_UNIX_DIFF_SECS: u64 = 11644473600;
const INTERVALS_PER_SEC: u64 = 10_000_000;

/// Convert SystemTime to an i64 FILETIME value.
///
/// FILETIME represents the number of 100-nanosecond intervals since
/// January 1, 1601 UTC. Times before the Unix epoch clamp to it.
pub fn systemtime_to_filetime(time: SystemTime) -> i64 {
    let duration: Duration = time.duration_since(UNIX_EPOCH).unwrap_or(Duration::ZERO);

    let intervals: u64 = duration.as_secs() * INTERVALS_PER_SEC
        + duration.subsec_nanos() as u64 / 100
        + FILETIME_UNIX_DIFF_SECS * INTERVALS_PER_SEC;

    intervals as i64
}

/// Convert an i64 FILETIME value back to SystemTime.
///
/// Values before the Unix epoch clamp to it.
pub fn filetime_to_systemtime(filetime: i64) -> SystemTime {
    let intervals: u64 = filetime.max(0) as u64;

    if intervals < FILETIME_UNIX_DIFF_SECS * INTERVALS_PER_SEC {
        return UNIX_EPOCH;
    }

    let unix_intervals: u64 = intervals - FILETIME_UNIX_DIFF_SECS * INTERVALS_PER_SEC;
    let secs: u64 = unix_intervals / INTERVALS_PER_SEC;
    let nanos: u32 = ((unix_intervals % INTERVALS_PER_SEC) * 100) as u32;

    UNIX_EPOCH + Duration::new(secs, nanos)
}
