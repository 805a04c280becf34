//! Timestamp helpers.

use std::time::{SystemTime, UNIX_EPOCH};

/// Current time in whole Unix seconds.
///
/// A clock set before the epoch yields `0` rather than an error.
pub fn unix_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
