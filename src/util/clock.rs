use std::time::{SystemTime, UNIX_EPOCH};

use tracing::warn;

/// Wall-clock time in microseconds since the Unix epoch.
///
/// Cassandra resolves conflicting writes by this value, so every insert and
/// remove issued through one clock must use the same unit. A clock set
/// before the epoch is clamped to 0 and reported.
pub fn now_micros() -> i64 {
    micros_since_epoch(SystemTime::now())
}

fn micros_since_epoch(time: SystemTime) -> i64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(elapsed) => i64::try_from(elapsed.as_micros()).unwrap_or(i64::MAX),
        Err(err) => {
            warn!(behind = ?err.duration(), "system clock is before the Unix epoch, using timestamp 0");
            0
        }
    }
}
