//! Runtime derivation for dispatch rows.
//!
//! A running dispatch's `runtime` field is stale the moment it leaves the
//! server, so its displayed runtime is computed against a local clock.

use chrono::Duration;

use crate::dispatch::DispatchRecord;
use crate::types::Timestamp;

/// Elapsed runtime to display for `record` at `now`.
///
/// - Running: `now - started_at`, truncated to whole seconds.
/// - Finished with both timestamps: `ended_at - started_at`.
/// - Otherwise the server's `runtime` field, if any. This covers the
///   window where a terminal status arrives before `ended_at` does.
pub fn display_runtime(record: &DispatchRecord, now: Timestamp) -> Option<Duration> {
    if record.status.is_running() {
        let started = record.started_at?;
        let elapsed = (now - started).num_seconds().max(0);
        return Some(Duration::seconds(elapsed));
    }
    match (record.started_at, record.ended_at) {
        (Some(start), Some(end)) if end >= start => Some(end - start),
        _ => record.runtime.map(Duration::milliseconds),
    }
}

/// Format a duration as `1h 2m 3s`, dropping leading zero units.
pub fn format_runtime(duration: Duration) -> String {
    let total = duration.num_seconds().max(0);
    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);
    if hours > 0 {
        format!("{hours}h {minutes}m {seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m {seconds}s")
    } else {
        format!("{seconds}s")
    }
}
