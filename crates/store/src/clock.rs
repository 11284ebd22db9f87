//! Logical clock.
//!
//! Every time-dependent decision in the store (debounce, refresh cooldown,
//! notice expiry, live runtimes) reads time through [`Clock`] so tests can
//! advance virtual time deterministically with [`ManualClock`].

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to. Clones share the same instant.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn advance(&self, by: std::time::Duration) {
        let mut now = self.lock();
        *now += span(by);
    }

    pub fn set(&self, at: DateTime<Utc>) {
        *self.lock() = at;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, DateTime<Utc>> {
        self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.lock()
    }
}

/// Convert a configured [`std::time::Duration`] into a calendar span.
/// Saturates at `i64::MAX` milliseconds.
pub fn span(duration: std::time::Duration) -> chrono::Duration {
    let millis = i64::try_from(duration.as_millis()).unwrap_or(i64::MAX);
    chrono::Duration::milliseconds(millis)
}
