//! Search-box debouncing.
//!
//! The search box echoes every keystroke through the list state's draft.
//! The text becomes a commit only after a quiet period with no further
//! keystrokes, or at once when the box is cleared.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::clock::span;
use crate::timer::PendingTimer;

#[derive(Debug, Clone)]
pub struct SearchDebouncer {
    quiet_period: Duration,
    pending: PendingTimer<String>,
}

impl SearchDebouncer {
    pub fn new(quiet_period: Duration) -> Self {
        Self {
            quiet_period,
            pending: PendingTimer::new(),
        }
    }

    /// Record a keystroke. Returns a commit only when the box was cleared;
    /// otherwise the commit is deferred to [`SearchDebouncer::poll`].
    pub fn input(&mut self, text: &str, now: DateTime<Utc>) -> Option<String> {
        if text.is_empty() {
            self.pending.cancel();
            return Some(String::new());
        }
        self.pending
            .schedule(now + span(self.quiet_period), text.to_string());
        None
    }

    /// Commit the draft if the quiet period has elapsed.
    pub fn poll(&mut self, now: DateTime<Utc>) -> Option<String> {
        self.pending.fire_due(now)
    }

    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.pending.deadline()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_pending()
    }
}
