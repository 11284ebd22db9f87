//! Pending-timer abstraction over the logical clock.
//!
//! A [`PendingTimer`] holds at most one scheduled value. Scheduling again
//! replaces (resets) it, cancelling drops it, and [`PendingTimer::fire_due`]
//! yields it once its deadline has passed. Nothing here sleeps; the owner
//! polls with the current logical time.

use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct PendingTimer<T> {
    pending: Option<(DateTime<Utc>, T)>,
}

impl<T> Default for PendingTimer<T> {
    fn default() -> Self {
        Self { pending: None }
    }
}

impl<T> PendingTimer<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `value` to fire at `deadline`, replacing anything pending.
    pub fn schedule(&mut self, deadline: DateTime<Utc>, value: T) {
        self.pending = Some((deadline, value));
    }

    /// Drop the pending value without firing it.
    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|(_, value)| value)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.pending.as_ref().map(|(deadline, _)| *deadline)
    }

    /// Take the pending value if `now` has reached its deadline.
    pub fn fire_due(&mut self, now: DateTime<Utc>) -> Option<T> {
        match &self.pending {
            Some((deadline, _)) if *deadline <= now => self.cancel(),
            _ => None,
        }
    }
}
