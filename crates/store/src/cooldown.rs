//! Refresh cooldown for notification storms.
//!
//! Long-running dispatches emit a steady stream of `result-update` hints.
//! [`RefreshGate`] remembers when the list was last fetched and refuses
//! cooldown-subject refetches until the window has passed.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::clock::span;

#[derive(Debug, Clone)]
pub struct RefreshGate {
    cooldown: Duration,
    last_fetch: Option<DateTime<Utc>>,
}

impl RefreshGate {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_fetch: None,
        }
    }

    /// Note that a list fetch was issued at `now`.
    pub fn record(&mut self, now: DateTime<Utc>) {
        self.last_fetch = Some(now);
    }

    /// Whether a cooldown-subject refetch may be issued at `now`.
    pub fn allows(&self, now: DateTime<Utc>) -> bool {
        match self.last_fetch {
            None => true,
            Some(last) => now - last >= span(self.cooldown),
        }
    }
}
