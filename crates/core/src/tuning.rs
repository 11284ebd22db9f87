//! Product-tuning constants for the dispatch listing.
//!
//! These are UX judgement calls rather than derived invariants, so they
//! are carried in [`ListTuning`] and overridable from configuration.

use std::time::Duration;

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

/// Rows per page.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Quiet period after the last keystroke before a search is committed.
pub const DEFAULT_SEARCH_DEBOUNCE_MS: u64 = 1000;

/// Non-empty searches shorter than this are not sent to the backend.
pub const DEFAULT_SEARCH_MIN_LEN: usize = 3;

/// Minimum gap between notification-driven refetches of a running dispatch.
pub const DEFAULT_REFRESH_COOLDOWN_MS: u64 = 3000;

/// How long an error notice stays visible.
pub const DEFAULT_NOTICE_DURATION_MS: u64 = 3000;

/// Tick period of the local clock that drives live runtimes.
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 1000;

/// Notice shown for background fetch failures.
pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong, please contact the administrator!";

// ---------------------------------------------------------------------------
// ListTuning
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListTuning {
    pub page_size: u32,
    pub search_debounce: Duration,
    pub search_min_len: usize,
    pub refresh_cooldown: Duration,
    pub notice_duration: Duration,
    pub tick_interval: Duration,
}

impl Default for ListTuning {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            search_debounce: Duration::from_millis(DEFAULT_SEARCH_DEBOUNCE_MS),
            search_min_len: DEFAULT_SEARCH_MIN_LEN,
            refresh_cooldown: Duration::from_millis(DEFAULT_REFRESH_COOLDOWN_MS),
            notice_duration: Duration::from_millis(DEFAULT_NOTICE_DURATION_MS),
            tick_interval: Duration::from_millis(DEFAULT_TICK_INTERVAL_MS),
        }
    }
}
