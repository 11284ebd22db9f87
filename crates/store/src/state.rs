//! List state container.
//!
//! [`ListState`] is the single source of truth the view renders from. It
//! is only mutated by [`reduce`](crate::reducer::reduce); everything else
//! reads snapshots of it.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use covalent_client::ApiError;
use covalent_core::dispatch::{DispatchOverview, DispatchRecord};
use covalent_core::query::ListQuery;
use covalent_core::types::DispatchId;
use serde::{Deserialize, Serialize};

/// Monotonic id assigned to each issued list request.
pub type RequestId = u64;

/// Cloneable snapshot of a failed call, kept in state for the view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{message}")]
pub struct FetchError {
    pub message: String,
    /// HTTP status, absent for network failures.
    pub status: Option<u16>,
}

impl From<&ApiError> for FetchError {
    fn from(err: &ApiError) -> Self {
        Self {
            message: err.message().to_string(),
            status: err.status(),
        }
    }
}

impl From<ApiError> for FetchError {
    fn from(err: ApiError) -> Self {
        Self::from(&err)
    }
}

/// Transient message shown above the table until dismissed or expired.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub message: String,
}

/// The most recently issued list request. Only responses for this query
/// shape are applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestTicket {
    pub id: RequestId,
    pub query: ListQuery,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListState {
    pub page_size: u32,
    pub query: ListQuery,
    /// Search box contents, ahead of `query.search` while debouncing.
    pub search_draft: String,
    pub records: Vec<DispatchRecord>,
    pub total_count: u64,
    pub selection: BTreeSet<DispatchId>,
    pub is_fetching: bool,
    /// Set once any list response has been applied.
    pub has_loaded: bool,
    pub error: Option<FetchError>,
    pub notice: Option<Notice>,
    /// Bumped on every live-notification or manual refresh. Not part of
    /// the query, so it never makes a response stale.
    pub refresh_token: u64,
    pub latest_request: Option<RequestTicket>,
    pub overview: Option<DispatchOverview>,
    pub is_deleting: bool,
    /// Rows on the page the pending delete was issued from.
    pub delete_page_rows: Option<usize>,
    /// Local ticking clock used for live runtimes.
    pub now: DateTime<Utc>,
}

impl ListState {
    pub fn new(page_size: u32, now: DateTime<Utc>) -> Self {
        Self {
            page_size,
            query: ListQuery::default(),
            search_draft: String::new(),
            records: Vec::new(),
            total_count: 0,
            selection: BTreeSet::new(),
            is_fetching: false,
            has_loaded: false,
            error: None,
            notice: None,
            refresh_token: 0,
            latest_request: None,
            overview: None,
            is_deleting: false,
            delete_page_rows: None,
            now,
        }
    }

    /// Whether a response for `query` corresponds to the latest request.
    pub fn is_current(&self, query: &ListQuery) -> bool {
        self.latest_request
            .as_ref()
            .is_some_and(|ticket| ticket.query == *query)
    }

    pub fn is_latest_request(&self, request: RequestId) -> bool {
        self.latest_request
            .as_ref()
            .is_some_and(|ticket| ticket.id == request)
    }

    pub fn record(&self, id: &str) -> Option<&DispatchRecord> {
        self.records.iter().find(|r| r.dispatch_id == id)
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selection.contains(id)
    }

    /// `true` when every visible row is selected and there is at least one.
    pub fn all_selected(&self) -> bool {
        !self.records.is_empty()
            && self
                .records
                .iter()
                .all(|r| self.selection.contains(&r.dispatch_id))
    }

    pub fn page(&self) -> u32 {
        self.query.page(self.page_size)
    }

    pub fn page_count(&self) -> u32 {
        covalent_core::query::page_count(self.total_count, self.page_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_failure_snapshot_has_no_status() {
        let err = ApiError::Network {
            message: "connection refused".into(),
        };
        let snapshot = FetchError::from(&err);
        assert_eq!(snapshot.status, None);
        assert_eq!(snapshot.to_string(), "connection refused");
    }

    #[test]
    fn response_currency_follows_latest_query() {
        let mut state = ListState::new(10, Utc::now());
        assert!(!state.is_current(&ListQuery::default()));

        state.latest_request = Some(RequestTicket {
            id: 4,
            query: ListQuery::default(),
        });
        assert!(state.is_current(&ListQuery::default()));
        assert!(state.is_latest_request(4));
        assert!(!state.is_latest_request(3));

        let other = ListQuery {
            search: "abc".into(),
            ..Default::default()
        };
        assert!(!state.is_current(&other));
    }
}
