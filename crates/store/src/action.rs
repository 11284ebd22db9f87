//! Discrete state transitions applied by the reducer.
//!
//! Actions are plain serializable data. The coordinator emits them in
//! response to intents, completions and ticks; tests can replay them
//! directly against [`reduce`](crate::reducer::reduce).

use chrono::{DateTime, Utc};
use covalent_core::dispatch::{DispatchOverview, DispatchPage};
use covalent_core::query::{ListQuery, SortColumn, StatusFilter};
use covalent_core::types::DispatchId;
use serde::{Deserialize, Serialize};

use crate::state::{FetchError, RequestId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ListAction {
    // -- query parameters --
    SortClicked { column: SortColumn },
    SearchDraftChanged { text: String },
    SearchCommitted { text: String },
    StatusFilterChanged { filter: StatusFilter },
    PageChanged { offset: u64 },

    // -- selection --
    RowToggled { dispatch_id: DispatchId },
    AllToggled,

    // -- list fetch --
    FetchStarted { request: RequestId },
    FetchSucceeded {
        request: RequestId,
        query: ListQuery,
        page: DispatchPage,
    },
    FetchFailed {
        request: RequestId,
        query: ListQuery,
        error: FetchError,
    },
    RefreshRequested,

    // -- overview --
    OverviewLoaded { overview: DispatchOverview },
    OverviewFailed { error: FetchError },

    // -- deletion --
    DeleteStarted { page_rows: usize },
    DeleteSucceeded {
        requested: Vec<DispatchId>,
        failed: Vec<DispatchId>,
    },
    DeleteAllSucceeded { failed: Vec<DispatchId> },
    DeleteFailed { error: FetchError },

    // -- notices and clock --
    NoticeDismissed,
    Ticked { now: DateTime<Utc> },
}

impl ListAction {
    /// Short name for log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SortClicked { .. } => "sort_clicked",
            Self::SearchDraftChanged { .. } => "search_draft_changed",
            Self::SearchCommitted { .. } => "search_committed",
            Self::StatusFilterChanged { .. } => "status_filter_changed",
            Self::PageChanged { .. } => "page_changed",
            Self::RowToggled { .. } => "row_toggled",
            Self::AllToggled => "all_toggled",
            Self::FetchStarted { .. } => "fetch_started",
            Self::FetchSucceeded { .. } => "fetch_succeeded",
            Self::FetchFailed { .. } => "fetch_failed",
            Self::RefreshRequested => "refresh_requested",
            Self::OverviewLoaded { .. } => "overview_loaded",
            Self::OverviewFailed { .. } => "overview_failed",
            Self::DeleteStarted { .. } => "delete_started",
            Self::DeleteSucceeded { .. } => "delete_succeeded",
            Self::DeleteAllSucceeded { .. } => "delete_all_succeeded",
            Self::DeleteFailed { .. } => "delete_failed",
            Self::NoticeDismissed => "notice_dismissed",
            Self::Ticked { .. } => "ticked",
        }
    }
}
