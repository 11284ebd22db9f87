//! Dispatch listing payloads returned by `/api/v1/dispatches/*`.

use serde::{Deserialize, Serialize};

use crate::status::DispatchStatus;
use crate::timestamp;
use crate::types::{DispatchId, Timestamp};

/// One row of the dispatch listing.
///
/// Records are created and mutated only by the backend. The client reads,
/// filters and removes them from view; it never edits their fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchRecord {
    pub dispatch_id: DispatchId,
    pub lattice_name: String,
    #[serde(default, with = "timestamp::option")]
    pub started_at: Option<Timestamp>,
    /// `None` while the dispatch is running, and possibly for a short
    /// window after it reached a terminal status.
    #[serde(default, with = "timestamp::option")]
    pub ended_at: Option<Timestamp>,
    /// Server-computed runtime in milliseconds. Stale for running dispatches.
    #[serde(default)]
    pub runtime: Option<i64>,
    pub status: DispatchStatus,
    #[serde(default)]
    pub total_electrons: u32,
    #[serde(default)]
    pub total_electrons_completed: u32,
}

impl DispatchRecord {
    /// Completed-over-total electron counter, clamped so that
    /// `completed <= total` even if the server briefly reports otherwise.
    pub fn progress(&self) -> (u32, u32) {
        let total = self.total_electrons;
        (self.total_electrons_completed.min(total), total)
    }
}

/// A single page of the dispatch listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DispatchPage {
    pub total_count: u64,
    pub items: Vec<DispatchRecord>,
}

/// Aggregate counters from `/api/v1/dispatches/overview`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DispatchOverview {
    #[serde(default)]
    pub total_jobs: u64,
    #[serde(default)]
    pub total_jobs_running: u64,
    #[serde(default)]
    pub total_jobs_completed: u64,
    #[serde(default)]
    pub total_jobs_failed: u64,
    #[serde(default)]
    pub latest_running_task_status: Option<DispatchStatus>,
    /// Cumulative dispatcher runtime in milliseconds.
    #[serde(default)]
    pub total_dispatcher_duration: Option<i64>,
}

/// Success/failure envelope returned by the delete endpoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeleteOutcome {
    #[serde(default)]
    pub success_items: Vec<DispatchId>,
    #[serde(default)]
    pub failure_items: Vec<DispatchId>,
}

impl DeleteOutcome {
    /// `true` if the backend reported at least one id it could not delete.
    pub fn has_failures(&self) -> bool {
        !self.failure_items.is_empty()
    }
}

/// Request body for `POST /api/v1/dispatches/delete`.
#[derive(Debug, Clone, Serialize)]
pub struct DeleteRequest<'a> {
    pub dispatches: &'a [DispatchId],
}

/// Request body for `POST /api/v1/dispatches/delete-all`.
#[derive(Debug, Clone, Serialize)]
pub struct DeleteAllRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_filter: Option<String>,
}
