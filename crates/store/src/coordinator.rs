//! Query coordinator.
//!
//! Turns intents, live notifications, clock ticks and call completions
//! into reducer actions plus the [`Command`]s the driver must execute.
//! It performs no I/O and never reads a clock: every entry point takes
//! the current logical time, so tests drive it step by step.
//!
//! Request ordering: every list fetch gets a fresh [`RequestId`] and
//! becomes the latest request. A response is applied only if its query
//! equals the latest request's query, which gives last-write-wins across
//! parameter changes and last-resolution-wins for identical refetches.

use chrono::{DateTime, Utc};
use covalent_client::messages::ResultUpdate;
use covalent_client::ApiError;
use covalent_core::dispatch::{DeleteOutcome, DispatchOverview, DispatchPage};
use covalent_core::query::{page_offset, ListQuery, StatusFilter};
use covalent_core::status::state_machine;
use covalent_core::tuning::ListTuning;
use covalent_core::types::DispatchId;

use crate::action::ListAction;
use crate::clock::span;
use crate::cooldown::RefreshGate;
use crate::debounce::SearchDebouncer;
use crate::intent::Intent;
use crate::reducer::reduce;
use crate::state::{FetchError, ListState, RequestId};
use crate::timer::PendingTimer;

// ---------------------------------------------------------------------------
// Commands and completions
// ---------------------------------------------------------------------------

/// Side effect the driver must perform on the coordinator's behalf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    FetchList { request: RequestId, query: ListQuery },
    FetchOverview,
    Delete { ids: Vec<DispatchId> },
    DeleteAll { filter: StatusFilter },
}

/// Outcome of an executed [`Command`], fed back through
/// [`QueryCoordinator::complete`].
#[derive(Debug, Clone)]
pub enum Completion {
    List {
        request: RequestId,
        query: ListQuery,
        result: Result<DispatchPage, ApiError>,
    },
    Overview(Result<DispatchOverview, ApiError>),
    Delete {
        requested: Vec<DispatchId>,
        result: Result<DeleteOutcome, ApiError>,
    },
    DeleteAll(Result<DeleteOutcome, ApiError>),
}

// ---------------------------------------------------------------------------
// QueryCoordinator
// ---------------------------------------------------------------------------

pub struct QueryCoordinator {
    tuning: ListTuning,
    state: ListState,
    debouncer: SearchDebouncer,
    refresh_gate: RefreshGate,
    notice_timer: PendingTimer<()>,
    next_request: RequestId,
}

impl QueryCoordinator {
    pub fn new(tuning: ListTuning, now: DateTime<Utc>) -> Self {
        Self {
            state: ListState::new(tuning.page_size, now),
            debouncer: SearchDebouncer::new(tuning.search_debounce),
            refresh_gate: RefreshGate::new(tuning.refresh_cooldown),
            notice_timer: PendingTimer::new(),
            next_request: 1,
            tuning,
        }
    }

    pub fn state(&self) -> &ListState {
        &self.state
    }

    /// Earliest instant at which [`QueryCoordinator::poll`] has work to do:
    /// a debounced search commit or a notice expiry. The driver sleeps
    /// until then instead of waiting for the next tick.
    pub fn next_deadline(&self) -> Option<DateTime<Utc>> {
        match (self.debouncer.deadline(), self.notice_timer.deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Initial load: the first page plus the overview aggregate.
    pub fn start(&mut self, now: DateTime<Utc>) -> Vec<Command> {
        tracing::info!(page_size = self.tuning.page_size, "Loading dispatch list");
        self.apply(ListAction::Ticked { now }, now);
        vec![self.issue_fetch(now), Command::FetchOverview]
    }

    pub fn handle_intent(&mut self, intent: Intent, now: DateTime<Utc>) -> Vec<Command> {
        tracing::debug!(?intent, "Handling intent");
        match intent {
            Intent::SortBy(column) => {
                self.apply(ListAction::SortClicked { column }, now);
                vec![self.issue_fetch(now)]
            }
            Intent::SearchInput(text) => {
                self.apply(ListAction::SearchDraftChanged { text: text.clone() }, now);
                match self.debouncer.input(&text, now) {
                    Some(commit) => self.commit_search(commit, now),
                    None => Vec::new(),
                }
            }
            Intent::GoToPage(page) => self.go_to_page(page, now),
            Intent::FilterStatus(filter) => {
                if filter == self.state.query.status_filter {
                    return Vec::new();
                }
                self.apply(ListAction::StatusFilterChanged { filter }, now);
                vec![self.issue_fetch(now)]
            }
            Intent::ToggleRow(dispatch_id) => {
                self.apply(ListAction::RowToggled { dispatch_id }, now);
                Vec::new()
            }
            Intent::ToggleAll => {
                self.apply(ListAction::AllToggled, now);
                Vec::new()
            }
            Intent::ConfirmDelete => {
                if self.state.is_deleting || self.state.selection.is_empty() {
                    return Vec::new();
                }
                let ids: Vec<DispatchId> = self.state.selection.iter().cloned().collect();
                tracing::info!(count = ids.len(), "Deleting selected dispatches");
                self.apply(
                    ListAction::DeleteStarted {
                        page_rows: self.state.records.len(),
                    },
                    now,
                );
                vec![Command::Delete { ids }]
            }
            Intent::DeleteAll => {
                if self.state.is_deleting {
                    return Vec::new();
                }
                let filter = self.state.query.status_filter;
                tracing::info!(filter = filter.as_str(), "Deleting all matching dispatches");
                self.apply(
                    ListAction::DeleteStarted {
                        page_rows: self.state.records.len(),
                    },
                    now,
                );
                vec![Command::DeleteAll { filter }]
            }
            Intent::DismissNotice => {
                self.notice_timer.cancel();
                self.apply(ListAction::NoticeDismissed, now);
                Vec::new()
            }
            Intent::Refresh => self.refresh(now),
        }
    }

    /// Advance the local clock: updates live runtimes, expires notices and
    /// commits a debounced search whose quiet period has passed.
    pub fn poll(&mut self, now: DateTime<Utc>) -> Vec<Command> {
        self.apply(ListAction::Ticked { now }, now);
        if self.notice_timer.fire_due(now).is_some() {
            self.apply(ListAction::NoticeDismissed, now);
        }
        match self.debouncer.poll(now) {
            Some(text) => self.commit_search(text, now),
            None => Vec::new(),
        }
    }

    /// React to a `result-update` hint.
    ///
    /// A dispatch reported as running is subject to the refresh cooldown,
    /// whether or not it is on the current page. Reports of a finished
    /// dispatch, and running reports for a row shown with another status,
    /// refetch immediately.
    pub fn handle_notification(&mut self, update: &ResultUpdate, now: DateTime<Utc>) -> Vec<Command> {
        let dispatch_id = &update.result.dispatch_id;
        let status = update.result.status;
        let status_changed = self
            .state
            .record(dispatch_id)
            .is_some_and(|r| r.status != status);

        if status.is_running() && !status_changed && !self.refresh_gate.allows(now) {
            tracing::debug!(dispatch_id = %dispatch_id, "Live update within cooldown, not refetching");
            return Vec::new();
        }

        tracing::debug!(
            dispatch_id = %dispatch_id,
            status = status.as_str(),
            "Refetching on live update",
        );
        self.refresh(now)
    }

    /// The notification stream dropped events; resynchronise once.
    pub fn handle_missed_notifications(&mut self, now: DateTime<Utc>) -> Vec<Command> {
        tracing::warn!("Live updates were missed, refetching");
        self.refresh(now)
    }

    pub fn complete(&mut self, completion: Completion, now: DateTime<Utc>) -> Vec<Command> {
        match completion {
            Completion::List {
                request,
                query,
                result,
            } => {
                if !self.state.is_current(&query) {
                    tracing::debug!(request, "Discarding stale list response");
                    return Vec::new();
                }
                match result {
                    Ok(page) => {
                        tracing::debug!(
                            request,
                            total_count = page.total_count,
                            rows = page.items.len(),
                            "Dispatch list loaded",
                        );
                        self.check_transitions(&page);
                        self.apply(ListAction::FetchSucceeded { request, query, page }, now);
                    }
                    Err(e) => {
                        tracing::error!(request, error = %e, "Dispatch list fetch failed");
                        let error = FetchError::from(&e);
                        self.apply(ListAction::FetchFailed { request, query, error }, now);
                    }
                }
                Vec::new()
            }
            Completion::Overview(Ok(overview)) => {
                self.apply(ListAction::OverviewLoaded { overview }, now);
                Vec::new()
            }
            Completion::Overview(Err(e)) => {
                tracing::error!(error = %e, "Overview fetch failed");
                self.apply(ListAction::OverviewFailed { error: e.into() }, now);
                Vec::new()
            }
            Completion::Delete {
                requested,
                result: Ok(outcome),
            } => {
                if outcome.has_failures() {
                    tracing::warn!(
                        deleted = outcome.success_items.len(),
                        failed = outcome.failure_items.len(),
                        "Delete partially confirmed",
                    );
                } else {
                    tracing::info!(deleted = outcome.success_items.len(), "Delete confirmed");
                }
                let failed = outcome.failure_items;
                self.apply(ListAction::DeleteSucceeded { requested, failed }, now);
                vec![self.issue_fetch(now), Command::FetchOverview]
            }
            Completion::DeleteAll(Ok(outcome)) => {
                tracing::info!(
                    deleted = outcome.success_items.len(),
                    failed = outcome.failure_items.len(),
                    "Delete-all confirmed",
                );
                let failed = outcome.failure_items;
                self.apply(ListAction::DeleteAllSucceeded { failed }, now);
                vec![self.issue_fetch(now), Command::FetchOverview]
            }
            Completion::Delete { result: Err(e), .. } | Completion::DeleteAll(Err(e)) => {
                tracing::error!(error = %e, "Delete failed");
                self.apply(ListAction::DeleteFailed { error: e.into() }, now);
                Vec::new()
            }
        }
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn apply(&mut self, action: ListAction, now: DateTime<Utc>) {
        tracing::trace!(action = action.kind(), "Applying action");
        let previous_notice = self.state.notice.clone();
        reduce(&mut self.state, action);
        if self.state.notice.is_some() && self.state.notice != previous_notice {
            self.notice_timer
                .schedule(now + span(self.tuning.notice_duration), ());
        }
    }

    fn issue_fetch(&mut self, now: DateTime<Utc>) -> Command {
        let request = self.next_request;
        self.next_request += 1;
        self.apply(ListAction::FetchStarted { request }, now);
        self.refresh_gate.record(now);
        let query = self.state.query.clone();
        tracing::debug!(
            request,
            offset = query.offset,
            search = %query.search,
            sort_by = query.sort_column.as_str(),
            "Issuing dispatch list request",
        );
        Command::FetchList { request, query }
    }

    fn refresh(&mut self, now: DateTime<Utc>) -> Vec<Command> {
        self.apply(ListAction::RefreshRequested, now);
        vec![self.issue_fetch(now), Command::FetchOverview]
    }

    fn commit_search(&mut self, text: String, now: DateTime<Utc>) -> Vec<Command> {
        let len = text.chars().count();
        if len > 0 && len < self.tuning.search_min_len {
            tracing::debug!(len, "Search text below minimum length, not sent");
            return Vec::new();
        }
        if text == self.state.query.search {
            return Vec::new();
        }
        self.apply(ListAction::SearchCommitted { text }, now);
        vec![self.issue_fetch(now)]
    }

    fn go_to_page(&mut self, page: u32, now: DateTime<Utc>) -> Vec<Command> {
        let offset = match page_offset(page, self.tuning.page_size) {
            Ok(offset) => offset,
            Err(e) => {
                tracing::warn!(page, error = %e, "Ignoring invalid page");
                return Vec::new();
            }
        };
        if self.state.has_loaded && page > self.state.page_count() {
            tracing::warn!(page, page_count = self.state.page_count(), "Ignoring page out of range");
            return Vec::new();
        }
        if offset == self.state.query.offset {
            return Vec::new();
        }
        self.apply(ListAction::PageChanged { offset }, now);
        vec![self.issue_fetch(now)]
    }

    /// Status changes are server-driven; an illegal one is logged and the
    /// server value is still applied.
    fn check_transitions(&self, page: &DispatchPage) {
        for incoming in &page.items {
            let Some(known) = self.state.record(&incoming.dispatch_id) else {
                continue;
            };
            if let Err(reason) = state_machine::validate_transition(known.status, incoming.status) {
                tracing::warn!(
                    dispatch_id = %incoming.dispatch_id,
                    %reason,
                    "Server reported an illegal status transition",
                );
            }
        }
    }
}
