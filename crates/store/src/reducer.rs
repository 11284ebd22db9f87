//! Pure reducer for [`ListState`].
//!
//! No I/O and no clock reads: every input arrives in the action. The
//! query coordinator is the only caller outside tests.

use std::collections::BTreeSet;

use covalent_core::tuning::GENERIC_ERROR_MESSAGE;
use covalent_core::types::DispatchId;

use crate::action::ListAction;
use crate::state::{ListState, Notice, RequestTicket};

pub const DELETE_FAILED_MESSAGE: &str = "Failed to delete the selected dispatches.";

pub fn reduce(state: &mut ListState, action: ListAction) {
    match action {
        // ---------------------------------------------------------------
        // Query parameters. Each change resets the selection.
        // ---------------------------------------------------------------
        ListAction::SortClicked { column } => {
            state.query.click_sort(column);
            state.selection.clear();
        }
        ListAction::SearchDraftChanged { text } => {
            state.search_draft = text;
        }
        ListAction::SearchCommitted { text } => {
            state.query.set_search(&text);
            state.search_draft = text;
            state.selection.clear();
        }
        ListAction::StatusFilterChanged { filter } => {
            state.query.set_status_filter(filter);
            state.selection.clear();
        }
        ListAction::PageChanged { offset } => {
            state.query.offset = offset;
            state.selection.clear();
        }

        // ---------------------------------------------------------------
        // Selection
        // ---------------------------------------------------------------
        ListAction::RowToggled { dispatch_id } => {
            if !state.selection.remove(&dispatch_id) && state.record(&dispatch_id).is_some() {
                state.selection.insert(dispatch_id);
            }
        }
        ListAction::AllToggled => {
            if state.all_selected() {
                state.selection.clear();
            } else {
                state.selection = state
                    .records
                    .iter()
                    .map(|r| r.dispatch_id.clone())
                    .collect();
            }
        }

        // ---------------------------------------------------------------
        // List fetch
        // ---------------------------------------------------------------
        ListAction::FetchStarted { request } => {
            state.latest_request = Some(RequestTicket {
                id: request,
                query: state.query.clone(),
            });
            state.is_fetching = true;
        }
        ListAction::FetchSucceeded {
            request,
            query,
            page,
        } => {
            if !state.is_current(&query) {
                return;
            }
            if state.is_latest_request(request) {
                state.is_fetching = false;
            }
            let visible: BTreeSet<&DispatchId> =
                page.items.iter().map(|r| &r.dispatch_id).collect();
            state.selection.retain(|id| visible.contains(id));
            state.records = page.items;
            state.total_count = page.total_count;
            state.has_loaded = true;
            state.error = None;
        }
        ListAction::FetchFailed {
            request,
            query,
            error,
        } => {
            if !state.is_current(&query) {
                return;
            }
            if state.is_latest_request(request) {
                state.is_fetching = false;
            }
            state.error = Some(error);
            raise(state, GENERIC_ERROR_MESSAGE);
        }
        ListAction::RefreshRequested => {
            state.refresh_token += 1;
        }

        // ---------------------------------------------------------------
        // Overview
        // ---------------------------------------------------------------
        ListAction::OverviewLoaded { overview } => {
            state.overview = Some(overview);
        }
        ListAction::OverviewFailed { .. } => {
            raise(state, GENERIC_ERROR_MESSAGE);
        }

        // ---------------------------------------------------------------
        // Deletion. Records are only removed after the server confirmed.
        // ---------------------------------------------------------------
        ListAction::DeleteStarted { page_rows } => {
            state.is_deleting = true;
            state.delete_page_rows = Some(page_rows);
        }
        ListAction::DeleteSucceeded { requested, failed } => {
            state.is_deleting = false;
            // Decided against the page the delete was issued from.
            let page_was_full = state
                .delete_page_rows
                .take()
                .is_some_and(|rows| rows as u64 == u64::from(state.page_size));
            let removed: BTreeSet<&DispatchId> =
                requested.iter().filter(|id| !failed.contains(*id)).collect();
            let before = state.records.len();
            state
                .records
                .retain(|r| !removed.contains(&r.dispatch_id));
            let removed_rows = before - state.records.len();
            state.total_count = state.total_count.saturating_sub(removed_rows as u64);
            state.selection.clear();
            if page_was_full && removed.len() as u64 == u64::from(state.page_size) {
                state.query.offset = 0;
            }
            if !failed.is_empty() {
                raise(state, &partial_failure_message(failed.len()));
            }
        }
        ListAction::DeleteAllSucceeded { failed } => {
            state.is_deleting = false;
            state.delete_page_rows = None;
            state.selection.clear();
            state.query.offset = 0;
            if !failed.is_empty() {
                raise(state, &partial_failure_message(failed.len()));
            }
        }
        ListAction::DeleteFailed { .. } => {
            state.is_deleting = false;
            state.delete_page_rows = None;
            raise(state, DELETE_FAILED_MESSAGE);
        }

        // ---------------------------------------------------------------
        // Notices and clock
        // ---------------------------------------------------------------
        ListAction::NoticeDismissed => {
            state.notice = None;
        }
        ListAction::Ticked { now } => {
            state.now = now;
        }
    }
}

fn raise(state: &mut ListState, message: &str) {
    state.notice = Some(Notice {
        message: message.to_string(),
    });
}

fn partial_failure_message(count: usize) -> String {
    if count == 1 {
        "1 dispatch could not be deleted.".to_string()
    } else {
        format!("{count} dispatches could not be deleted.")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use covalent_core::dispatch::{DispatchPage, DispatchRecord};
    use covalent_core::query::{ListQuery, SortColumn, StatusFilter};
    use covalent_core::status::DispatchStatus;

    use crate::state::FetchError;

    fn record(id: &str) -> DispatchRecord {
        DispatchRecord {
            dispatch_id: id.to_string(),
            lattice_name: format!("lattice-{id}"),
            started_at: None,
            ended_at: None,
            runtime: None,
            status: DispatchStatus::Completed,
            total_electrons: 1,
            total_electrons_completed: 1,
        }
    }

    fn loaded(ids: &[&str], page_size: u32) -> ListState {
        let mut state = ListState::new(page_size, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        reduce(&mut state, ListAction::FetchStarted { request: 1 });
        reduce(
            &mut state,
            ListAction::FetchSucceeded {
                request: 1,
                query: ListQuery::default(),
                page: DispatchPage {
                    total_count: ids.len() as u64,
                    items: ids.iter().map(|id| record(id)).collect(),
                },
            },
        );
        state
    }

    fn select(state: &mut ListState, ids: &[&str]) {
        for id in ids {
            reduce(
                state,
                ListAction::RowToggled {
                    dispatch_id: id.to_string(),
                },
            );
        }
    }

    #[test]
    fn fetch_success_replaces_page_and_clears_flags() {
        let state = loaded(&["a", "b"], 10);
        assert_eq!(state.records.len(), 2);
        assert_eq!(state.total_count, 2);
        assert!(!state.is_fetching);
        assert!(state.has_loaded);
    }

    #[test]
    fn sort_and_filter_clear_selection() {
        let mut state = loaded(&["a", "b"], 10);
        select(&mut state, &["a"]);
        reduce(&mut state, ListAction::SortClicked { column: SortColumn::Status });
        assert!(state.selection.is_empty());

        select(&mut state, &["b"]);
        reduce(
            &mut state,
            ListAction::StatusFilterChanged {
                filter: StatusFilter::Failed,
            },
        );
        assert!(state.selection.is_empty());
    }

    #[test]
    fn toggling_unknown_row_is_ignored() {
        let mut state = loaded(&["a"], 10);
        select(&mut state, &["zzz"]);
        assert!(state.selection.is_empty());
    }

    #[test]
    fn toggle_all_selects_then_clears() {
        let mut state = loaded(&["a", "b"], 10);
        reduce(&mut state, ListAction::AllToggled);
        assert_eq!(state.selection.len(), 2);
        reduce(&mut state, ListAction::AllToggled);
        assert!(state.selection.is_empty());
    }

    #[test]
    fn stale_query_response_is_dropped() {
        let mut state = loaded(&["a"], 10);
        reduce(&mut state, ListAction::SearchCommitted { text: "xyz".into() });
        reduce(&mut state, ListAction::FetchStarted { request: 2 });

        reduce(
            &mut state,
            ListAction::FetchSucceeded {
                request: 1,
                query: ListQuery::default(),
                page: DispatchPage {
                    total_count: 9,
                    items: vec![record("old")],
                },
            },
        );
        assert_eq!(state.records[0].dispatch_id, "a");
        assert!(state.is_fetching);
    }

    #[test]
    fn fetch_failure_keeps_last_page_and_raises_notice() {
        let mut state = loaded(&["a"], 10);
        reduce(&mut state, ListAction::FetchStarted { request: 2 });
        reduce(
            &mut state,
            ListAction::FetchFailed {
                request: 2,
                query: ListQuery::default(),
                error: FetchError {
                    message: "boom".into(),
                    status: Some(500),
                },
            },
        );
        assert_eq!(state.records.len(), 1);
        assert!(!state.is_fetching);
        assert_eq!(state.error.as_ref().and_then(|e| e.status), Some(500));
        assert_eq!(state.notice.as_ref().unwrap().message, GENERIC_ERROR_MESSAGE);
    }

    #[test]
    fn deleting_a_full_page_resets_offset() {
        let mut state = loaded(&["a", "b"], 2);
        state.query.offset = 4;
        select(&mut state, &["a", "b"]);
        let page_rows = state.records.len();
        reduce(&mut state, ListAction::DeleteStarted { page_rows });
        reduce(
            &mut state,
            ListAction::DeleteSucceeded {
                requested: vec!["a".into(), "b".into()],
                failed: vec![],
            },
        );
        assert_eq!(state.query.offset, 0);
        assert!(state.selection.is_empty());
        assert!(state.records.is_empty());
        assert!(!state.is_deleting);
    }

    #[test]
    fn page_reset_uses_page_the_delete_was_issued_from() {
        let mut state = loaded(&["a", "b"], 2);
        select(&mut state, &["a", "b"]);
        reduce(&mut state, ListAction::DeleteStarted { page_rows: 2 });

        // The user moves to a half-empty last page while the delete runs.
        reduce(&mut state, ListAction::PageChanged { offset: 2 });
        reduce(&mut state, ListAction::FetchStarted { request: 2 });
        let query = state.query.clone();
        reduce(
            &mut state,
            ListAction::FetchSucceeded {
                request: 2,
                query,
                page: DispatchPage {
                    total_count: 3,
                    items: vec![record("c")],
                },
            },
        );

        reduce(
            &mut state,
            ListAction::DeleteSucceeded {
                requested: vec!["a".into(), "b".into()],
                failed: vec![],
            },
        );
        assert_eq!(state.query.offset, 0);
        assert_eq!(state.total_count, 3);
        assert_eq!(state.delete_page_rows, None);
    }

    #[test]
    fn partial_page_delete_keeps_offset() {
        let mut state = loaded(&["c"], 2);
        state.query.offset = 2;
        select(&mut state, &["c"]);
        reduce(&mut state, ListAction::DeleteStarted { page_rows: 1 });
        reduce(
            &mut state,
            ListAction::DeleteSucceeded {
                requested: vec!["c".into()],
                failed: vec![],
            },
        );
        assert_eq!(state.query.offset, 2);
        assert!(state.records.is_empty());
    }

    #[test]
    fn partial_delete_keeps_offset_and_reports_failures() {
        let mut state = loaded(&["a", "b"], 2);
        state.query.offset = 4;
        reduce(
            &mut state,
            ListAction::DeleteSucceeded {
                requested: vec!["a".into(), "b".into()],
                failed: vec!["b".into()],
            },
        );
        assert_eq!(state.query.offset, 4);
        assert_eq!(state.records.len(), 1);
        assert_eq!(
            state.notice.as_ref().unwrap().message,
            "1 dispatch could not be deleted."
        );
    }

    #[test]
    fn delete_failure_leaves_table_and_selection() {
        let mut state = loaded(&["a", "b"], 10);
        select(&mut state, &["a"]);
        let page_rows = state.records.len();
        reduce(&mut state, ListAction::DeleteStarted { page_rows });
        reduce(
            &mut state,
            ListAction::DeleteFailed {
                error: FetchError {
                    message: "nope".into(),
                    status: Some(500),
                },
            },
        );
        assert_eq!(state.records.len(), 2);
        assert!(state.is_selected("a"));
        assert_eq!(state.notice.as_ref().unwrap().message, DELETE_FAILED_MESSAGE);
    }
}
