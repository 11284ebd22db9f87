//! Behavioural tests for the sans-IO query coordinator.
//!
//! Time is virtual: a [`ManualClock`] is advanced explicitly and the
//! coordinator is polled, so debounce and cooldown windows are exact.

use std::time::Duration;

use assert_matches::assert_matches;
use chrono::{DateTime, TimeZone, Utc};
use covalent_client::{ApiError, ResultUpdate};
use covalent_core::dispatch::{DeleteOutcome, DispatchPage, DispatchRecord};
use covalent_core::query::{ListQuery, SortColumn, SortDirection, StatusFilter};
use covalent_core::runtime::display_runtime;
use covalent_core::status::DispatchStatus;
use covalent_store::state::RequestId;
use covalent_store::{Clock, Command, Completion, Intent, ManualClock, QueryCoordinator};
use covalent_core::tuning::ListTuning;

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
}

fn record(id: &str, status: DispatchStatus) -> DispatchRecord {
    DispatchRecord {
        dispatch_id: id.to_string(),
        lattice_name: format!("workflow_{id}"),
        started_at: Some(t0() - chrono::Duration::minutes(5)),
        ended_at: if status.is_terminal() { Some(t0()) } else { None },
        runtime: Some(1_000),
        status,
        total_electrons: 4,
        total_electrons_completed: 2,
    }
}

fn rows(prefix: &str, n: usize) -> Vec<DispatchRecord> {
    (0..n)
        .map(|i| record(&format!("{prefix}{i}"), DispatchStatus::Completed))
        .collect()
}

fn list_fetches(commands: &[Command]) -> Vec<(RequestId, ListQuery)> {
    commands
        .iter()
        .filter_map(|c| match c {
            Command::FetchList { request, query } => Some((*request, query.clone())),
            _ => None,
        })
        .collect()
}

struct Harness {
    clock: ManualClock,
    coordinator: QueryCoordinator,
    /// Latest list fetch not yet resolved.
    pending: Option<(RequestId, ListQuery)>,
}

impl Harness {
    fn new() -> Self {
        Self::with_tuning(ListTuning::default())
    }

    fn with_tuning(tuning: ListTuning) -> Self {
        let clock = ManualClock::new(t0());
        let mut coordinator = QueryCoordinator::new(tuning, clock.now());
        let commands = coordinator.start(clock.now());
        let pending = list_fetches(&commands).pop();
        Self {
            clock,
            coordinator,
            pending,
        }
    }

    fn intent(&mut self, intent: Intent) -> Vec<Command> {
        let commands = self.coordinator.handle_intent(intent, self.clock.now());
        self.track(&commands);
        commands
    }

    fn advance(&mut self, ms: u64) -> Vec<Command> {
        self.clock.advance(Duration::from_millis(ms));
        let commands = self.coordinator.poll(self.clock.now());
        self.track(&commands);
        commands
    }

    fn notify(&mut self, id: &str, status: DispatchStatus) -> Vec<Command> {
        let commands = self
            .coordinator
            .handle_notification(&ResultUpdate::new(id, status), self.clock.now());
        self.track(&commands);
        commands
    }

    fn complete(&mut self, completion: Completion) -> Vec<Command> {
        let commands = self.coordinator.complete(completion, self.clock.now());
        self.track(&commands);
        commands
    }

    /// Resolve the latest pending list fetch with `items`.
    fn resolve(&mut self, total_count: u64, items: Vec<DispatchRecord>) {
        let (request, query) = self.pending.take().expect("no pending list fetch");
        self.complete(Completion::List {
            request,
            query,
            result: Ok(DispatchPage { total_count, items }),
        });
    }

    fn track(&mut self, commands: &[Command]) {
        if let Some(latest) = list_fetches(commands).pop() {
            self.pending = Some(latest);
        }
    }

    fn select(&mut self, ids: &[&str]) {
        for id in ids {
            self.intent(Intent::ToggleRow(id.to_string()));
        }
    }
}

// ---------------------------------------------------------------------------
// P1 / P2 / Scenario B: search debounce and short-query suppression
// ---------------------------------------------------------------------------

#[test]
fn keystroke_burst_commits_once_with_final_text() {
    let mut h = Harness::new();
    h.resolve(0, vec![]);

    let mut issued = Vec::new();
    for text in ["l", "la", "lat", "latt", "latti", "lattic", "lattice"] {
        issued.extend(h.intent(Intent::SearchInput(text.to_string())));
        issued.extend(h.advance(300));
    }
    assert!(issued.is_empty(), "nothing may fire while typing");
    assert_eq!(h.coordinator.state().search_draft, "lattice");

    for _ in 0..10 {
        issued.extend(h.advance(250));
    }
    let fetches = list_fetches(&issued);
    assert_eq!(fetches.len(), 1);
    assert_eq!(fetches[0].1.search, "lattice");
}

#[test]
fn short_search_is_not_sent() {
    let mut h = Harness::new();
    h.resolve(0, vec![]);

    assert!(h.intent(Intent::SearchInput("ab".into())).is_empty());
    assert!(list_fetches(&h.advance(1000)).is_empty());
    assert_eq!(h.coordinator.state().query.search, "");
    assert_eq!(h.coordinator.state().search_draft, "ab");
}

#[test]
fn clearing_search_fetches_immediately() {
    let mut h = Harness::new();
    h.resolve(0, vec![]);
    h.intent(Intent::SearchInput("abcd".into()));
    h.advance(1000);
    h.resolve(0, vec![]);

    let commands = h.intent(Intent::SearchInput(String::new()));

    let fetches = list_fetches(&commands);
    assert_eq!(fetches.len(), 1);
    assert_eq!(fetches[0].1.search, "");
}

#[test]
fn scenario_b_two_chars_then_four() {
    let mut h = Harness::new();
    h.resolve(0, vec![]);

    h.intent(Intent::SearchInput("a".into()));
    h.intent(Intent::SearchInput("ab".into()));
    assert!(list_fetches(&h.advance(1000)).is_empty());

    h.intent(Intent::SearchInput("abc".into()));
    h.intent(Intent::SearchInput("abcd".into()));
    assert!(list_fetches(&h.advance(999)).is_empty());
    let fetches = list_fetches(&h.advance(1));

    assert_eq!(fetches.len(), 1);
    let params = fetches[0].1.to_params(10);
    assert!(params.contains(&("search", "abcd".to_string())));
    assert!(params.contains(&("offset", "0".to_string())));
}

// ---------------------------------------------------------------------------
// P3 / P4 / P5: sorting, offset reset, selection drop
// ---------------------------------------------------------------------------

#[test]
fn sort_toggle_and_column_change() {
    let mut h = Harness::new();

    h.intent(Intent::SortBy(SortColumn::StartedAt));
    let q = &h.coordinator.state().query;
    assert_eq!((q.sort_column, q.sort_direction), (SortColumn::StartedAt, SortDirection::Asc));

    h.intent(Intent::SortBy(SortColumn::StartedAt));
    let q = &h.coordinator.state().query;
    assert_eq!(q.sort_direction, SortDirection::Desc);

    h.intent(Intent::SortBy(SortColumn::StartedAt));
    h.intent(Intent::SortBy(SortColumn::LatticeName));
    let q = &h.coordinator.state().query;
    assert_eq!((q.sort_column, q.sort_direction), (SortColumn::LatticeName, SortDirection::Desc));
}

fn on_second_page_with_selection() -> Harness {
    let mut h = Harness::new();
    h.resolve(25, rows("a", 10));
    h.intent(Intent::GoToPage(2));
    h.resolve(25, rows("b", 10));
    h.select(&["b1", "b2"]);
    assert_eq!(h.coordinator.state().query.offset, 10);
    assert_eq!(h.coordinator.state().selection.len(), 2);
    h
}

#[test]
fn sort_column_change_resets_offset_and_selection() {
    let mut h = on_second_page_with_selection();
    let fetches = list_fetches(&h.intent(Intent::SortBy(SortColumn::Runtime)));
    assert_eq!(fetches[0].1.offset, 0);
    assert!(h.coordinator.state().selection.is_empty());
}

#[test]
fn sort_direction_change_resets_offset_and_selection() {
    let mut h = on_second_page_with_selection();
    h.intent(Intent::SortBy(SortColumn::StartedAt));
    assert_eq!(h.coordinator.state().query.sort_direction, SortDirection::Asc);
    assert_eq!(h.coordinator.state().query.offset, 0);
    assert!(h.coordinator.state().selection.is_empty());
}

#[test]
fn filter_change_resets_offset_and_selection() {
    let mut h = on_second_page_with_selection();
    let fetches = list_fetches(&h.intent(Intent::FilterStatus(StatusFilter::Failed)));
    assert_eq!(fetches[0].1.offset, 0);
    assert_eq!(fetches[0].1.status_filter, StatusFilter::Failed);
    assert!(h.coordinator.state().selection.is_empty());
}

#[test]
fn paging_keeps_sort_and_search() {
    let mut h = Harness::new();
    h.intent(Intent::SortBy(SortColumn::LatticeName));
    h.intent(Intent::SearchInput("mnist".into()));
    h.advance(1000);
    h.resolve(30, rows("a", 10));

    let fetches = list_fetches(&h.intent(Intent::GoToPage(3)));

    let query = &fetches[0].1;
    assert_eq!(query.offset, 20);
    assert_eq!(query.sort_column, SortColumn::LatticeName);
    assert_eq!(query.search, "mnist");
}

#[test]
fn navigating_pages_drops_selection() {
    let mut h = Harness::new();
    h.resolve(25, rows("a", 10));
    h.select(&["a0", "a3"]);

    h.intent(Intent::GoToPage(2));
    assert!(h.coordinator.state().selection.is_empty());

    h.resolve(25, rows("b", 10));
    h.select(&["b0"]);
    h.intent(Intent::GoToPage(1));
    h.resolve(25, rows("a", 10));
    assert!(h.coordinator.state().selection.is_empty());
}

#[test]
fn refetch_drops_selected_rows_that_vanished() {
    let mut h = Harness::new();
    h.resolve(3, rows("a", 3));
    h.select(&["a0", "a2"]);

    h.intent(Intent::Refresh);
    h.resolve(2, rows("a", 2));

    let selection: Vec<_> = h.coordinator.state().selection.iter().cloned().collect();
    assert_eq!(selection, vec!["a0".to_string()]);
}

// ---------------------------------------------------------------------------
// P6: stale responses
// ---------------------------------------------------------------------------

#[test]
fn superseded_response_is_discarded() {
    let mut h = Harness::new();
    let r1 = h.pending.take().unwrap();
    let r2 = list_fetches(&h.intent(Intent::SortBy(SortColumn::LatticeName)))
        .pop()
        .unwrap();

    h.complete(Completion::List {
        request: r2.0,
        query: r2.1,
        result: Ok(DispatchPage {
            total_count: 1,
            items: vec![record("from-r2", DispatchStatus::Completed)],
        }),
    });
    h.complete(Completion::List {
        request: r1.0,
        query: r1.1,
        result: Ok(DispatchPage {
            total_count: 1,
            items: vec![record("from-r1", DispatchStatus::Completed)],
        }),
    });

    let state = h.coordinator.state();
    assert_eq!(state.records[0].dispatch_id, "from-r2");
    assert!(!state.is_fetching);
}

#[test]
fn superseded_failure_is_discarded() {
    let mut h = Harness::new();
    let r1 = h.pending.take().unwrap();
    h.intent(Intent::FilterStatus(StatusFilter::Running));
    h.resolve(0, vec![]);

    h.complete(Completion::List {
        request: r1.0,
        query: r1.1,
        result: Err(ApiError::Network {
            message: "late".into(),
        }),
    });

    assert!(h.coordinator.state().error.is_none());
    assert!(h.coordinator.state().notice.is_none());
}

#[test]
fn identical_refetches_apply_last_resolution() {
    let mut h = Harness::new();
    h.resolve(0, vec![]);
    let first = list_fetches(&h.intent(Intent::Refresh)).pop().unwrap();
    let second = list_fetches(&h.intent(Intent::Refresh)).pop().unwrap();
    assert_eq!(first.1, second.1);

    h.complete(Completion::List {
        request: second.0,
        query: second.1,
        result: Ok(DispatchPage {
            total_count: 1,
            items: vec![record("second", DispatchStatus::Running)],
        }),
    });
    assert!(!h.coordinator.state().is_fetching);

    h.complete(Completion::List {
        request: first.0,
        query: first.1,
        result: Ok(DispatchPage {
            total_count: 1,
            items: vec![record("first", DispatchStatus::Running)],
        }),
    });
    assert_eq!(h.coordinator.state().records[0].dispatch_id, "first");
    assert_eq!(h.coordinator.state().refresh_token, 2);
}

// ---------------------------------------------------------------------------
// P7 / Scenario D: deletion
// ---------------------------------------------------------------------------

#[test]
fn deleting_full_page_resets_offset() {
    let mut h = Harness::new();
    h.resolve(30, rows("a", 10));
    h.intent(Intent::GoToPage(2));
    let page = rows("b", 10);
    h.resolve(30, page.clone());
    h.intent(Intent::ToggleAll);
    assert_eq!(h.coordinator.state().selection.len(), 10);

    let commands = h.intent(Intent::ConfirmDelete);
    let ids = assert_matches!(&commands[..], [Command::Delete { ids }] => ids.clone());
    assert_eq!(ids.len(), 10);

    let followups = h.complete(Completion::Delete {
        requested: ids.clone(),
        result: Ok(DeleteOutcome {
            success_items: ids,
            failure_items: vec![],
        }),
    });

    assert_eq!(h.coordinator.state().query.offset, 0);
    assert!(h.coordinator.state().selection.is_empty());
    let fetches = list_fetches(&followups);
    assert_eq!(fetches.len(), 1);
    assert_eq!(fetches[0].1.offset, 0);
    assert!(followups.contains(&Command::FetchOverview));
}

#[test]
fn deleting_part_of_a_page_keeps_offset() {
    let mut h = Harness::new();
    h.resolve(30, rows("a", 10));
    h.intent(Intent::GoToPage(2));
    h.resolve(30, rows("b", 10));
    h.select(&["b0", "b1"]);
    h.intent(Intent::ConfirmDelete);

    h.complete(Completion::Delete {
        requested: vec!["b0".into(), "b1".into()],
        result: Ok(DeleteOutcome {
            success_items: vec!["b0".into(), "b1".into()],
            failure_items: vec![],
        }),
    });

    assert_eq!(h.coordinator.state().query.offset, 10);
}

#[test]
fn failed_delete_leaves_selection_and_page() {
    let mut h = Harness::new();
    h.resolve(2, rows("a", 2));
    h.select(&["a0"]);
    h.intent(Intent::ConfirmDelete);

    let followups = h.complete(Completion::Delete {
        requested: vec!["a0".into()],
        result: Err(ApiError::from_server_body(500, r#"{"detail":"db locked"}"#)),
    });

    assert!(followups.is_empty());
    let state = h.coordinator.state();
    assert!(state.is_selected("a0"));
    assert_eq!(state.records.len(), 2);
    assert!(!state.is_deleting);
    assert!(state.notice.is_some());
}

#[test]
fn scenario_d_delete_everything_visible() {
    let mut h = Harness::new();
    h.resolve(
        2,
        vec![
            record("d1", DispatchStatus::Completed),
            record("d2", DispatchStatus::Failed),
        ],
    );
    h.select(&["d1", "d2"]);

    let commands = h.intent(Intent::ConfirmDelete);
    assert_matches!(&commands[..], [Command::Delete { ids }] if ids.len() == 2);
    assert!(h.coordinator.state().is_deleting);

    h.complete(Completion::Delete {
        requested: vec!["d1".into(), "d2".into()],
        result: Ok(DeleteOutcome {
            success_items: vec!["d1".into(), "d2".into()],
            failure_items: vec![],
        }),
    });
    h.resolve(0, vec![]);

    let state = h.coordinator.state();
    assert!(state.selection.is_empty());
    assert_eq!(state.query.offset, 0);
    assert_eq!(state.total_count, 0);
    assert!(state.records.is_empty());
    assert!(state.has_loaded && !state.is_fetching);
}

#[test]
fn delete_all_uses_current_filter() {
    let mut h = Harness::new();
    h.intent(Intent::FilterStatus(StatusFilter::Failed));
    h.resolve(1, vec![record("f", DispatchStatus::Failed)]);

    let commands = h.intent(Intent::DeleteAll);
    assert_eq!(
        commands,
        vec![Command::DeleteAll {
            filter: StatusFilter::Failed
        }]
    );
    assert!(h.intent(Intent::DeleteAll).is_empty(), "one delete at a time");

    let followups = h.complete(Completion::DeleteAll(Ok(DeleteOutcome {
        success_items: vec!["f".into()],
        failure_items: vec![],
    })));
    assert_eq!(list_fetches(&followups).len(), 1);
    assert!(!h.coordinator.state().is_deleting);
}

// ---------------------------------------------------------------------------
// P8: live runtime
// ---------------------------------------------------------------------------

#[test]
fn running_runtime_follows_local_clock() {
    let mut h = Harness::new();
    let mut running = record("r", DispatchStatus::Running);
    running.started_at = Some(t0());
    running.runtime = Some(42);
    h.resolve(1, vec![running]);

    for (advance_ms, expected_secs) in [(1000, 1), (1000, 2), (58_000, 60), (500, 60)] {
        h.advance(advance_ms);
        let state = h.coordinator.state();
        let runtime = display_runtime(&state.records[0], state.now).unwrap();
        assert_eq!(runtime.num_seconds(), expected_secs);
    }
}

// ---------------------------------------------------------------------------
// Scenario C: notification cooldown
// ---------------------------------------------------------------------------

fn with_running_row() -> Harness {
    let mut h = Harness::new();
    h.resolve(
        2,
        vec![
            record("run", DispatchStatus::Running),
            record("done", DispatchStatus::Completed),
        ],
    );
    h
}

#[test]
fn scenario_c_running_update_respects_cooldown() {
    let mut h = with_running_row();

    h.advance(1000);
    assert!(h.notify("run", DispatchStatus::Running).is_empty());

    h.advance(2000);
    let commands = h.notify("run", DispatchStatus::Running);
    assert_eq!(list_fetches(&commands).len(), 1);
    assert_eq!(h.coordinator.state().refresh_token, 1);
}

#[test]
fn status_change_bypasses_cooldown() {
    let mut h = with_running_row();
    h.advance(500);
    let commands = h.notify("run", DispatchStatus::Completed);
    assert_eq!(list_fetches(&commands).len(), 1);
}

#[test]
fn running_dispatch_off_page_respects_cooldown() {
    let mut h = with_running_row();

    for _ in 0..5 {
        h.advance(500);
        assert!(h.notify("page-two", DispatchStatus::Running).is_empty());
    }

    h.advance(500);
    assert_eq!(list_fetches(&h.notify("page-two", DispatchStatus::Running)).len(), 1);
    h.advance(500);
    assert!(h.notify("page-two", DispatchStatus::Running).is_empty());
}

#[test]
fn finished_dispatch_off_page_bypasses_cooldown() {
    let mut h = with_running_row();
    h.advance(500);
    assert_eq!(list_fetches(&h.notify("page-two", DispatchStatus::Failed)).len(), 1);
}

#[test]
fn finished_dispatch_bypasses_cooldown() {
    let mut h = with_running_row();
    h.advance(500);
    assert_eq!(list_fetches(&h.notify("done", DispatchStatus::Completed)).len(), 1);
}

#[test]
fn refresh_keeps_query_unchanged() {
    let mut h = with_running_row();
    h.advance(3000);
    let fetches = list_fetches(&h.notify("run", DispatchStatus::Running));
    assert_eq!(fetches[0].1, ListQuery::default());
}

// ---------------------------------------------------------------------------
// Error notice
// ---------------------------------------------------------------------------

#[test]
fn failed_fetch_keeps_last_page_and_notice_auto_dismisses() {
    let tuning = ListTuning {
        notice_duration: Duration::from_millis(1500),
        ..Default::default()
    };
    let mut h = Harness::with_tuning(tuning);
    h.resolve(1, rows("a", 1));
    h.intent(Intent::Refresh);
    let (request, query) = h.pending.take().unwrap();

    h.complete(Completion::List {
        request,
        query,
        result: Err(ApiError::from_server_body(503, "")),
    });
    let state = h.coordinator.state();
    assert_eq!(state.records.len(), 1);
    assert_eq!(state.error.as_ref().and_then(|e| e.status), Some(503));
    assert!(!state.is_fetching);
    assert!(state.notice.is_some());

    h.advance(1500);
    assert!(h.coordinator.state().notice.is_none());
    assert!(h.coordinator.state().error.is_some());
}
