//! In-memory backend for demo mode and offline tests.
//!
//! [`FixtureApi`] serves the bundled JSON fixtures through the same
//! [`DashboardApi`] the HTTP client implements, applying search, status
//! filter, sort and pagination the way the dispatcher does, so the store
//! and view behave identically without a server.

use std::cmp::Ordering;
use std::sync::Mutex;

use async_trait::async_trait;
use covalent_core::dispatch::{DeleteOutcome, DispatchOverview, DispatchPage, DispatchRecord};
use covalent_core::logs::{LogPage, LogQuery, LogRecord, LogSortColumn};
use covalent_core::query::{ListQuery, SortColumn, SortDirection, StatusFilter};
use covalent_core::settings::Settings;
use covalent_core::status::DispatchStatus;
use covalent_core::types::DispatchId;

use crate::backend::DashboardApi;
use crate::error::ApiError;

const DISPATCHES_JSON: &str = include_str!("../fixtures/dispatches.json");
const LOGS_JSON: &str = include_str!("../fixtures/logs.json");
const SETTINGS_JSON: &str = include_str!("../fixtures/settings.json");

pub struct FixtureApi {
    dispatches: Mutex<Vec<DispatchRecord>>,
    logs: Vec<LogRecord>,
    settings: Mutex<Settings>,
}

impl FixtureApi {
    /// Backend seeded from the fixtures bundled with this crate.
    pub fn bundled() -> Result<Self, ApiError> {
        Ok(Self {
            dispatches: Mutex::new(decode(DISPATCHES_JSON)?),
            logs: decode(LOGS_JSON)?,
            settings: Mutex::new(decode(SETTINGS_JSON)?),
        })
    }

    /// Backend holding exactly `dispatches`, with no logs and empty settings.
    pub fn with_dispatches(dispatches: Vec<DispatchRecord>) -> Self {
        Self {
            dispatches: Mutex::new(dispatches),
            logs: Vec::new(),
            settings: Mutex::new(Settings::default()),
        }
    }

    /// Number of dispatches currently held.
    pub fn len(&self) -> usize {
        self.lock_dispatches().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock_dispatches(&self) -> std::sync::MutexGuard<'_, Vec<DispatchRecord>> {
        // A poisoned lock only means a panicking test thread; the data is
        // still a plain Vec and safe to keep using.
        self.dispatches
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn decode<T: serde::de::DeserializeOwned>(raw: &str) -> Result<T, ApiError> {
    serde_json::from_str(raw).map_err(|e| ApiError::Decode {
        message: format!("bundled fixture: {e}"),
    })
}

// ---------------------------------------------------------------------------
// Listing semantics
// ---------------------------------------------------------------------------

fn matches_search(record: &DispatchRecord, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    let needle = needle.to_lowercase();
    record.dispatch_id.to_lowercase().contains(&needle)
        || record.lattice_name.to_lowercase().contains(&needle)
}

fn compare(a: &DispatchRecord, b: &DispatchRecord, column: SortColumn) -> Ordering {
    match column {
        SortColumn::LatticeName => a.lattice_name.cmp(&b.lattice_name),
        SortColumn::Status => a.status.as_str().cmp(b.status.as_str()),
        SortColumn::StartedAt => a.started_at.cmp(&b.started_at),
        SortColumn::EndedAt => a.ended_at.cmp(&b.ended_at),
        SortColumn::Runtime => a.runtime.cmp(&b.runtime),
        SortColumn::TotalElectrons => a.total_electrons.cmp(&b.total_electrons),
    }
}

fn apply_direction(ordering: Ordering, direction: SortDirection) -> Ordering {
    match direction {
        SortDirection::Asc => ordering,
        SortDirection::Desc => ordering.reverse(),
    }
}

/// Slice `[offset, offset + count)` out of `items`, tolerating offsets past
/// the end.
fn window<T: Clone>(items: &[T], offset: u64, count: u32) -> Vec<T> {
    let start = usize::try_from(offset).unwrap_or(usize::MAX).min(items.len());
    let end = start.saturating_add(count as usize).min(items.len());
    items[start..end].to_vec()
}

/// Apply search, filter, sort and pagination to `records`.
pub fn select_page(records: &[DispatchRecord], query: &ListQuery, page_size: u32) -> DispatchPage {
    let mut matching: Vec<DispatchRecord> = records
        .iter()
        .filter(|r| query.status_filter.matches(r.status))
        .filter(|r| matches_search(r, &query.search))
        .cloned()
        .collect();

    matching.sort_by(|a, b| {
        apply_direction(compare(a, b, query.sort_column), query.sort_direction)
            .then_with(|| a.dispatch_id.cmp(&b.dispatch_id))
    });

    DispatchPage {
        total_count: matching.len() as u64,
        items: window(&matching, query.offset, page_size),
    }
}

fn summarize(records: &[DispatchRecord]) -> DispatchOverview {
    let count = |status: DispatchStatus| records.iter().filter(|r| r.status == status).count() as u64;
    let latest_running = records
        .iter()
        .filter(|r| r.status.is_running())
        .max_by_key(|r| r.started_at)
        .map(|r| r.status);
    let total_duration: i64 = records.iter().filter_map(|r| r.runtime).sum();

    DispatchOverview {
        total_jobs: records.len() as u64,
        total_jobs_running: count(DispatchStatus::Running),
        total_jobs_completed: count(DispatchStatus::Completed),
        total_jobs_failed: count(DispatchStatus::Failed),
        latest_running_task_status: latest_running,
        total_dispatcher_duration: Some(total_duration),
    }
}

#[async_trait]
impl DashboardApi for FixtureApi {
    async fn list_dispatches(
        &self,
        query: &ListQuery,
        page_size: u32,
    ) -> Result<DispatchPage, ApiError> {
        Ok(select_page(&self.lock_dispatches(), query, page_size))
    }

    async fn overview(&self) -> Result<DispatchOverview, ApiError> {
        Ok(summarize(&self.lock_dispatches()))
    }

    async fn delete_dispatches(&self, ids: &[DispatchId]) -> Result<DeleteOutcome, ApiError> {
        let mut dispatches = self.lock_dispatches();
        let mut outcome = DeleteOutcome::default();
        for id in ids {
            match dispatches.iter().position(|r| &r.dispatch_id == id) {
                Some(idx) => {
                    dispatches.remove(idx);
                    outcome.success_items.push(id.clone());
                }
                None => outcome.failure_items.push(id.clone()),
            }
        }
        Ok(outcome)
    }

    async fn delete_all(&self, filter: StatusFilter) -> Result<DeleteOutcome, ApiError> {
        let mut dispatches = self.lock_dispatches();
        let (removed, kept): (Vec<_>, Vec<_>) = dispatches
            .drain(..)
            .partition(|r| filter.matches(r.status));
        *dispatches = kept;
        Ok(DeleteOutcome {
            success_items: removed.into_iter().map(|r| r.dispatch_id).collect(),
            failure_items: Vec::new(),
        })
    }

    async fn list_logs(&self, query: &LogQuery) -> Result<LogPage, ApiError> {
        let needle = query.search.to_lowercase();
        let mut matching: Vec<LogRecord> = self
            .logs
            .iter()
            .filter(|l| needle.is_empty() || l.message.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        matching.sort_by(|a, b| {
            let ordering = match query.sort_column {
                LogSortColumn::LogDate => a.log_date.cmp(&b.log_date),
                LogSortColumn::Status => a.status.cmp(&b.status),
            };
            apply_direction(ordering, query.sort_direction)
        });
        Ok(LogPage {
            total_count: matching.len() as u64,
            items: window(&matching, query.offset, query.count),
        })
    }

    async fn download_logs(&self) -> Result<String, ApiError> {
        let mut lines: Vec<&LogRecord> = self.logs.iter().collect();
        lines.sort_by_key(|l| l.log_date);
        Ok(lines
            .iter()
            .map(|l| {
                let date = l
                    .log_date
                    .map(|d| d.format("%Y-%m-%d %H:%M:%S,%3f").to_string())
                    .unwrap_or_default();
                format!("[{date}] [{}] {}\n", l.status, l.message)
            })
            .collect())
    }

    async fn settings(&self) -> Result<Settings, ApiError> {
        Ok(self
            .settings
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone())
    }

    async fn update_settings(&self, settings: &Settings) -> Result<(), ApiError> {
        *self
            .settings
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = settings.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bundled() -> FixtureApi {
        FixtureApi::bundled().expect("bundled fixtures decode")
    }

    #[tokio::test]
    async fn bundled_fixtures_decode() {
        let api = bundled();
        assert_eq!(api.len(), 12);
        assert!(!api.list_logs(&LogQuery::default()).await.unwrap().items.is_empty());
        assert!(api.settings().await.unwrap().get_path("dask.num_workers").is_some());
    }

    #[tokio::test]
    async fn paginates_with_total_count() {
        let api = bundled();
        let query = ListQuery {
            offset: 10,
            ..Default::default()
        };
        let page = api.list_dispatches(&query, 10).await.unwrap();
        assert_eq!(page.total_count, 12);
        assert_eq!(page.items.len(), 2);
    }

    #[tokio::test]
    async fn offset_past_end_is_empty() {
        let api = bundled();
        let query = ListQuery {
            offset: 500,
            ..Default::default()
        };
        let page = api.list_dispatches(&query, 10).await.unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.total_count, 12);
    }

    #[tokio::test]
    async fn default_sort_is_newest_first() {
        let api = bundled();
        let page = api.list_dispatches(&ListQuery::default(), 12).await.unwrap();
        let starts: Vec<_> = page.items.iter().map(|r| r.started_at).collect();
        let mut sorted = starts.clone();
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(starts, sorted);
    }

    #[tokio::test]
    async fn filters_and_searches() {
        let api = bundled();
        let query = ListQuery {
            status_filter: StatusFilter::Running,
            ..Default::default()
        };
        let page = api.list_dispatches(&query, 10).await.unwrap();
        assert!(page.items.iter().all(|r| r.status == DispatchStatus::Running));
        assert_eq!(page.total_count, 2);

        let query = ListQuery {
            search: "MNIST".into(),
            ..Default::default()
        };
        let page = api.list_dispatches(&query, 10).await.unwrap();
        assert!(page.items.iter().all(|r| r.lattice_name == "mnist_training"));
        assert!(page.total_count > 0);
    }

    #[tokio::test]
    async fn delete_reports_unknown_ids_as_failures() {
        let api = bundled();
        let first = api.list_dispatches(&ListQuery::default(), 1).await.unwrap().items[0]
            .dispatch_id
            .clone();
        let outcome = api
            .delete_dispatches(&[first.clone(), "missing".to_string()])
            .await
            .unwrap();
        assert_eq!(outcome.success_items, vec![first]);
        assert_eq!(outcome.failure_items, vec!["missing".to_string()]);
        assert_eq!(api.len(), 11);
    }

    #[tokio::test]
    async fn delete_all_respects_filter() {
        let api = bundled();
        let outcome = api.delete_all(StatusFilter::Failed).await.unwrap();
        assert_eq!(outcome.success_items.len(), 2);
        let overview = api.overview().await.unwrap();
        assert_eq!(overview.total_jobs_failed, 0);
        assert_eq!(overview.total_jobs, 10);
    }

    #[tokio::test]
    async fn download_is_chronological() {
        let api = bundled();
        let text = api.download_logs().await.unwrap();
        let first = text.lines().next().unwrap();
        assert!(first.contains("Dispatcher started"), "{first}");
    }
}
