//! Backend abstraction consumed by the list store.
//!
//! [`DashboardApi`] is implemented by the HTTP client
//! ([`CovalentApi`](crate::api::CovalentApi)) and by the demo-mode
//! fixtures ([`FixtureApi`](crate::fixtures::FixtureApi)), so the store
//! and view run unchanged against either.

use async_trait::async_trait;
use covalent_core::dispatch::{DeleteOutcome, DispatchOverview, DispatchPage};
use covalent_core::logs::{LogPage, LogQuery};
use covalent_core::query::{ListQuery, StatusFilter};
use covalent_core::settings::Settings;
use covalent_core::types::DispatchId;

use crate::error::ApiError;

#[async_trait]
pub trait DashboardApi: Send + Sync {
    /// One page of the dispatch listing for `query`.
    async fn list_dispatches(
        &self,
        query: &ListQuery,
        page_size: u32,
    ) -> Result<DispatchPage, ApiError>;

    async fn overview(&self) -> Result<DispatchOverview, ApiError>;

    /// Bulk-delete the given dispatches.
    async fn delete_dispatches(&self, ids: &[DispatchId]) -> Result<DeleteOutcome, ApiError>;

    /// Delete every dispatch matching `filter`.
    async fn delete_all(&self, filter: StatusFilter) -> Result<DeleteOutcome, ApiError>;

    async fn list_logs(&self, query: &LogQuery) -> Result<LogPage, ApiError>;

    /// Raw server log file content.
    async fn download_logs(&self) -> Result<String, ApiError>;

    async fn settings(&self) -> Result<Settings, ApiError>;

    /// Replace the server settings, overriding existing values.
    async fn update_settings(&self, settings: &Settings) -> Result<(), ApiError>;
}
