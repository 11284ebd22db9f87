//! REST client for the Covalent dispatcher API.
//!
//! Wraps the `/api/v1` HTTP endpoints using [`reqwest`]. Callers receive
//! decoded payloads directly; transport responses never leave this module.
//! No retries happen here.

use std::time::Duration;

use async_trait::async_trait;
use covalent_core::dispatch::{
    DeleteAllRequest, DeleteOutcome, DeleteRequest, DispatchOverview, DispatchPage,
};
use covalent_core::logs::{LogPage, LogQuery};
use covalent_core::query::{ListQuery, StatusFilter};
use covalent_core::settings::Settings;
use covalent_core::types::DispatchId;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::backend::DashboardApi;
use crate::error::ApiError;

/// HTTP client for one dispatcher instance.
#[derive(Clone)]
pub struct CovalentApi {
    client: reqwest::Client,
    api_url: String,
}

impl CovalentApi {
    /// Create a new API client.
    ///
    /// * `api_url` - Base HTTP URL, e.g. `http://localhost:48008`.
    pub fn new(api_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), api_url)
    }

    /// Create a client whose requests time out after `timeout`.
    pub fn with_timeout(api_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, api_url))
    }

    /// Create an API client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, api_url: impl Into<String>) -> Self {
        let api_url = api_url.into().trim_end_matches('/').to_string();
        Self { client, api_url }
    }

    /// `GET {path}?{params}` decoded as `T`.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let request = self.client.get(self.url(path)).query(params);
        tracing::debug!(path, "GET");
        let response = request.send().await?;
        Self::parse_response(response).await
    }

    /// `POST {path}` with a JSON body, decoded as `T`.
    pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.post_with_params(path, &[], body).await
    }

    /// `POST {path}?{params}` with a JSON body, decoded as `T`.
    pub async fn post_with_params<T, B>(
        &self,
        path: &str,
        params: &[(&str, String)],
        body: &B,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let request = self.client.post(self.url(path)).query(params).json(body);
        tracing::debug!(path, "POST");
        let response = request.send().await?;
        Self::parse_response(response).await
    }

    /// `DELETE {path}` with a JSON body, decoded as `T`.
    pub async fn delete<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let request = self.client.delete(self.url(path)).json(body);
        tracing::debug!(path, "DELETE");
        let response = request.send().await?;
        Self::parse_response(response).await
    }

    /// `POST {path}?{params}` with a JSON body, ignoring the response body.
    pub async fn post_discarding<B>(
        &self,
        path: &str,
        params: &[(&str, String)],
        body: &B,
    ) -> Result<(), ApiError>
    where
        B: Serialize + ?Sized,
    {
        let request = self.client.post(self.url(path)).query(params).json(body);
        tracing::debug!(path, "POST");
        let response = request.send().await?;
        Self::ensure_success(response).await?;
        Ok(())
    }

    /// `GET {path}` returning the raw body text.
    pub async fn get_text(&self, path: &str) -> Result<String, ApiError> {
        let response = self.client.get(self.url(path)).send().await?;
        let response = Self::ensure_success(response).await?;
        Ok(response.text().await?)
    }

    // ---- private helpers ----

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    /// Return the response unchanged on a success status, or an
    /// [`ApiError::Server`] built from its body otherwise.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::debug!(status = status.as_u16(), "Server rejected request");
            return Err(ApiError::from_server_body(status.as_u16(), &body));
        }
        Ok(response)
    }

    /// Decode a successful JSON body. A body that does not match `T`
    /// yields [`ApiError::Decode`] rather than a transport error.
    async fn parse_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let response = Self::ensure_success(response).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode {
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl DashboardApi for CovalentApi {
    async fn list_dispatches(
        &self,
        query: &ListQuery,
        page_size: u32,
    ) -> Result<DispatchPage, ApiError> {
        self.get("/api/v1/dispatches/list", &query.to_params(page_size))
            .await
    }

    async fn overview(&self) -> Result<DispatchOverview, ApiError> {
        self.get("/api/v1/dispatches/overview", &[]).await
    }

    async fn delete_dispatches(&self, ids: &[DispatchId]) -> Result<DeleteOutcome, ApiError> {
        self.post("/api/v1/dispatches/delete", &DeleteRequest { dispatches: ids })
            .await
    }

    async fn delete_all(&self, filter: StatusFilter) -> Result<DeleteOutcome, ApiError> {
        let body = DeleteAllRequest {
            status_filter: match filter {
                StatusFilter::All => None,
                other => Some(other.as_str().to_string()),
            },
        };
        self.post("/api/v1/dispatches/delete-all", &body).await
    }

    async fn list_logs(&self, query: &LogQuery) -> Result<LogPage, ApiError> {
        self.get("/api/v1/logs/", &query.to_params()).await
    }

    async fn download_logs(&self) -> Result<String, ApiError> {
        self.get_text("/api/v1/logs/download").await
    }

    async fn settings(&self) -> Result<Settings, ApiError> {
        self.get("/api/v1/settings", &[]).await
    }

    async fn update_settings(&self, settings: &Settings) -> Result<(), ApiError> {
        self.post_discarding(
            "/api/v1/settings",
            &[("override_existing", "true".to_string())],
            settings,
        )
        .await
    }
}
