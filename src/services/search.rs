//! Search endpoint client
//!
//! The controller only sees the [`SearchBackend`] trait, so tests and other
//! hosts can substitute their own transport.

use async_trait::async_trait;
use reqwest::Client;

use crate::{
    config::{BackendConfig, SearchConfig},
    error::{AppError, AppResult},
    models::SearchResponse,
};

/// Anything able to answer a suggestion query
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Run one query. Non-success statuses and transport failures are errors.
    async fn search(&self, query: &str) -> AppResult<SearchResponse>;
}

/// [`SearchBackend`] over HTTP: `GET <base_url><endpoint>?q=<query>`
#[derive(Clone)]
pub struct HttpSearchBackend {
    client: Client,
    url: String,
    limit: Option<u32>,
}

impl HttpSearchBackend {
    /// Create a new backend from configuration
    pub fn new(backend: &BackendConfig, search: &SearchConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(backend.timeout())
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self::with_client(
            client,
            &backend.base_url,
            &search.api_endpoint,
            search.result_limit,
        ))
    }

    /// Create a backend sharing an existing client
    pub fn with_client(client: Client, base_url: &str, endpoint: &str, limit: Option<u32>) -> Self {
        Self {
            client,
            url: format!("{}{}", base_url.trim_end_matches('/'), endpoint),
            limit,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl SearchBackend for HttpSearchBackend {
    async fn search(&self, query: &str) -> AppResult<SearchResponse> {
        tracing::debug!("GET {} q={}", self.url, query);

        let mut request = self.client.get(&self.url).query(&[("q", query)]);
        if let Some(limit) = self.limit {
            request = request.query(&[("limit", limit)]);
        }

        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!("Search endpoint answered {} for q={}", status, query);
            return Err(AppError::Status(status.as_u16()));
        }

        response
            .json::<SearchResponse>()
            .await
            .map_err(|e| AppError::Transport(format!("Invalid search response: {}", e)))
    }
}
