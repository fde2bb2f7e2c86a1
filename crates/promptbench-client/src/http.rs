//! Harness REST API client.

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};

use promptbench_core::{
    is_chronological, sort_chronologically, Error, HistorySource, HistoryWindow, PromptSystem,
    Result, TestRunDetail, TestRunSummary,
};

use crate::config::ClientConfig;

/// [`HistorySource`] backed by the harness HTTP API.
#[derive(Debug, Clone)]
pub struct HttpHistoryClient {
    client: Client,
    base_url: Url,
}

impl HttpHistoryClient {
    /// Create a client for `config.base_url` with the configured request timeout.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| Error::Config(format!("invalid base_url {}: {}", config.base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(Error::Config(format!(
                "base_url cannot be used as a base: {}",
                config.base_url
            )));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {}", e)))?;

        debug!(
            base_url = %base_url,
            timeout_secs = config.request_timeout_secs,
            "Initialized harness API client"
        );

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build an endpoint URL below the base URL, percent-encoding each segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                Error::Internal(format!("base URL cannot take a path: {}", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// GET `url` and decode a JSON body.
    ///
    /// 404 maps to [`Error::NotFound`]. Transport failures and timeouts map to
    /// [`Error::Request`], undecodable bodies to [`Error::Serialization`].
    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        let start = Instant::now();
        let response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(Error::NotFound(url.path().to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Request(format!(
                "GET {} returned {}: {}",
                url, status, body
            )));
        }

        let parsed = response.json::<T>().await?;

        debug!(
            url = %url,
            status = status.as_u16(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Harness API request completed"
        );
        Ok(parsed)
    }
}

#[async_trait]
impl HistorySource for HttpHistoryClient {
    #[instrument(skip(self), fields(op = "list_prompt_systems"))]
    async fn list_prompt_systems(&self) -> Result<Vec<PromptSystem>> {
        // The API routes the collection with a trailing slash.
        let url = self.endpoint(&["prompt-systems", ""])?;
        let systems: Vec<PromptSystem> = self.get_json(url).await?;
        debug!(result_count = systems.len(), "Listed prompt systems");
        Ok(systems)
    }

    #[instrument(skip(self), fields(op = "get_prompt_system"))]
    async fn get_prompt_system(&self, system_id: &str) -> Result<PromptSystem> {
        let url = self.endpoint(&["prompt-systems", system_id])?;
        match self.get_json(url).await {
            Err(Error::NotFound(_)) => Err(Error::PromptSystemNotFound(system_id.to_string())),
            other => other,
        }
    }

    #[instrument(skip(self), fields(op = "fetch_history", days = window.days()))]
    async fn fetch_history(
        &self,
        system_id: &str,
        window: HistoryWindow,
    ) -> Result<Vec<TestRunSummary>> {
        let mut url = self.endpoint(&["test-runs", system_id, "history"])?;
        url.query_pairs_mut()
            .append_pair("days", &window.days().to_string());

        let mut runs: Vec<TestRunSummary> = self.get_json(url).await?;

        if !is_chronological(&runs) {
            warn!(
                system_id,
                result_count = runs.len(),
                "History returned out of order, sorting by created_at"
            );
            sort_chronologically(&mut runs);
        }

        debug!(system_id, result_count = runs.len(), "Fetched run history");
        Ok(runs)
    }

    #[instrument(skip(self), fields(op = "get_test_run"))]
    async fn get_test_run(&self, run_id: &str) -> Result<TestRunDetail> {
        let url = self.endpoint(&["test-runs", run_id])?;
        match self.get_json::<TestRunDetail>(url).await {
            Ok(detail) => {
                debug!(result_count = detail.results.len(), "Fetched test run");
                Ok(detail)
            }
            Err(Error::NotFound(_)) => Err(Error::NotFound(format!("test run {}", run_id))),
            Err(e) => Err(e),
        }
    }
}
