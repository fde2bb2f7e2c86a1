//! In-memory history source for deterministic testing.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use promptbench_client::mock::MockHistorySource;
//!
//! let source = MockHistorySource::new()
//!     .with_scores("ps-1", &[Some(0.5), Some(0.9)])
//!     .with_failure("ps-2")
//!     .with_latency_ms("ps-1", 50);
//! ```

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use promptbench_core::{
    Error, HistorySource, HistoryWindow, PromptSystem, Result, TestRunDetail, TestRunSummary,
};

/// Mock history source for testing.
#[derive(Clone, Default)]
pub struct MockHistorySource {
    config: Arc<MockConfig>,
    call_log: Arc<Mutex<Vec<MockCall>>>,
}

#[derive(Debug, Clone, Default)]
struct MockConfig {
    systems: Vec<PromptSystem>,
    histories: HashMap<String, Vec<TestRunSummary>>,
    runs: HashMap<String, TestRunDetail>,
    failing: HashSet<String>,
    latency_ms: HashMap<String, u64>,
    fail_listing: bool,
}

/// One recorded call against the mock.
#[derive(Debug, Clone, PartialEq)]
pub struct MockCall {
    pub operation: String,
    pub system_id: Option<String>,
    pub days: Option<u32>,
}

impl MockHistorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a prompt system returned by listing.
    pub fn with_system(mut self, system: PromptSystem) -> Self {
        Arc::make_mut(&mut self.config).systems.push(system);
        self
    }

    /// Set the history returned for `system_id`.
    pub fn with_history(mut self, system_id: impl Into<String>, runs: Vec<TestRunSummary>) -> Self {
        Arc::make_mut(&mut self.config)
            .histories
            .insert(system_id.into(), runs);
        self
    }

    /// Set the history for `system_id` from bare scores, oldest first.
    pub fn with_scores(self, system_id: impl Into<String>, scores: &[Option<f64>]) -> Self {
        let system_id = system_id.into();
        let runs = runs_from_scores(&system_id, scores);
        self.with_history(system_id, runs)
    }

    /// Register a test run returned by [`HistorySource::get_test_run`].
    pub fn with_test_run(mut self, detail: TestRunDetail) -> Self {
        Arc::make_mut(&mut self.config)
            .runs
            .insert(detail.test_run.id.clone(), detail);
        self
    }

    /// Make history fetches for `system_id` fail.
    pub fn with_failure(mut self, system_id: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config)
            .failing
            .insert(system_id.into());
        self
    }

    /// Delay history fetches for `system_id`.
    pub fn with_latency_ms(mut self, system_id: impl Into<String>, latency_ms: u64) -> Self {
        Arc::make_mut(&mut self.config)
            .latency_ms
            .insert(system_id.into(), latency_ms);
        self
    }

    /// Make prompt system listing fail.
    pub fn with_listing_failure(mut self) -> Self {
        Arc::make_mut(&mut self.config).fail_listing = true;
        self
    }

    /// Get all logged calls for assertion.
    pub fn get_calls(&self) -> Vec<MockCall> {
        self.calls().clone()
    }

    /// Number of history fetches issued.
    pub fn history_call_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.operation == "fetch_history")
            .count()
    }

    fn calls(&self) -> std::sync::MutexGuard<'_, Vec<MockCall>> {
        self.call_log.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn log_call(&self, operation: &str, system_id: Option<&str>, days: Option<u32>) {
        self.calls().push(MockCall {
            operation: operation.to_string(),
            system_id: system_id.map(str::to_string),
            days,
        });
    }
}

#[async_trait]
impl HistorySource for MockHistorySource {
    async fn list_prompt_systems(&self) -> Result<Vec<PromptSystem>> {
        self.log_call("list_prompt_systems", None, None);
        if self.config.fail_listing {
            return Err(Error::Request("simulated listing failure".to_string()));
        }
        Ok(self.config.systems.clone())
    }

    async fn get_prompt_system(&self, system_id: &str) -> Result<PromptSystem> {
        self.log_call("get_prompt_system", Some(system_id), None);
        self.config
            .systems
            .iter()
            .find(|s| s.id == system_id)
            .cloned()
            .ok_or_else(|| Error::PromptSystemNotFound(system_id.to_string()))
    }

    async fn fetch_history(
        &self,
        system_id: &str,
        window: HistoryWindow,
    ) -> Result<Vec<TestRunSummary>> {
        self.log_call("fetch_history", Some(system_id), Some(window.days()));

        if let Some(&ms) = self.config.latency_ms.get(system_id) {
            tokio::time::sleep(std::time::Duration::from_millis(ms)).await;
        }

        if self.config.failing.contains(system_id) {
            return Err(Error::Request(format!(
                "simulated failure for {}",
                system_id
            )));
        }

        Ok(self
            .config
            .histories
            .get(system_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_test_run(&self, run_id: &str) -> Result<TestRunDetail> {
        self.log_call("get_test_run", None, None);
        self.config
            .runs
            .get(run_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("test run {}", run_id)))
    }
}

/// Build hourly runs for `system_id` from scores, oldest first.
pub fn runs_from_scores(system_id: &str, scores: &[Option<f64>]) -> Vec<TestRunSummary> {
    let base = Utc
        .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or_default();
    scores
        .iter()
        .enumerate()
        .map(|(i, &score)| TestRunSummary {
            id: format!("{}-run-{}", system_id, i),
            created_at: base + Duration::hours(i as i64),
            avg_score: score,
            total_samples: Some(10),
            is_scheduled: false,
        })
        .collect()
}

/// A prompt system with only an id and name.
pub fn prompt_system(id: &str, name: &str) -> PromptSystem {
    PromptSystem {
        id: id.to_string(),
        name: name.to_string(),
        template: None,
        provider: None,
        model: None,
        temperature: None,
        max_tokens: None,
        top_p: None,
        top_k: None,
        created_at: None,
    }
}
