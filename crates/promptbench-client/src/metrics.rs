//! Concurrent per-system metrics collection.
//!
//! [`MetricsCollector`] fetches the history of every requested prompt system
//! on its own task and merges each result into a [`SystemMetricsTable`] as it
//! completes. Fetches are independent: a failure for one system records the
//! neutral metrics for that system and never affects the others.

use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, trace, warn};

use promptbench_core::{
    classify, defaults, sort_newest_first, Error, HistorySource, HistoryWindow, PromptSystem,
    Result, RunMetrics,
};

/// Metrics keyed by prompt system id.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SystemMetricsTable {
    entries: BTreeMap<String, RunMetrics>,
    #[serde(skip_serializing_if = "HashSet::is_empty")]
    failed: HashSet<String>,
}

impl SystemMetricsTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record metrics computed from a successful fetch.
    pub fn insert(&mut self, system_id: impl Into<String>, metrics: RunMetrics) {
        let system_id = system_id.into();
        self.failed.remove(&system_id);
        self.entries.insert(system_id, metrics);
    }

    /// Record a failed fetch; the system shows the neutral metrics.
    pub fn insert_failed(&mut self, system_id: impl Into<String>) {
        let system_id = system_id.into();
        self.entries.insert(system_id.clone(), RunMetrics::neutral());
        self.failed.insert(system_id);
    }

    pub fn get(&self, system_id: &str) -> Option<&RunMetrics> {
        self.entries.get(system_id)
    }

    /// Metrics for `system_id`, or the neutral record if none were collected.
    pub fn get_or_neutral(&self, system_id: &str) -> RunMetrics {
        self.entries.get(system_id).copied().unwrap_or_default()
    }

    /// True if the last fetch for `system_id` failed.
    pub fn is_failed(&self, system_id: &str) -> bool {
        self.failed.contains(system_id)
    }

    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }

    pub fn contains(&self, system_id: &str) -> bool {
        self.entries.contains_key(system_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Fetches run histories concurrently and computes per-system metrics.
pub struct MetricsCollector {
    source: Arc<dyn HistorySource>,
    window: HistoryWindow,
    max_concurrent: usize,
}

impl MetricsCollector {
    pub fn new(source: Arc<dyn HistorySource>) -> Self {
        Self {
            source,
            window: HistoryWindow::default(),
            max_concurrent: defaults::MAX_CONCURRENT_FETCHES,
        }
    }

    /// Set the history window requested for every system.
    pub fn with_window(mut self, window: HistoryWindow) -> Self {
        self.window = window;
        self
    }

    /// Bound the number of fetches in flight. Zero is treated as one.
    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    pub fn window(&self) -> HistoryWindow {
        self.window
    }

    /// Metrics for a single system. Errors propagate to the caller.
    pub async fn metrics_for(&self, system_id: &str) -> Result<RunMetrics> {
        let runs = self.source.fetch_history(system_id, self.window).await?;
        Ok(classify(&runs))
    }

    /// Collect metrics for every id in `system_ids`.
    ///
    /// Never fails: each system whose fetch errors (or whose task panics) gets
    /// the neutral record and is marked failed in the returned table.
    #[instrument(skip(self, system_ids), fields(op = "collect", systems = system_ids.len(), days = self.window.days()))]
    pub async fn collect(&self, system_ids: &[String]) -> SystemMetricsTable {
        let start = Instant::now();
        let mut table = SystemMetricsTable::new();
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let mut tasks = JoinSet::new();

        for system_id in system_ids {
            let source = Arc::clone(&self.source);
            let semaphore = Arc::clone(&semaphore);
            let system_id = system_id.clone();
            let window = self.window;

            tasks.spawn(async move {
                let result = match semaphore.acquire_owned().await {
                    Ok(_permit) => source.fetch_history(&system_id, window).await,
                    Err(e) => Err(Error::Internal(format!("fetch limiter closed: {}", e))),
                };
                (system_id, result)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((system_id, Ok(runs))) => {
                    let metrics = classify(&runs);
                    trace!(
                        system_id = %system_id,
                        result_count = runs.len(),
                        trend = %metrics.trend,
                        "Computed system metrics"
                    );
                    table.insert(system_id, metrics);
                }
                Ok((system_id, Err(e))) => {
                    warn!(
                        system_id = %system_id,
                        error = %e,
                        "Failed to fetch history, using neutral metrics"
                    );
                    table.insert_failed(system_id);
                }
                Err(e) => {
                    warn!(error = ?e, "History fetch task panicked");
                }
            }
        }

        // A panicked task cannot report its id; fill whatever is still missing.
        for system_id in system_ids {
            if !table.contains(system_id) {
                table.insert_failed(system_id.clone());
            }
        }

        info!(
            result_count = table.len(),
            failed_count = table.failed_count(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Collected system metrics"
        );
        table
    }

    /// List all prompt systems (newest first) and collect metrics for each.
    ///
    /// Fails only if the system listing itself fails.
    pub async fn collect_for_all_systems(&self) -> Result<(Vec<PromptSystem>, SystemMetricsTable)> {
        let mut systems = self.source.list_prompt_systems().await?;
        sort_newest_first(&mut systems);
        debug!(result_count = systems.len(), "Listed prompt systems for metrics");

        let ids: Vec<String> = systems.iter().map(|s| s.id.clone()).collect();
        let table = self.collect(&ids).await;
        Ok((systems, table))
    }
}
