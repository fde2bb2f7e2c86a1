//! Core traits for promptbench abstractions.
//!
//! These traits define the interfaces that fetch layers must satisfy,
//! enabling pluggable backends and testability.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{HistoryWindow, PromptSystem, TestRunDetail, TestRunSummary};

// =============================================================================
// HISTORY SOURCE
// =============================================================================

/// Read access to prompt systems and their test-run history.
#[async_trait]
pub trait HistorySource: Send + Sync {
    /// List all prompt systems.
    async fn list_prompt_systems(&self) -> Result<Vec<PromptSystem>>;

    /// Fetch a single prompt system by id.
    async fn get_prompt_system(&self, system_id: &str) -> Result<PromptSystem>;

    /// Fetch runs for one system within `window`, oldest first.
    async fn fetch_history(
        &self,
        system_id: &str,
        window: HistoryWindow,
    ) -> Result<Vec<TestRunSummary>>;

    /// Fetch one test run with its per-sample results.
    async fn get_test_run(&self, run_id: &str) -> Result<TestRunDetail>;
}
