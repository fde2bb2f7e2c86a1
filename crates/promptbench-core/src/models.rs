//! Core data models for promptbench.
//!
//! These types mirror the payloads returned by the harness REST API and are
//! shared by every promptbench crate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::defaults;
use crate::error::{Error, Result};

// =============================================================================
// TEST RUN TYPES
// =============================================================================

/// One past test run of a prompt system, as returned by the history endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestRunSummary {
    pub id: String,
    #[serde(with = "api_timestamp")]
    pub created_at: DateTime<Utc>,
    /// Mean score over all samples in [0, 1]. `None` while a run has not been
    /// scored.
    #[serde(default)]
    pub avg_score: Option<f64>,
    #[serde(default)]
    pub total_samples: Option<u32>,
    /// True when the run was fired by a test schedule rather than by hand.
    #[serde(default)]
    pub is_scheduled: bool,
}

impl TestRunSummary {
    /// Score used for aggregation; a missing score counts as 0.
    pub fn score_or_zero(&self) -> f64 {
        self.avg_score.unwrap_or(0.0)
    }

    /// Sample count used for display; a missing count shows as 0.
    pub fn samples_or_zero(&self) -> u32 {
        self.total_samples.unwrap_or(0)
    }
}

/// Returns true if runs are in non-decreasing `created_at` order.
pub fn is_chronological(runs: &[TestRunSummary]) -> bool {
    runs.windows(2).all(|w| w[0].created_at <= w[1].created_at)
}

/// Stable-sort runs oldest first.
pub fn sort_chronologically(runs: &mut [TestRunSummary]) {
    runs.sort_by_key(|r| r.created_at);
}

// =============================================================================
// PROMPT SYSTEM TYPES
// =============================================================================

/// A named configuration of template, provider, model and sampling settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptSystem {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    #[serde(
        default,
        with = "api_timestamp::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
}

/// Order systems newest first. Systems without a timestamp go last.
pub fn sort_newest_first(systems: &mut [PromptSystem]) {
    systems.sort_by(|a, b| match (a.created_at, b.created_at) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
}

// =============================================================================
// TEST RUN DETAIL TYPES
// =============================================================================

/// A single test run as returned by `GET /test-runs/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestRun {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_system_id: Option<String>,
    #[serde(with = "api_timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub avg_score: Option<f64>,
    #[serde(default)]
    pub total_samples: Option<u32>,
    /// The owning system, when the API embeds it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_system: Option<PromptSystem>,
}

impl TestRun {
    pub fn score_or_zero(&self) -> f64 {
        self.avg_score.unwrap_or(0.0)
    }

    pub fn samples_or_zero(&self) -> u32 {
        self.total_samples.unwrap_or(0)
    }

    /// Name of the owning system, or "Unknown" when not embedded.
    pub fn system_name(&self) -> &str {
        self.prompt_system
            .as_ref()
            .map(|s| s.name.as_str())
            .unwrap_or("Unknown")
    }
}

/// Outcome of one regression sample within a test run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleResult {
    pub id: String,
    /// Zero-based position in the regression set, as a string.
    #[serde(default)]
    pub sample_id: String,
    /// Template variables as a JSON-encoded object.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_variables: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predicted_output: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaluation_method: Option<String>,
}

impl SampleResult {
    /// One-based sample number for display. Non-numeric ids are shown as-is.
    pub fn sample_number(&self) -> String {
        match self.sample_id.trim().parse::<u64>() {
            Ok(n) => n.saturating_add(1).to_string(),
            Err(_) => self.sample_id.clone(),
        }
    }

    /// Input variables re-encoded as compact JSON. Malformed input is
    /// returned unchanged.
    pub fn input_variables_compact(&self) -> Option<String> {
        let raw = self.input_variables.as_deref()?;
        Some(match serde_json::from_str::<serde_json::Value>(raw) {
            Ok(value) => value.to_string(),
            Err(_) => raw.to_string(),
        })
    }

    pub fn score_or_zero(&self) -> f64 {
        self.score.unwrap_or(0.0)
    }
}

/// A test run together with its per-sample results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestRunDetail {
    pub test_run: TestRun,
    #[serde(default)]
    pub results: Vec<SampleResult>,
}

// =============================================================================
// HISTORY WINDOW
// =============================================================================

/// Look-back window for the history endpoint, in whole days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct HistoryWindow(u32);

impl HistoryWindow {
    /// Create a window of `days` days. Zero is rejected.
    pub fn new(days: u32) -> Result<Self> {
        if days == 0 {
            return Err(Error::InvalidInput(
                "history window must be at least one day".to_string(),
            ));
        }
        Ok(Self(days))
    }

    pub fn days(&self) -> u32 {
        self.0
    }

    /// Human label, e.g. "Last 24 hours" or "Last 30 days".
    pub fn label(&self) -> String {
        match self.0 {
            1 => "Last 24 hours".to_string(),
            n => format!("Last {} days", n),
        }
    }
}

impl Default for HistoryWindow {
    fn default() -> Self {
        Self(defaults::HISTORY_DAYS)
    }
}

impl TryFrom<u32> for HistoryWindow {
    type Error = Error;

    fn try_from(days: u32) -> Result<Self> {
        Self::new(days)
    }
}

impl From<HistoryWindow> for u32 {
    fn from(window: HistoryWindow) -> Self {
        window.0
    }
}

impl fmt::Display for HistoryWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d", self.0)
    }
}

// =============================================================================
// TIMESTAMPS
// =============================================================================

/// Serde adapter for API timestamps.
///
/// The harness emits ISO-8601 strings that usually carry no offset
/// (`2024-03-01T12:30:00.123456`). Those are read as UTC; strings with an
/// offset are converted to UTC. Values are always written as RFC 3339.
pub mod api_timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    /// Parse a timestamp string as emitted by the harness API.
    pub fn parse(s: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(dt.with_timezone(&Utc));
        }
        s.parse::<NaiveDateTime>().ok().map(|n| n.and_utc())
    }

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&dt.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        parse(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {}", raw)))
    }

    pub mod option {
        use chrono::{DateTime, Utc};
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            dt: &Option<DateTime<Utc>>,
            s: S,
        ) -> Result<S::Ok, S::Error> {
            match dt {
                Some(dt) => s.serialize_str(&dt.to_rfc3339()),
                None => s.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            d: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            match Option::<String>::deserialize(d)? {
                Some(raw) => super::parse(&raw).map(Some).ok_or_else(|| {
                    serde::de::Error::custom(format!("invalid timestamp: {}", raw))
                }),
                None => Ok(None),
            }
        }
    }
}
