//! Run-history aggregation and trend classification.
//!
//! Given a system's test runs in chronological order, [`classify`] reports the
//! mean score, the run count, and whether scores are improving, declining, or
//! stable. The trend compares the mean of the most recent
//! [`TREND_WINDOW`](crate::defaults::TREND_WINDOW) runs against the mean of the
//! window immediately before it, with a
//! [`TREND_THRESHOLD`](crate::defaults::TREND_THRESHOLD) band on either side.
//!
//! Missing scores count as 0. They are not skipped, so the average is a lower
//! bound whenever some runs are unscored.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::defaults::{SCORE_DISPLAY_DECIMALS, TREND_THRESHOLD, TREND_WINDOW};
use crate::error::Error;
use crate::models::TestRunSummary;

/// Qualitative direction of recent scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    #[default]
    Stable,
    Improving,
    Declining,
}

impl Trend {
    /// Capitalized label for display ("Improving").
    pub fn label(&self) -> &'static str {
        match self {
            Self::Stable => "Stable",
            Self::Improving => "Improving",
            Self::Declining => "Declining",
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stable => write!(f, "stable"),
            Self::Improving => write!(f, "improving"),
            Self::Declining => write!(f, "declining"),
        }
    }
}

impl FromStr for Trend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "stable" => Ok(Self::Stable),
            "improving" => Ok(Self::Improving),
            "declining" => Ok(Self::Declining),
            _ => Err(Error::InvalidInput(format!("unknown trend: {}", s))),
        }
    }
}

/// Aggregate metrics over one system's run history.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RunMetrics {
    /// Mean score at full precision.
    pub average: f64,
    pub count: usize,
    pub trend: Trend,
}

impl RunMetrics {
    /// The record shown for a system with no history or a failed fetch.
    pub fn neutral() -> Self {
        Self::default()
    }

    /// Average rounded to the display precision.
    pub fn rounded_average(&self) -> f64 {
        let factor = 10f64.powi(SCORE_DISPLAY_DECIMALS as i32);
        (self.average * factor).round() / factor
    }

    /// Average formatted for display ("0.90").
    pub fn display_average(&self) -> String {
        format!("{:.*}", SCORE_DISPLAY_DECIMALS, self.average)
    }
}

/// Compute metrics for runs ordered oldest first.
///
/// # Precondition
///
/// `runs` must already be in chronological order. This function does not sort;
/// given a different order the recent-versus-older comparison is computed over
/// the wrong runs. [`crate::models::is_chronological`] can check the order.
pub fn classify(runs: &[TestRunSummary]) -> RunMetrics {
    let scores: Vec<Option<f64>> = runs.iter().map(|r| r.avg_score).collect();
    classify_scores(&scores)
}

/// [`classify`] over bare scores, oldest first.
pub fn classify_scores(scores: &[Option<f64>]) -> RunMetrics {
    let count = scores.len();
    if count == 0 {
        return RunMetrics::neutral();
    }

    RunMetrics {
        average: mean(scores),
        count,
        trend: trend_of(scores),
    }
}

fn trend_of(scores: &[Option<f64>]) -> Trend {
    let count = scores.len();
    if count < 2 {
        return Trend::Stable;
    }

    let recent_start = count.saturating_sub(TREND_WINDOW);
    let older_start = recent_start.saturating_sub(TREND_WINDOW);
    let recent = &scores[recent_start..];
    let older = &scores[older_start..recent_start];

    if recent.is_empty() || older.is_empty() {
        return Trend::Stable;
    }

    let recent_avg = mean(recent);
    let older_avg = mean(older);

    if recent_avg > older_avg + TREND_THRESHOLD {
        Trend::Improving
    } else if recent_avg < older_avg - TREND_THRESHOLD {
        Trend::Declining
    } else {
        Trend::Stable
    }
}

fn mean(scores: &[Option<f64>]) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }
    let total: f64 = scores.iter().map(|s| s.unwrap_or(0.0)).sum();
    total / scores.len() as f64
}
