//! # promptbench-core
//!
//! Core types, traits, and computations for the promptbench test harness
//! dashboard.
//!
//! This crate provides the data structures returned by the harness REST API,
//! the run-history trend classifier, client-side pagination, and the
//! [`HistorySource`] trait that fetch layers implement.

pub mod defaults;
pub mod error;
pub mod models;
pub mod pagination;
pub mod traits;
pub mod trend;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use models::*;
pub use pagination::{page_controls, paginate, Page, PageControl, PageState};
pub use traits::*;
pub use trend::{classify, classify_scores, RunMetrics, Trend};
