//! # promptbench-client
//!
//! Fetch layer and dashboard output for promptbench.
//!
//! This crate provides:
//! - [`HttpHistoryClient`], a [`HistorySource`] backed by the harness REST API
//! - [`MetricsCollector`], which fetches every system's history concurrently
//!   and merges the results into a [`SystemMetricsTable`]
//! - Client configuration from TOML files or `PROMPTBENCH_*` environment
//!   variables
//! - Plain-text table rendering used by the `promptbench` binary
//!
//! # Feature Flags
//!
//! - `mock`: expose [`mock::MockHistorySource`] for downstream tests
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use promptbench_client::{ClientConfig, HttpHistoryClient, MetricsCollector};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ClientConfig::from_env();
//!     let client = HttpHistoryClient::new(&config).unwrap();
//!     let collector = MetricsCollector::new(Arc::new(client));
//!     let (systems, table) = collector.collect_for_all_systems().await.unwrap();
//!     for system in &systems {
//!         println!("{}: {}", system.name, table.get_or_neutral(&system.id).trend);
//!     }
//! }
//! ```

pub mod config;
pub mod http;
pub mod metrics;
pub mod report;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

// Re-export core types
pub use promptbench_core::*;

pub use config::{ClientConfig, ConfigError, ConfigOverrides, ConfigResult};
pub use http::HttpHistoryClient;
pub use metrics::{MetricsCollector, SystemMetricsTable};
