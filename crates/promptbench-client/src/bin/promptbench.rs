//! promptbench: terminal dashboard for prompt-system run history.
//!
//! Reads prompt systems and their test-run history from the harness API,
//! computes per-system averages and trends, and prints paginated tables.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use promptbench_client::report::{
    controls_line, history_table, metrics_summary, page_footer, results_table, run_summary,
    system_rows, systems_table, HistoryReport, PageReport,
};
use promptbench_client::{
    classify, ClientConfig, ConfigOverrides, HistorySource, HistoryWindow, HttpHistoryClient,
    MetricsCollector, PageState,
};

#[derive(Parser)]
#[command(name = "promptbench")]
#[command(author, version, about = "Prompt-system run history and trends")]
#[command(propagate_version = true)]
struct Cli {
    /// Harness API base URL (overrides config and PROMPTBENCH_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Path to a client.toml config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List prompt systems with average score, run count and trend
    Systems {
        /// Page to show (clamped to the last page)
        #[arg(long, default_value_t = 1)]
        page: usize,

        /// Rows per page: 5, 10, 25 or 50
        #[arg(long)]
        per_page: Option<usize>,

        /// History window in days (1, 7, 30 or 90 match the dashboard presets)
        #[arg(long)]
        days: Option<u32>,
    },

    /// Show run history and metrics for one prompt system
    History {
        /// Prompt system id
        system_id: String,

        /// History window in days (1, 7, 30 or 90 match the dashboard presets)
        #[arg(long)]
        days: Option<u32>,

        /// Page to show (clamped to the last page)
        #[arg(long, default_value_t = 1)]
        page: usize,

        /// Rows per page: 5, 10, 25 or 50
        #[arg(long)]
        per_page: Option<usize>,
    },

    /// Show one test run with its per-sample results
    Run {
        /// Test run id
        run_id: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let _log_guard = init_tracing();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Initialize tracing on stderr, or a daily-rolled file when LOG_FILE is set.
///
/// Environment variables:
///   LOG_FORMAT  - "json" or "text" (default: "text")
///   LOG_FILE    - path to log file (optional)
///   LOG_ANSI    - "true"/"false" override ANSI colors
///   RUST_LOG    - standard env filter (default: "promptbench=info,promptbench_client=info")
fn init_tracing() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_file = std::env::var("LOG_FILE").ok();
    let log_ansi = std::env::var("LOG_ANSI")
        .ok()
        .map(|v| v == "true" || v == "1");

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "promptbench=info,promptbench_client=info".into());

    let registry = tracing_subscriber::registry().with(env_filter);

    let guard = if let Some(ref path) = log_file {
        let path = std::path::Path::new(path);
        let file_dir = path.parent().unwrap_or(std::path::Path::new("."));
        let file_name = path
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("promptbench.log");
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        if log_format == "json" {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking),
                )
                .init();
        } else {
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(log_ansi.unwrap_or(false));
            registry.with(layer).init();
        }
        Some(guard)
    } else {
        // stdout carries tables and JSON
        if log_format == "json" {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr),
                )
                .init();
        } else {
            let mut layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
            if let Some(ansi) = log_ansi {
                layer = layer.with_ansi(ansi);
            }
            registry.with(layer).init();
        }
        None
    };

    debug!(
        log_format = %log_format,
        log_file = log_file.as_deref().unwrap_or("(stderr)"),
        "Logging initialized"
    );
    guard
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut overrides = ConfigOverrides {
        base_url: cli.api_url,
        ..Default::default()
    };
    if let Commands::Systems { per_page, days, .. } | Commands::History { per_page, days, .. } =
        &cli.command
    {
        overrides.page_size = *per_page;
        overrides.history_days = *days;
    }

    let config = ClientConfig::resolve(cli.config.as_deref(), overrides)
        .context("invalid client configuration")?;

    match cli.command {
        Commands::Systems { page, .. } => cmd_systems(&config, page, cli.json).await,
        Commands::History {
            system_id, page, ..
        } => cmd_history(&config, &system_id, page, cli.json).await,
        Commands::Run { run_id } => cmd_run(&config, &run_id, cli.json).await,
    }
}

async fn cmd_systems(config: &ClientConfig, page: usize, json: bool) -> anyhow::Result<()> {
    let window = HistoryWindow::new(config.history_days)?;
    let mut state = PageState::new(config.page_size)?;
    state.go_to(page);

    let client = HttpHistoryClient::new(config)?;
    info!(base_url = %client.base_url(), days = window.days(), "Collecting system metrics");

    let collector = MetricsCollector::new(Arc::new(client))
        .with_window(window)
        .with_max_concurrent(config.max_concurrent_fetches);
    let (systems, table) = collector
        .collect_for_all_systems()
        .await
        .context("failed to list prompt systems")?;

    let page = state.paginate(&systems);

    if json {
        let report = PageReport::new(&page, system_rows(page.items, &table));
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Prompt systems ({})", window.label());
    println!();
    print!("{}", systems_table(page.items, &table));
    println!();
    println!("{}", page_footer(&page));
    let controls = controls_line(&page.controls());
    if !controls.is_empty() {
        println!("{}", controls);
    }
    Ok(())
}

async fn cmd_history(
    config: &ClientConfig,
    system_id: &str,
    page: usize,
    json: bool,
) -> anyhow::Result<()> {
    let window = HistoryWindow::new(config.history_days)?;
    let mut state = PageState::new(config.page_size)?;
    state.go_to(page);

    let client = HttpHistoryClient::new(config)?;
    let system = client.get_prompt_system(system_id).await?;
    let runs = client
        .fetch_history(system_id, window)
        .await
        .with_context(|| format!("failed to fetch history for {}", system_id))?;
    let metrics = classify(&runs);

    let page = state.paginate(&runs);

    if json {
        let report = HistoryReport {
            system_id,
            days: window.days(),
            metrics,
            runs: PageReport::new(&page, page.items.iter().collect()),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{} ({})", system.name, window.label());
    println!("{}", metrics_summary(&metrics));
    println!();
    print!("{}", history_table(page.items));
    println!();
    println!("{}", page_footer(&page));
    let controls = controls_line(&page.controls());
    if !controls.is_empty() {
        println!("{}", controls);
    }
    Ok(())
}

async fn cmd_run(config: &ClientConfig, run_id: &str, json: bool) -> anyhow::Result<()> {
    let client = HttpHistoryClient::new(config)?;
    let detail = client.get_test_run(run_id).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&detail)?);
        return Ok(());
    }

    println!("{}", run_summary(&detail.test_run));
    if detail.results.is_empty() {
        println!("No sample results");
    } else {
        print!("{}", results_table(&detail.results));
    }
    Ok(())
}
