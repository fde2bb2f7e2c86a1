//! Plain-text and JSON output for the `promptbench` dashboard.

use serde::Serialize;
use std::fmt::Write as _;

use promptbench_core::{
    Page, PageControl, PromptSystem, RunMetrics, SampleResult, TestRun, TestRunSummary,
};

use crate::metrics::SystemMetricsTable;

/// Placeholder for missing optional columns.
const EMPTY: &str = "-";

/// Longest free-text cell in the sample results table.
const MAX_TEXT_CELL: usize = 40;

// =============================================================================
// JSON ROWS
// =============================================================================

/// One prompt system with its metrics, as emitted by `--json`.
#[derive(Debug, Clone, Serialize)]
pub struct SystemRow<'a> {
    pub id: &'a str,
    pub name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<&'a str>,
    pub metrics: RunMetrics,
    pub fetch_failed: bool,
}

/// A page of rows plus the page-button model.
#[derive(Debug, Clone, Serialize)]
pub struct PageReport<R> {
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub total_items: usize,
    pub rows: Vec<R>,
    pub controls: Vec<PageControl>,
}

impl<R> PageReport<R> {
    pub fn new<T>(page: &Page<'_, T>, rows: Vec<R>) -> Self {
        Self {
            page: page.page,
            page_size: page.page_size,
            total_pages: page.total_pages,
            total_items: page.total_items,
            rows,
            controls: page.controls(),
        }
    }
}

/// History for one system: metrics over the whole window, runs for one page.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryReport<'a> {
    pub system_id: &'a str,
    pub days: u32,
    pub metrics: RunMetrics,
    pub runs: PageReport<&'a TestRunSummary>,
}

pub fn system_rows<'a>(
    systems: &'a [PromptSystem],
    table: &SystemMetricsTable,
) -> Vec<SystemRow<'a>> {
    systems
        .iter()
        .map(|s| SystemRow {
            id: &s.id,
            name: &s.name,
            provider: s.provider.as_deref(),
            model: s.model.as_deref(),
            metrics: table.get_or_neutral(&s.id),
            fetch_failed: table.is_failed(&s.id),
        })
        .collect()
}

// =============================================================================
// TEXT TABLES
// =============================================================================

/// Render prompt systems with their average, run count and trend.
pub fn systems_table(systems: &[PromptSystem], table: &SystemMetricsTable) -> String {
    let rows: Vec<[String; 6]> = systems
        .iter()
        .map(|s| {
            let metrics = table.get_or_neutral(&s.id);
            let trend = if table.is_failed(&s.id) {
                format!("{} (unavailable)", metrics.trend.label())
            } else {
                metrics.trend.label().to_string()
            };
            [
                s.name.clone(),
                s.provider.clone().unwrap_or_else(|| EMPTY.to_string()),
                s.model.clone().unwrap_or_else(|| EMPTY.to_string()),
                metrics.display_average(),
                metrics.count.to_string(),
                trend,
            ]
        })
        .collect();

    render_table(
        ["Name", "Provider", "Model", "Avg Score", "Runs", "Trend"],
        &rows,
    )
}

/// Render a run history page.
pub fn history_table(runs: &[TestRunSummary]) -> String {
    let rows: Vec<[String; 4]> = runs
        .iter()
        .map(|r| {
            [
                r.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                format!("{:.2}", r.score_or_zero()),
                r.samples_or_zero().to_string(),
                if r.is_scheduled { "yes" } else { "no" }.to_string(),
            ]
        })
        .collect();

    render_table(["Date", "Score", "Samples", "Scheduled"], &rows)
}

/// Header block for a single test run.
pub fn run_summary(run: &TestRun) -> String {
    format!(
        "Run ID: {}\nTimestamp: {}\nAverage Score: {:.2}\nTotal Samples: {}\nPrompt System: {}\n",
        run.id,
        run.created_at.format("%Y-%m-%d %H:%M:%S"),
        run.score_or_zero(),
        run.samples_or_zero(),
        run.system_name()
    )
}

/// Render per-sample results of a test run. Long text is cut to fit.
pub fn results_table(results: &[SampleResult]) -> String {
    let rows: Vec<[String; 5]> = results
        .iter()
        .map(|r| {
            [
                r.sample_number(),
                truncate_cell(r.input_variables_compact().as_deref()),
                truncate_cell(r.expected_output.as_deref()),
                truncate_cell(r.predicted_output.as_deref()),
                format!("{:.2}", r.score_or_zero()),
            ]
        })
        .collect();

    render_table(
        ["Sample", "Input Variables", "Expected", "Predicted", "Score"],
        &rows,
    )
}

/// One-line summary of a system's metrics.
pub fn metrics_summary(metrics: &RunMetrics) -> String {
    format!(
        "Average Score: {}  |  Total Runs: {}  |  Trend: {}",
        metrics.display_average(),
        metrics.count,
        metrics.trend.label()
    )
}

/// Render the page-button row, e.g. `< Prev 1 ... 4 5 [6] 7 8 ... 12 Next >`.
pub fn controls_line(controls: &[PageControl]) -> String {
    let parts: Vec<String> = controls
        .iter()
        .map(|c| match c {
            PageControl::Previous { .. } => "< Prev".to_string(),
            PageControl::Page {
                number,
                current: true,
            } => format!("[{}]", number),
            PageControl::Page { number, .. } => number.to_string(),
            PageControl::Ellipsis => "...".to_string(),
            PageControl::Next { .. } => "Next >".to_string(),
        })
        .collect();
    parts.join(" ")
}

/// "Showing 11-20 of 37", or "No items" for an empty list.
pub fn page_footer<T>(page: &Page<'_, T>) -> String {
    if page.total_items == 0 {
        return "No items".to_string();
    }
    format!(
        "Showing {}-{} of {} (page {} of {})",
        page.start_index + 1,
        page.end_index,
        page.total_items,
        page.page,
        page.total_pages
    )
}

/// Flatten to one line and cut to [`MAX_TEXT_CELL`] characters.
fn truncate_cell(text: Option<&str>) -> String {
    let Some(text) = text else {
        return EMPTY.to_string();
    };
    let flat: String = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= MAX_TEXT_CELL {
        return flat;
    }
    let cut: String = flat.chars().take(MAX_TEXT_CELL - 3).collect();
    format!("{}...", cut)
}

fn render_table<const N: usize>(headers: [&str; N], rows: &[[String; N]]) -> String {
    let mut widths: [usize; N] = headers.map(|h| h.chars().count());
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let header_cells: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
    push_row(&mut out, &header_cells, &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    push_row(&mut out, &rule, &widths);
    for row in rows {
        push_row(&mut out, row, &widths);
    }
    out
}

fn push_row(out: &mut String, cells: &[String], widths: &[usize]) {
    let line: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
        .collect();
    let _ = writeln!(out, "{}", line.join("  ").trim_end());
}
