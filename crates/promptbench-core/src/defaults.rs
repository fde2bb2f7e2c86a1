//! Centralized default constants for promptbench.
//!
//! **This module is the single source of truth** for shared default values.
//! Crates and the CLI reference these constants instead of defining their own
//! magic numbers.

// =============================================================================
// TREND CLASSIFICATION
// =============================================================================

/// Number of most recent runs compared against the preceding window.
pub const TREND_WINDOW: usize = 3;

/// Minimum difference between window means before a trend is reported.
pub const TREND_THRESHOLD: f64 = 0.1;

/// Decimal places used when displaying average scores.
pub const SCORE_DISPLAY_DECIMALS: usize = 2;

// =============================================================================
// PAGINATION
// =============================================================================

/// Page sizes offered by list views.
pub const PAGE_SIZE_OPTIONS: [usize; 4] = [5, 10, 25, 50];

/// Default page size for list views.
pub const PAGE_SIZE: usize = 10;

/// Maximum number of contiguous numbered page buttons.
pub const MAX_VISIBLE_PAGES: usize = 5;

// =============================================================================
// HISTORY
// =============================================================================

/// Default look-back window for the history endpoint, in days.
pub const HISTORY_DAYS: u32 = 7;

// =============================================================================
// CLIENT
// =============================================================================

/// Default harness API base URL.
pub const API_URL: &str = "http://localhost:8000";

/// Timeout for harness API requests in seconds.
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum number of history fetches in flight at once.
pub const MAX_CONCURRENT_FETCHES: usize = 8;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_page_size_is_an_option() {
        assert!(PAGE_SIZE_OPTIONS.contains(&PAGE_SIZE));
    }

    #[test]
    fn test_page_size_options_ascending() {
        assert!(PAGE_SIZE_OPTIONS.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_visible_pages_odd() {
        // An odd window keeps the current page centered.
        assert_eq!(MAX_VISIBLE_PAGES % 2, 1);
    }
}
