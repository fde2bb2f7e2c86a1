//! Client-side pagination over in-memory lists.
//!
//! [`paginate`] slices a list into 1-based pages and [`page_controls`] builds
//! the numbered page-button model shown under a table. [`PageState`] holds the
//! current page and page size for a view.
//!
//! Page requests are clamped into `[1, total_pages]`, so asking for page 9 of
//! a 3-page list returns page 3 instead of an empty slice.

use serde::{Deserialize, Serialize};

use crate::defaults::{MAX_VISIBLE_PAGES, PAGE_SIZE, PAGE_SIZE_OPTIONS};
use crate::error::{Error, Result};

/// One page of a list.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<'a, T> {
    pub items: &'a [T],
    /// Effective 1-based page after clamping.
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub total_items: usize,
    /// 0-based inclusive start into the full list.
    pub start_index: usize,
    /// 0-based exclusive end into the full list.
    pub end_index: usize,
}

impl<'a, T> Page<'a, T> {
    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    /// Page-button model for this page.
    pub fn controls(&self) -> Vec<PageControl> {
        page_controls(self.page, self.total_pages)
    }
}

/// Slice `items` into the requested 1-based page.
///
/// Returns [`Error::InvalidInput`] when `page_size` is zero. An out-of-range
/// `page` is clamped to the nearest valid page; an empty list yields page 1
/// with no items and zero pages.
pub fn paginate<T>(items: &[T], page: usize, page_size: usize) -> Result<Page<'_, T>> {
    if page_size == 0 {
        return Err(Error::InvalidInput(
            "page size must be greater than zero".to_string(),
        ));
    }
    Ok(slice_page(items, page, page_size))
}

fn slice_page<T>(items: &[T], page: usize, page_size: usize) -> Page<'_, T> {
    let total_items = items.len();
    let total_pages = total_items.div_ceil(page_size);
    let page = if total_pages == 0 {
        1
    } else {
        page.clamp(1, total_pages)
    };

    let start_index = ((page - 1) * page_size).min(total_items);
    let end_index = (start_index + page_size).min(total_items);

    Page {
        items: &items[start_index..end_index],
        page,
        page_size,
        total_pages,
        total_items,
        start_index,
        end_index,
    }
}

// =============================================================================
// PAGE CONTROLS
// =============================================================================

/// One element of the page-button row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PageControl {
    /// "Previous" button targeting the given page.
    Previous { target: usize },
    /// Numbered page button.
    Page { number: usize, current: bool },
    /// Gap marker between non-adjacent page numbers.
    Ellipsis,
    /// "Next" button targeting the given page.
    Next { target: usize },
}

/// Build the page-button row for `page` out of `total_pages`.
///
/// Shows at most [`MAX_VISIBLE_PAGES`] contiguous numbers centered on the
/// current page. The first and last page stay reachable through their own
/// buttons, with an ellipsis when the window leaves a gap. Nothing is shown
/// when there is at most one page.
pub fn page_controls(page: usize, total_pages: usize) -> Vec<PageControl> {
    if total_pages <= 1 {
        return Vec::new();
    }

    let page = page.clamp(1, total_pages);
    let mut start = page.saturating_sub(MAX_VISIBLE_PAGES / 2).max(1);
    let end = start
        .saturating_add(MAX_VISIBLE_PAGES - 1)
        .min(total_pages);
    if end - start + 1 < MAX_VISIBLE_PAGES {
        start = end.saturating_sub(MAX_VISIBLE_PAGES - 1).max(1);
    }

    let mut controls = Vec::with_capacity(MAX_VISIBLE_PAGES + 6);

    if page > 1 {
        controls.push(PageControl::Previous { target: page - 1 });
    }

    if start > 1 {
        controls.push(PageControl::Page {
            number: 1,
            current: false,
        });
        if start > 2 {
            controls.push(PageControl::Ellipsis);
        }
    }

    for number in start..=end {
        controls.push(PageControl::Page {
            number,
            current: number == page,
        });
    }

    if end < total_pages {
        if end < total_pages - 1 {
            controls.push(PageControl::Ellipsis);
        }
        controls.push(PageControl::Page {
            number: total_pages,
            current: false,
        });
    }

    if page < total_pages {
        controls.push(PageControl::Next { target: page + 1 });
    }

    controls
}

// =============================================================================
// PAGE STATE
// =============================================================================

/// Current page and page size of a paginated view.
///
/// Call [`PageState::reset`] whenever the underlying list changes identity
/// (another system selected, a new search); changing the page size resets
/// to page 1 on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageState {
    current_page: usize,
    items_per_page: usize,
}

impl PageState {
    /// Start on page 1 with a page size from [`PAGE_SIZE_OPTIONS`].
    pub fn new(items_per_page: usize) -> Result<Self> {
        validate_page_size(items_per_page)?;
        Ok(Self {
            current_page: 1,
            items_per_page,
        })
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn items_per_page(&self) -> usize {
        self.items_per_page
    }

    /// Jump to a page. Page 0 is treated as page 1; the upper bound is
    /// applied when the state is used to paginate.
    pub fn go_to(&mut self, page: usize) {
        self.current_page = page.max(1);
    }

    pub fn next(&mut self) {
        self.current_page = self.current_page.saturating_add(1);
    }

    pub fn previous(&mut self) {
        self.current_page = self.current_page.saturating_sub(1).max(1);
    }

    /// Change the page size and return to page 1.
    pub fn set_items_per_page(&mut self, items_per_page: usize) -> Result<()> {
        validate_page_size(items_per_page)?;
        self.items_per_page = items_per_page;
        self.current_page = 1;
        Ok(())
    }

    /// Return to page 1 after the underlying list changed.
    pub fn reset(&mut self) {
        self.current_page = 1;
    }

    /// Slice `items` for the current page, clamping the stored page into range.
    pub fn paginate<'a, T>(&mut self, items: &'a [T]) -> Page<'a, T> {
        let page = slice_page(items, self.current_page, self.items_per_page);
        self.current_page = page.page;
        page
    }
}

impl Default for PageState {
    fn default() -> Self {
        Self {
            current_page: 1,
            items_per_page: PAGE_SIZE,
        }
    }
}

fn validate_page_size(items_per_page: usize) -> Result<()> {
    if PAGE_SIZE_OPTIONS.contains(&items_per_page) {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!(
            "page size {} is not one of {:?}",
            items_per_page, PAGE_SIZE_OPTIONS
        )))
    }
}
