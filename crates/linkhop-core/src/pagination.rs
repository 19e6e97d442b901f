//! Page-link window for paginated lists.
//!
//! The pager always shows the first and last page and a window of
//! `max_pages` links around the current page. Hidden runs are replaced by a
//! separator only when the run spans at least two pages; a single hidden page
//! is shown instead.

use serde::Serialize;

/// One slot in the pager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "page", rename_all = "snake_case")]
pub enum PageItem {
    Page(u32),
    Separator,
}

/// Compute the pager slots for `current` of `total` pages (1-based).
///
/// `current` is clamped into `1..=total`; zero pages yields no slots.
pub fn page_window(current: u32, total: u32, max_pages: u32) -> Vec<PageItem> {
    if total == 0 {
        return Vec::new();
    }
    let max_pages = max_pages.max(1);
    if total <= max_pages.saturating_add(2) {
        return (1..=total).map(PageItem::Page).collect();
    }

    let current = current.clamp(1, total);
    // Window lives strictly between the first and last page.
    let highest_start = total - max_pages;
    let start = current
        .saturating_sub(max_pages / 2)
        .clamp(2, highest_start);
    let end = start + max_pages - 1;

    let mut items = Vec::with_capacity(max_pages as usize + 4);
    items.push(PageItem::Page(1));
    match start - 1 {
        1 => {}
        2 => items.push(PageItem::Page(2)),
        _ => items.push(PageItem::Separator),
    }
    items.extend((start..=end).map(PageItem::Page));
    match total - end {
        1 => {}
        2 => items.push(PageItem::Page(total - 1)),
        _ => items.push(PageItem::Separator),
    }
    items.push(PageItem::Page(total));
    items
}
