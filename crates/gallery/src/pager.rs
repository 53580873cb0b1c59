//! Pagination over already-sorted listings.

use std::num::NonZeroUsize;

use serde::Serialize;

/// One page of a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    /// Items on this page, in listing order.
    pub items: Vec<T>,
    /// 1-based page number actually served.
    pub page: usize,
    /// Number of pages in the full listing (0 when it is empty).
    pub total_pages: usize,
}

impl<T> Page<T> {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Slice `items` into the requested page.
///
/// Pages below 1 are served as page 1. A page past the end yields no items.
pub fn paginate<T>(items: Vec<T>, page: i64, page_size: NonZeroUsize) -> Page<T> {
    let page = clamp_page(page);
    let size = page_size.get();
    let total_pages = items.len().div_ceil(size);

    let start = (page - 1).saturating_mul(size);
    let items = items.into_iter().skip(start).take(size).collect();

    Page {
        items,
        page,
        total_pages,
    }
}

/// Clamp a requested page number to a valid 1-based index.
fn clamp_page(page: i64) -> usize {
    if page < 1 {
        1
    } else {
        usize::try_from(page).unwrap_or(usize::MAX)
    }
}
