pub mod catalog;
pub mod returns;

pub use catalog::*;
pub use returns::*;

use serde::Serialize;

/// One page of query results. Every list endpoint speaks this envelope.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, page: u64, limit: u64, total: u64) -> Self {
        let total_pages = if limit == 0 { 0 } else { total.div_ceil(limit) };
        Self {
            items,
            page,
            limit,
            total,
            total_pages,
        }
    }

    /// Paginate an already-filtered, already-ordered vector (in-memory store).
    pub fn slice(all: Vec<T>, page: u64, limit: u64) -> Self {
        let total = all.len() as u64;
        let start = page
            .saturating_sub(1)
            .saturating_mul(limit)
            .min(total) as usize;
        let end = start.saturating_add(limit as usize).min(all.len());
        let items = all.into_iter().skip(start).take(end - start).collect();
        Self::new(items, page, limit, total)
    }
}

/// Clamp raw query-string paging values to something sane. The page cap keeps
/// `(page - 1) * limit` offsets inside i64 for the database stores.
pub fn paging(page: Option<u64>, limit: Option<u64>) -> (u64, u64) {
    let page = page.unwrap_or(1).clamp(1, 1 << 32);
    let limit = limit.unwrap_or(50).clamp(1, 500);
    (page, limit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slice_returns_requested_window() {
        let p = Page::slice((0..10).collect::<Vec<_>>(), 2, 3);
        assert_eq!(p.items, vec![3, 4, 5]);
        assert_eq!(p.total, 10);
        assert_eq!(p.total_pages, 4);
    }

    #[test]
    fn slice_past_the_end_is_empty_not_an_error() {
        let p = Page::slice(vec![1, 2], 5, 10);
        assert!(p.items.is_empty());
        assert_eq!(p.total, 2);
    }

    #[test]
    fn paging_clamps_zero_page_and_oversized_limit() {
        assert_eq!(paging(Some(0), Some(100_000)), (1, 500));
        assert_eq!(paging(None, None), (1, 50));
    }

    #[test]
    fn absurd_page_number_yields_an_empty_page_without_overflow() {
        let (page, limit) = paging(Some(u64::MAX), Some(500));
        assert!(page.checked_mul(limit).is_some(), "offset must fit in u64");
        assert!(page.saturating_mul(limit) <= i64::MAX as u64);

        let p = Page::slice(vec![1, 2, 3], page, limit);
        assert!(p.items.is_empty());
        assert_eq!(p.total, 3);

        // Direct callers may skip paging(); slice itself must not overflow.
        let p = Page::slice(vec![1, 2, 3], u64::MAX, u64::MAX);
        assert!(p.items.is_empty());
    }
}
