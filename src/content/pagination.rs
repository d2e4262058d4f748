//! Stateless page window computation.

use super::DEFAULT_PER_PAGE;
use serde::Serialize;
use std::ops::Range;

/// Page metadata for a listing.
///
/// `current_page` is always within `1..=total_pages`, and `total_pages` is at
/// least 1 even for an empty listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub current_page: usize,
    pub total_pages: usize,
    pub total_items: usize,
    pub per_page: usize,
    pub has_prev: bool,
    pub has_next: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev_page: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page: Option<usize>,
}

impl Pagination {
    /// Clamp `page` into range and compute the window metadata.
    ///
    /// `per_page == 0` falls back to [`DEFAULT_PER_PAGE`].
    pub fn new(page: i64, total_items: usize, per_page: usize) -> Self {
        let per_page = if per_page == 0 { DEFAULT_PER_PAGE } else { per_page };
        let total_pages = total_items.div_ceil(per_page).max(1);
        let current_page = usize::try_from(page).unwrap_or(0).clamp(1, total_pages);

        let has_prev = current_page > 1;
        let has_next = current_page < total_pages;

        Self {
            current_page,
            total_pages,
            total_items,
            per_page,
            has_prev,
            has_next,
            prev_page: has_prev.then(|| current_page - 1),
            next_page: has_next.then(|| current_page + 1),
        }
    }

    /// Half-open index range of the current page, empty when out of items.
    pub fn range(&self) -> Range<usize> {
        let start = (self.current_page - 1).saturating_mul(self.per_page);
        if start >= self.total_items {
            return 0..0;
        }
        let end = start.saturating_add(self.per_page).min(self.total_items);
        start..end
    }

    /// Apply the window to `items`.
    ///
    /// `items` is expected to hold `total_items` elements; a shorter slice is
    /// truncated rather than panicking.
    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let range = self.range();
        let end = range.end.min(items.len());
        let start = range.start.min(end);
        &items[start..end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_middle_page() {
        let p = Pagination::new(2, 25, 10);
        assert_eq!(p.current_page, 2);
        assert_eq!(p.total_pages, 3);
        assert!(p.has_prev && p.has_next);
        assert_eq!(p.prev_page, Some(1));
        assert_eq!(p.next_page, Some(3));
        assert_eq!(p.range(), 10..20);
    }

    #[test]
    fn test_last_partial_page() {
        let p = Pagination::new(3, 25, 10);
        assert_eq!(p.range(), 20..25);
        assert!(!p.has_next);
        assert_eq!(p.next_page, None);
    }

    #[test]
    fn test_page_clamping() {
        assert_eq!(Pagination::new(0, 25, 10).current_page, 1);
        assert_eq!(Pagination::new(-7, 25, 10).current_page, 1);
        assert_eq!(Pagination::new(99, 25, 10).current_page, 3);
        assert_eq!(Pagination::new(i64::MAX, 25, 10).current_page, 3);
    }

    #[test]
    fn test_zero_per_page_uses_default() {
        let p = Pagination::new(1, 0, 0);
        assert_eq!(p.per_page, DEFAULT_PER_PAGE);
        assert_eq!(p.total_pages, 1);
        assert_eq!(p.current_page, 1);
        assert!(!p.has_prev && !p.has_next);
        assert!(p.range().is_empty());
    }

    #[test]
    fn test_exact_multiple() {
        let p = Pagination::new(2, 20, 10);
        assert_eq!(p.total_pages, 2);
        assert_eq!(p.range(), 10..20);
    }

    #[test]
    fn test_slice() {
        let items: Vec<_> = (0..25).collect();
        let p = Pagination::new(3, items.len(), 10);
        assert_eq!(p.slice(&items), &[20, 21, 22, 23, 24]);

        let p = Pagination::new(1, 3, usize::MAX);
        assert_eq!(p.slice(&items[..3]), &[0, 1, 2]);
    }

    #[test]
    fn test_window_length_for_every_size() {
        for n in 0..=30usize {
            for per_page in 1..=12usize {
                let total_pages = n.div_ceil(per_page).max(1);
                let page_count = i64::try_from(total_pages).unwrap();
                for page in 1..=page_count + 1 {
                    let p = Pagination::new(page, n, per_page);
                    let start = (p.current_page - 1) * per_page;
                    assert_eq!(p.total_pages, total_pages, "n={n} per_page={per_page}");
                    assert_eq!(
                        p.range().len(),
                        per_page.min(n.saturating_sub(start)),
                        "n={n} per_page={per_page} page={page}"
                    );
                }
                // non-positive pages behave like page 1
                for page in [0, -1, i64::MIN] {
                    assert_eq!(Pagination::new(page, n, per_page), Pagination::new(1, n, per_page));
                }
            }
        }
    }

    #[test]
    fn test_serializes_without_absent_neighbours() {
        let json = serde_json::to_value(Pagination::new(1, 5, 10)).unwrap();
        assert_eq!(json["total_pages"], 1);
        assert!(json.get("prev_page").is_none());
        assert!(json.get("next_page").is_none());
    }
}
