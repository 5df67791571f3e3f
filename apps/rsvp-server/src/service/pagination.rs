// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Page/size handling for the public event listing.

/// A clamped page request. Pages are zero-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub size: u64,
}

impl PageRequest {
    /// Clamp raw query values: negative pages become 0, sizes are forced into
    /// `[1, max_size]`, missing values fall back to page 0 / `default_size`.
    pub fn clamped(
        page: Option<i64>,
        size: Option<i64>,
        default_size: u64,
        max_size: u64,
    ) -> Self {
        let max_size = max_size.max(1);
        let page = page.map_or(0, |p| u64::try_from(p).unwrap_or(0));
        let size = match size {
            Some(s) => u64::try_from(s).unwrap_or(0),
            None => default_size,
        };
        Self {
            page,
            size: size.clamp(1, max_size),
        }
    }

    pub fn offset(&self) -> u64 {
        self.page.saturating_mul(self.size)
    }
}

/// One page of results plus the numbers needed to navigate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_items: u64,
    pub total_pages: u64,
    pub current_page: u64,
    pub page_size: u64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total_items: u64, request: PageRequest) -> Self {
        let total_pages = total_items.div_ceil(request.size);
        Self {
            items,
            total_items,
            total_pages,
            current_page: request.page,
            page_size: request.size,
            has_next_page: request.page.saturating_add(1) < total_pages,
            has_prev_page: request.page > 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_missing() {
        assert_eq!(
            PageRequest::clamped(None, None, 10, 100),
            PageRequest { page: 0, size: 10 }
        );
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        assert_eq!(
            PageRequest::clamped(Some(-3), Some(0), 10, 100),
            PageRequest { page: 0, size: 1 }
        );
        assert_eq!(
            PageRequest::clamped(Some(2), Some(5000), 10, 100),
            PageRequest { page: 2, size: 100 }
        );
        assert_eq!(
            PageRequest::clamped(Some(1), Some(-7), 10, 100),
            PageRequest { page: 1, size: 1 }
        );
    }

    #[test]
    fn single_full_page_has_no_neighbours() {
        let request = PageRequest { page: 0, size: 10 };
        let page = Page::new(vec![0; 10], 10, request);
        assert_eq!(page.total_pages, 1);
        assert!(!page.has_next_page);
        assert!(!page.has_prev_page);
    }

    #[test]
    fn middle_page_has_both_neighbours() {
        let request = PageRequest { page: 1, size: 10 };
        let page = Page::new(vec![0; 10], 25, request);
        assert_eq!(page.total_pages, 3);
        assert!(page.has_next_page);
        assert!(page.has_prev_page);
        assert_eq!(request.offset(), 10);
    }

    #[test]
    fn empty_result_has_zero_pages() {
        let page: Page<u8> = Page::new(vec![], 0, PageRequest { page: 0, size: 10 });
        assert_eq!(page.total_pages, 0);
        assert!(!page.has_next_page);
    }
}
