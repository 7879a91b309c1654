// ABOUTME: Page-number pagination envelope for list endpoints
// ABOUTME: Carries items plus derived total_pages/has_next/has_previous flags
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cadence

//! Offset pagination
//!
//! List endpoints accept `page` (1-based) and `page_size` query parameters
//! and wrap their items in [`PaginationResult`].

use serde::{Deserialize, Serialize};

/// Default page size when the client does not specify one
pub const DEFAULT_PAGE_SIZE: u32 = 10;
/// Upper bound on page size to keep result sets sane
pub const MAX_PAGE_SIZE: u32 = 100;

/// Page/size pair extracted from query parameters
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageParams {
    /// 1-based page number
    pub page: Option<u32>,
    /// Items per page
    pub page_size: Option<u32>,
}

impl PageParams {
    /// Effective 1-based page number (minimum 1)
    #[must_use]
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    /// Effective page size, clamped to `1..=MAX_PAGE_SIZE`
    #[must_use]
    pub fn page_size(&self) -> u32 {
        self.page_size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    /// Row offset for SQL `LIMIT`/`OFFSET`
    #[must_use]
    pub fn offset(&self) -> u32 {
        (self.page() - 1) * self.page_size()
    }
}

/// Envelope returned by every list endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationResult<T> {
    /// Items on this page
    pub items: Vec<T>,
    /// 1-based page number
    pub page: u32,
    /// Items per page
    pub page_size: u32,
    /// Total matching items across all pages
    pub total_count: u32,
    /// Total number of pages
    pub total_pages: u32,
    /// Whether a previous page exists
    pub has_previous_page: bool,
    /// Whether a next page exists
    pub has_next_page: bool,
}

impl<T> PaginationResult<T> {
    /// Build the envelope, deriving page counts from the totals
    #[must_use]
    pub fn new(items: Vec<T>, page: u32, page_size: u32, total_count: u32) -> Self {
        let total_pages = total_count.div_ceil(page_size.max(1));
        Self {
            items,
            page,
            page_size,
            total_count,
            total_pages,
            has_previous_page: page > 1,
            has_next_page: page < total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_page_flags() {
        let result = PaginationResult::new(vec![1, 2, 3], 2, 3, 7);
        assert_eq!(result.total_pages, 3);
        assert!(result.has_previous_page);
        assert!(result.has_next_page);

        let last = PaginationResult::new(vec![7], 3, 3, 7);
        assert!(!last.has_next_page);
    }

    #[test]
    fn empty_result_has_zero_pages() {
        let result = PaginationResult::<u32>::new(vec![], 1, 10, 0);
        assert_eq!(result.total_pages, 0);
        assert!(!result.has_previous_page);
        assert!(!result.has_next_page);
    }

    #[test]
    fn page_params_clamp_to_bounds() {
        let params = PageParams {
            page: Some(0),
            page_size: Some(5000),
        };
        assert_eq!(params.page(), 1);
        assert_eq!(params.page_size(), MAX_PAGE_SIZE);
        assert_eq!(params.offset(), 0);
    }
}
