//! Offset/limit pagination shared by the catalog and order listings.
//!
//! Both read paths (cache-backed search and direct primary-store queries)
//! return the same [`Page`] shape so callers cannot tell which one served
//! the request.

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_NUMBER: u32 = 1;
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Caller-supplied pagination, with defaults for absent fields
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Pagination {
    pub page_number: Option<u32>,
    pub page_size: Option<u32>,
}

impl Pagination {
    /// Resolve to a concrete `(page_number, page_size)`, both at least 1
    pub fn resolve(&self) -> (u32, u32) {
        let page_number = self.page_number.unwrap_or(DEFAULT_PAGE_NUMBER).max(1);
        let page_size = self.page_size.unwrap_or(DEFAULT_PAGE_SIZE).max(1);
        (page_number, page_size)
    }

    /// Zero-based offset of the first row on the page
    pub fn offset(&self) -> u64 {
        let (page_number, page_size) = self.resolve();
        u64::from(page_number - 1) * u64::from(page_size)
    }
}

/// One page of results plus totals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_items: u64,
    pub total_pages: u32,
    pub page_number: u32,
    pub page_size: u32,
}

impl<T> Page<T> {
    /// Assemble a page, deriving `total_pages` from the item count
    pub fn new(items: Vec<T>, total_items: u64, pagination: Pagination) -> Self {
        let (page_number, page_size) = pagination.resolve();
        let total_pages = total_items.div_ceil(u64::from(page_size)) as u32;
        Self {
            items,
            total_items,
            total_pages,
            page_number,
            page_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_absent() {
        let pagination = Pagination::default();
        assert_eq!(pagination.resolve(), (1, 10));
        assert_eq!(pagination.offset(), 0);
    }

    #[test]
    fn offset_skips_earlier_pages() {
        let pagination = Pagination {
            page_number: Some(3),
            page_size: Some(25),
        };
        assert_eq!(pagination.offset(), 50);
    }

    #[test]
    fn zero_values_are_clamped() {
        let pagination = Pagination {
            page_number: Some(0),
            page_size: Some(0),
        };
        assert_eq!(pagination.resolve(), (1, 1));
    }

    #[test]
    fn total_pages_rounds_up() {
        let page = Page::new(vec![1, 2, 3], 11, Pagination::default());
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.total_items, 11);

        let empty: Page<i32> = Page::new(vec![], 0, Pagination::default());
        assert_eq!(empty.total_pages, 0);
    }
}
