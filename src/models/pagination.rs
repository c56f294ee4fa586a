//! Pagination primitives shared across all list endpoints.

use serde::Serialize;

/// Resolved pagination for one request: page number, validated per-page
/// value, and the options a selector may offer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    page: i64,
    per_page: i64,
    options: Vec<i64>,
}

impl PageRequest {
    /// `page` is clamped to 1 and `per_page` to at least 1.
    pub fn new(page: i64, per_page: i64, options: Vec<i64>) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.max(1),
            options,
        }
    }

    pub fn per_page(&self) -> i64 {
        self.per_page
    }

    pub fn options(&self) -> &[i64] {
        &self.options
    }

    pub fn limit(&self) -> i64 {
        self.per_page
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.per_page)
    }

    pub fn current_page(&self) -> i64 {
        self.page
    }
}

/// Paged result envelope returned by list endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct PagedResult<T: Serialize> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
    pub per_page_options: Vec<i64>,
}

impl<T: Serialize> PagedResult<T> {
    /// Package one page of results. Never re-queries.
    pub fn new(items: Vec<T>, total: i64, request: &PageRequest) -> Self {
        let per_page = request.per_page();
        let total = total.max(items.len() as i64);
        let total_pages = (total + per_page - 1) / per_page;
        Self {
            items,
            total,
            page: request.current_page(),
            per_page,
            total_pages,
            per_page_options: request.options().to_vec(),
        }
    }
}
