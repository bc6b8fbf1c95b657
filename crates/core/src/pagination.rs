//! Paginated list results.

use serde::Serialize;

/// Pagination envelope returned alongside list data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    /// Row count matching the filters, ignoring pagination.
    pub total: i64,
    /// `ceil(total / limit)`.
    pub total_pages: i64,
}

impl Pagination {
    pub const fn new(page: i64, limit: i64, total: i64) -> Self {
        let total_pages = if total == 0 { 0 } else { (total + limit - 1) / limit };
        Self { page, limit, total, total_pages }
    }
}

/// An ordered page of results plus its pagination envelope.
#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub pagination: Pagination,
}

/// Number of rows a page is expected to hold:
/// `min(limit, max(0, total - (page-1)*limit))`.
pub const fn expected_page_len(page: i64, limit: i64, total: i64) -> i64 {
    let remaining = total - (page - 1) * limit;
    if remaining <= 0 {
        0
    } else if remaining < limit {
        remaining
    } else {
        limit
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
