//! Paged listings.

use serde::{Deserialize, Serialize};

/// One page of a listing with its paging metadata.
///
/// Serializes to the `{docs, totalDocs, limit, totalPages, page, ...}` envelope
/// used by list endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub docs: Vec<T>,
    pub total_docs: u64,
    pub limit: u64,
    pub total_pages: u64,
    pub page: u64,
    pub prev_page: Option<u64>,
    pub next_page: Option<u64>,
    pub has_prev_page: bool,
    pub has_next_page: bool,
}

impl<T> Page<T> {
    /// Build a page from its items, the total count and the 1-based page number.
    #[must_use]
    pub fn new(docs: Vec<T>, total_docs: u64, page: u64, limit: u64) -> Self {
        let limit = limit.max(1);
        let page = page.max(1);
        let total_pages = total_docs.div_ceil(limit).max(1);
        let has_prev_page = page > 1;
        let has_next_page = page < total_pages;

        Self {
            docs,
            total_docs,
            limit,
            total_pages,
            page,
            prev_page: has_prev_page.then(|| page - 1),
            next_page: has_next_page.then(|| page + 1),
            has_prev_page,
            has_next_page,
        }
    }

    /// Convert the items, keeping the metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            docs: self.docs.into_iter().map(f).collect(),
            total_docs: self.total_docs,
            limit: self.limit,
            total_pages: self.total_pages,
            page: self.page,
            prev_page: self.prev_page,
            next_page: self.next_page,
            has_prev_page: self.has_prev_page,
            has_next_page: self.has_next_page,
        }
    }
}
