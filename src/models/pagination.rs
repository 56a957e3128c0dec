//! Paginated response envelope.

use serde::{Deserialize, Serialize};

/// Pagination block returned alongside list data.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaginationInfo {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub limit: u32,
    #[serde(default)]
    pub pages: u32,
}

impl PaginationInfo {
    /// Page count, derived from `total / limit` when the backend leaves it out.
    /// Never less than one so an empty list still has a page to show.
    pub fn total_pages(&self) -> u32 {
        if self.pages > 0 {
            return self.pages;
        }
        if self.limit == 0 {
            return 1;
        }
        let pages = self.total.div_ceil(u64::from(self.limit));
        u32::try_from(pages).unwrap_or(u32::MAX).max(1)
    }
}

/// A page of list data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub pagination: PaginationInfo,
}

/// Result of a page fetch as seen by a list view.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub total_pages: u32,
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            total_pages: 1,
        }
    }

    /// Slice one page out of a fully fetched list.
    pub fn slice(all: Vec<T>, page: u32, limit: u32) -> Self {
        let total = all.len() as u64;
        let info = PaginationInfo {
            total,
            page,
            limit,
            pages: 0,
        };
        let limit = limit.max(1) as usize;
        let start = (page.max(1) as usize - 1).saturating_mul(limit);
        let items = all.into_iter().skip(start).take(limit).collect();
        Self {
            items,
            total,
            total_pages: info.total_pages(),
        }
    }
}

impl<T> From<PaginatedResponse<T>> for Page<T> {
    fn from(response: PaginatedResponse<T>) -> Self {
        Self {
            total: response.pagination.total,
            total_pages: response.pagination.total_pages(),
            items: response.data,
        }
    }
}
