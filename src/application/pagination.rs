//! Offset pagination for the active task listing.

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 7;
pub const MAX_LIMIT: u32 = 100;

/// A normalized page request: `page >= 1`, `1 <= limit <= MAX_LIMIT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl PageRequest {
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        let page = page.map_or(DEFAULT_PAGE, |page| {
            u32::try_from(page.max(1)).unwrap_or(u32::MAX)
        });
        let limit = limit.map_or(DEFAULT_LIMIT, |limit| {
            u32::try_from(limit.clamp(1, i64::from(MAX_LIMIT))).unwrap_or(DEFAULT_LIMIT)
        });
        Self { page, limit }
    }

    /// Build from raw query-string values. Unparseable values fall back to
    /// the defaults.
    pub fn from_query(page: Option<&str>, limit: Option<&str>) -> Self {
        let parse = |raw: Option<&str>| raw.and_then(|value| value.trim().parse::<i64>().ok());
        Self::new(parse(page), parse(limit))
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }
}

/// List envelope returned by the paginated endpoints and cached verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListPage<T> {
    pub items: Vec<T>,
    pub current_page: u32,
    pub per_page: u32,
    pub total_items: u64,
    pub total_pages: u64,
}

impl<T> ListPage<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total_items: u64) -> Self {
        let per_page = u64::from(request.limit.max(1));
        Self {
            items,
            current_page: request.page,
            per_page: request.limit,
            total_items,
            total_pages: total_items.div_ceil(per_page),
        }
    }
}
