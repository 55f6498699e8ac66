//! Cache key and tag formats.
//!
//! The rendered strings are shared with any persisted cache dump, so the
//! formats here must not change.

use std::fmt;

/// Tag carried by every active-listing page.
pub const TAG_ALL_ACTIVE: &str = "tasks:all-active";

/// Keys for cached task representations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskCacheKey {
    /// Single task view: `task:<id>`.
    Item { id: i64 },
    /// One page of the active listing: `tasks:list:p<page>:l<limit>`.
    ListPage { page: u32, limit: u32 },
}

impl TaskCacheKey {
    pub fn item(id: i64) -> Self {
        Self::Item { id }
    }

    pub fn list_page(page: u32, limit: u32) -> Self {
        Self::ListPage { page, limit }
    }

    /// Tags recorded alongside the entry when it is stored.
    pub fn tags(&self) -> &'static [&'static str] {
        match self {
            TaskCacheKey::Item { .. } => &[],
            TaskCacheKey::ListPage { .. } => &[TAG_ALL_ACTIVE],
        }
    }
}

impl fmt::Display for TaskCacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskCacheKey::Item { id } => write!(f, "task:{id}"),
            TaskCacheKey::ListPage { page, limit } => write!(f, "tasks:list:p{page}:l{limit}"),
        }
    }
}
