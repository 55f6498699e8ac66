//! Invalidation plan generation.
//!
//! Merges lifecycle events into the set of tags and keys to evict.

use std::collections::BTreeSet;
use std::fmt;

use super::events::TaskEvent;
use super::keys::{TAG_ALL_ACTIVE, TaskCacheKey};

/// Tags and keys to evict for a batch of events, deduplicated.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct InvalidationPlan {
    /// Tags whose members are dropped.
    pub tags: BTreeSet<&'static str>,
    /// Individual keys deleted by name.
    pub keys: BTreeSet<String>,
}

impl fmt::Display for InvalidationPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "InvalidationPlan {{ tags: {}, keys: {} }}",
            self.tags.len(),
            self.keys.len(),
        )
    }
}

impl InvalidationPlan {
    pub fn from_event(event: TaskEvent) -> Self {
        Self::from_events([event])
    }

    /// Every lifecycle event invalidates the active listings. Events on an
    /// existing row also drop that row's item view.
    pub fn from_events(events: impl IntoIterator<Item = TaskEvent>) -> Self {
        let mut plan = Self::default();

        for event in events {
            plan.tags.insert(TAG_ALL_ACTIVE);
            if event.touches_item() {
                plan.keys
                    .insert(TaskCacheKey::item(event.task_id()).to_string());
            }
        }

        plan
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty() && self.keys.is_empty()
    }

    pub fn tag_refs(&self) -> Vec<&str> {
        self.tags.iter().copied().collect()
    }

    pub fn key_refs(&self) -> Vec<&str> {
        self.keys.iter().map(String::as_str).collect()
    }
}
