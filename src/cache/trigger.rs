//! Cache trigger service.
//!
//! Turns committed lifecycle events into evictions on the item and list
//! caches. Callers fire only after the store write returned.

use tracing::info;

use super::events::TaskEvent;
use super::item::ItemCache;
use super::planner::InvalidationPlan;
use super::tagged::TaggedCache;

#[derive(Clone, Debug)]
pub struct CacheTrigger {
    items: ItemCache,
    lists: TaggedCache,
}

impl CacheTrigger {
    pub fn new(items: ItemCache, lists: TaggedCache) -> Self {
        Self { items, lists }
    }

    /// Evict everything `event` made stale.
    pub async fn fire(&self, event: TaskEvent) {
        self.fire_all([event]).await;
    }

    /// Evict everything a batch of events made stale, once per tag and key.
    pub async fn fire_all(&self, events: impl IntoIterator<Item = TaskEvent>) {
        let events: Vec<TaskEvent> = events.into_iter().collect();
        let plan = InvalidationPlan::from_events(events.iter().copied());
        if plan.is_empty() {
            return;
        }

        self.lists.invalidate_tags(&plan.tag_refs()).await;
        self.items.forget(&plan.key_refs()).await;

        info!(
            target = "taskdeck::cache::trigger",
            events = events.len(),
            first = %events[0],
            plan = %plan,
            "Cache invalidation applied"
        );
    }
}
