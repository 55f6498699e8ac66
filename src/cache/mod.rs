//! Taskdeck cache layer
//!
//! Read-through caching between the JSON endpoints and the task store:
//!
//! - **Item cache**: one serialized task view per `task:<id>` key, dropped
//!   by key after every mutation of that task
//! - **Tagged list cache**: paginated listings under
//!   `tasks:list:p<page>:l<limit>`, all members of the `tasks:all-active`
//!   tag and dropped together on any lifecycle change
//!
//! Both go through one [`CacheClient`], which bounds every backend call with
//! a timeout and fails open to the store.
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! enabled = true
//! backend = "memory"     # or "redis" with the `redis` feature
//! item_ttl_seconds = 3600
//! list_ttl_seconds = 180
//! call_timeout_ms = 250
//! single_flight = false
//! ```

mod backend;
mod client;
mod codec;
mod config;
mod events;
mod flight;
mod item;
mod keys;
mod lock;
mod memory;
mod planner;
#[cfg(feature = "redis")]
mod redis;
mod registry;
mod tagged;
mod trigger;

pub use backend::{BackendError, CacheBackend};
pub use client::{
    CacheClient, METRIC_CACHE_BACKEND_ERROR_TOTAL, METRIC_CACHE_BUILD_MS,
    METRIC_CACHE_DECODE_ERROR_TOTAL, METRIC_CACHE_HIT_TOTAL, METRIC_CACHE_INVALIDATION_TOTAL,
    METRIC_CACHE_MISS_TOTAL,
};
pub use codec::CacheError;
pub use config::CacheConfig;
pub use events::TaskEvent;
pub use item::ItemCache;
pub use keys::{TAG_ALL_ACTIVE, TaskCacheKey};
pub use memory::MemoryBackend;
pub use planner::InvalidationPlan;
#[cfg(feature = "redis")]
pub use redis::RedisBackend;
pub use registry::TagRegistry;
pub use tagged::TaggedCache;
pub use trigger::CacheTrigger;
