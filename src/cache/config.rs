//! Cache configuration.
//!
//! Controls TTLs, call timeouts and the in-process backend via `taskdeck.toml`.

use std::num::NonZeroUsize;
use std::time::Duration;

use serde::Deserialize;

// Default values for cache configuration
const DEFAULT_ITEM_TTL_SECS: u64 = 3600;
const DEFAULT_LIST_TTL_SECS: u64 = 180;
const DEFAULT_CALL_TIMEOUT_MS: u64 = 250;
const DEFAULT_MEMORY_ENTRY_LIMIT: usize = 10_000;

/// Cache configuration from `taskdeck.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Enable the read-through caches. When off every read goes to the store.
    pub enabled: bool,
    /// Backend expiry for single-task entries.
    pub item_ttl_seconds: u64,
    /// Backend expiry for listing pages; upper bound on list staleness.
    pub list_ttl_seconds: u64,
    /// Timeout applied to every backend round trip.
    pub call_timeout_ms: u64,
    /// Capacity of the in-process backend.
    pub memory_entry_limit: usize,
    /// Serialize concurrent builds of the same key within this process.
    pub single_flight: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            item_ttl_seconds: DEFAULT_ITEM_TTL_SECS,
            list_ttl_seconds: DEFAULT_LIST_TTL_SECS,
            call_timeout_ms: DEFAULT_CALL_TIMEOUT_MS,
            memory_entry_limit: DEFAULT_MEMORY_ENTRY_LIMIT,
            single_flight: false,
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            enabled: settings.enabled,
            item_ttl_seconds: settings.item_ttl_seconds,
            list_ttl_seconds: settings.list_ttl_seconds,
            call_timeout_ms: settings.call_timeout_ms,
            memory_entry_limit: settings.memory_entry_limit,
            single_flight: settings.single_flight,
        }
    }
}

impl CacheConfig {
    /// Item TTL, clamped to at least one second.
    pub fn item_ttl(&self) -> Duration {
        Duration::from_secs(self.item_ttl_seconds.max(1))
    }

    /// List TTL, clamped to at least one second.
    pub fn list_ttl(&self) -> Duration {
        Duration::from_secs(self.list_ttl_seconds.max(1))
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms.max(1))
    }

    /// Returns the memory entry limit as NonZeroUsize, clamping to 1 if zero.
    pub fn memory_entry_limit_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.memory_entry_limit).unwrap_or(NonZeroUsize::MIN)
    }
}
