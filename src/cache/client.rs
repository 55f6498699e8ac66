//! Shared cache handle.
//!
//! [`CacheClient`] wraps one [`CacheBackend`] and is the only path the
//! caches take to it. Every backend call is bounded by the configured
//! timeout and fails open: errors are logged, counted and reported to the
//! caller as a miss or a skipped write.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use metrics::{counter, histogram};
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, warn};

use super::backend::{BackendError, CacheBackend};
use super::codec::{self, CacheError};
use super::config::CacheConfig;
use super::flight::SingleFlight;
use super::memory::MemoryBackend;

pub const METRIC_CACHE_HIT_TOTAL: &str = "taskdeck_cache_hit_total";
pub const METRIC_CACHE_MISS_TOTAL: &str = "taskdeck_cache_miss_total";
pub const METRIC_CACHE_DECODE_ERROR_TOTAL: &str = "taskdeck_cache_decode_error_total";
pub const METRIC_CACHE_BACKEND_ERROR_TOTAL: &str = "taskdeck_cache_backend_error_total";
pub const METRIC_CACHE_INVALIDATION_TOTAL: &str = "taskdeck_cache_invalidation_total";
pub const METRIC_CACHE_BUILD_MS: &str = "taskdeck_cache_build_ms";

/// Cloneable handle over a cache backend.
///
/// Created once at startup and passed to the caches that need it.
#[derive(Clone)]
pub struct CacheClient {
    backend: Arc<dyn CacheBackend>,
    config: Arc<CacheConfig>,
    flights: Option<Arc<SingleFlight>>,
}

impl CacheClient {
    pub fn new(backend: Arc<dyn CacheBackend>, config: CacheConfig) -> Self {
        let flights = config
            .single_flight
            .then(|| Arc::new(SingleFlight::new()));
        Self {
            backend,
            config: Arc::new(config),
            flights,
        }
    }

    /// Client over a fresh [`MemoryBackend`].
    pub fn in_memory(config: CacheConfig) -> Self {
        let backend = Arc::new(MemoryBackend::new(&config));
        Self::new(backend, config)
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Raw bytes stored under `key`, or `None` on miss or backend failure.
    pub async fn fetch(&self, key: &str) -> Option<Bytes> {
        if !self.is_enabled() {
            return None;
        }
        self.call("get", self.backend.get(key)).await.flatten()
    }

    /// Store `value` under `key` and record its tag memberships.
    pub async fn store(&self, key: &str, value: Bytes, ttl: Duration, tags: &[&str]) {
        if !self.is_enabled() {
            return;
        }
        let stored = self
            .call("set", self.backend.set_with_expiry(key, value, ttl))
            .await;
        if stored.is_some() && !tags.is_empty() {
            self.call("tag", self.backend.tag_entry(key, tags)).await;
        }
    }

    /// Delete `keys`. An empty slice performs no backend call.
    pub async fn evict(&self, keys: &[&str]) {
        if !self.is_enabled() || keys.is_empty() {
            return;
        }
        self.call("delete", self.backend.delete(keys)).await;
    }

    /// Drop every entry carrying any of `tags`.
    pub async fn invalidate_tags(&self, tags: &[&str]) {
        if !self.is_enabled() || tags.is_empty() {
            return;
        }
        if self
            .call("invalidate", self.backend.invalidate_by_tag(tags))
            .await
            .is_some()
        {
            counter!(METRIC_CACHE_INVALIDATION_TOTAL).increment(tags.len() as u64);
        }
    }

    /// Fetch and decode `key`. Undecodable payloads count as a miss.
    pub(crate) async fn lookup<T: DeserializeOwned>(
        &self,
        cache: &'static str,
        key: &str,
    ) -> Option<T> {
        let bytes = self.fetch(key).await?;
        match codec::decode(&bytes) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(
                    target = "taskdeck::cache::client",
                    cache,
                    key,
                    error = %err,
                    "Discarding undecodable cache entry"
                );
                counter!(METRIC_CACHE_DECODE_ERROR_TOTAL).increment(1);
                None
            }
        }
    }

    /// Read-through: return the cached value for `key`, or build, store and
    /// return a fresh one.
    ///
    /// Builder errors propagate and leave the cache untouched. With
    /// single-flight enabled, concurrent misses on the same key in this
    /// process build once; the others re-read the stored value.
    pub(crate) async fn read_through<T, E, F, Fut>(
        &self,
        cache: &'static str,
        key: &str,
        ttl: Duration,
        tags: &[&str],
        builder: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        E: From<CacheError>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if !self.is_enabled() {
            return builder().await;
        }

        if let Some(value) = self.lookup(cache, key).await {
            self.record_hit(cache, key);
            return Ok(value);
        }

        let _flight = match &self.flights {
            Some(flights) => {
                let guard = flights.acquire(key).await;
                if let Some(value) = self.lookup(cache, key).await {
                    self.record_hit(cache, key);
                    return Ok(value);
                }
                Some(guard)
            }
            None => None,
        };

        self.record_miss(cache, key);
        let started_at = Instant::now();
        let value = builder().await?;
        histogram!(METRIC_CACHE_BUILD_MS, "cache" => cache)
            .record(started_at.elapsed().as_secs_f64() * 1000.0);

        let bytes = codec::encode(&value)?;
        self.store(key, bytes, ttl, tags).await;
        Ok(value)
    }

    fn record_hit(&self, cache: &'static str, key: &str) {
        debug!(target = "taskdeck::cache::client", cache, key, "cache hit");
        counter!(METRIC_CACHE_HIT_TOTAL, "cache" => cache).increment(1);
    }

    fn record_miss(&self, cache: &'static str, key: &str) {
        debug!(target = "taskdeck::cache::client", cache, key, "cache miss");
        counter!(METRIC_CACHE_MISS_TOTAL, "cache" => cache).increment(1);
    }

    async fn call<T, F>(&self, op: &'static str, operation: F) -> Option<T>
    where
        F: Future<Output = Result<T, BackendError>>,
    {
        let timeout = self.config.call_timeout();
        let result = match tokio::time::timeout(timeout, operation).await {
            Ok(result) => result,
            Err(_) => Err(BackendError::Timeout(timeout)),
        };

        match result {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(
                    target = "taskdeck::cache::client",
                    op,
                    error = %err,
                    "Cache backend call failed; continuing without cache"
                );
                counter!(METRIC_CACHE_BACKEND_ERROR_TOTAL, "op" => op).increment(1);
                None
            }
        }
    }
}

impl std::fmt::Debug for CacheClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheClient")
            .field("config", &self.config)
            .field("single_flight", &self.flights.is_some())
            .finish_non_exhaustive()
    }
}
