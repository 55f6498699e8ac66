//! In-process cache backend.
//!
//! LRU-bounded map of byte entries with per-entry expiry, plus a
//! [`TagRegistry`] for tag sweeps. Used when no external backend is
//! configured and by tests.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use lru::LruCache;
use tokio::time::Instant;

use super::backend::{BackendError, CacheBackend};
use super::config::CacheConfig;
use super::lock::mutex_lock;
use super::registry::TagRegistry;

const SOURCE: &str = "cache::memory";

#[derive(Clone)]
struct MemoryEntry {
    value: Bytes,
    expires_at: Instant,
}

impl MemoryEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

pub struct MemoryBackend {
    entries: Mutex<LruCache<String, MemoryEntry>>,
    tags: TagRegistry,
}

impl MemoryBackend {
    /// Create a new backend sized from the given configuration.
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(config.memory_entry_limit_non_zero())),
            tags: TagRegistry::new(),
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        mutex_lock(&self.entries, SOURCE, "len").len()
    }
}

// Lock order is entries, then tags. Every path that drops an entry also
// unregisters it before releasing the entries lock.
#[async_trait]
impl CacheBackend for MemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<Bytes>, BackendError> {
        let now = Instant::now();
        let mut entries = mutex_lock(&self.entries, SOURCE, "get");
        let Some(entry) = entries.get(key) else {
            return Ok(None);
        };
        if !entry.is_expired(now) {
            return Ok(Some(entry.value.clone()));
        }

        entries.pop(key);
        self.tags.unregister(key);
        Ok(None)
    }

    async fn set_with_expiry(
        &self,
        key: &str,
        value: Bytes,
        ttl: Duration,
    ) -> Result<(), BackendError> {
        let entry = MemoryEntry {
            value,
            expires_at: Instant::now() + ttl,
        };
        let mut entries = mutex_lock(&self.entries, SOURCE, "set_with_expiry");
        // `push` hands back either the replaced value for `key` or the LRU victim.
        let evicted = entries
            .push(key.to_string(), entry)
            .map(|(evicted_key, _)| evicted_key);

        if let Some(evicted_key) = evicted.filter(|evicted_key| evicted_key != key) {
            self.tags.unregister(&evicted_key);
        }
        Ok(())
    }

    async fn delete(&self, keys: &[&str]) -> Result<(), BackendError> {
        let mut entries = mutex_lock(&self.entries, SOURCE, "delete");
        for key in keys {
            entries.pop(*key);
            self.tags.unregister(key);
        }
        Ok(())
    }

    /// Keys that are no longer stored are not registered.
    async fn tag_entry(&self, key: &str, tags: &[&str]) -> Result<(), BackendError> {
        let entries = mutex_lock(&self.entries, SOURCE, "tag_entry");
        if entries.contains(key) {
            self.tags.register(key, tags);
        }
        Ok(())
    }

    async fn invalidate_by_tag(&self, tags: &[&str]) -> Result<(), BackendError> {
        let mut entries = mutex_lock(&self.entries, SOURCE, "invalidate_by_tag");
        for tag in tags {
            for key in self.tags.take_tag(tag) {
                entries.pop(key.as_str());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::panic::{AssertUnwindSafe, catch_unwind};

    use super::*;

    fn backend() -> MemoryBackend {
        MemoryBackend::new(&CacheConfig::default())
    }

    #[tokio::test]
    async fn set_get_delete_roundtrip() {
        let backend = backend();
        assert!(backend.get("task:1").await.unwrap().is_none());

        backend
            .set_with_expiry("task:1", Bytes::from_static(b"{}"), Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(
            backend.get("task:1").await.unwrap(),
            Some(Bytes::from_static(b"{}"))
        );

        backend.delete(&["task:1", "task:missing"]).await.unwrap();
        assert!(backend.get("task:1").await.unwrap().is_none());
        assert_eq!(backend.len(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn entries_expire_after_ttl() {
        let backend = backend();
        backend
            .set_with_expiry("task:1", Bytes::from_static(b"1"), Duration::from_secs(5))
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(4)).await;
        assert!(backend.get("task:1").await.unwrap().is_some());

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(backend.get("task:1").await.unwrap().is_none());
        assert_eq!(backend.len(), 0);
    }

    #[tokio::test]
    async fn tag_invalidation_drops_only_tagged_entries() {
        let backend = backend();
        let ttl = Duration::from_secs(60);
        for key in ["tasks:list:p1:l7", "tasks:list:p2:l7", "tasks:list:p1:l20"] {
            backend
                .set_with_expiry(key, Bytes::from_static(b"[]"), ttl)
                .await
                .unwrap();
            backend.tag_entry(key, &["tasks:all-active"]).await.unwrap();
        }
        backend
            .set_with_expiry("task:9", Bytes::from_static(b"{}"), ttl)
            .await
            .unwrap();

        backend
            .invalidate_by_tag(&["tasks:all-active"])
            .await
            .unwrap();

        assert!(backend.get("tasks:list:p1:l7").await.unwrap().is_none());
        assert!(backend.get("tasks:list:p2:l7").await.unwrap().is_none());
        assert!(backend.get("tasks:list:p1:l20").await.unwrap().is_none());
        assert!(backend.get("task:9").await.unwrap().is_some());
        assert_eq!(backend.tags.key_count(), 0);
    }

    #[tokio::test]
    async fn lru_eviction_unregisters_tags() {
        let config = CacheConfig {
            memory_entry_limit: 1,
            ..Default::default()
        };
        let backend = MemoryBackend::new(&config);
        let ttl = Duration::from_secs(60);

        backend
            .set_with_expiry("tasks:list:p1:l7", Bytes::from_static(b"a"), ttl)
            .await
            .unwrap();
        backend
            .tag_entry("tasks:list:p1:l7", &["tasks:all-active"])
            .await
            .unwrap();
        backend
            .set_with_expiry("task:1", Bytes::from_static(b"b"), ttl)
            .await
            .unwrap();

        assert!(backend.get("tasks:list:p1:l7").await.unwrap().is_none());
        assert_eq!(backend.tags.key_count(), 0);
        assert_eq!(backend.len(), 1);
    }

    #[tokio::test]
    async fn recovers_from_poisoned_lock() {
        let backend = backend();

        let _ = catch_unwind(AssertUnwindSafe(|| {
            let _guard = backend
                .entries
                .lock()
                .expect("entries lock should be acquired");
            panic!("poison entries lock");
        }));

        backend
            .set_with_expiry("task:1", Bytes::from_static(b"1"), Duration::from_secs(60))
            .await
            .unwrap();
        assert!(backend.get("task:1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn replaced_entry_keeps_fresh_tags_after_delete_race() {
        let backend = backend();
        let ttl = Duration::from_secs(60);
        let key = "tasks:list:p1:l7";

        backend
            .set_with_expiry(key, Bytes::from_static(b"old"), ttl)
            .await
            .unwrap();
        backend.tag_entry(key, &["tasks:all-active"]).await.unwrap();

        backend.delete(&[key]).await.unwrap();
        backend
            .set_with_expiry(key, Bytes::from_static(b"new"), ttl)
            .await
            .unwrap();
        backend.tag_entry(key, &["tasks:all-active"]).await.unwrap();

        backend
            .invalidate_by_tag(&["tasks:all-active"])
            .await
            .unwrap();
        assert!(backend.get(key).await.unwrap().is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_delete_and_refill_keep_entry_and_tags_in_step() {
        let backend = std::sync::Arc::new(backend());
        let key = "tasks:list:p1:l7";
        let ttl = Duration::from_secs(60);

        for _ in 0..200 {
            backend
                .set_with_expiry(key, Bytes::from_static(b"old"), ttl)
                .await
                .unwrap();
            backend.tag_entry(key, &["tasks:all-active"]).await.unwrap();

            let deleter = {
                let backend = backend.clone();
                tokio::spawn(async move { backend.delete(&[key]).await })
            };
            let refiller = {
                let backend = backend.clone();
                tokio::spawn(async move {
                    backend
                        .set_with_expiry(key, Bytes::from_static(b"new"), ttl)
                        .await?;
                    backend.tag_entry(key, &["tasks:all-active"]).await
                })
            };
            deleter.await.unwrap().unwrap();
            refiller.await.unwrap().unwrap();

            assert_eq!(backend.len(), backend.tags.key_count());

            backend
                .invalidate_by_tag(&["tasks:all-active"])
                .await
                .unwrap();
            assert_eq!(backend.len(), 0);
        }
    }

    #[tokio::test]
    async fn tagging_a_missing_key_is_ignored() {
        let backend = backend();
        backend
            .tag_entry("tasks:list:p9:l7", &["tasks:all-active"])
            .await
            .unwrap();
        assert_eq!(backend.tags.key_count(), 0);
    }
}
