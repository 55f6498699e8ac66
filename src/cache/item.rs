//! Read-through cache for single records.

use std::future::Future;
use std::time::Duration;

use serde::{Serialize, de::DeserializeOwned};

use super::client::CacheClient;
use super::codec::{self, CacheError};

const CACHE_LABEL: &str = "item";

/// Caches one serialized value per key. Entries are replaced only by
/// deletion followed by a rebuild, never edited in place.
#[derive(Clone, Debug)]
pub struct ItemCache {
    client: CacheClient,
}

impl ItemCache {
    pub fn new(client: CacheClient) -> Self {
        Self { client }
    }

    pub fn default_ttl(&self) -> Duration {
        self.client.config().item_ttl()
    }

    /// Cached value under `key`, if present and decodable.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.client.lookup(CACHE_LABEL, key).await
    }

    /// Store `value` under `key`. `None` uses the configured item TTL.
    pub async fn put<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
    ) -> Result<(), CacheError> {
        let bytes = codec::encode(value)?;
        let ttl = ttl.unwrap_or_else(|| self.default_ttl());
        self.client.store(key, bytes, ttl, &[]).await;
        Ok(())
    }

    /// Return the cached value, or run `builder`, cache its result for `ttl`
    /// and return it.
    pub async fn remember<T, E, F, Fut>(&self, key: &str, ttl: Duration, builder: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        E: From<CacheError>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.client
            .read_through(CACHE_LABEL, key, ttl, &[], builder)
            .await
    }

    /// Delete `keys`; missing keys are ignored.
    pub async fn forget(&self, keys: &[&str]) {
        self.client.evict(keys).await;
    }
}
