//! Read-through cache for listings grouped under invalidation tags.

use std::future::Future;
use std::time::Duration;

use serde::{Serialize, de::DeserializeOwned};

use super::client::CacheClient;
use super::codec::CacheError;

const CACHE_LABEL: &str = "list";

/// Like [`ItemCache`](super::ItemCache), but every stored entry joins the
/// given tags so a whole family can be dropped without knowing its keys.
#[derive(Clone, Debug)]
pub struct TaggedCache {
    client: CacheClient,
}

impl TaggedCache {
    pub fn new(client: CacheClient) -> Self {
        Self { client }
    }

    pub fn default_ttl(&self) -> Duration {
        self.client.config().list_ttl()
    }

    pub async fn get<T, E, F, Fut>(
        &self,
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
        self.client
            .read_through(CACHE_LABEL, key, ttl, tags, builder)
            .await
    }

    pub async fn invalidate_tags(&self, tags: &[&str]) {
        self.client.invalidate_tags(tags).await;
    }
}
