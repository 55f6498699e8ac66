//! Redis cache backend (cargo feature `redis`).
//!
//! Entries are plain string keys set with `PX` expiry. Tag membership lives
//! in a Redis set per tag (`tags:<tag>`); invalidation drains those sets and
//! deletes their members inside one Lua script.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use deadpool_redis::redis::{self, AsyncCommands, Script};
use deadpool_redis::{Config, Connection, Pool, Runtime};

use super::backend::{BackendError, CacheBackend};

const TAG_SET_PREFIX: &str = "tags:";

/// Deletes every member of each tag set in KEYS, then the set itself.
const INVALIDATE_TAGS_SCRIPT: &str = r#"
local removed = 0
for _, tag_key in ipairs(KEYS) do
    local members = redis.call('SMEMBERS', tag_key)
    for _, member in ipairs(members) do
        removed = removed + redis.call('DEL', member)
    end
    redis.call('DEL', tag_key)
end
return removed
"#;

pub struct RedisBackend {
    pool: Pool,
}

impl RedisBackend {
    pub fn connect(url: &str) -> Result<Self, BackendError> {
        let pool = Config::from_url(url)
            .create_pool(Some(Runtime::Tokio1))
            .map_err(BackendError::unavailable)?;
        Ok(Self { pool })
    }

    async fn connection(&self) -> Result<Connection, BackendError> {
        self.pool.get().await.map_err(BackendError::unavailable)
    }
}

fn tag_set_key(tag: &str) -> String {
    format!("{TAG_SET_PREFIX}{tag}")
}

fn expiry_millis(ttl: Duration) -> u64 {
    u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1)
}

#[async_trait]
impl CacheBackend for RedisBackend {
    async fn get(&self, key: &str) -> Result<Option<Bytes>, BackendError> {
        let mut conn = self.connection().await?;
        let value: Option<Vec<u8>> = conn.get(key).await.map_err(BackendError::command)?;
        Ok(value.map(Bytes::from))
    }

    async fn set_with_expiry(
        &self,
        key: &str,
        value: Bytes,
        ttl: Duration,
    ) -> Result<(), BackendError> {
        let mut conn = self.connection().await?;
        redis::cmd("SET")
            .arg(key)
            .arg(value.as_ref())
            .arg("PX")
            .arg(expiry_millis(ttl))
            .query_async::<()>(&mut conn)
            .await
            .map_err(BackendError::command)
    }

    async fn delete(&self, keys: &[&str]) -> Result<(), BackendError> {
        if keys.is_empty() {
            return Ok(());
        }
        let mut conn = self.connection().await?;
        redis::cmd("DEL")
            .arg(keys)
            .query_async::<()>(&mut conn)
            .await
            .map_err(BackendError::command)
    }

    async fn tag_entry(&self, key: &str, tags: &[&str]) -> Result<(), BackendError> {
        if tags.is_empty() {
            return Ok(());
        }
        let mut conn = self.connection().await?;
        let mut pipe = redis::pipe();
        pipe.atomic();
        for tag in tags {
            pipe.cmd("SADD").arg(tag_set_key(tag)).arg(key).ignore();
        }
        pipe.query_async::<()>(&mut conn)
            .await
            .map_err(BackendError::command)
    }

    async fn invalidate_by_tag(&self, tags: &[&str]) -> Result<(), BackendError> {
        if tags.is_empty() {
            return Ok(());
        }
        let mut conn = self.connection().await?;
        let script = Script::new(INVALIDATE_TAGS_SCRIPT);
        let mut invocation = script.prepare_invoke();
        for tag in tags {
            invocation.key(tag_set_key(tag));
        }
        invocation
            .invoke_async::<i64>(&mut conn)
            .await
            .map(|_| ())
            .map_err(BackendError::command)
    }
}
