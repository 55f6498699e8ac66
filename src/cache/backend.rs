//! Key/value backend seam.
//!
//! A backend stores opaque bytes with an expiry and can group keys under
//! tags for bulk eviction. Each call is atomic on its own; callers never rely
//! on multi-call transactions.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),
    #[error("cache backend command failed: {0}")]
    Command(String),
    #[error("cache backend call timed out after {0:?}")]
    Timeout(Duration),
}

impl BackendError {
    pub fn unavailable(err: impl std::fmt::Display) -> Self {
        Self::Unavailable(err.to_string())
    }

    pub fn command(err: impl std::fmt::Display) -> Self {
        Self::Command(err.to_string())
    }
}

#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Bytes>, BackendError>;

    async fn set_with_expiry(
        &self,
        key: &str,
        value: Bytes,
        ttl: Duration,
    ) -> Result<(), BackendError>;

    /// Delete every listed key. Missing keys are ignored.
    async fn delete(&self, keys: &[&str]) -> Result<(), BackendError>;

    /// Record `key` as a member of each tag.
    async fn tag_entry(&self, key: &str, tags: &[&str]) -> Result<(), BackendError>;

    /// Delete every entry that is a member of any of `tags`.
    async fn invalidate_by_tag(&self, tags: &[&str]) -> Result<(), BackendError>;
}
