//! JSON encoding for cached payloads.

use bytes::Bytes;
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;

/// Errors surfaced to callers of the caches.
///
/// Backend failures never appear here; they degrade to misses inside
/// [`CacheClient`](super::CacheClient).
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("failed to encode cache payload: {0}")]
    Encode(#[source] serde_json::Error),
}

pub(crate) fn encode<T: Serialize>(value: &T) -> Result<Bytes, CacheError> {
    serde_json::to_vec(value)
        .map(Bytes::from)
        .map_err(CacheError::Encode)
}

pub(crate) fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, serde_json::Error> {
    serde_json::from_slice(bytes)
}
