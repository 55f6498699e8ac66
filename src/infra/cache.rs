//! Cache client construction from deployment settings.

use tracing::info;

use crate::cache::{CacheClient, CacheConfig};
use crate::config::{CacheBackendKind, CacheSettings};

use super::error::InfraError;

/// Build the process-wide cache handle for the configured backend.
pub fn build_cache_client(settings: &CacheSettings) -> Result<CacheClient, InfraError> {
    let config = CacheConfig::from(settings);

    let client = match settings.backend {
        CacheBackendKind::Memory => CacheClient::in_memory(config),
        CacheBackendKind::Redis => {
            let url = settings
                .redis_url
                .as_deref()
                .ok_or_else(|| InfraError::configuration("cache.redis_url is not configured"))?;
            redis_client(url, config)?
        }
    };

    info!(
        target = "taskdeck::cache",
        backend = ?settings.backend,
        enabled = settings.enabled,
        single_flight = settings.single_flight,
        "Cache client ready"
    );
    Ok(client)
}

#[cfg(feature = "redis")]
fn redis_client(url: &str, config: CacheConfig) -> Result<CacheClient, InfraError> {
    let backend = crate::cache::RedisBackend::connect(url)
        .map_err(InfraError::cache)?;
    Ok(CacheClient::new(std::sync::Arc::new(backend), config))
}

#[cfg(not(feature = "redis"))]
fn redis_client(_url: &str, _config: CacheConfig) -> Result<CacheClient, InfraError> {
    Err(InfraError::configuration(
        "cache.backend = \"redis\" requires building with the `redis` feature",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(backend: CacheBackendKind) -> CacheSettings {
        CacheSettings {
            enabled: true,
            backend,
            redis_url: Some("redis://127.0.0.1/".to_string()),
            item_ttl_seconds: 3600,
            list_ttl_seconds: 180,
            call_timeout_ms: 250,
            memory_entry_limit: 16,
            single_flight: false,
        }
    }

    #[test]
    fn memory_backend_builds() {
        let client = build_cache_client(&settings(CacheBackendKind::Memory)).unwrap();
        assert!(client.is_enabled());
        assert_eq!(client.config().memory_entry_limit, 16);
    }

    #[cfg(not(feature = "redis"))]
    #[test]
    fn redis_backend_requires_feature() {
        let err = build_cache_client(&settings(CacheBackendKind::Redis)).unwrap_err();
        assert!(matches!(err, InfraError::Configuration { .. }));
    }
}
