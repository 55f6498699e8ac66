use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::cache::{
    METRIC_CACHE_BACKEND_ERROR_TOTAL, METRIC_CACHE_BUILD_MS, METRIC_CACHE_DECODE_ERROR_TOTAL,
    METRIC_CACHE_HIT_TOTAL, METRIC_CACHE_INVALIDATION_TOTAL, METRIC_CACHE_MISS_TOTAL,
};
use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(InfraError::logging)
}

fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            METRIC_CACHE_HIT_TOTAL,
            Unit::Count,
            "Total number of cache hits, labelled by cache."
        );
        describe_counter!(
            METRIC_CACHE_MISS_TOTAL,
            Unit::Count,
            "Total number of cache misses that ran the builder, labelled by cache."
        );
        describe_counter!(
            METRIC_CACHE_DECODE_ERROR_TOTAL,
            Unit::Count,
            "Total number of cached payloads discarded because they failed to decode."
        );
        describe_counter!(
            METRIC_CACHE_BACKEND_ERROR_TOTAL,
            Unit::Count,
            "Total number of failed or timed-out backend calls, labelled by operation."
        );
        describe_counter!(
            METRIC_CACHE_INVALIDATION_TOTAL,
            Unit::Count,
            "Total number of tags invalidated."
        );
        describe_histogram!(
            METRIC_CACHE_BUILD_MS,
            Unit::Milliseconds,
            "Time spent rebuilding a value after a cache miss, in milliseconds."
        );
    });
}
