//! Tracing and metrics bootstrap.

use metrics::describe_counter;
use tracing_error::ErrorLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::LoggingSettings;
use crate::infra::error::InfraError;

pub fn init(settings: &LoggingSettings) -> Result<(), InfraError> {
    let filter = EnvFilter::try_new(&settings.filter)
        .map_err(|err| InfraError::Telemetry(err.to_string()))?;

    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(ErrorLayer::default());

    let init_result = if settings.json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer().compact()).try_init()
    };
    init_result.map_err(|err| InfraError::Telemetry(err.to_string()))?;

    describe_metrics();
    Ok(())
}

fn describe_metrics() {
    describe_counter!(
        "foglio_page_cache_hit_total",
        "Feed pages served from the page cache"
    );
    describe_counter!(
        "foglio_page_cache_miss_total",
        "Feed page lookups that fell through to a live render"
    );
    describe_counter!(
        "foglio_page_cache_expired_total",
        "Cached feed pages dropped after their TTL elapsed"
    );
    describe_counter!(
        "foglio_page_cache_evict_total",
        "Cached feed pages evicted by the LRU limit"
    );
    describe_counter!(
        "foglio_page_cache_store_total",
        "Feed pages written into the page cache"
    );
}
