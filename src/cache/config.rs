//! Page cache configuration.

use std::num::NonZeroUsize;

use serde::Deserialize;
use time::Duration;

const DEFAULT_TTL_SECONDS: u64 = 20;
const DEFAULT_MAX_ENTRIES: usize = 64;

/// Cache section of the settings file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Enable the page cache over the public feed.
    pub enabled: bool,
    /// Seconds a cached page stays fresh. Staleness within the TTL is
    /// accepted; writes do not invalidate.
    pub ttl_seconds: u64,
    /// Maximum cached pages before LRU eviction.
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_seconds: DEFAULT_TTL_SECONDS,
            max_entries: DEFAULT_MAX_ENTRIES,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::seconds(i64::try_from(self.ttl_seconds).unwrap_or(i64::MAX))
    }

    /// Entry limit clamped to at least one.
    pub fn max_entries_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.max_entries).unwrap_or(NonZeroUsize::MIN)
    }
}
