//! TTL page store: full rendered responses keyed by path + query, held in
//! an LRU map and expired lazily against an injected clock.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, RwLock};

use axum::http::{HeaderMap, StatusCode};
use bytes::Bytes;
use lru::LruCache;
use metrics::counter;
use time::{Duration, OffsetDateTime};

use crate::cache::clock::Clock;
use crate::cache::config::CacheConfig;
use crate::cache::lock::{rw_read, rw_write};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageKey {
    path: String,
    query_hash: u64,
}

impl PageKey {
    pub fn new(path: &str, query: Option<&str>) -> Self {
        let mut hasher = DefaultHasher::new();
        query.unwrap_or("").hash(&mut hasher);
        Self {
            path: path.to_string(),
            query_hash: hasher.finish(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CachedPage {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub stored_at: OffsetDateTime,
}

pub struct PageStore {
    entries: RwLock<LruCache<PageKey, CachedPage>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl PageStore {
    pub fn new(config: &CacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(LruCache::new(config.max_entries_non_zero())),
            ttl: config.ttl(),
            clock,
        }
    }

    /// A fresh entry, or None on miss/expiry. Expired entries are dropped
    /// on the way out.
    pub fn get(&self, key: &PageKey) -> Option<CachedPage> {
        let now = self.clock.now();
        let mut entries = rw_write(&self.entries);
        match entries.get(key) {
            Some(page) if now - page.stored_at < self.ttl => {
                counter!("foglio_page_cache_hit_total").increment(1);
                Some(page.clone())
            }
            Some(_) => {
                entries.pop(key);
                counter!("foglio_page_cache_expired_total").increment(1);
                counter!("foglio_page_cache_miss_total").increment(1);
                None
            }
            None => {
                counter!("foglio_page_cache_miss_total").increment(1);
                None
            }
        }
    }

    pub fn put(&self, key: PageKey, status: StatusCode, headers: HeaderMap, body: Bytes) {
        let page = CachedPage {
            status,
            headers,
            body,
            stored_at: self.clock.now(),
        };
        let mut entries = rw_write(&self.entries);
        if entries.len() == entries.cap().get() && !entries.contains(&key) {
            counter!("foglio_page_cache_evict_total").increment(1);
        }
        entries.put(key, page);
        counter!("foglio_page_cache_store_total").increment(1);
    }

    /// Drops every entry. For operators and tests; normal expiry is TTL.
    pub fn clear(&self) {
        rw_write(&self.entries).clear();
    }

    pub fn len(&self) -> usize {
        rw_read(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
