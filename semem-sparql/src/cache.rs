//! TTL + LRU query-result cache, invalidated wholesale on writes and
//! rollback.

use std::time::{Duration, Instant};

use lru::LruCache;
use parking_lot::RwLock;
use serde_json::Value;
use std::num::NonZeroUsize;

#[derive(Debug, Clone)]
struct CacheEntry {
    result: Value,
    inserted_at: Instant,
}

/// Running cache statistics, surfaced for observability.
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheMetrics {
    /// Reads that found a live entry.
    pub hits: u64,
    /// Reads that found nothing (miss or expired).
    pub misses: u64,
    /// Entries evicted for exceeding `max_size` or expiring.
    pub evictions: u64,
}

/// TTL + LRU cache for normalized-query → SPARQL result pairs.
pub struct CacheLayer {
    inner: RwLock<LruCache<String, CacheEntry>>,
    ttl: Duration,
    metrics: RwLock<CacheMetrics>,
    enabled: bool,
}

impl CacheLayer {
    /// Construct a cache holding at most `max_size` entries, each valid for `ttl_ms`.
    #[must_use]
    pub fn new(max_size: usize, ttl_ms: u64) -> Self {
        let capacity = NonZeroUsize::new(max_size.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: RwLock::new(LruCache::new(capacity)),
            ttl: Duration::from_millis(ttl_ms),
            metrics: RwLock::new(CacheMetrics::default()),
            enabled: true,
        }
    }

    /// Construct a cache that never stores or returns anything, for when
    /// `SememConfig::cache_enabled` is `false`. Kept as a real [`CacheLayer`]
    /// (rather than an `Option`) so callers don't need to branch.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::new(1, 0)
        }
    }

    /// Normalize a query string by collapsing whitespace runs to a single
    /// space and trimming the ends.
    #[must_use]
    pub fn normalize(query: &str) -> String {
        query.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    /// Look up `query` (normalized internally), purging expired entries
    /// first. Returns a deep copy so callers cannot mutate the cached value.
    ///
    /// Uses `peek` rather than `get`: reads do not refresh recency, so the
    /// cache evicts by insertion order, not by access order.
    pub fn get(&self, query: &str) -> Option<Value> {
        if !self.enabled {
            return None;
        }
        self.purge_expired();
        let key = Self::normalize(query);
        let inner = self.inner.read();
        let hit = inner.peek(&key).map(|entry| entry.result.clone());

        let mut metrics = self.metrics.write();
        if hit.is_some() {
            metrics.hits += 1;
        } else {
            metrics.misses += 1;
        }
        hit
    }

    /// Insert `result` for `query`, purging expired entries and evicting the
    /// oldest-inserted entry if over capacity.
    pub fn put(&self, query: &str, result: Value) {
        if !self.enabled {
            return;
        }
        self.purge_expired();
        let key = Self::normalize(query);
        let mut inner = self.inner.write();
        if inner.put(
            key,
            CacheEntry {
                result,
                inserted_at: Instant::now(),
            },
        )
        .is_some()
        {
            self.metrics.write().evictions += 1;
        }
    }

    fn purge_expired(&self) {
        let ttl = self.ttl;
        let mut inner = self.inner.write();
        let expired: Vec<String> = inner
            .iter()
            .filter(|(_, entry)| entry.inserted_at.elapsed() > ttl)
            .map(|(key, _)| key.clone())
            .collect();
        if expired.is_empty() {
            return;
        }
        for key in &expired {
            inner.pop(key);
        }
        drop(inner);
        self.metrics.write().evictions += expired.len() as u64;
    }

    /// Invalidate every cached entry. Must be called after any write to the
    /// underlying store, and after a rollback.
    pub fn invalidate_all(&self) {
        self.inner.write().clear();
    }

    /// Snapshot of current cache statistics.
    #[must_use]
    pub fn metrics(&self) -> CacheMetrics {
        *self.metrics.read()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn normalize_collapses_whitespace() {
        assert_eq!(CacheLayer::normalize("  SELECT  ?s\n  WHERE "), "SELECT ?s WHERE");
    }

    #[test]
    fn put_then_get_round_trips() {
        let cache = CacheLayer::new(10, 10_000);
        cache.put("SELECT ?s", Value::String("result".to_string()));
        assert_eq!(cache.get("SELECT  ?s"), Some(Value::String("result".to_string())));
    }

    #[test]
    fn get_on_miss_increments_miss_metric() {
        let cache = CacheLayer::new(10, 10_000);
        assert_eq!(cache.get("nothing here"), None);
        assert_eq!(cache.metrics().misses, 1);
    }

    #[test]
    fn entries_expire_after_ttl() {
        let cache = CacheLayer::new(10, 1);
        cache.put("q", Value::Bool(true));
        sleep(Duration::from_millis(5));
        assert_eq!(cache.get("q"), None);
    }

    #[test]
    fn invalidate_all_clears_every_entry() {
        let cache = CacheLayer::new(10, 10_000);
        cache.put("q1", Value::Bool(true));
        cache.put("q2", Value::Bool(false));
        cache.invalidate_all();
        assert_eq!(cache.get("q1"), None);
        assert_eq!(cache.get("q2"), None);
    }

    #[test]
    fn eviction_respects_capacity() {
        let cache = CacheLayer::new(1, 10_000);
        cache.put("q1", Value::Bool(true));
        cache.put("q2", Value::Bool(false));
        assert_eq!(cache.get("q1"), None);
        assert_eq!(cache.get("q2"), Some(Value::Bool(false)));
    }

    #[test]
    fn disabled_cache_never_stores_or_returns_anything() {
        let cache = CacheLayer::disabled();
        cache.put("q1", Value::Bool(true));
        assert_eq!(cache.get("q1"), None);
    }

    #[test]
    fn reads_do_not_refresh_eviction_order() {
        let cache = CacheLayer::new(2, 10_000);
        cache.put("q1", Value::Bool(true));
        cache.put("q2", Value::Bool(false));

        // Reading q1 repeatedly must not protect it from eviction: LRU order
        // is by insertion, not by access.
        for _ in 0..5 {
            cache.get("q1");
        }
        cache.put("q3", Value::String("x".to_string()));

        assert_eq!(cache.get("q1"), None);
        assert_eq!(cache.get("q2"), Some(Value::Bool(false)));
        assert_eq!(cache.get("q3"), Some(Value::String("x".to_string())));
    }
}
