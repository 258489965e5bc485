use branchkey_commons::{CacheKey, TableMeta};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// A cached table snapshot plus its LRU position
#[derive(Debug)]
pub struct CachedTableMeta {
    table: Arc<TableMeta>,

    /// Access tick of the last hit, from [`TableCache`]'s logical clock
    last_access: AtomicU64,
}

impl CachedTableMeta {
    pub fn new(table: Arc<TableMeta>) -> Self {
        Self {
            table,
            last_access: AtomicU64::new(0),
        }
    }

    pub fn table(&self) -> &Arc<TableMeta> {
        &self.table
    }

    pub fn touch_at(&self, tick: u64) {
        self.last_access.store(tick, Ordering::Relaxed);
    }

    pub fn last_access(&self) -> u64 {
        self.last_access.load(Ordering::Relaxed)
    }
}

/// Snapshot of cache counters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CacheStats {
    pub size: usize,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
}

/// Table snapshot cache keyed by [`CacheKey`]
///
/// Recency is tracked with a logical clock stored on each entry rather than
/// a separate ordering structure, so a hit is a map lookup plus one atomic
/// store. Eviction scans for the oldest tick, which is fine for the few
/// hundred tables a resource typically touches.
#[derive(Debug)]
pub struct TableCache {
    cache: DashMap<CacheKey, Arc<CachedTableMeta>>,

    /// Maximum number of entries before LRU eviction (0 = unbounded)
    max_size: usize,

    clock: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl TableCache {
    pub fn new(max_size: usize) -> Self {
        Self {
            cache: DashMap::new(),
            max_size,
            clock: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Look up a table, counting the hit or miss and refreshing recency
    pub fn get(&self, key: &CacheKey) -> Option<Arc<TableMeta>> {
        if let Some(entry) = self.cache.get(key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            entry.value().touch_at(self.tick());
            Some(Arc::clone(entry.value().table()))
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            None
        }
    }

    /// Look up a table without touching counters or recency
    pub fn peek(&self, key: &CacheKey) -> Option<Arc<TableMeta>> {
        self.cache
            .get(key)
            .map(|entry| Arc::clone(entry.value().table()))
    }

    /// Insert or replace a table.
    /// Returns the key of the evicted entry, if any
    pub fn insert(&self, key: CacheKey, table: Arc<TableMeta>) -> Option<CacheKey> {
        let mut evicted = None;
        if self.max_size > 0 && !self.cache.contains_key(&key) && self.cache.len() >= self.max_size {
            evicted = self.evict_lru();
        }

        let entry = Arc::new(CachedTableMeta::new(table));
        entry.touch_at(self.tick());
        self.cache.insert(key, entry);

        evicted
    }

    /// Remove a table; returns whether it was cached
    pub fn invalidate(&self, key: &CacheKey) -> bool {
        self.cache.remove(key).is_some()
    }

    fn evict_lru(&self) -> Option<CacheKey> {
        let oldest = self
            .cache
            .iter()
            .min_by_key(|entry| entry.value().last_access())
            .map(|entry| entry.key().clone());

        if let Some(key) = &oldest {
            self.cache.remove(key);
        }
        oldest
    }

    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;

        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            size: self.cache.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            hit_rate: self.hit_rate(),
        }
    }

    /// Drop every entry and reset counters
    pub fn clear(&self) {
        self.cache.clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::orders_table;

    fn key(table: &str) -> CacheKey {
        CacheKey::new("res", table)
    }

    #[test]
    fn test_hits_and_misses_are_counted() {
        let cache = TableCache::new(0);
        assert!(cache.get(&key("orders")).is_none());

        cache.insert(key("orders"), Arc::new(orders_table()));
        assert!(cache.get(&key("orders")).is_some());
        assert!(cache.peek(&key("orders")).is_some());

        let stats = cache.stats();
        assert_eq!(stats.size, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert!((stats.hit_rate - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_least_recently_used_is_evicted() {
        let cache = TableCache::new(2);
        let table = Arc::new(orders_table());
        cache.insert(key("a"), Arc::clone(&table));
        cache.insert(key("b"), Arc::clone(&table));

        // "a" becomes the most recently used
        assert!(cache.get(&key("a")).is_some());

        let evicted = cache.insert(key("c"), Arc::clone(&table));
        assert_eq!(evicted, Some(key("b")));
        assert_eq!(cache.len(), 2);
        assert!(cache.peek(&key("a")).is_some());
        assert!(cache.peek(&key("c")).is_some());
    }

    #[test]
    fn test_replacing_an_entry_does_not_evict() {
        let cache = TableCache::new(1);
        let table = Arc::new(orders_table());
        cache.insert(key("a"), Arc::clone(&table));
        assert_eq!(cache.insert(key("a"), table), None);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_clear_resets_counters() {
        let cache = TableCache::new(0);
        cache.insert(key("a"), Arc::new(orders_table()));
        cache.get(&key("a"));
        assert!(cache.invalidate(&key("a")));
        assert!(!cache.invalidate(&key("a")));

        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.stats().hits, 0);
    }
}
