//! Read-through registry of table snapshots

use super::table_cache::{CacheStats, TableCache};
use crate::dialect::Dialect;
use crate::driver::DbConnection;
use crate::error::SchemaFetchError;
use branchkey_commons::{CacheKey, TableMeta};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;

type FetchResult = Result<Arc<TableMeta>, SchemaFetchError>;

/// Shared slot for one in-progress fetch; every waiter reads the same result
type Flight = Arc<OnceCell<FetchResult>>;

/// Table schema registry for one dialect
///
/// - Hits are served from [`TableCache`] without I/O
/// - Misses are single-flight per [`CacheKey`]: the first caller fetches,
///   concurrent callers for the same key wait for its result (success or error)
/// - Failed fetches are not cached; the next call retries
/// - No lock is held while the catalog queries run
pub struct SchemaRegistry {
    dialect: Arc<dyn Dialect>,
    cache: TableCache,
    in_flight: DashMap<CacheKey, Flight>,
    fetch_timeout: Option<Duration>,

    /// Catalog fetches issued (for metrics and tests)
    fetches: AtomicU64,
}

impl std::fmt::Debug for SchemaRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaRegistry")
            .field("dialect", &self.dialect.kind())
            .field("table_cache_size", &self.cache.len())
            .field("in_flight", &self.in_flight.len())
            .field("fetch_timeout", &self.fetch_timeout)
            .finish()
    }
}

impl SchemaRegistry {
    /// `max_entries` = 0 disables eviction
    pub fn new(dialect: Arc<dyn Dialect>, max_entries: usize, fetch_timeout: Option<Duration>) -> Self {
        Self {
            dialect,
            cache: TableCache::new(max_entries),
            in_flight: DashMap::new(),
            fetch_timeout,
            fetches: AtomicU64::new(0),
        }
    }

    pub fn dialect(&self) -> &Arc<dyn Dialect> {
        &self.dialect
    }

    pub fn cache_key(&self, table_name: &str, resource_id: &str) -> CacheKey {
        self.dialect.cache_key(table_name, resource_id)
    }

    // ===== Read-through =====

    /// Get the snapshot of `table_name`, fetching it on a miss
    pub async fn get(
        &self,
        conn: &dyn DbConnection,
        table_name: &str,
        resource_id: &str,
    ) -> FetchResult {
        let key = self.cache_key(table_name, resource_id);
        if let Some(table) = self.cache.get(&key) {
            return Ok(table);
        }
        self.load(conn, table_name, key).await
    }

    /// Drop the cached snapshot and fetch it again
    pub async fn refresh(
        &self,
        conn: &dyn DbConnection,
        table_name: &str,
        resource_id: &str,
    ) -> FetchResult {
        let key = self.cache_key(table_name, resource_id);
        self.invalidate_key(&key);
        self.load(conn, table_name, key).await
    }

    async fn load(&self, conn: &dyn DbConnection, table_name: &str, key: CacheKey) -> FetchResult {
        // The map guard must not live past this statement
        let flight: Flight = self
            .in_flight
            .entry(key.clone())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .value()
            .clone();

        let result = flight
            .get_or_init(|| {
                let flight = Arc::clone(&flight);
                let key = &key;
                async move {
                    // A flight may have completed between our miss and joining
                    if let Some(table) = self.cache.peek(key) {
                        return Ok(table);
                    }
                    let fetched = self.fetch(conn, table_name, key).await;
                    match &fetched {
                        Ok(table) if self.is_current_flight(key, &flight) => {
                            if let Some(evicted) = self.cache.insert(key.clone(), Arc::clone(table)) {
                                log::debug!("[SchemaRegistry] Evicted {} to cache {}", evicted, key);
                            }
                        }
                        Ok(_) => {
                            log::debug!(
                                "[SchemaRegistry] {} was invalidated or replaced while fetching, not caching",
                                key
                            );
                        }
                        Err(e) => {
                            log::warn!("[SchemaRegistry] Failed to fetch schema of {}: {}", key, e);
                        }
                    }
                    fetched
                }
            })
            .await
            .clone();

        // Removed only once resolved
        self.finish_flight(&key, &flight);
        result
    }

    async fn fetch(&self, conn: &dyn DbConnection, table_name: &str, key: &CacheKey) -> FetchResult {
        self.fetches.fetch_add(1, Ordering::Relaxed);
        log::debug!("[SchemaRegistry] Fetching schema of {} as {}", table_name, key);

        let fetch = self.dialect.fetch_schema(conn, table_name);
        let table = match self.fetch_timeout {
            Some(after) => tokio::time::timeout(after, fetch)
                .await
                .map_err(|_| SchemaFetchError::timeout(key, after))??,
            None => fetch.await?,
        };
        Ok(Arc::new(table))
    }

    fn is_current_flight(&self, key: &CacheKey, flight: &Flight) -> bool {
        self.in_flight
            .get(key)
            .map(|entry| Arc::ptr_eq(entry.value(), flight))
            .unwrap_or(false)
    }

    fn finish_flight(&self, key: &CacheKey, flight: &Flight) {
        self.in_flight.remove_if(key, |_, current| Arc::ptr_eq(current, flight));
    }

    // ===== Cache access =====

    /// Cached snapshot without I/O or counter updates
    pub fn peek(&self, table_name: &str, resource_id: &str) -> Option<Arc<TableMeta>> {
        self.cache.peek(&self.cache_key(table_name, resource_id))
    }

    /// Cached snapshot by key, counting the hit or miss
    pub fn get_by_key(&self, key: &CacheKey) -> Option<Arc<TableMeta>> {
        self.cache.get(key)
    }

    /// Store a snapshot fetched elsewhere.
    ///
    /// Any in-progress fetch of the key is detached so its older result does
    /// not replace this one.
    pub fn insert(&self, key: CacheKey, table: Arc<TableMeta>) {
        self.in_flight.remove(&key);
        self.cache.insert(key, table);
    }

    /// Drop the snapshot of `table_name` (e.g. after DDL)
    pub fn invalidate(&self, resource_id: &str, table_name: &str) -> bool {
        let key = self.cache_key(table_name, resource_id);
        self.invalidate_key(&key)
    }

    /// Drop a snapshot and detach any in-progress fetch of it.
    ///
    /// A detached fetch still answers its current waiters but its result is
    /// not cached.
    pub fn invalidate_key(&self, key: &CacheKey) -> bool {
        let detached = self.in_flight.remove(key).is_some();
        let removed = self.cache.invalidate(key);
        if removed || detached {
            log::debug!("[SchemaRegistry] Invalidated {}", key);
        }
        removed
    }

    /// Drop every snapshot and detach every in-progress fetch
    pub fn clear(&self) {
        self.in_flight.clear();
        self.cache.clear();
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Number of catalog fetches issued so far
    pub fn fetch_count(&self) -> u64 {
        self.fetches.load(Ordering::Relaxed)
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
    use crate::dialect::GBasedbtDialect;
    use crate::test_helpers::MockConnection;

    fn registry() -> SchemaRegistry {
        SchemaRegistry::new(Arc::new(GBasedbtDialect), 16, None)
    }

    #[tokio::test]
    async fn test_second_get_is_served_from_cache() {
        let registry = registry();
        let conn = MockConnection::orders();

        let first = registry.get(&conn, "orders", "res").await.unwrap();
        let second = registry.get(&conn, "ORDERS", "res").await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(conn.columns_calls(), 1);
        assert_eq!(registry.fetch_count(), 1);
        assert_eq!(registry.stats().hits, 1);
    }

    #[tokio::test]
    async fn test_refresh_fetches_again() {
        let registry = registry();
        let conn = MockConnection::orders();

        let first = registry.get(&conn, "orders", "res").await.unwrap();
        let refreshed = registry.refresh(&conn, "orders", "res").await.unwrap();

        assert!(!Arc::ptr_eq(&first, &refreshed));
        assert_eq!(*first, *refreshed);
        assert_eq!(registry.fetch_count(), 2);
    }
}
