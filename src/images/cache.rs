//! Local cache of resolved legacy images.
//!
//! Entries live in the shared [`KeyValueStore`] under `<prefix><legacy key>`,
//! next to unrelated entries such as the draft slot. Only keys carrying the
//! prefix are ever evicted or cleared.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::storage::KeyValueStore;

/// Default key prefix of cache entries.
pub const DEFAULT_CACHE_PREFIX: &str = "img_";

/// Best-effort cache of legacy image payloads.
///
/// No operation fails observably: read errors count as misses and write
/// errors are logged and dropped.
#[derive(Clone)]
pub struct ImageCache {
    store: Arc<dyn KeyValueStore>,
    prefix: String,
}

impl ImageCache {
    pub fn new(store: Arc<dyn KeyValueStore>, prefix: impl Into<String>) -> Self {
        Self {
            store,
            prefix: prefix.into(),
        }
    }

    fn storage_key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    /// Cached payload for a legacy key.
    pub fn get(&self, key: &str) -> Option<String> {
        match self.store.get_item(&self.storage_key(key)) {
            Ok(Some(payload)) if !payload.is_empty() => {
                debug!(key, "Image cache hit");
                Some(payload)
            }
            Ok(_) => None,
            Err(e) => {
                debug!(key, error = %e, "Image cache read failed");
                None
            }
        }
    }

    /// Store a payload for a legacy key.
    ///
    /// When the store is full the oldest half of the cache is evicted and the
    /// write retried once. A second failure is dropped.
    pub fn put(&self, key: &str, payload: &str) {
        let storage_key = self.storage_key(key);

        let err = match self.store.set_item(&storage_key, payload) {
            Ok(()) => return,
            Err(e) => e,
        };

        if !err.is_capacity() {
            warn!(key, error = %err, "Image cache write failed");
            return;
        }

        let evicted = self.evict_oldest_half();
        info!(key, evicted, "Image cache full, evicted oldest entries");

        if let Err(e) = self.store.set_item(&storage_key, payload) {
            warn!(key, error = %e, "Image cache write failed after eviction");
        }
    }

    /// Remove the oldest half (rounded up) of the cache entries.
    ///
    /// Returns the number of entries removed.
    pub fn evict_oldest_half(&self) -> usize {
        let keys = self.cached_keys();
        let count = keys.len().div_ceil(2);

        keys.iter()
            .take(count)
            .filter(|k| self.remove(k))
            .count()
    }

    /// Remove every cache entry. Returns the number removed.
    pub fn clear(&self) -> usize {
        self.cached_keys().iter().filter(|k| self.remove(k)).count()
    }

    /// Number of cache entries.
    pub fn len(&self) -> usize {
        self.cached_keys().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Storage keys of cache entries, oldest first.
    fn cached_keys(&self) -> Vec<String> {
        match self.store.keys() {
            Ok(keys) => keys
                .into_iter()
                .filter(|k| k.starts_with(&self.prefix))
                .collect(),
            Err(e) => {
                warn!(error = %e, "Failed to list image cache keys");
                Vec::new()
            }
        }
    }

    fn remove(&self, storage_key: &str) -> bool {
        match self.store.remove_item(storage_key) {
            Ok(removed) => removed,
            Err(e) => {
                warn!(key = storage_key, error = %e, "Failed to remove image cache entry");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::SqliteKeyValueStore;
    use reportforge_common::{Error, Result};
    use reportforge_db::pool::init_memory_pool;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn cache_with_quota(quota: Option<u64>) -> (ImageCache, Arc<SqliteKeyValueStore>) {
        let store = Arc::new(SqliteKeyValueStore::new(init_memory_pool().unwrap(), quota));
        (ImageCache::new(store.clone(), DEFAULT_CACHE_PREFIX), store)
    }

    #[test]
    fn test_put_then_get() {
        let (cache, store) = cache_with_quota(None);

        cache.put("k1", "data:image/jpeg;base64,BBB");
        assert_eq!(cache.get("k1").as_deref(), Some("data:image/jpeg;base64,BBB"));
        assert!(cache.get("k2").is_none());
        assert_eq!(
            store.get_item("img_k1").unwrap().as_deref(),
            Some("data:image/jpeg;base64,BBB")
        );
    }

    #[test]
    fn test_evict_oldest_half_rounds_up() {
        let (cache, _) = cache_with_quota(None);
        for i in 0..5 {
            cache.put(&format!("k{}", i), "v");
        }

        assert_eq!(cache.evict_oldest_half(), 3);
        assert_eq!(cache.len(), 2);
        assert!(cache.get("k0").is_none());
        assert!(cache.get("k2").is_none());
        assert!(cache.get("k3").is_some());
        assert!(cache.get("k4").is_some());
    }

    #[test]
    fn test_capacity_triggers_eviction_and_retry() {
        // Each entry "img_kN" + 10 bytes = 16 bytes
        let (cache, store) = cache_with_quota(Some(64));
        for i in 0..4 {
            cache.put(&format!("k{}", i), "0123456789");
        }
        let before = cache.len();
        assert_eq!(before, 4);

        cache.put("k9", "0123456789");

        assert_eq!(cache.get("k9").as_deref(), Some("0123456789"));
        assert!(cache.get("k0").is_none());
        assert!(cache.get("k1").is_none());
        assert!(cache.len() <= before);
        assert!(store.used_bytes().unwrap() <= 64);
    }

    #[test]
    fn test_oversized_entry_is_dropped_silently() {
        let (cache, _) = cache_with_quota(Some(16));
        cache.put("k1", "v");
        cache.put("big", &"x".repeat(100));

        assert!(cache.get("big").is_none());
        // Eviction ran but the retry still did not fit
        assert!(cache.get("k1").is_none());
    }

    #[test]
    fn test_eviction_leaves_foreign_keys() {
        let (cache, store) = cache_with_quota(None);
        store.set_item("laporan_draft", "{}").unwrap();
        cache.put("k1", "v");
        cache.put("k2", "v");

        assert_eq!(cache.clear(), 2);
        assert!(cache.is_empty());
        assert_eq!(store.get_item("laporan_draft").unwrap().as_deref(), Some("{}"));
    }

    struct BrokenStore {
        removals: AtomicUsize,
    }

    impl KeyValueStore for BrokenStore {
        fn get_item(&self, _key: &str) -> Result<Option<String>> {
            Err(Error::database("disk I/O error"))
        }

        fn set_item(&self, _key: &str, _value: &str) -> Result<()> {
            Err(Error::database("disk I/O error"))
        }

        fn remove_item(&self, _key: &str) -> Result<bool> {
            self.removals.fetch_add(1, Ordering::SeqCst);
            Ok(true)
        }

        fn keys(&self) -> Result<Vec<String>> {
            Ok(vec!["img_a".into(), "img_b".into()])
        }
    }

    #[test]
    fn test_non_capacity_errors_do_not_evict() {
        let store = Arc::new(BrokenStore {
            removals: AtomicUsize::new(0),
        });
        let cache = ImageCache::new(store.clone(), DEFAULT_CACHE_PREFIX);

        cache.put("k1", "v");
        assert!(cache.get("k1").is_none());
        assert_eq!(store.removals.load(Ordering::SeqCst), 0);
    }
}
