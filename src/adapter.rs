//! Adapter Module
//!
//! The uniform contract every cache backend implements, and the [`Cache`]
//! façade that owns one backend and enforces its lifecycle.

use std::fmt;

use tracing::debug;

use crate::cache::{BoundedStore, EstimateSize, Ttl};
use crate::config::{AdapterConfig, AdapterKind};
use crate::error::Result;

// == Cache Adapter Trait ==
/// Operations shared by every cache backend.
pub trait CacheAdapter<V> {
    /// One-time setup, called before first use. Must be idempotent.
    fn init(&mut self) {}

    /// Teardown. Must be idempotent.
    fn destroy(&mut self) -> Result<()>;

    fn get(&mut self, key: &str) -> Option<V>;

    fn get_or(&mut self, key: &str, default: V) -> V {
        self.get(key).unwrap_or(default)
    }

    /// Stores `data`, using the backend's default lifetime when `ttl` is None.
    fn put(&mut self, key: &str, data: V, ttl: Option<Ttl>) -> Result<()>;

    fn has(&self, key: &str) -> bool;

    fn remove(&mut self, key: &str) -> Result<()>;

    fn clear(&mut self);

    /// Runs any retirement passes the backend has queued, returning the
    /// number of entries evicted. Backends without deferred work return 0.
    fn run_pending_retirements(&mut self) -> usize {
        0
    }
}

impl<V: EstimateSize + Clone> CacheAdapter<V> for BoundedStore<V> {
    fn destroy(&mut self) -> Result<()> {
        BoundedStore::clear(self);
        Ok(())
    }

    fn get(&mut self, key: &str) -> Option<V> {
        BoundedStore::get(self, key)
    }

    fn put(&mut self, key: &str, data: V, ttl: Option<Ttl>) -> Result<()> {
        BoundedStore::put(self, key, data, ttl)
    }

    fn has(&self, key: &str) -> bool {
        BoundedStore::has(self, key)
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        BoundedStore::remove(self, key)
    }

    fn clear(&mut self) {
        BoundedStore::clear(self)
    }

    fn run_pending_retirements(&mut self) -> usize {
        BoundedStore::run_pending_retirements(self)
    }
}

// == Cache ==
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Ready,
    Destroyed,
}

/// Single-backend cache with an init/destroy lifecycle.
///
/// The backend is initialised on construction. After [`Cache::destroy`] any
/// data operation panics.
pub struct Cache<V> {
    adapter: Box<dyn CacheAdapter<V> + Send>,
    state: Lifecycle,
}

impl<V> fmt::Debug for Cache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache").field("state", &self.state).finish()
    }
}

impl<V> Cache<V> {
    // == Constructor ==
    /// Wraps and initialises a backend.
    pub fn new(mut adapter: Box<dyn CacheAdapter<V> + Send>) -> Self {
        adapter.init();
        Self {
            adapter,
            state: Lifecycle::Ready,
        }
    }

    pub fn from_adapter<A>(adapter: A) -> Self
    where
        A: CacheAdapter<V> + Send + 'static,
    {
        Self::new(Box::new(adapter))
    }

    pub fn get(&mut self, key: &str) -> Option<V> {
        self.ready_mut().get(key)
    }

    pub fn get_or(&mut self, key: &str, default: V) -> V {
        self.ready_mut().get_or(key, default)
    }

    pub fn put(&mut self, key: &str, data: V, ttl: Option<Ttl>) -> Result<()> {
        self.ready_mut().put(key, data, ttl)
    }

    pub fn has(&self, key: &str) -> bool {
        self.ready().has(key)
    }

    pub fn remove(&mut self, key: &str) -> Result<()> {
        self.ready_mut().remove(key)
    }

    pub fn clear(&mut self) {
        self.ready_mut().clear()
    }

    /// Drains the backend's queued retirement passes.
    pub fn run_pending_retirements(&mut self) -> usize {
        self.ready_mut().run_pending_retirements()
    }

    // == Destroy ==
    /// Tears the backend down. Calling it again is a no-op.
    pub fn destroy(&mut self) -> Result<()> {
        if self.state == Lifecycle::Destroyed {
            return Ok(());
        }
        self.state = Lifecycle::Destroyed;
        debug!("Destroying cache backend");
        self.adapter.destroy()
    }

    pub fn is_destroyed(&self) -> bool {
        self.state == Lifecycle::Destroyed
    }

    fn ready(&self) -> &(dyn CacheAdapter<V> + Send) {
        assert!(
            self.state == Lifecycle::Ready,
            "cache used after destroy()"
        );
        self.adapter.as_ref()
    }

    fn ready_mut(&mut self) -> &mut (dyn CacheAdapter<V> + Send) {
        assert!(
            self.state == Lifecycle::Ready,
            "cache used after destroy()"
        );
        self.adapter.as_mut()
    }
}

impl<V> Cache<V>
where
    V: EstimateSize + Clone + Send + 'static,
{
    /// Builds a cache from a named adapter and its options.
    pub fn from_config(config: &AdapterConfig) -> Self {
        match config.adapter {
            AdapterKind::Lru => Self::from_adapter(BoundedStore::new(config.adapter_options)),
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::error::CacheError;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Backend that records lifecycle calls.
    #[derive(Default)]
    struct RecordingAdapter {
        inits: Arc<AtomicUsize>,
        destroys: Arc<AtomicUsize>,
        data: HashMap<String, String>,
    }

    impl CacheAdapter<String> for RecordingAdapter {
        fn init(&mut self) {
            self.inits.fetch_add(1, Ordering::SeqCst);
        }

        fn destroy(&mut self) -> Result<()> {
            self.destroys.fetch_add(1, Ordering::SeqCst);
            self.data.clear();
            Ok(())
        }

        fn get(&mut self, key: &str) -> Option<String> {
            self.data.get(key).cloned()
        }

        fn put(&mut self, key: &str, data: String, _ttl: Option<Ttl>) -> Result<()> {
            self.data.insert(key.to_string(), data);
            Ok(())
        }

        fn has(&self, key: &str) -> bool {
            self.data.contains_key(key)
        }

        fn remove(&mut self, key: &str) -> Result<()> {
            self.data
                .remove(key)
                .map(|_| ())
                .ok_or_else(|| CacheError::NotFound(key.to_string()))
        }

        fn clear(&mut self) {
            self.data.clear();
        }
    }

    #[test]
    fn test_cache_initialises_adapter_once() {
        let adapter = RecordingAdapter::default();
        let inits = adapter.inits.clone();

        let mut cache = Cache::from_adapter(adapter);
        cache.put("k", "v".to_string(), None).unwrap();

        assert_eq!(inits.load(Ordering::SeqCst), 1);
        assert_eq!(cache.get_or("k", String::new()), "v");
    }

    #[test]
    fn test_cache_from_config_builds_lru() {
        let mut cache: Cache<String> =
            Cache::from_config(&AdapterConfig::lru(StoreConfig::default().with_max_size(3)));

        assert!(matches!(
            cache.put("str", "aa".to_string(), None),
            Err(CacheError::Oversized { .. })
        ));
        cache.put("str", "a".to_string(), None).unwrap();
        assert!(cache.has("str"));
        assert_eq!(cache.get("str"), Some("a".to_string()));
    }

    #[test]
    fn test_cache_delegates_operations() {
        let mut cache: Cache<String> = Cache::from_config(&AdapterConfig::default());

        cache.put("a", "1".to_string(), None).unwrap();
        cache.put("b", "2".to_string(), None).unwrap();
        assert_eq!(cache.get_or("missing", "def".to_string()), "def");

        cache.remove("a").unwrap();
        assert!(cache.remove("a").is_err());
        assert!(!cache.has("a"));

        cache.clear();
        assert!(!cache.has("b"));
    }

    #[test]
    fn test_cache_destroy_is_idempotent() {
        let adapter = RecordingAdapter::default();
        let destroys = adapter.destroys.clone();
        let mut cache = Cache::from_adapter(adapter);

        cache.destroy().unwrap();
        cache.destroy().unwrap();

        assert!(cache.is_destroyed());
        assert_eq!(destroys.load(Ordering::SeqCst), 1);
    }

    #[test]
    #[should_panic(expected = "cache used after destroy()")]
    fn test_cache_use_after_destroy_panics() {
        let mut cache: Cache<String> = Cache::from_config(&AdapterConfig::default());
        cache.destroy().unwrap();
        cache.get("key");
    }

    #[test]
    fn test_cache_runs_queued_retirements() {
        let mut cache: Cache<String> =
            Cache::from_config(&AdapterConfig::lru(StoreConfig::default().with_max_size(4)));

        for key in ["a", "b", "c"] {
            cache.put(key, "x".to_string(), None).unwrap();
        }
        assert!(cache.has("a"));

        assert_eq!(cache.run_pending_retirements(), 1);
        assert!(!cache.has("a"));
        assert!(cache.has("b") && cache.has("c"));
        assert_eq!(cache.run_pending_retirements(), 0);
    }

    #[test]
    fn test_adapter_without_deferred_work_retires_nothing() {
        let mut cache = Cache::from_adapter(RecordingAdapter::default());
        cache.put("k", "v".to_string(), None).unwrap();

        assert_eq!(cache.run_pending_retirements(), 0);
        assert!(cache.has("k"));
    }

    #[test]
    fn test_bounded_store_destroy_clears() {
        let mut store: BoundedStore<String> = BoundedStore::new(StoreConfig::default());
        BoundedStore::put(&mut store, "k", "v".to_string(), None).unwrap();

        CacheAdapter::destroy(&mut store).unwrap();

        assert!(store.is_empty());
    }
}
