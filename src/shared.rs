//! Shared Store Module
//!
//! A bounded store behind one async lock, for callers on many tasks. Each
//! successful put wakes the retirement worker started with
//! [`crate::spawn_retirement_task`].

use std::sync::Arc;

use tokio::sync::{Notify, RwLock};

use crate::cache::{BoundedStore, CacheStats, EstimateSize, Ttl};
use crate::config::StoreConfig;
use crate::error::Result;

// == Shared Store ==
/// Thread-safe handle to a [`BoundedStore`].
///
/// Cloning is cheap; clones share the same store and worker wakeup.
pub struct SharedStore<V> {
    /// Thread-safe store
    pub store: Arc<RwLock<BoundedStore<V>>>,
    /// Signals the retirement worker that passes are queued
    wakeup: Arc<Notify>,
}

impl<V> Clone for SharedStore<V> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            wakeup: Arc::clone(&self.wakeup),
        }
    }
}

impl<V> SharedStore<V> {
    // == Constructor ==
    /// Creates a new SharedStore around the given store.
    pub fn new(store: BoundedStore<V>) -> Self {
        Self {
            store: Arc::new(RwLock::new(store)),
            wakeup: Arc::new(Notify::new()),
        }
    }

    /// Creates a new SharedStore from configuration.
    pub fn from_config(config: StoreConfig) -> Self {
        Self::new(BoundedStore::new(config))
    }

    pub async fn has(&self, key: &str) -> bool {
        self.store.read().await.has(key)
    }

    pub async fn remove(&self, key: &str) -> Result<()> {
        self.store.write().await.remove(key)
    }

    pub async fn clear(&self) {
        self.store.write().await.clear()
    }

    pub async fn size(&self) -> usize {
        self.store.read().await.size()
    }

    pub async fn len(&self) -> usize {
        self.store.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.store.read().await.is_empty()
    }

    pub async fn stats(&self) -> CacheStats {
        self.store.read().await.stats()
    }

    pub async fn pending_retirements(&self) -> usize {
        self.store.read().await.pending_retirements()
    }

    /// Runs every queued retirement pass under the write lock.
    pub async fn run_pending_retirements(&self) -> usize {
        self.store.write().await.run_pending_retirements()
    }

    /// Waits until a put signals queued retirement work.
    pub(crate) async fn retirement_requested(&self) {
        self.wakeup.notified().await
    }
}

impl<V: EstimateSize> SharedStore<V> {
    /// Stores a value and wakes the retirement worker.
    ///
    /// Returns as soon as the entry is inserted; retirement happens on the
    /// worker.
    pub async fn put(&self, key: &str, data: V, ttl: Option<Ttl>) -> Result<()> {
        let result = self.store.write().await.put(key, data, ttl);
        if result.is_ok() {
            self.wakeup.notify_one();
        }
        result
    }
}

impl<V: Clone> SharedStore<V> {
    pub async fn get(&self, key: &str) -> Option<V> {
        self.store.write().await.get(key)
    }

    pub async fn get_or(&self, key: &str, default: V) -> V {
        self.store.write().await.get_or(key, default)
    }
}
