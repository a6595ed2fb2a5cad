//! Cache Store Module
//!
//! The eviction engine: a key index over a recency list, with lazy expiry and
//! deferred size-bounded retirement.
//!
//! Retirement is expired-first, then oldest-first by insertion or touch time.
//! This is not classic LRU: a read only refreshes an entry's position when
//! `update_age_on_get` is enabled.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::cache::clock::{Clock, SystemClock};
use crate::cache::entry::{CacheEntry, Ttl};
use crate::cache::recency::{Direction, Handle, RecencyList};
use crate::cache::size::{size_of, EstimateSize};
use crate::cache::stats::CacheStats;
use crate::config::StoreConfig;
use crate::error::{CacheError, Result};

// == Bounded Store ==
/// Size-bounded key/value store with per-entry expiry.
///
/// Every successful `put` enqueues one retirement pass on the store's own work
/// queue. Queued passes run at the start of the next `get`, `put` or `remove`,
/// on an explicit [`BoundedStore::run_pending_retirements`], or on the
/// retirement worker when the store is wrapped in a [`crate::SharedStore`].
/// Until then the aggregate size may exceed `max_size`.
#[derive(Debug)]
pub struct BoundedStore<V> {
    /// Key to list handle
    index: HashMap<String, Handle>,
    /// Entries ordered by insertion or touch time
    list: RecencyList<CacheEntry<V>>,
    /// Sum of the cached size of every live entry
    size: usize,
    config: StoreConfig,
    clock: Arc<dyn Clock>,
    stats: CacheStats,
    /// Retirement passes enqueued by `put` and not yet run
    pending_retirements: usize,
}

impl<V> BoundedStore<V> {
    // == Constructor ==
    /// Creates a new store driven by the system clock.
    pub fn new(config: StoreConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock::new()))
    }

    /// Creates a new store driven by the given clock.
    pub fn with_clock(config: StoreConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            index: HashMap::new(),
            list: RecencyList::new(),
            size: 0,
            config,
            clock,
            stats: CacheStats::new(),
            pending_retirements: 0,
        }
    }

    // == Has ==
    /// Returns true if the key holds an entry that may be served.
    ///
    /// Never evicts and never runs queued retirement.
    pub fn has(&self, key: &str) -> bool {
        let now = self.clock.now();
        self.index
            .get(key)
            .and_then(|&handle| self.list.get(handle))
            .is_some_and(|entry| self.config.allow_expired || !entry.is_expired(now))
    }

    // == Remove ==
    /// Removes an entry by key.
    pub fn remove(&mut self, key: &str) -> Result<()> {
        self.run_pending_retirements();

        match self.detach_key(key) {
            Some(_) => Ok(()),
            None => Err(CacheError::NotFound(key.to_string())),
        }
    }

    // == Clear ==
    /// Removes every entry.
    pub fn clear(&mut self) {
        self.index.clear();
        self.list.clear();
        self.size = 0;
    }

    // == Retire ==
    /// Runs one retirement pass and returns the number of entries evicted.
    ///
    /// Does nothing while the store fits its budget. Otherwise expired entries
    /// are evicted first, stopping as soon as the budget is met, then entries
    /// are evicted from the oldest end of the recency list.
    pub fn retire(&mut self) -> usize {
        self.stats.record_retirement_pass();

        let Some(max_size) = self.config.max_size else {
            return 0;
        };
        if self.size <= max_size {
            return 0;
        }

        let now = self.clock.now();
        let expired: Vec<Handle> = self
            .index
            .values()
            .copied()
            .filter(|&handle| self.live_entry(handle).is_expired(now))
            .collect();

        let mut evicted = 0;
        for handle in expired {
            if self.size <= max_size {
                break;
            }
            self.evict(handle);
            evicted += 1;
        }

        while self.size > max_size {
            let Some(oldest) = self.list.back() else {
                break;
            };
            self.evict(oldest);
            evicted += 1;
        }

        self.stats.record_evictions(evicted);
        debug!(
            "Retirement pass evicted {} entries, size now {} of {}",
            evicted, self.size, max_size
        );
        evicted
    }

    // == Run Pending Retirements ==
    /// Runs every queued retirement pass, returning the total evicted.
    pub fn run_pending_retirements(&mut self) -> usize {
        let mut evicted = 0;
        while self.pending_retirements > 0 {
            self.pending_retirements -= 1;
            evicted += self.retire();
        }
        evicted
    }

    /// Number of retirement passes queued and not yet run.
    pub fn pending_retirements(&self) -> usize {
        self.pending_retirements
    }

    // == Observers ==
    /// Returns the aggregate estimated size of all live entries.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Returns the current number of entries, expired or not.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn max_size(&self) -> Option<usize> {
        self.config.max_size
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Lists keys in recency order.
    pub fn keys(&self, direction: Direction) -> Vec<String> {
        self.list
            .iter(direction)
            .map(|entry| entry.key.clone())
            .collect()
    }

    /// Iterates over the entries in recency order.
    pub fn entries(&self, direction: Direction) -> impl Iterator<Item = &CacheEntry<V>> {
        self.list.iter(direction)
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_occupancy(self.index.len(), self.size);
        stats
    }

    // == Internal Helpers ==
    fn live_entry(&self, handle: Handle) -> &CacheEntry<V> {
        match self.list.get(handle) {
            Some(entry) => entry,
            None => unreachable!("indexed handle is missing from the recency list"),
        }
    }

    /// Unindexes and unlinks the entry for `key`, keeping the size in sync.
    fn detach_key(&mut self, key: &str) -> Option<CacheEntry<V>> {
        let handle = self.index.remove(key)?;
        let entry = self.list.detach(handle);
        self.size -= entry.size;
        Some(entry)
    }

    /// Unlinks the entry behind a live handle and unindexes it.
    fn evict(&mut self, handle: Handle) {
        let entry = self.list.detach(handle);
        self.index.remove(&entry.key);
        self.size -= entry.size;
    }
}

impl<V: EstimateSize> BoundedStore<V> {
    // == Put ==
    /// Stores a value, replacing any existing entry for the key.
    ///
    /// `ttl` defaults to the configured `max_age`. A value whose estimated
    /// size alone exceeds `max_size` is rejected and the store is left
    /// untouched. On success one retirement pass is queued; the store may
    /// exceed its budget until that pass runs.
    pub fn put(&mut self, key: impl Into<String>, data: V, ttl: Option<Ttl>) -> Result<()> {
        self.run_pending_retirements();

        let key = key.into();
        let ttl = ttl.unwrap_or(self.config.max_age);
        let size = size_of(&data);

        if let Some(max_size) = self.config.max_size {
            if size > max_size {
                self.stats.record_rejection();
                debug!(
                    "Rejected {}: {} bytes exceeds the {} byte budget",
                    key, size, max_size
                );
                return Err(CacheError::Oversized {
                    key,
                    size,
                    max_size,
                });
            }
        }

        // Full replace: the new entry gets a fresh position and timestamp
        self.detach_key(&key);

        let entry = CacheEntry::new(key.clone(), data, ttl, size, self.clock.now());
        self.size += size;
        let handle = self.list.push_front(entry);
        self.index.insert(key, handle);

        self.pending_retirements += 1;
        Ok(())
    }
}

impl<V: Clone> BoundedStore<V> {
    // == Get ==
    /// Retrieves a value by key.
    ///
    /// An expired entry is evicted on the spot and reported as a miss, unless
    /// `allow_expired` is set. With `update_age_on_get`, a hit moves the entry
    /// to the front and restarts its full TTL from now.
    pub fn get(&mut self, key: &str) -> Option<V> {
        self.run_pending_retirements();

        let Some(&handle) = self.index.get(key) else {
            self.stats.record_miss();
            return None;
        };

        let now = self.clock.now();
        if !self.config.allow_expired && self.live_entry(handle).is_expired(now) {
            self.detach_key(key);
            self.stats.record_expiration();
            self.stats.record_miss();
            debug!("Evicted expired entry {} on read", key);
            return None;
        }

        let handle = if self.config.update_age_on_get {
            let mut entry = self.list.detach(handle);
            entry.touch(now);
            let touched = self.list.push_front(entry);
            if let Some(slot) = self.index.get_mut(key) {
                *slot = touched;
            }
            touched
        } else {
            handle
        };

        self.stats.record_hit();
        Some(self.live_entry(handle).data.clone())
    }

    /// Retrieves a value by key, or `default` on a miss.
    pub fn get_or(&mut self, key: &str, default: V) -> V {
        self.get(key).unwrap_or(default)
    }
}
