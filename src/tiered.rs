//! Tiered Cache Module
//!
//! Sequences several independently configured caches, consulted in priority
//! order.

use tracing::debug;

use crate::adapter::Cache;
use crate::cache::EstimateSize;
use crate::config::AdapterConfig;
use crate::error::{CacheError, Result};

// == Tiered Cache ==
/// Ordered stack of caches.
///
/// Reads stop at the first tier holding the key. Writes, removals and
/// teardown go to every tier and succeed only if every tier does.
#[derive(Debug)]
pub struct TieredCache<V> {
    tiers: Vec<Cache<V>>,
}

impl<V> TieredCache<V> {
    // == Constructor ==
    /// Creates a stack from caches in priority order.
    pub fn new(tiers: Vec<Cache<V>>) -> Self {
        Self { tiers }
    }

    // == Has ==
    /// Returns true if any tier holds the key.
    pub fn has(&self, key: &str) -> bool {
        self.tiers.iter().any(|tier| tier.has(key))
    }

    // == Remove ==
    /// Removes the key from every tier.
    pub fn remove(&mut self, key: &str) -> Result<()> {
        self.apply_all("remove", key, |tier| tier.remove(key))
    }

    // == Destroy ==
    /// Destroys every tier.
    pub fn destroy(&mut self) -> Result<()> {
        self.apply_all("destroy", "*", Cache::destroy)
    }

    // == Retirement ==
    /// Runs queued retirement passes on every tier, returning the total
    /// number of entries evicted.
    pub fn run_pending_retirements(&mut self) -> usize {
        self.tiers
            .iter_mut()
            .map(Cache::run_pending_retirements)
            .sum()
    }

    pub fn tiers(&self) -> &[Cache<V>] {
        &self.tiers
    }

    pub fn tier(&self, index: usize) -> Option<&Cache<V>> {
        self.tiers.get(index)
    }

    pub fn tier_mut(&mut self, index: usize) -> Option<&mut Cache<V>> {
        self.tiers.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }

    /// Runs `op` on every tier without short-circuiting, keeping the first error.
    fn apply_all<F>(&mut self, op: &str, key: &str, mut f: F) -> Result<()>
    where
        F: FnMut(&mut Cache<V>) -> Result<()>,
    {
        let mut first_error: Option<CacheError> = None;
        for (index, tier) in self.tiers.iter_mut().enumerate() {
            if let Err(err) = f(tier) {
                debug!("Tier {} failed to {} {}: {}", index, op, key, err);
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

impl<V: Clone> TieredCache<V> {
    // == Get ==
    /// Returns the value from the first tier that holds the key.
    ///
    /// A miss is a tier returning `None`. Any stored value is a hit, including
    /// one the caller considers null (such as `Value::Null`), so it shadows
    /// lower tiers.
    pub fn get(&mut self, key: &str) -> Option<V> {
        self.tiers.iter_mut().find_map(|tier| tier.get(key))
    }

    pub fn get_or(&mut self, key: &str, default: V) -> V {
        self.get(key).unwrap_or(default)
    }

    // == Put ==
    /// Writes the value to every tier.
    ///
    /// There is no per-call TTL: each tier applies its own configured
    /// default lifetime.
    pub fn put(&mut self, key: &str, data: V) -> Result<()> {
        self.apply_all("put", key, |tier| tier.put(key, data.clone(), None))
    }
}

impl<V> TieredCache<V>
where
    V: EstimateSize + Clone + Send + 'static,
{
    /// Builds one tier per adapter config, in order.
    pub fn from_configs(configs: &[AdapterConfig]) -> Self {
        Self::new(configs.iter().map(Cache::from_config).collect())
    }

    /// Builds the stack from a JSON array of adapter configs.
    ///
    /// ```
    /// use tiered_cache::TieredCache;
    ///
    /// let mut stack: TieredCache<String> = TieredCache::from_json(
    ///     r#"[{"adapter": "lru", "adapterOptions": {"maxSize": 1024}}, {"adapter": "lru"}]"#,
    /// )
    /// .unwrap();
    /// stack.put("key", "value".to_string()).unwrap();
    /// assert!(stack.has("key"));
    /// ```
    pub fn from_json(json: &str) -> Result<Self> {
        let configs: Vec<AdapterConfig> = serde_json::from_str(json)?;
        Ok(Self::from_configs(&configs))
    }
}
