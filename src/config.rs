//! Configuration Module
//!
//! Store options, loadable from environment variables or JSON.

use std::env;

use serde::{Deserialize, Serialize};

use crate::cache::Ttl;
use crate::error::Result;

// == Store Config ==
/// Options recognised by a bounded store.
///
/// Serialized in camelCase; `maxAge` is in milliseconds with `null` meaning
/// unbounded, and a missing `maxSize` means no budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoreConfig {
    /// Lifetime given to entries put without an explicit TTL
    pub max_age: Ttl,
    /// Aggregate size budget in estimated bytes
    pub max_size: Option<usize>,
    /// Whether a successful read moves the entry to the front and resets its age
    pub update_age_on_get: bool,
    /// Whether expired entries are still served until physically retired
    pub allow_expired: bool,
}

impl StoreConfig {
    /// Creates a new StoreConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_MAX_AGE_MS` - Default entry lifetime in milliseconds (default: unbounded)
    /// - `CACHE_MAX_SIZE` - Size budget in estimated bytes (default: unbounded)
    /// - `CACHE_UPDATE_AGE_ON_GET` - `true`/`false` (default: false)
    /// - `CACHE_ALLOW_EXPIRED` - `true`/`false` (default: false)
    ///
    /// Values that fail to parse fall back to the default.
    pub fn from_env() -> Self {
        Self {
            max_age: env::var("CACHE_MAX_AGE_MS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .map_or(Ttl::Unbounded, Ttl::from_millis),
            max_size: env::var("CACHE_MAX_SIZE")
                .ok()
                .and_then(|v| v.parse().ok()),
            update_age_on_get: env::var("CACHE_UPDATE_AGE_ON_GET")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            allow_expired: env::var("CACHE_ALLOW_EXPIRED")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
        }
    }

    /// Parses a config from a JSON object.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_max_age(mut self, max_age: impl Into<Ttl>) -> Self {
        self.max_age = max_age.into();
        self
    }

    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = Some(max_size);
        self
    }

    pub fn with_update_age_on_get(mut self, enabled: bool) -> Self {
        self.update_age_on_get = enabled;
        self
    }

    pub fn with_allow_expired(mut self, enabled: bool) -> Self {
        self.allow_expired = enabled;
        self
    }
}

// == Adapter Config ==
/// Store implementations a [`crate::Cache`] can be built from by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdapterKind {
    /// Size-bounded store with insertion/touch-order retirement
    #[default]
    Lru,
}

/// Names an adapter and its options, one per cache tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdapterConfig {
    pub adapter: AdapterKind,
    #[serde(default)]
    pub adapter_options: StoreConfig,
}

impl AdapterConfig {
    pub fn lru(options: StoreConfig) -> Self {
        Self {
            adapter: AdapterKind::Lru,
            adapter_options: options,
        }
    }
}
