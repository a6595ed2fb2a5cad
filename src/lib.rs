//! Tiered Cache - an in-process key/value cache
//!
//! Provides a size-bounded store with per-entry expiry and expired-first,
//! oldest-next retirement, an approximate size estimator for heterogeneous
//! values, and a multi-tier composition of independently configured stores.

pub mod adapter;
pub mod cache;
pub mod config;
pub mod error;
pub mod shared;
pub mod tasks;
pub mod tiered;

pub use adapter::{Cache, CacheAdapter};
pub use cache::{BoundedStore, CacheStats, EstimateSize, Ttl, Value};
pub use config::{AdapterConfig, AdapterKind, StoreConfig};
pub use error::{CacheError, Result};
pub use shared::SharedStore;
pub use tasks::spawn_retirement_task;
pub use tiered::TieredCache;
