//! Cache Module
//!
//! Provides the size-bounded store with TTL expiration and deferred
//! retirement, plus the size estimator that feeds its budget.

mod clock;
mod entry;
mod recency;
mod size;
mod stats;
mod store;
mod value;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::{CacheEntry, Ttl};
pub use recency::{Direction, Handle, Iter, RecencyList};
pub use size::{
    size_of, EstimateSize, Opaque, SizeEstimator, BOOLEAN_SIZE, NUMBER_SIZE, TEXT_UNIT_SIZE,
};
pub use stats::CacheStats;
pub use store::BoundedStore;
pub use value::Value;
