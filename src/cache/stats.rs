//! Cache Statistics Module
//!
//! Tracks cache performance metrics including hits, misses, and retirements.

use serde::Serialize;

// == Cache Stats ==
/// Tracks cache performance metrics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Number of successful cache retrievals
    pub hits: u64,
    /// Number of failed cache retrievals (key not found or expired)
    pub misses: u64,
    /// Entries dropped because a read found them expired
    pub expirations: u64,
    /// Entries dropped by retirement passes
    pub evictions: u64,
    /// Puts refused because the value alone exceeds the size budget
    pub rejections: u64,
    /// Retirement passes executed, including ones that found nothing to do
    pub retirement_passes: u64,
    /// Current number of entries in the cache
    pub total_entries: usize,
    /// Current aggregate estimated size in bytes
    pub total_size: usize,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_expiration(&mut self) {
        self.expirations += 1;
    }

    pub fn record_evictions(&mut self, count: usize) {
        self.evictions += count as u64;
    }

    pub fn record_rejection(&mut self) {
        self.rejections += 1;
    }

    pub fn record_retirement_pass(&mut self) {
        self.retirement_passes += 1;
    }

    // == Update Occupancy ==
    /// Updates the entry count and aggregate size.
    pub fn set_occupancy(&mut self, entries: usize, size: usize) {
        self.total_entries = entries;
        self.total_size = size;
    }
}
