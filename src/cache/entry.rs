//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use std::time::Duration;

use serde::{Deserialize, Serialize};

// == Time To Live ==
/// Lifetime of a cache entry.
///
/// Serializes as milliseconds, with `null` meaning unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Option<u64>", into = "Option<u64>")]
pub enum Ttl {
    /// The entry never expires
    #[default]
    Unbounded,
    /// The entry expires once this much time has passed since `created_at`
    Bounded(Duration),
}

impl Ttl {
    /// Shorthand for a bounded lifetime in milliseconds.
    pub fn from_millis(ms: u64) -> Self {
        Ttl::Bounded(Duration::from_millis(ms))
    }

    /// Returns the instant after which an entry created at `created_at`
    /// counts as expired, or None if it never does.
    pub fn deadline(&self, created_at: Duration) -> Option<Duration> {
        match self {
            Ttl::Unbounded => None,
            Ttl::Bounded(ttl) => created_at.checked_add(*ttl),
        }
    }

    pub fn is_unbounded(&self) -> bool {
        matches!(self, Ttl::Unbounded)
    }
}

impl From<Duration> for Ttl {
    fn from(ttl: Duration) -> Self {
        Ttl::Bounded(ttl)
    }
}

impl From<Option<u64>> for Ttl {
    fn from(ms: Option<u64>) -> Self {
        ms.map_or(Ttl::Unbounded, Ttl::from_millis)
    }
}

impl From<Ttl> for Option<u64> {
    fn from(ttl: Ttl) -> Self {
        match ttl {
            Ttl::Unbounded => None,
            Ttl::Bounded(d) => Some(u64::try_from(d.as_millis()).unwrap_or(u64::MAX)),
        }
    }
}

// == Cache Entry ==
/// Represents a single cache entry with value and metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// Key the entry is indexed under
    pub key: String,
    /// The stored value
    pub data: V,
    /// Creation (or last touch) timestamp on the store's clock
    pub created_at: Duration,
    /// Lifetime measured from `created_at`
    pub ttl: Ttl,
    /// Estimated size in bytes, fixed at insertion
    pub size: usize,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new cache entry stamped at `now`.
    pub fn new(key: String, data: V, ttl: Ttl, size: usize, now: Duration) -> Self {
        Self {
            key,
            data,
            created_at: now,
            ttl,
            size,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired at `now`.
    ///
    /// Boundary condition: the entry is still live at exactly
    /// `created_at + ttl` and expires strictly after it.
    pub fn is_expired(&self, now: Duration) -> bool {
        match self.ttl.deadline(self.created_at) {
            Some(deadline) => now > deadline,
            None => false,
        }
    }

    // == Time To Live ==
    /// Returns remaining lifetime at `now`, or None if the entry never expires.
    ///
    /// # Returns
    /// - `Some(Duration::ZERO)` if the entry has expired
    /// - `Some(remaining)` if the entry has a TTL and hasn't expired
    /// - `None` if the entry has no TTL
    pub fn ttl_remaining(&self, now: Duration) -> Option<Duration> {
        self.ttl
            .deadline(self.created_at)
            .map(|deadline| deadline.saturating_sub(now))
    }

    // == Touch ==
    /// Resets the entry's age so its full TTL is measured from `now`.
    pub fn touch(&mut self, now: Duration) {
        self.created_at = now;
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn entry(ttl: Ttl) -> CacheEntry<&'static str> {
        CacheEntry::new("key".to_string(), "test_value", ttl, 20, Duration::from_millis(100))
    }

    #[test]
    fn test_entry_creation_no_ttl() {
        let entry = entry(Ttl::Unbounded);

        assert_eq!(entry.data, "test_value");
        assert_eq!(entry.size, 20);
        assert!(!entry.is_expired(Duration::from_secs(u32::MAX as u64)));
        assert!(entry.ttl_remaining(Duration::from_millis(100)).is_none());
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let entry = entry(Ttl::from_millis(50));

        assert!(!entry.is_expired(Duration::from_millis(149)));
        assert!(!entry.is_expired(Duration::from_millis(150)));
        assert!(entry.is_expired(Duration::from_millis(151)));
    }

    #[test]
    fn test_ttl_remaining() {
        let entry = entry(Ttl::from_millis(50));

        assert_eq!(
            entry.ttl_remaining(Duration::from_millis(120)),
            Some(Duration::from_millis(30))
        );
        assert_eq!(
            entry.ttl_remaining(Duration::from_millis(500)),
            Some(Duration::ZERO)
        );
    }

    #[test]
    fn test_touch_resets_age() {
        let mut entry = entry(Ttl::from_millis(50));

        entry.touch(Duration::from_millis(140));

        assert!(!entry.is_expired(Duration::from_millis(185)));
        assert!(entry.is_expired(Duration::from_millis(191)));
    }

    #[test]
    fn test_deadline_overflow_never_expires() {
        let entry = CacheEntry::new(
            "key".to_string(),
            0u8,
            Ttl::Bounded(Duration::MAX),
            8,
            Duration::from_secs(1),
        );
        assert!(!entry.is_expired(Duration::MAX));
    }

    #[test]
    fn test_ttl_serde_as_millis() {
        assert_eq!(serde_json::to_string(&Ttl::from_millis(250)).unwrap(), "250");
        assert_eq!(serde_json::to_string(&Ttl::Unbounded).unwrap(), "null");

        let parsed: Ttl = serde_json::from_str("1500").unwrap();
        assert_eq!(parsed, Ttl::Bounded(Duration::from_millis(1500)));
        let parsed: Ttl = serde_json::from_str("null").unwrap();
        assert!(parsed.is_unbounded());
    }
}
