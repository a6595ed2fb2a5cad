//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the store's accounting and retirement invariants
//! over arbitrary operation sequences.

use proptest::prelude::*;
use std::sync::Arc;

use crate::cache::{size_of, BoundedStore, Direction, ManualClock, Ttl, Value};
use crate::config::StoreConfig;
use crate::error::CacheError;

// == Strategies ==
/// Generates keys from a small alphabet so operations collide often
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-e]{1,2}"
}

/// Generates string values between 0 and 16 bytes of estimated size
fn value_strategy() -> impl Strategy<Value = String> {
    "[a-z]{0,8}"
}

#[derive(Debug, Clone)]
enum CacheOp {
    Put { key: String, value: String },
    Get { key: String },
    Remove { key: String },
    Retire,
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        3 => (key_strategy(), value_strategy())
            .prop_map(|(key, value)| CacheOp::Put { key, value }),
        2 => key_strategy().prop_map(|key| CacheOp::Get { key }),
        1 => key_strategy().prop_map(|key| CacheOp::Remove { key }),
        1 => Just(CacheOp::Retire),
    ]
}

fn new_store(max_size: Option<usize>) -> BoundedStore<String> {
    let config = StoreConfig {
        max_size,
        ..StoreConfig::default()
    };
    BoundedStore::with_clock(config, Arc::new(ManualClock::new()))
}

/// Checks index/list agreement and recomputes the aggregate size from scratch.
fn assert_consistent(store: &BoundedStore<String>) -> Result<(), TestCaseError> {
    let front = store.keys(Direction::FrontToBack);
    let mut back = store.keys(Direction::BackToFront);
    back.reverse();
    prop_assert_eq!(&front, &back);
    prop_assert_eq!(front.len(), store.len());

    let reconstructed: usize = store
        .entries(Direction::FrontToBack)
        .map(|entry| entry.size)
        .sum();
    prop_assert_eq!(store.size(), reconstructed);

    for entry in store.entries(Direction::FrontToBack) {
        prop_assert_eq!(entry.size, size_of(&entry.data));
        prop_assert!(store.has(&entry.key));
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    // Aggregate size always equals the sum of live entry sizes, and the index
    // and recency list never disagree.
    #[test]
    fn prop_size_accounting(
        max_size in prop::option::of(0usize..40),
        ops in prop::collection::vec(cache_op_strategy(), 1..80)
    ) {
        let mut store = new_store(max_size);

        for op in ops {
            match op {
                CacheOp::Put { key, value } => {
                    let _ = store.put(key, value, None);
                }
                CacheOp::Get { key } => {
                    store.get(&key);
                }
                CacheOp::Remove { key } => {
                    let _ = store.remove(&key);
                }
                CacheOp::Retire => {
                    store.run_pending_retirements();
                }
            }
            assert_consistent(&store)?;
        }

        store.run_pending_retirements();
        if let Some(max_size) = max_size {
            prop_assert!(store.size() <= max_size);
        }
    }

    // Storing then reading before expiry returns the stored value.
    #[test]
    fn prop_roundtrip_storage(key in key_strategy(), value in value_strategy()) {
        let mut store = new_store(None);

        store.put(key.clone(), value.clone(), None).unwrap();

        prop_assert_eq!(store.get(&key), Some(value));
    }

    // Keys never inserted miss and yield the caller's default.
    #[test]
    fn prop_missing_key_yields_default(
        stored in prop::collection::vec(key_strategy(), 0..10),
        probe in "[f-z]{1,3}",
        default in value_strategy()
    ) {
        let mut store = new_store(None);
        for key in stored {
            store.put(key, "x".to_string(), None).unwrap();
        }

        prop_assert!(!store.has(&probe));
        prop_assert_eq!(store.get_or(&probe, default.clone()), default);
    }

    // A second remove of the same key fails.
    #[test]
    fn prop_remove_idempotent(key in key_strategy(), value in value_strategy()) {
        let mut store = new_store(None);
        store.put(key.clone(), value, None).unwrap();

        prop_assert!(store.remove(&key).is_ok());
        prop_assert_eq!(store.remove(&key), Err(CacheError::NotFound(key.clone())));
        prop_assert!(!store.has(&key));
    }

    // A value larger than the budget is never admitted.
    #[test]
    fn prop_oversized_rejected(key in key_strategy(), value in "[a-z]{3,20}") {
        let budget = value.len() * 2 - 1;
        let mut store = new_store(Some(budget));

        let result = store.put(key.clone(), value, None);

        let rejected = matches!(result, Err(CacheError::Oversized { .. }));
        prop_assert!(rejected);
        prop_assert!(!store.has(&key));
        prop_assert_eq!(store.size(), 0);
    }

    // Without expiry pressure, retirement keeps exactly the newest entries
    // that fit.
    #[test]
    fn prop_retirement_keeps_newest(count in 1usize..30, keep in 1usize..10) {
        let mut store = new_store(Some(keep * 2));

        for i in 0..count {
            store.put(format!("k{}", i), "a".to_string(), None).unwrap();
        }
        store.run_pending_retirements();

        let expected: Vec<String> = (count.saturating_sub(keep)..count)
            .rev()
            .map(|i| format!("k{}", i))
            .collect();
        prop_assert_eq!(store.keys(Direction::FrontToBack), expected);
    }

    // Any number of references to one shared aggregate cost the same as one.
    #[test]
    fn prop_shared_reference_dedup(
        members in prop::collection::vec(("[a-z]{1,4}", "[a-z]{0,6}"), 0..6),
        copies in 1usize..8
    ) {
        let shared = Value::map(members);
        let single = Value::list([shared.clone()]);
        let repeated = Value::list(std::iter::repeat(shared).take(copies));

        prop_assert_eq!(size_of(&repeated), size_of(&single));
    }
}

// Expiry boundary with an explicit TTL, both with and without serving stale
// entries.
proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn prop_expiry_boundary(ttl_ms in 1u64..10_000, allow_expired in any::<bool>()) {
        let clock = ManualClock::new();
        let config = StoreConfig::default().with_allow_expired(allow_expired);
        let mut store: BoundedStore<String> =
            BoundedStore::with_clock(config, Arc::new(clock.clone()));

        store.put("k", "v".to_string(), Some(Ttl::from_millis(ttl_ms))).unwrap();

        clock.set(std::time::Duration::from_millis(ttl_ms - 1));
        prop_assert_eq!(store.get("k"), Some("v".to_string()));

        clock.set(std::time::Duration::from_millis(ttl_ms + 1));
        let expected = if allow_expired { Some("v".to_string()) } else { None };
        prop_assert_eq!(store.get("k"), expected);
    }
}
