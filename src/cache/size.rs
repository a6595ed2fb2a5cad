//! Size Estimation Module
//!
//! Approximates the memory cost of cached values so the store can enforce a
//! byte budget. Costs follow a fixed table rather than real allocator usage:
//!
//! | kind                         | cost                       |
//! |------------------------------|----------------------------|
//! | text                         | 2 bytes per UTF-16 unit    |
//! | boolean                      | 4                          |
//! | any numeric scalar           | 8                          |
//! | byte buffer                  | its length                 |
//! | aggregates                   | sum of their members       |
//!
//! Shared pointers (`Arc`, `Rc`) are deduplicated by address, so the same
//! allocation reached twice, including through a cycle, is counted once.
//!
//! Byte buffers are [`Bytes`] and [`BytesMut`]. A plain `Vec<u8>` or `[u8]`
//! is a sequence of numbers and costs 8 per element.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::rc::Rc;
use std::sync::{Arc, Mutex, RwLock, TryLockError};

use bytes::{Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use tracing::trace;

// == Cost Table ==
/// Cost of one UTF-16 code unit of text
pub const TEXT_UNIT_SIZE: usize = 2;

/// Cost of a boolean
pub const BOOLEAN_SIZE: usize = 4;

/// Cost of any numeric scalar, regardless of width
pub const NUMBER_SIZE: usize = 8;

// == Estimate Size Trait ==
/// Types whose approximate byte cost can be computed.
///
/// Implementations for aggregates must route their members back through the
/// estimator so shared references are seen by the dedup set.
pub trait EstimateSize {
    /// Returns the cost of `self`, recording any shared references reached.
    fn estimate_size(&self, estimator: &mut SizeEstimator) -> usize;
}

// == Size Estimator ==
/// Traversal context holding the set of already-visited shared allocations.
///
/// A fresh estimator scopes deduplication to a single value. Reusing one
/// across several calls deduplicates across them too; in that case the caller
/// must keep the measured values alive until the estimator is reset or
/// dropped, since visited allocations are tracked by address.
#[derive(Debug, Default)]
pub struct SizeEstimator {
    visited: HashSet<usize>,
}

impl SizeEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Computes the cost of `value`.
    pub fn size_of<T: EstimateSize + ?Sized>(&mut self, value: &T) -> usize {
        value.estimate_size(self)
    }

    /// Records a shared allocation, returning false if it was already seen.
    pub fn first_visit<T: ?Sized>(&mut self, ptr: *const T) -> bool {
        self.visited.insert(ptr as *const () as usize)
    }

    /// Number of distinct shared allocations seen so far.
    pub fn visited(&self) -> usize {
        self.visited.len()
    }

    /// Forgets every visited allocation.
    pub fn reset(&mut self) {
        self.visited.clear();
    }
}

/// Computes the cost of `value` with a fresh estimator.
pub fn size_of<T: EstimateSize + ?Sized>(value: &T) -> usize {
    SizeEstimator::new().size_of(value)
}

// == Scalars ==
macro_rules! numeric_size {
    ($($ty:ty),* $(,)?) => {
        $(
            impl EstimateSize for $ty {
                fn estimate_size(&self, _: &mut SizeEstimator) -> usize {
                    NUMBER_SIZE
                }
            }
        )*
    };
}

numeric_size!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, f32, f64);

impl EstimateSize for bool {
    fn estimate_size(&self, _: &mut SizeEstimator) -> usize {
        BOOLEAN_SIZE
    }
}

impl EstimateSize for char {
    fn estimate_size(&self, _: &mut SizeEstimator) -> usize {
        self.len_utf16() * TEXT_UNIT_SIZE
    }
}

impl EstimateSize for str {
    fn estimate_size(&self, _: &mut SizeEstimator) -> usize {
        self.encode_utf16().count() * TEXT_UNIT_SIZE
    }
}

impl EstimateSize for String {
    fn estimate_size(&self, estimator: &mut SizeEstimator) -> usize {
        self.as_str().estimate_size(estimator)
    }
}

impl EstimateSize for () {
    fn estimate_size(&self, _: &mut SizeEstimator) -> usize {
        0
    }
}

// == Byte Buffers ==
impl EstimateSize for Bytes {
    fn estimate_size(&self, _: &mut SizeEstimator) -> usize {
        self.len()
    }
}

impl EstimateSize for BytesMut {
    fn estimate_size(&self, _: &mut SizeEstimator) -> usize {
        self.len()
    }
}

// == Owning Wrappers ==
impl<T: EstimateSize + ?Sized> EstimateSize for &T {
    fn estimate_size(&self, estimator: &mut SizeEstimator) -> usize {
        (**self).estimate_size(estimator)
    }
}

impl<T: EstimateSize + ?Sized> EstimateSize for Box<T> {
    fn estimate_size(&self, estimator: &mut SizeEstimator) -> usize {
        (**self).estimate_size(estimator)
    }
}

impl<T: EstimateSize> EstimateSize for Option<T> {
    fn estimate_size(&self, estimator: &mut SizeEstimator) -> usize {
        self.as_ref().map_or(0, |inner| inner.estimate_size(estimator))
    }
}

// == Sequences ==
fn sum_all<'a, T, I>(items: I, estimator: &mut SizeEstimator) -> usize
where
    T: EstimateSize + 'a,
    I: IntoIterator<Item = &'a T>,
{
    items
        .into_iter()
        .map(|item| item.estimate_size(estimator))
        .sum()
}

impl<T: EstimateSize> EstimateSize for [T] {
    fn estimate_size(&self, estimator: &mut SizeEstimator) -> usize {
        sum_all(self, estimator)
    }
}

impl<T: EstimateSize, const N: usize> EstimateSize for [T; N] {
    fn estimate_size(&self, estimator: &mut SizeEstimator) -> usize {
        sum_all(self, estimator)
    }
}

impl<T: EstimateSize> EstimateSize for Vec<T> {
    fn estimate_size(&self, estimator: &mut SizeEstimator) -> usize {
        sum_all(self, estimator)
    }
}

impl<T: EstimateSize> EstimateSize for VecDeque<T> {
    fn estimate_size(&self, estimator: &mut SizeEstimator) -> usize {
        sum_all(self, estimator)
    }
}

impl<T: EstimateSize, S> EstimateSize for HashSet<T, S> {
    fn estimate_size(&self, estimator: &mut SizeEstimator) -> usize {
        sum_all(self, estimator)
    }
}

impl<T: EstimateSize> EstimateSize for BTreeSet<T> {
    fn estimate_size(&self, estimator: &mut SizeEstimator) -> usize {
        sum_all(self, estimator)
    }
}

// == Keyed Maps ==
// Only values are counted; keys are treated as structure.
impl<K, V: EstimateSize, S> EstimateSize for HashMap<K, V, S> {
    fn estimate_size(&self, estimator: &mut SizeEstimator) -> usize {
        sum_all(self.values(), estimator)
    }
}

impl<K, V: EstimateSize> EstimateSize for BTreeMap<K, V> {
    fn estimate_size(&self, estimator: &mut SizeEstimator) -> usize {
        sum_all(self.values(), estimator)
    }
}

impl<A: EstimateSize, B: EstimateSize> EstimateSize for (A, B) {
    fn estimate_size(&self, estimator: &mut SizeEstimator) -> usize {
        self.0.estimate_size(estimator) + self.1.estimate_size(estimator)
    }
}

impl<A: EstimateSize, B: EstimateSize, C: EstimateSize> EstimateSize for (A, B, C) {
    fn estimate_size(&self, estimator: &mut SizeEstimator) -> usize {
        self.0.estimate_size(estimator)
            + self.1.estimate_size(estimator)
            + self.2.estimate_size(estimator)
    }
}

// == Shared References ==
impl<T: EstimateSize + ?Sized> EstimateSize for Arc<T> {
    fn estimate_size(&self, estimator: &mut SizeEstimator) -> usize {
        if estimator.first_visit(Arc::as_ptr(self)) {
            (**self).estimate_size(estimator)
        } else {
            0
        }
    }
}

impl<T: EstimateSize + ?Sized> EstimateSize for Rc<T> {
    fn estimate_size(&self, estimator: &mut SizeEstimator) -> usize {
        if estimator.first_visit(Rc::as_ptr(self)) {
            (**self).estimate_size(estimator)
        } else {
            0
        }
    }
}

// == Interior Mutability ==
// A cell that is exclusively held elsewhere is skipped rather than waited on.
impl<T: EstimateSize + ?Sized> EstimateSize for RefCell<T> {
    fn estimate_size(&self, estimator: &mut SizeEstimator) -> usize {
        match self.try_borrow() {
            Ok(inner) => inner.estimate_size(estimator),
            Err(_) => 0,
        }
    }
}

impl<T: EstimateSize + ?Sized> EstimateSize for Mutex<T> {
    fn estimate_size(&self, estimator: &mut SizeEstimator) -> usize {
        match self.try_lock() {
            Ok(inner) => inner.estimate_size(estimator),
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner().estimate_size(estimator),
            Err(TryLockError::WouldBlock) => 0,
        }
    }
}

impl<T: EstimateSize + ?Sized> EstimateSize for RwLock<T> {
    fn estimate_size(&self, estimator: &mut SizeEstimator) -> usize {
        match self.try_read() {
            Ok(inner) => inner.estimate_size(estimator),
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner().estimate_size(estimator),
            Err(TryLockError::WouldBlock) => 0,
        }
    }
}

// == JSON Values ==
impl EstimateSize for serde_json::Value {
    fn estimate_size(&self, estimator: &mut SizeEstimator) -> usize {
        use serde_json::Value as Json;

        match self {
            Json::Null => 0,
            Json::Bool(_) => BOOLEAN_SIZE,
            Json::Number(_) => NUMBER_SIZE,
            Json::String(text) => text.estimate_size(estimator),
            Json::Array(items) => sum_all(items, estimator),
            Json::Object(members) => sum_all(members.values(), estimator),
        }
    }
}

// == Opaque Fallback ==
/// Estimates any serializable type by summing its serialized members.
///
/// Use this for types that have no [`EstimateSize`] implementation. The value
/// is walked through its `Serialize` impl: struct fields and map entries count
/// as members, sequences as elements. Anything that fails to serialize is
/// costed at zero.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Opaque<T>(pub T);

impl<T> Opaque<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T: Serialize> EstimateSize for Opaque<T> {
    fn estimate_size(&self, estimator: &mut SizeEstimator) -> usize {
        match serde_json::to_value(&self.0) {
            Ok(members) => members.estimate_size(estimator),
            Err(err) => {
                trace!("Opaque value could not be enumerated, costing 0: {}", err);
                0
            }
        }
    }
}
