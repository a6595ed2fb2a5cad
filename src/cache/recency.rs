//! Recency List Module
//!
//! Arena-backed doubly linked list that orders cache entries by insertion or
//! touch time.

// == Handle ==
/// Stable reference to a node in a [`RecencyList`].
///
/// A handle stays valid until its node is detached. The generation guards
/// against a recycled slot being mistaken for the node that used to live there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle {
    index: usize,
    generation: u64,
}

// == Direction ==
/// Traversal order for snapshots and iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Most recent first
    FrontToBack,
    /// Oldest first
    BackToFront,
}

#[derive(Debug)]
struct Slot<T> {
    value: Option<T>,
    generation: u64,
    prev: Option<usize>,
    next: Option<usize>,
}

// == Recency List ==
/// Doubly linked list of values with O(1) push-front and O(1) detach.
///
/// - Front = most recently inserted or touched
/// - Back = oldest
#[derive(Debug)]
pub struct RecencyList<T> {
    slots: Vec<Slot<T>>,
    /// Indices of vacant slots ready for reuse
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
}

impl<T> Default for RecencyList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> RecencyList<T> {
    // == Constructor ==
    /// Creates a new empty list.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
            len: 0,
        }
    }

    // == Push Front ==
    /// Inserts a value at the front and returns its handle.
    pub fn push_front(&mut self, value: T) -> Handle {
        let index = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index];
                slot.value = Some(value);
                slot.prev = None;
                slot.next = self.head;
                index
            }
            None => {
                self.slots.push(Slot {
                    value: Some(value),
                    generation: 0,
                    prev: None,
                    next: self.head,
                });
                self.slots.len() - 1
            }
        };

        match self.head {
            Some(old_head) => self.slots[old_head].prev = Some(index),
            None => self.tail = Some(index),
        }
        self.head = Some(index);
        self.len += 1;

        Handle {
            index,
            generation: self.slots[index].generation,
        }
    }

    // == Detach ==
    /// Unlinks the node behind `handle` and returns its value.
    ///
    /// # Panics
    /// Panics if the handle does not refer to a live node of this list.
    pub fn detach(&mut self, handle: Handle) -> T {
        assert!(
            self.is_live(handle),
            "detach called with a stale recency list handle: {:?}",
            handle
        );

        let (prev, next) = {
            let slot = &self.slots[handle.index];
            (slot.prev, slot.next)
        };

        match prev {
            Some(prev) => self.slots[prev].next = next,
            None => self.head = next,
        }
        match next {
            Some(next) => self.slots[next].prev = prev,
            None => self.tail = prev,
        }

        let slot = &mut self.slots[handle.index];
        slot.prev = None;
        slot.next = None;
        slot.generation += 1;
        let value = slot.value.take();
        self.free.push(handle.index);
        self.len -= 1;

        match value {
            Some(value) => value,
            None => unreachable!("live slot without a value"),
        }
    }

    // == Accessors ==
    /// Returns the value behind `handle`, or None if the handle is stale.
    pub fn get(&self, handle: Handle) -> Option<&T> {
        self.slots
            .get(handle.index)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.value.as_ref())
    }

    /// Mutable variant of [`RecencyList::get`].
    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        self.slots
            .get_mut(handle.index)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.value.as_mut())
    }

    /// Handle of the most recent node.
    pub fn front(&self) -> Option<Handle> {
        self.head.map(|index| self.handle_at(index))
    }

    /// Handle of the oldest node.
    pub fn back(&self) -> Option<Handle> {
        self.tail.map(|index| self.handle_at(index))
    }

    pub fn is_live(&self, handle: Handle) -> bool {
        self.get(handle).is_some()
    }

    // == Snapshot ==
    /// Collects references to every value in the requested order.
    pub fn snapshot(&self, direction: Direction) -> Vec<&T> {
        self.iter(direction).collect()
    }

    pub fn iter(&self, direction: Direction) -> Iter<'_, T> {
        let cursor = match direction {
            Direction::FrontToBack => self.head,
            Direction::BackToFront => self.tail,
        };
        Iter {
            list: self,
            cursor,
            direction,
            remaining: self.len,
        }
    }

    // == Length ==
    /// Returns the number of live nodes.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    // == Clear ==
    /// Drops every value. All outstanding handles become stale.
    pub fn clear(&mut self) {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.value.take().is_some() {
                slot.generation += 1;
                slot.prev = None;
                slot.next = None;
                self.free.push(index);
            }
        }
        self.head = None;
        self.tail = None;
        self.len = 0;
    }

    fn handle_at(&self, index: usize) -> Handle {
        Handle {
            index,
            generation: self.slots[index].generation,
        }
    }
}

// == Iterator ==
/// Borrowing iterator over a [`RecencyList`].
pub struct Iter<'a, T> {
    list: &'a RecencyList<T>,
    cursor: Option<usize>,
    direction: Direction,
    remaining: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.cursor?;
        let slot = &self.list.slots[index];
        self.cursor = match self.direction {
            Direction::FrontToBack => slot.next,
            Direction::BackToFront => slot.prev,
        };
        self.remaining = self.remaining.saturating_sub(1);
        slot.value.as_ref()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}
