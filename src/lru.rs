//! Bounded least-recently-used cache
//!
//! Generic fixed-capacity key/value store. Both reads and writes count
//! as a "touch" and refresh an entry's recency; once the store is full,
//! inserting a new key evicts the least-recently-touched entry.
//!
//! Recency is tracked with a doubly linked list threaded through a slab
//! of slots, indexed by a hash map, so get and set stay O(1) expected
//! time at any entry count.

use std::collections::HashMap;
use std::hash::Hash;

#[derive(Debug)]
struct Slot<K, V> {
    key: K,
    value: V,
    prev: Option<usize>,
    next: Option<usize>,
}

/// Fixed-capacity cache with least-recently-used eviction.
///
/// Capacity is set at construction and never grows. Eviction is fully
/// deterministic: no timers, no randomness, insertion order breaks ties
/// among untouched entries.
#[derive(Debug)]
pub struct LruCache<K, V> {
    capacity: usize,
    map: HashMap<K, usize>,
    slots: Vec<Slot<K, V>>,
    /// Least recently touched entry.
    head: Option<usize>,
    /// Most recently touched entry.
    tail: Option<usize>,
    /// Slots vacated by eviction, reused before the slab grows.
    free: Vec<usize>,
}

impl<K: Eq + Hash + Clone, V> LruCache<K, V> {
    /// Create a cache holding at most `capacity` entries (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            map: HashMap::with_capacity(capacity),
            slots: Vec::with_capacity(capacity),
            head: None,
            tail: None,
            free: Vec::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Look up a key, refreshing its recency on a hit.
    ///
    /// A miss never mutates the cache.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        let idx = *self.map.get(key)?;
        self.move_to_tail(idx);
        Some(&self.slots[idx].value)
    }

    /// Insert or replace a value.
    ///
    /// Replacing an existing key refreshes its recency and never evicts.
    /// A new key at capacity evicts the least-recently-touched entry
    /// before the insert.
    pub fn set(&mut self, key: K, value: V) {
        if let Some(&idx) = self.map.get(&key) {
            self.slots[idx].value = value;
            self.move_to_tail(idx);
            return;
        }

        if self.map.len() >= self.capacity {
            self.evict_lru();
        }

        let slot = Slot {
            key: key.clone(),
            value,
            prev: None,
            next: None,
        };
        let idx = match self.free.pop() {
            Some(idx) => {
                self.slots[idx] = slot;
                idx
            }
            None => {
                self.slots.push(slot);
                self.slots.len() - 1
            }
        };
        self.push_tail(idx);
        self.map.insert(key, idx);
    }

    /// Drop all entries; capacity is unchanged.
    pub fn clear(&mut self) {
        self.map.clear();
        self.slots.clear();
        self.free.clear();
        self.head = None;
        self.tail = None;
    }

    fn evict_lru(&mut self) {
        if let Some(idx) = self.head {
            self.unlink(idx);
            let key = self.slots[idx].key.clone();
            self.map.remove(&key);
            self.free.push(idx);
        }
    }

    fn move_to_tail(&mut self, idx: usize) {
        if self.tail == Some(idx) {
            return;
        }
        self.unlink(idx);
        self.push_tail(idx);
    }

    fn unlink(&mut self, idx: usize) {
        let (prev, next) = (self.slots[idx].prev, self.slots[idx].next);
        match prev {
            Some(p) => self.slots[p].next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.slots[n].prev = prev,
            None => self.tail = prev,
        }
        self.slots[idx].prev = None;
        self.slots[idx].next = None;
    }

    fn push_tail(&mut self, idx: usize) {
        self.slots[idx].prev = self.tail;
        self.slots[idx].next = None;
        match self.tail {
            Some(t) => self.slots[t].next = Some(idx),
            None => self.head = Some(idx),
        }
        self.tail = Some(idx);
    }
}
