//! Slot and bucket layout shared by every table.
//!
//! Keys and payloads sit in [`AtomicCell`]s so that lookups can read a slot
//! without taking its lock. Writers store the payload before the key: a reader
//! that observes a key also observes a payload at least as recent as the one
//! written with it.

use crate::common::key::{Key, Payload};

use crossbeam_utils::atomic::AtomicCell;

pub(crate) struct Slot<K, P> {
    key: AtomicCell<K>,
    payload: AtomicCell<P>,
}

impl<K: Key, P: Payload> Default for Slot<K, P> {
    fn default() -> Self {
        Self {
            key: AtomicCell::new(K::SENTINEL),
            payload: AtomicCell::new(P::default()),
        }
    }
}

impl<K: Key, P: Payload> Slot<K, P> {
    #[inline]
    pub(crate) fn key(&self) -> K {
        self.key.load()
    }

    #[inline]
    pub(crate) fn payload(&self) -> P {
        self.payload.load()
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.key().is_sentinel()
    }

    #[inline]
    pub(crate) fn store(&self, key: K, payload: P) {
        self.payload.store(payload);
        self.key.store(key);
    }

    #[inline]
    pub(crate) fn set_payload(&self, payload: P) {
        self.payload.store(payload);
    }

    /// Replaces the entry, returning the previous one.
    #[inline]
    pub(crate) fn replace(&self, key: K, payload: P) -> (K, P) {
        let old = (self.key(), self.payload());
        self.store(key, payload);
        old
    }

    /// Marks the slot empty. The stale payload stays in memory.
    #[inline]
    pub(crate) fn clear(&self) {
        self.key.store(K::SENTINEL);
    }
}

/// A fixed-size array of slots, filled front to back.
pub struct Bucket<K, P, const B: usize> {
    pub(crate) slots: [Slot<K, P>; B],
}

impl<K: Key, P: Payload, const B: usize> Default for Bucket<K, P, B> {
    fn default() -> Self {
        Self {
            slots: std::array::from_fn(|_| Slot::default()),
        }
    }
}

impl<K: Key, P: Payload, const B: usize> Bucket<K, P, B> {
    /// Number of occupied slots.
    pub fn occupancy(&self) -> usize {
        self.slots.iter().filter(|s| !s.is_empty()).count()
    }

    pub fn is_full(&self) -> bool {
        self.slots.iter().all(|s| !s.is_empty())
    }

    pub fn contains(&self, key: K) -> bool {
        self.find(key).is_some()
    }

    /// Returns the payload stored under `key`, if any.
    pub fn get(&self, key: K) -> Option<P> {
        self.find(key).map(Slot::payload)
    }

    /// Returns the `(key, payload)` pairs of the occupied slots.
    pub fn entries(&self) -> impl Iterator<Item = (K, P)> + '_ {
        self.slots
            .iter()
            .filter(|s| !s.is_empty())
            .map(|s| (s.key(), s.payload()))
    }

    pub(crate) fn find(&self, key: K) -> Option<&Slot<K, P>> {
        self.slots.iter().find(|s| s.key() == key)
    }

    pub(crate) fn first_empty(&self) -> Option<&Slot<K, P>> {
        self.slots.iter().find(|s| s.is_empty())
    }

    /// Stores the entry in the first empty slot. Returns `false` if the bucket
    /// is full.
    pub fn try_push(&self, key: K, payload: P) -> bool {
        match self.first_empty() {
            Some(slot) => {
                slot.store(key, payload);
                true
            }
            None => false,
        }
    }

    /// Overwrites the slot at `index`, returning the evicted entry.
    pub fn replace(&self, index: usize, key: K, payload: P) -> (K, P) {
        self.slots[index].replace(key, payload)
    }

    pub(crate) fn clear(&self) {
        for slot in &self.slots {
            slot.clear();
        }
    }
}

/// Number of `B`-slot buckets needed to hold `capacity` elements.
pub(crate) const fn bucket_count(capacity: usize, bucket_size: usize) -> usize {
    (capacity + bucket_size - 1) / bucket_size
}
