//! Separate chaining with bucketed overflow chains.
//!
//! The directory holds one [`FirstLevelSlot`] per requested element. A slot
//! stores its first entry inline; further entries go to a singly linked chain
//! of fixed-size overflow buckets owned by the slot. Chains only ever grow at
//! the tail, so a lookup may stop at the first empty slot it meets.

use crate::{
    common::{
        bucket::{Bucket, Slot},
        concurrent::{self, BucketLock, NoLock},
        error::InsertError,
        key::{Key, Payload},
    },
    hash::HashFn,
    reduction::Reducer,
    stats::Statistics,
    table::HashTable,
};

use std::{iter, mem, sync::OnceLock};

struct OverflowBucket<K, P, const B: usize> {
    bucket: Bucket<K, P, B>,
    next: OnceLock<Box<OverflowBucket<K, P, B>>>,
}

impl<K: Key, P: Payload, const B: usize> OverflowBucket<K, P, B> {
    fn with_entry(key: K, payload: P) -> Box<Self> {
        let this = Box::new(Self {
            bucket: Bucket::default(),
            next: OnceLock::new(),
        });
        this.bucket.try_push(key, payload);
        this
    }
}

struct FirstLevelSlot<K, P, const B: usize> {
    entry: Slot<K, P>,
    chain: OnceLock<Box<OverflowBucket<K, P, B>>>,
}

impl<K: Key, P: Payload, const B: usize> Default for FirstLevelSlot<K, P, B> {
    fn default() -> Self {
        Self {
            entry: Slot::default(),
            chain: OnceLock::new(),
        }
    }
}

impl<K, P, const B: usize> FirstLevelSlot<K, P, B> {
    fn chain(&self) -> impl Iterator<Item = &OverflowBucket<K, P, B>> {
        iter::successors(self.chain.get().map(|b| &**b), |b| b.next.get().map(|n| &**n))
    }

    /// Frees the overflow chain front to back, so that long chains do not
    /// recurse through `Box` destructors.
    fn release_chain(&mut self) {
        let mut next = self.chain.take();
        while let Some(mut bucket) = next {
            next = bucket.next.take();
        }
    }
}

/// A hash table resolving collisions by chaining overflow buckets of `B` slots.
///
/// The directory has exactly `capacity` first-level slots. Chains are unbounded,
/// so insertion never fails: a badly distributed hash function costs memory and
/// lookup time, not correctness.
///
/// With a lock type other than [`NoLock`], every first-level slot is guarded by
/// its own lock for the duration of an insert, and the table can be shared
/// between threads. Lookups never lock.
pub struct Chained<K, P, H, R, const B: usize = 1, L = NoLock> {
    hasher: H,
    reducer: R,
    capacity: usize,
    slots: Box<[FirstLevelSlot<K, P, B>]>,
    locks: Box<[L]>,
}

impl<K, P, H, R, const B: usize, L> Chained<K, P, H, R, B, L>
where
    K: Key,
    P: Payload,
    H: HashFn<K>,
    R: Reducer,
    L: BucketLock,
{
    /// Creates a table with a directory of `capacity` first-level slots.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` or `B` is 0.
    pub fn new(capacity: usize, hasher: H) -> Self {
        assert!(B > 0, "bucket size must be at least 1");
        let directory_size = Self::directory_address_count(capacity);

        Self {
            hasher,
            reducer: R::new(directory_size),
            capacity,
            slots: iter::repeat_with(FirstLevelSlot::default)
                .take(directory_size)
                .collect(),
            locks: concurrent::new_locks(directory_size),
        }
    }

    /// Inserts a key, payload pair.
    ///
    /// Returns `false` iff the key already exists or is the sentinel.
    pub fn insert(&self, key: K, payload: P) -> bool {
        if key.is_sentinel() {
            #[cfg(feature = "logging")]
            log::warn!("[{}] Rejected insert of the sentinel key", self.name());
            return false;
        }

        let index = self.index_of(key);
        let _guard = self.locks[index].lock();
        let slot = &self.slots[index];

        if slot.entry.is_empty() {
            slot.entry.store(key, payload);
            return true;
        }
        if slot.entry.key() == key {
            return false;
        }

        let Some(mut bucket) = slot.chain.get() else {
            slot.chain
                .get_or_init(|| OverflowBucket::with_entry(key, payload));
            return true;
        };

        loop {
            for s in &bucket.bucket.slots {
                if s.is_empty() {
                    s.store(key, payload);
                    return true;
                }
                if s.key() == key {
                    return false;
                }
            }

            match bucket.next.get() {
                Some(next) => bucket = next,
                None => break,
            }
        }

        #[cfg(feature = "logging")]
        log::trace!("[{}] Appending overflow bucket at slot {index}", self.name());
        bucket
            .next
            .get_or_init(|| OverflowBucket::with_entry(key, payload));
        true
    }

    /// Returns the payload stored under `key`.
    pub fn lookup(&self, key: K) -> Option<P> {
        if key.is_sentinel() {
            return None;
        }

        let slot = &self.slots[self.index_of(key)];
        if slot.entry.key() == key {
            return Some(slot.entry.payload());
        }

        for bucket in slot.chain() {
            for s in &bucket.bucket.slots {
                let k = s.key();
                if k == key {
                    return Some(s.payload());
                }
                if k.is_sentinel() {
                    return None;
                }
            }
        }

        None
    }

    /// Returns the payloads of all keys within `[min, max]`.
    ///
    /// The scan starts at the slot `min` maps to and walks the directory
    /// forward, stopping after the first slot that holds a key `>= max`. The
    /// result is only complete if the hash and reduction functions are both
    /// monotone, e.g. [`LinearModel`](crate::hash::LinearModel) with
    /// [`Clamp`](crate::reduction::Clamp).
    pub fn lookup_range(&self, min: K, max: K) -> Vec<P> {
        if min.is_sentinel() || max.is_sentinel() || min > max {
            return Vec::new();
        }

        let mut result = Vec::new();
        for slot in &self.slots[self.index_of(min)..] {
            let mut reached_max = false;

            let inline = (!slot.entry.is_empty()).then(|| (slot.entry.key(), slot.entry.payload()));
            let chained = slot
                .chain()
                .flat_map(|b| b.bucket.slots.iter())
                .map(|s| (s.key(), s.payload()))
                .take_while(|(k, _)| !k.is_sentinel());

            for (k, p) in inline.into_iter().chain(chained) {
                if k >= min && k <= max {
                    result.push(p);
                }
                reached_max |= k >= max;
            }

            if reached_max {
                break;
            }
        }

        result
    }

    /// Chain length distribution. The dataset is not needed.
    pub fn lookup_statistics(&self, _dataset: &[K]) -> Statistics {
        let mut empty_buckets = 0usize;
        let mut min_chain_length: Option<usize> = None;
        let mut max_chain_length = 0usize;
        let mut additional_buckets = 0usize;
        let mut empty_additional_slots = 0usize;

        for slot in self.slots.iter() {
            if slot.entry.is_empty() {
                empty_buckets += 1;
                continue;
            }

            let mut chain_length = 0;
            for bucket in slot.chain() {
                chain_length += 1;
                empty_additional_slots += B - bucket.bucket.occupancy();
            }
            additional_buckets += chain_length;

            min_chain_length = Some(min_chain_length.map_or(chain_length, |m| m.min(chain_length)));
            max_chain_length = max_chain_length.max(chain_length);
        }

        Statistics::from([
            ("empty_buckets", empty_buckets as f64),
            ("min_chain_length", min_chain_length.unwrap_or(0) as f64),
            ("max_chain_length", max_chain_length as f64),
            ("additional_buckets", additional_buckets as f64),
            ("empty_additional_slots", empty_additional_slots as f64),
        ])
    }

    /// Memory footprint in bytes, including the overflow chains.
    pub fn byte_size(&self) -> usize {
        let overflow_buckets: usize = self.slots.iter().map(|s| s.chain().count()).sum();

        mem::size_of::<Self>()
            + self.slots.len() * Self::slot_byte_size()
            + self.locks.len() * mem::size_of::<L>()
            + overflow_buckets * Self::bucket_byte_size()
    }

    /// Empties the table and frees every overflow bucket.
    ///
    /// Payloads of the inline entries remain in memory until overwritten.
    pub fn clear(&mut self) {
        for slot in self.slots.iter_mut() {
            slot.entry.clear();
            slot.release_chain();
        }
    }

    pub fn name(&self) -> String {
        format!("chained{}", L::name())
    }

    pub fn hash_name(&self) -> String {
        self.hasher.name()
    }

    pub fn reducer_name(&self) -> String {
        R::name().into()
    }

    /// The capacity the table was requested with.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn directory_size(&self) -> usize {
        self.slots.len()
    }

    pub const fn directory_address_count(capacity: usize) -> usize {
        capacity
    }

    pub const fn bucket_size() -> usize {
        B
    }

    pub const fn bucket_byte_size() -> usize {
        mem::size_of::<OverflowBucket<K, P, B>>()
    }

    pub const fn slot_byte_size() -> usize {
        mem::size_of::<FirstLevelSlot<K, P, B>>()
    }

    #[inline]
    fn index_of(&self, key: K) -> usize {
        self.reducer.reduce(self.hasher.hash(key))
    }
}

impl<K, P, H, R, const B: usize, L> Drop for Chained<K, P, H, R, B, L> {
    fn drop(&mut self) {
        for slot in self.slots.iter_mut() {
            slot.release_chain();
        }
    }
}

impl<K, P, H, R, const B: usize, L> HashTable<K, P> for Chained<K, P, H, R, B, L>
where
    K: Key,
    P: Payload,
    H: HashFn<K>,
    R: Reducer,
    L: BucketLock,
{
    fn insert(&self, key: K, payload: P) -> Result<bool, InsertError> {
        Ok(Chained::insert(self, key, payload))
    }

    fn lookup(&self, key: K) -> Option<P> {
        Chained::lookup(self, key)
    }

    fn clear(&mut self) {
        Chained::clear(self)
    }

    fn byte_size(&self) -> usize {
        Chained::byte_size(self)
    }

    fn lookup_statistics(&self, dataset: &[K]) -> Statistics {
        Chained::lookup_statistics(self, dataset)
    }

    fn name(&self) -> String {
        Chained::name(self)
    }

    fn hash_name(&self) -> String {
        Chained::hash_name(self)
    }

    fn reducer_name(&self) -> String {
        Chained::reducer_name(self)
    }
}

#[cfg(test)]
mod tests {
    use super::Chained;
    use crate::{
        common::{
            concurrent::SpinLock,
            test_utils::{init_logger, FnHash},
        },
        hash::{FromSample, Identity, LinearModel, Murmur3Finalizer},
        reduction::{Clamp, Modulo},
    };

    type ConstChained<const B: usize> = Chained<u64, u64, FnHash, Modulo, B>;

    #[test]
    fn overflow_chain_grows() {
        // Every key lands in slot 0: one inline entry, then two buckets of two.
        let table = ConstChained::<2>::new(4, FnHash::constant());

        for key in 1..=5 {
            assert!(table.insert(key, key * 10));
        }

        let stats = table.lookup_statistics(&[]);
        assert_eq!(stats["additional_buckets"], 2.0);
        assert_eq!(stats["max_chain_length"], 2.0);
        assert_eq!(stats["empty_additional_slots"], 0.0);
        assert_eq!(stats["empty_buckets"], 3.0);

        assert_eq!(table.lookup(5), Some(50));
        for key in 1..=5 {
            assert_eq!(table.lookup(key), Some(key * 10));
        }
        assert_eq!(table.lookup(6), None);
    }

    #[test]
    fn duplicates_are_rejected() {
        let table = ConstChained::<2>::new(4, FnHash::constant());

        assert!(table.insert(1, 1));
        assert!(table.insert(2, 2));
        assert!(table.insert(3, 3));

        // Inline, first chained and last chained positions.
        assert!(!table.insert(1, 100));
        assert!(!table.insert(2, 200));
        assert!(!table.insert(3, 300));

        assert_eq!(table.lookup(1), Some(1));
        assert_eq!(table.lookup(2), Some(2));
        assert_eq!(table.lookup(3), Some(3));
    }

    #[test]
    fn sentinel_is_never_a_key() {
        init_logger();
        let table = Chained::<u32, u32, Murmur3Finalizer, Modulo, 4>::new(16, Murmur3Finalizer);

        assert!(!table.insert(u32::MAX, 1));
        assert_eq!(table.lookup(u32::MAX), None);
        assert_eq!(table.lookup_statistics(&[])["empty_buckets"], 16.0);
    }

    #[test]
    fn clear_releases_chains() {
        let mut table = ConstChained::<2>::new(4, FnHash::constant());
        let empty_size = table.byte_size();

        for key in 0..9 {
            assert!(table.insert(key, key));
        }
        assert_eq!(
            table.byte_size(),
            empty_size + 4 * ConstChained::<2>::bucket_byte_size()
        );

        table.clear();
        assert_eq!(table.byte_size(), empty_size);
        for key in 0..9 {
            assert_eq!(table.lookup(key), None);
        }

        // Reusable after clearing.
        assert!(table.insert(3, 33));
        assert_eq!(table.lookup(3), Some(33));
    }

    #[test]
    fn long_chain() {
        let mut table = Chained::<u64, u64, FnHash, Modulo, 1>::new(1, FnHash::constant());
        for key in 0..2_000 {
            assert!(table.insert(key, key));
        }
        assert_eq!(table.lookup(1_999), Some(1_999));
        assert_eq!(table.lookup_statistics(&[])["max_chain_length"], 1_999.0);

        table.clear();
        assert_eq!(table.lookup(1_999), None);
    }

    #[test]
    fn round_trip_with_real_hash() {
        let table = Chained::<u64, u64, Murmur3Finalizer, Modulo, 2>::new(1_000, Murmur3Finalizer);

        for key in 0..1_000 {
            assert!(table.insert(key, key ^ 0xabcd));
        }
        for key in 0..1_000 {
            assert_eq!(table.lookup(key), Some(key ^ 0xabcd));
        }
        for key in 1_000..1_100 {
            assert_eq!(table.lookup(key), None);
        }

        let stats = table.lookup_statistics(&[]);
        let occupied = 1_000.0 - stats["empty_buckets"];
        assert!(occupied > 500.0);
    }

    #[test]
    fn range_lookup_with_identity() {
        let table = Chained::<u64, u64, Identity, Clamp, 2>::new(100, Identity);
        for key in (0..100).step_by(3) {
            assert!(table.insert(key, key + 1_000));
        }

        let mut found = table.lookup_range(10, 20);
        found.sort_unstable();
        assert_eq!(found, vec![1_012, 1_015, 1_018]);

        assert_eq!(table.lookup_range(31, 32), Vec::<u64>::new());
        assert_eq!(table.lookup_range(30, 30), vec![1_030]);
        assert_eq!(table.lookup_range(20, 10), Vec::<u64>::new());
        assert_eq!(table.lookup_range(0, u64::MAX), Vec::<u64>::new());
    }

    #[test]
    fn range_lookup_with_learned_model() {
        let keys: Vec<u64> = (0..500).map(|i| 10_000 + i * 37).collect();
        let model = <LinearModel as FromSample<u64>>::from_sample(&keys, 100);
        let table = Chained::<u64, u64, LinearModel, Clamp, 4>::new(100, model);

        for &key in &keys {
            assert!(table.insert(key, key));
        }

        let (min, max) = (12_000, 14_000);
        let mut found = table.lookup_range(min, max);
        found.sort_unstable();
        let expected: Vec<u64> = keys.iter().copied().filter(|k| (min..=max).contains(k)).collect();
        assert_eq!(found, expected);
    }

    #[test]
    fn labels() {
        let table = Chained::<u64, u64, Murmur3Finalizer, Modulo, 1, SpinLock>::new(8, Murmur3Finalizer);
        assert_eq!(table.name(), "chained_spinlock");
        assert_eq!(table.hash_name(), "murmur_finalizer64");
        assert_eq!(table.reducer_name(), "modulo");
        assert_eq!(table.directory_size(), 8);
        assert_eq!(table.capacity(), 8);
    }
}
