use super::{ProbeSeq, ProbingFn};
use crate::{
    common::{
        bucket::{bucket_count, Slot},
        concurrent::{self, BucketLock, NoLock},
        error::InsertError,
        key::{Key, Payload},
    },
    hash::HashFn,
    reduction::Reducer,
    stats::{PslStats, Statistics},
    table::HashTable,
};

use crossbeam_utils::atomic::AtomicCell;
use std::{array, iter, mem};

struct RobinHoodSlot<K, P> {
    entry: Slot<K, P>,
    psl: AtomicCell<usize>,
}

impl<K: Key, P: Payload> Default for RobinHoodSlot<K, P> {
    fn default() -> Self {
        Self {
            entry: Slot::default(),
            psl: AtomicCell::new(0),
        }
    }
}

impl<K: Key, P: Payload> RobinHoodSlot<K, P> {
    #[inline]
    fn store(&self, key: K, payload: P, psl: usize) {
        self.psl.store(psl);
        self.entry.store(key, payload);
    }
}

type RobinHoodBucket<K, P, const B: usize> = [RobinHoodSlot<K, P>; B];

/// A resident an insert took a slot from, kept so a failed insert can put it
/// back.
struct Displaced<K, P> {
    index: usize,
    slot: usize,
    stored: K,
    key: K,
    payload: P,
    psl: usize,
}

/// Open addressing where an insert takes over the slot of any resident that is
/// closer to its own origin than the insert currently is.
///
/// Every slot records the probe sequence length (PSL) of its entry. When an
/// incoming entry has probed further than a resident, the two swap and the
/// insert continues with the evicted resident. This keeps PSLs short and even
/// at high load.
///
/// Inserts fail with [`InsertError::ProbingCycle`] when the entry being carried
/// runs through its whole probe sequence, and with
/// [`InsertError::InfiniteDisplacement`] when the displacement chain comes back
/// for the key that started it. In both cases every displaced resident is put
/// back, leaving the table as it was before the insert.
///
/// Concurrent variants lock one bucket at a time. A lookup racing an insert may
/// miss the entry that is being carried to its next bucket.
pub struct RobinHoodProbing<K, P, H, R, F, const B: usize = 1, L = NoLock> {
    hasher: H,
    reducer: R,
    probing: F,
    capacity: usize,
    buckets: Box<[RobinHoodBucket<K, P, B>]>,
    locks: Box<[L]>,
}

impl<K, P, H, R, F, const B: usize, L> RobinHoodProbing<K, P, H, R, F, B, L>
where
    K: Key,
    P: Payload,
    H: HashFn<K>,
    R: Reducer,
    F: ProbingFn,
    L: BucketLock,
{
    /// # Panics
    ///
    /// Panics if `B` is 0 or if `capacity` rounds to an empty directory.
    pub fn new(capacity: usize, hasher: H) -> Self {
        assert!(B > 0, "bucket size must be at least 1");
        let directory_size = Self::directory_address_count(capacity);

        Self {
            hasher,
            reducer: R::new(directory_size),
            probing: F::new(directory_size),
            capacity,
            buckets: iter::repeat_with(|| array::from_fn(|_| RobinHoodSlot::default()))
                .take(directory_size)
                .collect(),
            locks: concurrent::new_locks(directory_size),
        }
    }

    /// Inserts a key, payload pair.
    ///
    /// Returns `Ok(false)` if the key already exists or is the sentinel.
    pub fn insert(&self, key: K, payload: P) -> Result<bool, InsertError> {
        if key.is_sentinel() {
            #[cfg(feature = "logging")]
            log::warn!("[{}] Rejected insert of the sentinel key", self.name());
            return Ok(false);
        }

        let inserted = key;
        let mut placed = false;
        let mut displaced = Vec::new();

        let (mut key, mut payload) = (key, payload);
        let mut origin = self.index_of(key);
        let mut index = origin;
        let mut step = 0;

        loop {
            {
                let guard = self.locks[index].lock();
                for (position, slot) in self.buckets[index].iter().enumerate() {
                    let resident = slot.entry.key();
                    if resident.is_sentinel() {
                        slot.store(key, payload, step);
                        return Ok(true);
                    }
                    if resident == key {
                        return Ok(placed);
                    }

                    let resident_psl = slot.psl.load();
                    if resident_psl >= step {
                        continue;
                    }

                    if resident == inserted {
                        drop(guard);
                        self.restore(&displaced);
                        return Err(self.fail(InsertError::InfiniteDisplacement));
                    }
                    // A duplicate may still sit further down the sequence.
                    if !placed && self.find(inserted).is_some() {
                        return Ok(false);
                    }

                    let resident_payload = slot.entry.payload();
                    slot.store(key, payload, step);
                    placed = true;
                    displaced.push(Displaced {
                        index,
                        slot: position,
                        stored: key,
                        key: resident,
                        payload: resident_payload,
                        psl: resident_psl,
                    });

                    #[cfg(feature = "logging")]
                    log::trace!(
                        "[{}] {key:?} displaced {resident:?} at bucket {index}",
                        self.name()
                    );

                    (key, payload, step) = (resident, resident_payload, resident_psl);
                    origin = self.index_of(key);
                }
            }

            step += 1;
            index = self.probing.probe(origin, step);
            if index == origin {
                self.restore(&displaced);
                return Err(self.fail(InsertError::ProbingCycle { table: self.name() }));
            }
        }
    }

    /// Undoes the displacements of a failed insert, latest first. A slot that
    /// a concurrent insert has taken over since is left alone.
    fn restore(&self, displaced: &[Displaced<K, P>]) {
        for d in displaced.iter().rev() {
            let _guard = self.locks[d.index].lock();
            let slot = &self.buckets[d.index][d.slot];
            if slot.entry.key() == d.stored {
                slot.store(d.key, d.payload, d.psl);
            }
        }

        #[cfg(feature = "logging")]
        if !displaced.is_empty() {
            log::debug!(
                "[{}] Restored {} displaced entries",
                self.name(),
                displaced.len()
            );
        }
    }

    pub fn lookup(&self, key: K) -> Option<P> {
        self.find(key).map(|(payload, _)| payload)
    }

    /// Looks up every key of `dataset` and reports the probe sequence lengths
    /// it took to find them.
    pub fn lookup_statistics(&self, dataset: &[K]) -> Statistics {
        let mut stats = PslStats::default();
        for &key in dataset {
            match self.find(key) {
                Some((_, psl)) => stats.record_found(psl),
                None => stats.record_missing(),
            }
        }

        #[cfg(feature = "logging")]
        log::debug!("[{}] {stats:?}", self.name());

        stats.into_statistics()
    }

    pub fn byte_size(&self) -> usize {
        mem::size_of::<Self>()
            + self.buckets.len() * Self::bucket_byte_size()
            + self.locks.len() * mem::size_of::<L>()
    }

    pub fn clear(&mut self) {
        for slot in self.buckets.iter().flatten() {
            slot.store(K::SENTINEL, P::default(), 0);
        }
    }

    pub fn name(&self) -> String {
        format!("{}_robinhood_probing{}", F::name(), L::name())
    }

    pub fn hash_name(&self) -> String {
        self.hasher.name()
    }

    pub fn reducer_name(&self) -> String {
        R::name().into()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn directory_size(&self) -> usize {
        self.buckets.len()
    }

    pub const fn directory_address_count(capacity: usize) -> usize {
        bucket_count(capacity, B)
    }

    pub const fn bucket_size() -> usize {
        B
    }

    pub const fn bucket_byte_size() -> usize {
        mem::size_of::<RobinHoodBucket<K, P, B>>()
    }

    fn find(&self, key: K) -> Option<(P, usize)> {
        if key.is_sentinel() {
            return None;
        }

        for (step, index) in ProbeSeq::new(&self.probing, self.index_of(key)) {
            for slot in &self.buckets[index] {
                let k = slot.entry.key();
                if k == key {
                    return Some((slot.entry.payload(), step));
                }
                if k.is_sentinel() {
                    return None;
                }
            }
        }

        None
    }

    fn fail(&self, error: InsertError) -> InsertError {
        #[cfg(feature = "logging")]
        log::error!("[{}] {error}", self.name());
        error
    }

    #[inline]
    fn index_of(&self, key: K) -> usize {
        self.reducer.reduce(self.hasher.hash(key))
    }
}

impl<K, P, H, R, F, const B: usize, L> HashTable<K, P> for RobinHoodProbing<K, P, H, R, F, B, L>
where
    K: Key,
    P: Payload,
    H: HashFn<K>,
    R: Reducer,
    F: ProbingFn,
    L: BucketLock,
{
    fn insert(&self, key: K, payload: P) -> Result<bool, InsertError> {
        RobinHoodProbing::insert(self, key, payload)
    }

    fn lookup(&self, key: K) -> Option<P> {
        RobinHoodProbing::lookup(self, key)
    }

    fn clear(&mut self) {
        RobinHoodProbing::clear(self)
    }

    fn byte_size(&self) -> usize {
        RobinHoodProbing::byte_size(self)
    }

    fn lookup_statistics(&self, dataset: &[K]) -> Statistics {
        RobinHoodProbing::lookup_statistics(self, dataset)
    }

    fn name(&self) -> String {
        RobinHoodProbing::name(self)
    }

    fn hash_name(&self) -> String {
        RobinHoodProbing::hash_name(self)
    }

    fn reducer_name(&self) -> String {
        RobinHoodProbing::reducer_name(self)
    }
}
