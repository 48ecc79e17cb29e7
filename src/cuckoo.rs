//! Bucketized cuckoo hashing.
//!
//! Every key has two candidate buckets, one per hash function, and always sits
//! in one of them. Lookups therefore read at most two buckets. Inserts into a
//! full pair of buckets evict a resident according to a [`KickingPolicy`] and
//! re-insert it into its other candidate, until some bucket has room.

mod kicking;

pub use kicking::{BalancedKicking, BiasedKicking, KickingPolicy, UnbiasedKicking};

use crate::{
    common::{
        bucket::{bucket_count, Bucket},
        concurrent::{self, BucketLock, NoLock},
        constants::DEFAULT_MAX_KICK_CYCLE_LENGTH,
        error::InsertError,
        key::{Key, Payload},
    },
    hash::HashFn,
    reduction::Reducer,
    stats::Statistics,
    table::HashTable,
};

use std::{
    iter, mem,
    sync::atomic::{AtomicBool, AtomicUsize, Ordering},
};

/// A cuckoo hash table over `ceil(capacity / B)` buckets of `B` slots.
///
/// An insert that needs more than `max_kick_cycle_length` displacements (50 000
/// unless set with
/// [`with_max_kick_cycle_length`](Self::with_max_kick_cycle_length)) fails with
/// [`InsertError::MaxKickCycleLength`]. Its kicks are undone, so the table
/// holds exactly what it held before the insert, and the table is marked
/// failed: further inserts return [`InsertError::TableFailed`] until
/// [`clear`](Self::clear) is called.
///
/// Concurrent variants lock both candidate buckets of the key being placed, in
/// ascending index order. Lookups never lock and may miss an entry that is
/// being moved between buckets.
/// One kick of an insert: `placed` took the slot of `evicted`.
struct Eviction<K, P> {
    placed: K,
    evicted: K,
    payload: P,
}

pub struct Cuckoo<K, P, H1, H2, R, Kick, const B: usize = 4, L = NoLock> {
    hasher1: H1,
    hasher2: H2,
    reducer1: R,
    reducer2: R,
    kicking: Kick,
    capacity: usize,
    max_kick_cycle_length: usize,
    buckets: Box<[Bucket<K, P, B>]>,
    locks: Box<[L]>,
    has_failed: AtomicBool,
    max_kick_count: AtomicUsize,
    total_kick_count: AtomicUsize,
}

impl<K, P, H1, H2, R, Kick, const B: usize, L> Cuckoo<K, P, H1, H2, R, Kick, B, L>
where
    K: Key,
    P: Payload,
    H1: HashFn<K>,
    H2: HashFn<K>,
    R: Reducer,
    Kick: KickingPolicy,
    L: BucketLock,
{
    /// Creates a table with the default kicking policy of `Kick`.
    ///
    /// # Panics
    ///
    /// Panics if `B` is 0 or if `capacity` rounds to an empty directory.
    pub fn new(capacity: usize, hasher1: H1, hasher2: H2) -> Self
    where
        Kick: Default,
    {
        Self::with_kicking(capacity, hasher1, hasher2, Kick::default())
    }

    /// # Panics
    ///
    /// Panics if `B` is 0 or if `capacity` rounds to an empty directory.
    pub fn with_kicking(capacity: usize, hasher1: H1, hasher2: H2, kicking: Kick) -> Self {
        assert!(B > 0, "bucket size must be at least 1");
        let directory_size = Self::directory_address_count(capacity);

        Self {
            hasher1,
            hasher2,
            reducer1: R::new(directory_size),
            reducer2: R::new(directory_size),
            kicking,
            capacity,
            max_kick_cycle_length: DEFAULT_MAX_KICK_CYCLE_LENGTH,
            buckets: iter::repeat_with(Bucket::default)
                .take(directory_size)
                .collect(),
            locks: concurrent::new_locks(directory_size),
            has_failed: AtomicBool::new(false),
            max_kick_count: AtomicUsize::new(0),
            total_kick_count: AtomicUsize::new(0),
        }
    }

    /// Sets how many displacements a single insert may trigger.
    pub fn with_max_kick_cycle_length(mut self, max_kick_cycle_length: usize) -> Self {
        self.max_kick_cycle_length = max_kick_cycle_length;
        self
    }

    /// Inserts a key, payload pair, replacing the payload if the key exists.
    pub fn insert(&self, key: K, payload: P) -> Result<(), InsertError> {
        if key.is_sentinel() {
            #[cfg(feature = "logging")]
            log::warn!("[{}] Rejected insert of the sentinel key", self.name());
            return Err(InsertError::SentinelKey);
        }
        if self.has_failed() {
            #[cfg(feature = "logging")]
            log::debug!("[{}] Rejected insert of {key:?}, table has failed", self.name());
            return Err(InsertError::TableFailed);
        }

        let (mut key, mut payload) = (key, payload);
        let mut kick_count = 0;
        let mut evictions = Vec::new();

        while let Some((evicted_key, evicted_payload)) = self.place(key, payload) {
            kick_count += 1;
            self.total_kick_count.fetch_add(1, Ordering::Relaxed);
            evictions.push(Eviction {
                placed: key,
                evicted: evicted_key,
                payload: evicted_payload,
            });

            // Another thread gave up on the table while we were kicking.
            if self.has_failed() {
                self.max_kick_count.fetch_max(kick_count, Ordering::Relaxed);
                self.undo(&evictions);
                return Err(InsertError::TableFailed);
            }

            if kick_count > self.max_kick_cycle_length {
                self.max_kick_count.fetch_max(kick_count, Ordering::Relaxed);
                self.undo(&evictions);
                self.has_failed.store(true, Ordering::Release);

                #[cfg(feature = "logging")]
                log::error!(
                    "[{}] Undid {kick_count} kicks while carrying {evicted_key:?}, table marked failed",
                    self.name()
                );
                return Err(InsertError::MaxKickCycleLength {
                    max: self.max_kick_cycle_length,
                });
            }

            (key, payload) = (evicted_key, evicted_payload);
        }

        self.max_kick_count.fetch_max(kick_count, Ordering::Relaxed);
        Ok(())
    }

    /// Stores the entry in one of its candidate buckets, returning whatever
    /// had to be evicted to make room.
    fn place(&self, key: K, payload: P) -> Option<(K, P)> {
        let (primary, secondary) = self.candidates(key);
        let _guards = self.lock_pair(primary, secondary);

        let primary = &self.buckets[primary];
        let secondary = &self.buckets[secondary];

        if let Some(slot) = primary.find(key).or_else(|| secondary.find(key)) {
            slot.set_payload(payload);
            return None;
        }

        self.kicking.kick(primary, secondary, key, payload)
    }

    /// Puts every evicted entry back into the slot its successor took, latest
    /// kick first. An entry a concurrent insert has moved since is skipped.
    fn undo(&self, evictions: &[Eviction<K, P>]) {
        for eviction in evictions.iter().rev() {
            let (primary, secondary) = self.candidates(eviction.placed);
            let _guards = self.lock_pair(primary, secondary);

            let slot = self.buckets[primary]
                .find(eviction.placed)
                .or_else(|| self.buckets[secondary].find(eviction.placed));
            if let Some(slot) = slot {
                slot.store(eviction.evicted, eviction.payload);
            }
        }
    }

    /// Locks both buckets in ascending index order.
    fn lock_pair(&self, a: usize, b: usize) -> (L::Guard<'_>, Option<L::Guard<'_>>) {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        let low_guard = self.locks[low].lock();
        (low_guard, (high != low).then(|| self.locks[high].lock()))
    }

    pub fn lookup(&self, key: K) -> Option<P> {
        if key.is_sentinel() {
            return None;
        }

        let (primary, secondary) = self.candidates(key);
        self.buckets[primary]
            .get(key)
            .or_else(|| self.buckets[secondary].get(key))
    }

    /// Reports the share of `dataset` found in its primary bucket together
    /// with the kick counters accumulated since the last [`clear`](Self::clear).
    pub fn lookup_statistics(&self, dataset: &[K]) -> Statistics {
        let primary_count = dataset
            .iter()
            .filter(|&&key| {
                !key.is_sentinel() && self.buckets[self.candidates(key).0].contains(key)
            })
            .count();
        let primary_key_ratio = if dataset.is_empty() {
            0.0
        } else {
            primary_count as f64 / dataset.len() as f64
        };

        Statistics::from([
            ("primary_key_ratio", primary_key_ratio),
            (
                "total_kick_count",
                self.total_kick_count.load(Ordering::Relaxed) as f64,
            ),
            (
                "max_kick_count",
                self.max_kick_count.load(Ordering::Relaxed) as f64,
            ),
        ])
    }

    pub fn has_failed(&self) -> bool {
        self.has_failed.load(Ordering::Acquire)
    }

    pub fn byte_size(&self) -> usize {
        mem::size_of::<Self>()
            + self.buckets.len() * Self::bucket_byte_size()
            + self.locks.len() * mem::size_of::<L>()
    }

    /// Empties the table, resets the kick counters and lifts the failed state.
    pub fn clear(&mut self) {
        for bucket in self.buckets.iter() {
            bucket.clear();
        }
        *self.has_failed.get_mut() = false;
        *self.max_kick_count.get_mut() = 0;
        *self.total_kick_count.get_mut() = 0;
    }

    pub fn name(&self) -> String {
        format!("cuckoo_{B}_{}{}", self.kicking.name(), L::name())
    }

    pub fn hash_name(&self) -> String {
        format!("{}-{}", self.hasher1.name(), self.hasher2.name())
    }

    pub fn reducer_name(&self) -> String {
        format!("{0}-{0}", R::name())
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn directory_size(&self) -> usize {
        self.buckets.len()
    }

    pub fn max_kick_cycle_length(&self) -> usize {
        self.max_kick_cycle_length
    }

    pub const fn directory_address_count(capacity: usize) -> usize {
        bucket_count(capacity, B)
    }

    pub const fn bucket_size() -> usize {
        B
    }

    pub const fn bucket_byte_size() -> usize {
        mem::size_of::<Bucket<K, P, B>>()
    }

    /// The two candidate bucket indices of `key`. They only coincide in a
    /// single-bucket directory.
    #[inline]
    fn candidates(&self, key: K) -> (usize, usize) {
        let primary = self.reducer1.reduce(self.hasher1.hash(key));
        let mut secondary = self.reducer2.reduce(self.hasher2.hash(key));
        if secondary == primary {
            secondary = (primary + 1) % self.buckets.len();
        }
        (primary, secondary)
    }
}

impl<K, P, H1, H2, R, Kick, const B: usize, L> HashTable<K, P>
    for Cuckoo<K, P, H1, H2, R, Kick, B, L>
where
    K: Key,
    P: Payload,
    H1: HashFn<K>,
    H2: HashFn<K>,
    R: Reducer,
    Kick: KickingPolicy,
    L: BucketLock,
{
    fn insert(&self, key: K, payload: P) -> Result<bool, InsertError> {
        Cuckoo::insert(self, key, payload).map(|()| true)
    }

    fn lookup(&self, key: K) -> Option<P> {
        Cuckoo::lookup(self, key)
    }

    fn clear(&mut self) {
        Cuckoo::clear(self)
    }

    fn byte_size(&self) -> usize {
        Cuckoo::byte_size(self)
    }

    fn lookup_statistics(&self, dataset: &[K]) -> Statistics {
        Cuckoo::lookup_statistics(self, dataset)
    }

    fn name(&self) -> String {
        Cuckoo::name(self)
    }

    fn hash_name(&self) -> String {
        Cuckoo::hash_name(self)
    }

    fn reducer_name(&self) -> String {
        Cuckoo::reducer_name(self)
    }
}
