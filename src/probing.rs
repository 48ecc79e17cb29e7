//! Open addressing over a directory of `B`-slot buckets.
//!
//! Entries never move once stored, and a lookup stops at the first empty slot
//! along its probe sequence. [`RobinHoodProbing`] reorders entries on insert to
//! bound the variance of probe sequence lengths.

mod probing_fn;
mod robin_hood;

pub(crate) use probing_fn::ProbeSeq;
pub use probing_fn::{LinearProbing, ProbingFn, QuadraticProbing};
pub use robin_hood::RobinHoodProbing;

use crate::{
    common::{
        bucket::{bucket_count, Bucket},
        concurrent::{self, BucketLock, NoLock},
        constants::DEFAULT_MAX_PROBING_STEPS,
        error::InsertError,
        key::{Key, Payload},
    },
    hash::HashFn,
    reduction::Reducer,
    stats::{PslStats, Statistics},
    table::HashTable,
};

use std::{iter, mem};

/// An open addressing table probing with `F` over `ceil(capacity / B)` buckets.
///
/// An insert fails with [`InsertError::ProbingCycle`] once its probe sequence
/// returns to the origin bucket, and with
/// [`InsertError::MaxProbingStepsExceeded`] after `max_probing_steps` steps
/// (500 unless set with [`with_max_probing_steps`](Self::with_max_probing_steps)).
///
/// Concurrent variants lock one bucket at a time while inserting. Lookups never
/// lock.
pub struct Probing<K, P, H, R, F, const B: usize = 1, L = NoLock> {
    hasher: H,
    reducer: R,
    probing: F,
    capacity: usize,
    max_probing_steps: usize,
    buckets: Box<[Bucket<K, P, B>]>,
    locks: Box<[L]>,
}

impl<K, P, H, R, F, const B: usize, L> Probing<K, P, H, R, F, B, L>
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
            max_probing_steps: DEFAULT_MAX_PROBING_STEPS,
            buckets: iter::repeat_with(Bucket::default)
                .take(directory_size)
                .collect(),
            locks: concurrent::new_locks(directory_size),
        }
    }

    /// Sets how many probe steps an insert may take before it fails.
    pub fn with_max_probing_steps(mut self, max_probing_steps: usize) -> Self {
        self.max_probing_steps = max_probing_steps;
        self
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

        let origin = self.index_of(key);
        let mut index = origin;
        let mut step = 0;

        loop {
            {
                let _guard = self.locks[index].lock();
                for slot in &self.buckets[index].slots {
                    if slot.is_empty() {
                        slot.store(key, payload);
                        return Ok(true);
                    }
                    if slot.key() == key {
                        return Ok(false);
                    }
                }
            }

            step += 1;
            index = self.probing.probe(origin, step);
            if index == origin {
                return Err(self.fail(InsertError::ProbingCycle { table: self.name() }));
            }
            if step > self.max_probing_steps {
                return Err(self.fail(InsertError::MaxProbingStepsExceeded {
                    max: self.max_probing_steps,
                }));
            }
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
        for bucket in self.buckets.iter() {
            bucket.clear();
        }
    }

    pub fn name(&self) -> String {
        format!("{}_probing{}", F::name(), L::name())
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

    pub fn max_probing_steps(&self) -> usize {
        self.max_probing_steps
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

    /// Returns the payload together with the probe step it was found at.
    fn find(&self, key: K) -> Option<(P, usize)> {
        if key.is_sentinel() {
            return None;
        }

        for (step, index) in ProbeSeq::new(&self.probing, self.index_of(key)) {
            for slot in &self.buckets[index].slots {
                let k = slot.key();
                if k == key {
                    return Some((slot.payload(), step));
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

impl<K, P, H, R, F, const B: usize, L> HashTable<K, P> for Probing<K, P, H, R, F, B, L>
where
    K: Key,
    P: Payload,
    H: HashFn<K>,
    R: Reducer,
    F: ProbingFn,
    L: BucketLock,
{
    fn insert(&self, key: K, payload: P) -> Result<bool, InsertError> {
        Probing::insert(self, key, payload)
    }

    fn lookup(&self, key: K) -> Option<P> {
        Probing::lookup(self, key)
    }

    fn clear(&mut self) {
        Probing::clear(self)
    }

    fn byte_size(&self) -> usize {
        Probing::byte_size(self)
    }

    fn lookup_statistics(&self, dataset: &[K]) -> Statistics {
        Probing::lookup_statistics(self, dataset)
    }

    fn name(&self) -> String {
        Probing::name(self)
    }

    fn hash_name(&self) -> String {
        Probing::hash_name(self)
    }

    fn reducer_name(&self) -> String {
        Probing::reducer_name(self)
    }
}

#[cfg(test)]
mod tests {
    use super::{LinearProbing, Probing, QuadraticProbing};
    use crate::{
        common::{
            concurrent::SpinLock,
            error::InsertError,
            test_utils::{init_logger, FnHash},
        },
        hash::{Murmur3Finalizer, XxHash3},
        reduction::{FastRange, Modulo},
    };

    type ConstLinear<const B: usize> = Probing<u64, u64, FnHash, Modulo, LinearProbing, B>;

    #[test]
    fn full_table_reports_cycle() {
        init_logger();
        let table = ConstLinear::<1>::new(4, FnHash::constant());

        for key in 1..=4 {
            assert_eq!(table.insert(key, key), Ok(true));
        }
        assert_eq!(
            table.insert(5, 5),
            Err(InsertError::ProbingCycle {
                table: "linear_probing".into()
            })
        );

        for key in 1..=4 {
            assert_eq!(table.lookup(key), Some(key));
        }
        assert_eq!(table.lookup(5), None);
    }

    #[test]
    fn psl_follows_probe_order() {
        let table = ConstLinear::<2>::new(8, FnHash::constant());
        for key in 1..=5 {
            assert_eq!(table.insert(key, key), Ok(true));
        }

        let stats = table.lookup_statistics(&[1, 2, 3, 4, 5, 6]);
        assert_eq!(stats["min_psl"], 0.0);
        assert_eq!(stats["max_psl"], 2.0);
        // 0 + 0 + 1 + 1 + 2
        assert_eq!(stats["total_psl"], 4.0);
        assert_eq!(stats["average_psl"], 4.0 / 6.0);
    }

    #[test]
    fn max_probing_steps() {
        let table = ConstLinear::<1>::new(16, FnHash::constant()).with_max_probing_steps(3);
        assert_eq!(table.max_probing_steps(), 3);

        for key in 1..=4 {
            assert_eq!(table.insert(key, key), Ok(true));
        }
        assert_eq!(
            table.insert(5, 5),
            Err(InsertError::MaxProbingStepsExceeded { max: 3 })
        );
    }

    #[test]
    fn cycle_wins_over_step_bound() {
        // The fifth insert returns to its origin on step 4, which is also the
        // first step past the bound.
        let table = ConstLinear::<1>::new(4, FnHash::constant()).with_max_probing_steps(3);

        for key in 1..=4 {
            assert_eq!(table.insert(key, key), Ok(true));
        }
        assert_eq!(
            table.insert(5, 5),
            Err(InsertError::ProbingCycle {
                table: "linear_probing".into()
            })
        );
    }

    #[test]
    fn duplicates_and_sentinel() {
        let table = ConstLinear::<1>::new(4, FnHash::constant());

        assert_eq!(table.insert(1, 10), Ok(true));
        assert_eq!(table.insert(2, 20), Ok(true));
        assert_eq!(table.insert(2, 21), Ok(false));
        assert_eq!(table.insert(u64::MAX, 0), Ok(false));

        assert_eq!(table.lookup(2), Some(20));
        assert_eq!(table.lookup(u64::MAX), None);
    }

    #[test]
    fn quadratic_cycle_can_skip_free_buckets() {
        // From origin 0 of 4 buckets the quadratic sequence is 0, 1, 0: buckets
        // 2 and 3 are never reached.
        let table =
            Probing::<u64, u64, FnHash, Modulo, QuadraticProbing, 1>::new(4, FnHash::constant());

        assert_eq!(table.insert(1, 1), Ok(true));
        assert_eq!(table.insert(2, 2), Ok(true));
        assert!(matches!(
            table.insert(3, 3),
            Err(InsertError::ProbingCycle { .. })
        ));
    }

    #[test]
    fn clear_resets_table() {
        let mut table = ConstLinear::<1>::new(4, FnHash::constant());
        for key in 1..=4 {
            table.insert(key, key).unwrap();
        }
        let size = table.byte_size();

        table.clear();
        assert_eq!(table.byte_size(), size);
        assert_eq!(table.lookup(1), None);
        assert_eq!(table.insert(9, 9), Ok(true));
        assert_eq!(table.lookup(9), Some(9));
    }

    #[test]
    fn round_trip_with_real_hash() {
        let table = Probing::<u64, u32, XxHash3, FastRange, LinearProbing, 4>::new(
            2_000,
            XxHash3::default(),
        );
        for key in 0..1_500u64 {
            assert_eq!(table.insert(key * 7, key as u32), Ok(true));
        }
        for key in 0..1_500u64 {
            assert_eq!(table.lookup(key * 7), Some(key as u32));
        }
        assert_eq!(table.lookup(1), None);
    }

    #[test]
    fn labels_and_sizes() {
        let table = Probing::<u64, u64, Murmur3Finalizer, Modulo, QuadraticProbing, 4, SpinLock>::new(
            10,
            Murmur3Finalizer,
        );
        assert_eq!(table.name(), "quadratic_probing_spinlock");
        assert_eq!(table.reducer_name(), "modulo");
        assert_eq!(table.directory_size(), 3);
        assert_eq!(table.capacity(), 10);
    }
}
