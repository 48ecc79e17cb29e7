use crate::common::{
    bucket::Bucket,
    constants::DEFAULT_KICKING_SEED,
    key::{Key, Payload},
};

use parking_lot::Mutex;
use rand::{rngs::SmallRng, Rng, RngCore, SeedableRng};

/// Decides where a cuckoo insert goes once both candidate buckets are known.
///
/// The caller holds the locks of both buckets. An implementation either stores
/// the entry in a free slot and returns `None`, or overwrites an occupied slot
/// of one of the two buckets and returns the evicted entry.
///
/// `primary` and `secondary` may be the same bucket.
pub trait KickingPolicy: Send + Sync {
    fn kick<K: Key, P: Payload, const B: usize>(
        &self,
        primary: &Bucket<K, P, B>,
        secondary: &Bucket<K, P, B>,
        key: K,
        payload: P,
    ) -> Option<(K, P)>;

    fn name(&self) -> String;
}

/// Fills the emptier bucket first, preferring the primary one on ties. When
/// both are full the victim bucket and slot are picked uniformly at random.
#[derive(Debug)]
pub struct BalancedKicking {
    rng: Mutex<SmallRng>,
}

impl BalancedKicking {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(SmallRng::seed_from_u64(seed)),
        }
    }
}

impl Default for BalancedKicking {
    fn default() -> Self {
        Self::with_seed(DEFAULT_KICKING_SEED)
    }
}

impl KickingPolicy for BalancedKicking {
    fn kick<K: Key, P: Payload, const B: usize>(
        &self,
        primary: &Bucket<K, P, B>,
        secondary: &Bucket<K, P, B>,
        key: K,
        payload: P,
    ) -> Option<(K, P)> {
        let primary_occupancy = primary.occupancy();
        let secondary_occupancy = secondary.occupancy();

        if primary_occupancy <= secondary_occupancy && primary_occupancy < B {
            primary.try_push(key, payload);
            return None;
        }
        if secondary_occupancy < B {
            secondary.try_push(key, payload);
            return None;
        }

        let mut rng = self.rng.lock();
        let victim = if rng.gen_bool(0.5) { primary } else { secondary };
        Some(victim.replace(rng.gen_range(0..B), key, payload))
    }

    fn name(&self) -> String {
        "balanced_kicking".into()
    }
}

/// Prefers the primary bucket, falling back to the secondary one. When both
/// are full, the victim comes from the secondary bucket with a probability of
/// `BIAS` percent and from the primary one otherwise.
///
/// `BIAS = 0` always evicts from the primary bucket, see [`UnbiasedKicking`].
#[derive(Debug)]
pub struct BiasedKicking<const BIAS: u8> {
    rng: Mutex<SmallRng>,
}

/// [`BiasedKicking`] that always evicts from the primary bucket.
pub type UnbiasedKicking = BiasedKicking<0>;

impl<const BIAS: u8> BiasedKicking<BIAS> {
    /// Entropy values at or above this threshold evict from the primary bucket.
    const THRESHOLD: u32 = ((u32::MAX as u64 * BIAS as u64) / 100) as u32;

    /// # Panics
    ///
    /// Panics if `BIAS` is above 100.
    pub fn with_seed(seed: u64) -> Self {
        assert!(BIAS <= 100, "bias is a percentage");
        Self {
            rng: Mutex::new(SmallRng::seed_from_u64(seed)),
        }
    }
}

impl<const BIAS: u8> Default for BiasedKicking<BIAS> {
    fn default() -> Self {
        Self::with_seed(DEFAULT_KICKING_SEED)
    }
}

impl<const BIAS: u8> KickingPolicy for BiasedKicking<BIAS> {
    fn kick<K: Key, P: Payload, const B: usize>(
        &self,
        primary: &Bucket<K, P, B>,
        secondary: &Bucket<K, P, B>,
        key: K,
        payload: P,
    ) -> Option<(K, P)> {
        if primary.try_push(key, payload) || secondary.try_push(key, payload) {
            return None;
        }

        let mut rng = self.rng.lock();
        let victim = if rng.next_u32() >= Self::THRESHOLD {
            primary
        } else {
            secondary
        };
        Some(victim.replace(rng.gen_range(0..B), key, payload))
    }

    fn name(&self) -> String {
        if BIAS == 0 {
            "unbiased_kicking".into()
        } else {
            format!("biased_kicking_{BIAS}")
        }
    }
}
