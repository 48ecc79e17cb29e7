//! Hash functions mapping keys to unbounded `u64` hash values.
//!
//! Tables only rely on [`HashFn`]. [`FromSample`] lets driver code build any
//! hash function uniformly from a dataset sample and the target address space,
//! which is how learned hash functions fit their model. The unlearned ones
//! ignore both arguments.

use crate::common::key::Key;

/// A deterministic, side-effect-free hash function.
pub trait HashFn<K: Key>: Send + Sync {
    fn hash(&self, key: K) -> u64;

    /// Label used in benchmark output.
    fn name(&self) -> String;
}

/// Construction from a dataset sample and the size of the address space the
/// hash values should cover.
pub trait FromSample<K: Key>: Sized {
    fn from_sample(sample: &[K], full_size: usize) -> Self;
}

macro_rules! impl_from_sample_with_default {
    ($($t:ty),*) => {
        $(
            impl<K: Key> FromSample<K> for $t {
                fn from_sample(_sample: &[K], _full_size: usize) -> Self {
                    Self::default()
                }
            }
        )*
    };
}

/// Returns the key itself. Monotone.
#[derive(Clone, Copy, Debug, Default)]
pub struct Identity;

impl<K: Key> HashFn<K> for Identity {
    #[inline]
    fn hash(&self, key: K) -> u64 {
        key.as_u64()
    }

    fn name(&self) -> String {
        "identity".into()
    }
}

/// The 64-bit finalizer of MurmurHash3.
#[derive(Clone, Copy, Debug, Default)]
pub struct Murmur3Finalizer;

impl<K: Key> HashFn<K> for Murmur3Finalizer {
    #[inline]
    fn hash(&self, key: K) -> u64 {
        let mut h = key.as_u64();
        h ^= h >> 33;
        h = h.wrapping_mul(0xff51_afd7_ed55_8ccd);
        h ^= h >> 33;
        h = h.wrapping_mul(0xc4ce_b9fe_1a85_ec53);
        h ^= h >> 33;
        h
    }

    fn name(&self) -> String {
        "murmur_finalizer64".into()
    }
}

/// Fibonacci hashing: multiplication by 2^64 / φ.
#[derive(Clone, Copy, Debug, Default)]
pub struct Multiplicative;

impl<K: Key> HashFn<K> for Multiplicative {
    #[inline]
    fn hash(&self, key: K) -> u64 {
        key.as_u64().wrapping_mul(0x9e37_79b9_7f4a_7c15)
    }

    fn name(&self) -> String {
        "mult_fibonacci64".into()
    }
}

/// XXH3 over the key's little-endian bytes.
///
/// Two instances with different seeds behave as independent hash functions,
/// which is what a cuckoo table needs.
#[derive(Clone, Copy, Debug, Default)]
pub struct XxHash3 {
    seed: u64,
}

impl XxHash3 {
    pub fn with_seed(seed: u64) -> Self {
        Self { seed }
    }
}

impl<K: Key> HashFn<K> for XxHash3 {
    #[inline]
    fn hash(&self, key: K) -> u64 {
        xxhash_rust::xxh3::xxh3_64_with_seed(&key.as_u64().to_le_bytes(), self.seed)
    }

    fn name(&self) -> String {
        if self.seed == 0 {
            "xxh3".into()
        } else {
            format!("xxh3_{:x}", self.seed)
        }
    }
}

impl_from_sample_with_default!(Identity, Murmur3Finalizer, Multiplicative, XxHash3);

/// A learned, monotone hash: a linear model fitted to the sample's key range
/// that spreads `[min, max]` over `[0, full_size)`.
///
/// Keys outside the fitted range saturate at the ends of the address space.
#[derive(Clone, Copy, Debug, Default)]
pub struct LinearModel {
    min: u64,
    range: u64,
    max_output: u64,
}

impl<K: Key> FromSample<K> for LinearModel {
    fn from_sample(sample: &[K], full_size: usize) -> Self {
        let max_output = (full_size as u64).saturating_sub(1);

        let (Some(min), Some(max)) = (sample.iter().min(), sample.iter().max()) else {
            return Self {
                min: 0,
                range: 0,
                max_output,
            };
        };
        let (min, max) = (min.as_u64(), max.as_u64());

        Self {
            min,
            range: max - min,
            max_output,
        }
    }
}

impl<K: Key> HashFn<K> for LinearModel {
    #[inline]
    fn hash(&self, key: K) -> u64 {
        if self.range == 0 {
            return 0;
        }

        let offset = key.as_u64().saturating_sub(self.min);
        // Float to int `as` casts saturate, so keys past the fitted maximum
        // clamp to the last address.
        let predicted = (offset as f64 / self.range as f64 * self.max_output as f64) as u64;
        predicted.min(self.max_output)
    }

    fn name(&self) -> String {
        "linear_model".into()
    }
}

#[cfg(test)]
mod tests {
    use super::{FromSample, HashFn, Identity, LinearModel, Multiplicative, Murmur3Finalizer, XxHash3};

    #[test]
    fn deterministic() {
        for key in [0u64, 1, 42, u64::MAX - 1] {
            assert_eq!(Murmur3Finalizer.hash(key), Murmur3Finalizer.hash(key));
            assert_eq!(Multiplicative.hash(key), Multiplicative.hash(key));
            assert_eq!(
                XxHash3::with_seed(7).hash(key),
                XxHash3::with_seed(7).hash(key)
            );
        }
    }

    #[test]
    fn seeds_differ() {
        let a = XxHash3::with_seed(1);
        let b = XxHash3::with_seed(2);
        let differing = (0u64..100).filter(|&k| a.hash(k) != b.hash(k)).count();
        assert!(differing > 90);
    }

    #[test]
    fn murmur_spreads_sequential_keys() {
        let hashes: std::collections::HashSet<u64> =
            (0u64..1000).map(|k| Murmur3Finalizer.hash(k) % 1024).collect();
        // Sequential keys must not collapse onto a handful of slots.
        assert!(hashes.len() > 500);
    }

    #[test]
    fn identity_is_identity() {
        assert_eq!(Identity.hash(17u32), 17);
        assert_eq!(HashFn::<u64>::name(&Identity), "identity");
    }

    #[test]
    fn linear_model_is_monotone_and_bounded() {
        let sample: Vec<u64> = (0..100).map(|i| 1_000 + i * 10).collect();
        let model = <LinearModel as FromSample<u64>>::from_sample(&sample, 50);

        assert_eq!(model.hash(1_000u64), 0);
        assert_eq!(model.hash(1_990u64), 49);
        assert_eq!(model.hash(5u64), 0);
        assert_eq!(model.hash(u64::MAX - 1), 49);

        let mut prev = 0;
        for key in (1_000u64..2_000).step_by(7) {
            let h = model.hash(key);
            assert!(h >= prev);
            prev = h;
        }
    }

    #[test]
    fn linear_model_degenerate_samples() {
        let empty = <LinearModel as FromSample<u64>>::from_sample(&[], 10);
        assert_eq!(empty.hash(123u64), 0);

        let single = <LinearModel as FromSample<u64>>::from_sample(&[5], 10);
        assert_eq!(single.hash(5u64), 0);
        assert_eq!(single.hash(500u64), 0);
    }

    #[test]
    fn unlearned_from_sample() {
        let h = <XxHash3 as FromSample<u64>>::from_sample(&[1, 2, 3], 100);
        assert_eq!(h.hash(9u64), XxHash3::default().hash(9u64));
    }
}
