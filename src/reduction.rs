//! Reduction functions mapping an unbounded hash value to a directory index.

/// Maps a hash value into `[0, directory_size)`.
pub trait Reducer: Send + Sync {
    fn new(directory_size: usize) -> Self
    where
        Self: Sized;

    fn reduce(&self, hash: u64) -> usize;

    fn name() -> &'static str
    where
        Self: Sized;
}

/// `hash % directory_size`.
#[derive(Clone, Copy, Debug)]
pub struct Modulo {
    directory_size: u64,
}

impl Reducer for Modulo {
    fn new(directory_size: usize) -> Self {
        assert!(directory_size > 0, "directory must not be empty");
        Self {
            directory_size: directory_size as u64,
        }
    }

    #[inline]
    fn reduce(&self, hash: u64) -> usize {
        (hash % self.directory_size) as usize
    }

    fn name() -> &'static str {
        "modulo"
    }
}

/// Lemire's multiply-shift range reduction, `(hash * n) >> 64`.
///
/// Order-preserving: larger hashes never land on smaller indices.
#[derive(Clone, Copy, Debug)]
pub struct FastRange {
    directory_size: u128,
}

impl Reducer for FastRange {
    fn new(directory_size: usize) -> Self {
        assert!(directory_size > 0, "directory must not be empty");
        Self {
            directory_size: directory_size as u128,
        }
    }

    #[inline]
    fn reduce(&self, hash: u64) -> usize {
        ((hash as u128 * self.directory_size) >> 64) as usize
    }

    fn name() -> &'static str {
        "fastrange64"
    }
}

/// `min(hash, directory_size - 1)`, for hash functions that already produce
/// values in the directory's range (e.g. learned models).
///
/// Order-preserving.
#[derive(Clone, Copy, Debug)]
pub struct Clamp {
    max_index: u64,
}

impl Reducer for Clamp {
    fn new(directory_size: usize) -> Self {
        assert!(directory_size > 0, "directory must not be empty");
        Self {
            max_index: directory_size as u64 - 1,
        }
    }

    #[inline]
    fn reduce(&self, hash: u64) -> usize {
        hash.min(self.max_index) as usize
    }

    fn name() -> &'static str {
        "clamp"
    }
}

#[cfg(test)]
mod tests {
    use super::{Clamp, FastRange, Modulo, Reducer};

    fn check_in_range<R: Reducer>(size: usize) {
        let r = R::new(size);
        for hash in [0, 1, 2, 1 << 20, u64::MAX / 3, u64::MAX - 1, u64::MAX] {
            assert!(r.reduce(hash) < size, "{} out of range", R::name());
        }
    }

    #[test]
    fn in_range() {
        for size in [1, 2, 7, 1000] {
            check_in_range::<Modulo>(size);
            check_in_range::<FastRange>(size);
            check_in_range::<Clamp>(size);
        }
    }

    #[test]
    fn modulo() {
        let r = Modulo::new(10);
        assert_eq!(r.reduce(23), 3);
    }

    #[test]
    fn fastrange_preserves_order() {
        let r = FastRange::new(100);
        assert_eq!(r.reduce(0), 0);
        assert_eq!(r.reduce(u64::MAX), 99);

        let mut prev = 0;
        for hash in (0..u64::MAX).step_by((u64::MAX / 1000) as usize) {
            let i = r.reduce(hash);
            assert!(i >= prev);
            prev = i;
        }
    }

    #[test]
    fn clamp() {
        let r = Clamp::new(8);
        assert_eq!(r.reduce(3), 3);
        assert_eq!(r.reduce(8), 7);
        assert_eq!(r.reduce(u64::MAX), 7);
    }

    #[test]
    #[should_panic(expected = "directory must not be empty")]
    fn empty_directory() {
        Modulo::new(0);
    }
}
