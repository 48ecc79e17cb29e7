use crate::{common::key::Key, hash::HashFn};

/// A hash function backed by a plain function pointer, used to pin keys to
/// chosen directory indices.
#[derive(Clone, Copy)]
pub(crate) struct FnHash {
    name: &'static str,
    f: fn(u64) -> u64,
}

impl FnHash {
    pub(crate) const fn new(name: &'static str, f: fn(u64) -> u64) -> Self {
        Self { name, f }
    }

    /// Sends every key to hash value 0.
    pub(crate) const fn constant() -> Self {
        Self::new("constant", |_| 0)
    }
}

impl<K: Key> HashFn<K> for FnHash {
    fn hash(&self, key: K) -> u64 {
        (self.f)(key.as_u64())
    }

    fn name(&self) -> String {
        self.name.into()
    }
}

pub(crate) fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}
