//! Thread-safe table flavours.
//!
//! Every alias guards each directory index with a [`SpinLock`]. Swap in a
//! `parking_lot::Mutex<()>` through the `Mutex*` aliases for an OS-assisted
//! lock. All of them are `Sync` and can be shared through an `Arc` or a scoped
//! thread.

use crate::common::concurrent::SpinLock;

use parking_lot::Mutex;

pub type Chained<K, P, H, R, const B: usize> = crate::chained::Chained<K, P, H, R, B, SpinLock>;

pub type Probing<K, P, H, R, F, const B: usize> =
    crate::probing::Probing<K, P, H, R, F, B, SpinLock>;

pub type RobinHoodProbing<K, P, H, R, F, const B: usize> =
    crate::probing::RobinHoodProbing<K, P, H, R, F, B, SpinLock>;

pub type Cuckoo<K, P, H1, H2, R, Kick, const B: usize> =
    crate::cuckoo::Cuckoo<K, P, H1, H2, R, Kick, B, SpinLock>;

pub type MutexChained<K, P, H, R, const B: usize> =
    crate::chained::Chained<K, P, H, R, B, Mutex<()>>;

pub type MutexProbing<K, P, H, R, F, const B: usize> =
    crate::probing::Probing<K, P, H, R, F, B, Mutex<()>>;

pub type MutexRobinHoodProbing<K, P, H, R, F, const B: usize> =
    crate::probing::RobinHoodProbing<K, P, H, R, F, B, Mutex<()>>;

pub type MutexCuckoo<K, P, H1, H2, R, Kick, const B: usize> =
    crate::cuckoo::Cuckoo<K, P, H1, H2, R, Kick, B, Mutex<()>>;
