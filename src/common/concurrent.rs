//! Lock striping strategies.
//!
//! Every table owns one lock per directory index. The lock type is a type
//! parameter so the same insert algorithm serves the single-threaded tables
//! ([`NoLock`]) and the concurrent ones ([`SpinLock`] or a
//! [`parking_lot::Mutex`]).

pub(crate) mod spinlock;

use std::{cell::Cell, marker::PhantomData};

use parking_lot::{Mutex, MutexGuard};

pub use spinlock::{SpinLock, SpinLockGuard};

/// A lock guarding one directory index.
pub trait BucketLock: Default + Send {
    type Guard<'a>
    where
        Self: 'a;

    fn lock(&self) -> Self::Guard<'_>;

    /// Suffix appended to the table name, e.g. `"_spinlock"`.
    fn name() -> &'static str;
}

/// No locking at all.
///
/// Holding a `NoLock` makes a table `!Sync`, so the compiler rejects sharing a
/// single-threaded table between threads.
#[derive(Debug, Default)]
pub struct NoLock {
    _not_sync: PhantomData<Cell<()>>,
}

impl BucketLock for NoLock {
    type Guard<'a> = ();

    #[inline]
    fn lock(&self) -> Self::Guard<'_> {}

    fn name() -> &'static str {
        ""
    }
}

impl BucketLock for SpinLock {
    type Guard<'a> = SpinLockGuard<'a>;

    #[inline]
    fn lock(&self) -> Self::Guard<'_> {
        SpinLock::lock(self)
    }

    fn name() -> &'static str {
        "_spinlock"
    }
}

impl BucketLock for Mutex<()> {
    type Guard<'a> = MutexGuard<'a, ()>;

    #[inline]
    fn lock(&self) -> Self::Guard<'_> {
        Mutex::lock(self)
    }

    fn name() -> &'static str {
        "_mutex"
    }
}

pub(crate) fn new_locks<L: BucketLock>(count: usize) -> Box<[L]> {
    std::iter::repeat_with(L::default).take(count).collect()
}
