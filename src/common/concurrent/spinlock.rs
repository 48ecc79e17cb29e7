//! A test-and-test-and-set spinlock.
//!
//! Spinning happens on a relaxed load so that waiting threads keep the lock's
//! cache line shared instead of bouncing it with failed swaps. See
//! <https://rigtorp.se/spinlock/>.

use std::{
    hint::spin_loop,
    sync::atomic::{AtomicBool, Ordering},
};

/// A minimal, unfair, non-reentrant mutual exclusion primitive.
#[derive(Debug, Default)]
pub struct SpinLock {
    locked: AtomicBool,
}

impl SpinLock {
    pub const fn new() -> Self {
        Self {
            locked: AtomicBool::new(false),
        }
    }

    /// Acquires the lock, spinning until it becomes available.
    #[inline]
    pub fn lock(&self) -> SpinLockGuard<'_> {
        loop {
            // Optimistically assume the lock is free on the first try.
            if !self.locked.swap(true, Ordering::Acquire) {
                return SpinLockGuard { lock: self };
            }

            while self.locked.load(Ordering::Relaxed) {
                spin_loop();
            }
        }
    }

    /// Attempts to acquire the lock without spinning.
    #[inline]
    pub fn try_lock(&self) -> Option<SpinLockGuard<'_>> {
        // The relaxed load keeps `while lock.try_lock().is_none() {}` loops from
        // invalidating the cache line on every iteration.
        if !self.locked.load(Ordering::Relaxed) && !self.locked.swap(true, Ordering::Acquire) {
            Some(SpinLockGuard { lock: self })
        } else {
            None
        }
    }

    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Relaxed)
    }

    /// Releases the lock without a guard.
    ///
    /// # Safety
    ///
    /// The caller must own the lock through a guard that was forgotten with
    /// [`std::mem::forget`].
    #[inline]
    pub unsafe fn force_unlock(&self) {
        self.locked.store(false, Ordering::Release);
    }
}

/// Releases the [`SpinLock`] on drop.
#[must_use = "if unused the SpinLock will immediately unlock"]
pub struct SpinLockGuard<'a> {
    lock: &'a SpinLock,
}

impl Drop for SpinLockGuard<'_> {
    #[inline]
    fn drop(&mut self) {
        // Safety: the guard proves ownership of the lock.
        unsafe { self.lock.force_unlock() };
    }
}
