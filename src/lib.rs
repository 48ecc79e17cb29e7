#![warn(clippy::all)]
#![warn(rust_2018_idioms)]

//! Fixed-capacity hash tables for comparing hashing schemes on integer keys.
//!
//! Three collision resolution families are provided, each generic over the
//! hash function, the reduction from hash value to directory index, the bucket
//! size `B` and a lock strategy:
//!
//! - [`Chained`]: separate chaining with overflow buckets. Never fails.
//! - [`Probing`] and [`RobinHoodProbing`]: open addressing with a pluggable
//!   [`ProbingFn`].
//! - [`Cuckoo`]: two-choice bucketized cuckoo hashing with a pluggable
//!   [`KickingPolicy`].
//!
//! Tables never resize. The largest value of the key type is reserved as the
//! empty-slot marker ([`Key::SENTINEL`]) and is rejected by every insert.
//!
//! Tables built with the default [`NoLock`] are single-threaded and `!Sync`.
//! The aliases in [`sync`] pick a [`SpinLock`] per directory index instead, so
//! the table can be filled from several threads at once.
//!
//! ```
//! use hashtables::{
//!     hash::Murmur3Finalizer, probing::LinearProbing, reduction::FastRange, Probing,
//! };
//!
//! let table = Probing::<u64, u32, Murmur3Finalizer, FastRange, LinearProbing, 4>::new(
//!     1_024,
//!     Murmur3Finalizer,
//! );
//! assert_eq!(table.insert(42, 7), Ok(true));
//! assert_eq!(table.insert(42, 8), Ok(false));
//! assert_eq!(table.lookup(42), Some(7));
//! ```
//!
//! # Logging
//!
//! With the `logging` feature enabled, rejected sentinel inserts and structural
//! insert failures are reported through the [`log`] facade.
//!
//! [`log`]: https://docs.rs/log

pub(crate) mod common;

pub mod chained;
pub mod cuckoo;
pub mod hash;
pub mod probing;
pub mod reduction;
pub mod stats;
pub mod sync;
pub mod table;

pub use common::{
    bucket::Bucket,
    concurrent::{BucketLock, NoLock, SpinLock, SpinLockGuard},
    error::InsertError,
    key::{Key, Payload},
};

pub use {
    chained::Chained,
    cuckoo::{Cuckoo, KickingPolicy},
    hash::{FromSample, HashFn},
    probing::{Probing, ProbingFn, RobinHoodProbing},
    reduction::Reducer,
    stats::Statistics,
    table::HashTable,
};
