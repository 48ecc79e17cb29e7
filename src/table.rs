use crate::{
    common::{
        error::InsertError,
        key::{Key, Payload},
    },
    stats::Statistics,
};

/// The operations a benchmark driver runs against any table in this crate.
///
/// Interior mutability: inserts take `&self` so that concurrent tables can be
/// shared between threads. `clear` takes `&mut self` because it must not race
/// with any other operation.
pub trait HashTable<K: Key, P: Payload> {
    /// Inserts an entry.
    ///
    /// Returns `Ok(false)` if the key was rejected without an error (a
    /// duplicate in a chaining or probing table, or the sentinel key). Cuckoo
    /// tables update duplicates in place and return `Ok(true)`.
    fn insert(&self, key: K, payload: P) -> Result<bool, InsertError>;

    fn lookup(&self, key: K) -> Option<P>;

    /// Empties the table. Overflow storage is released.
    fn clear(&mut self);

    /// Memory footprint in bytes, overflow storage included.
    fn byte_size(&self) -> usize;

    fn lookup_statistics(&self, dataset: &[K]) -> Statistics;

    fn name(&self) -> String;

    fn hash_name(&self) -> String;

    fn reducer_name(&self) -> String;
}
