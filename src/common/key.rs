use std::fmt::Debug;

/// A fixed-width integer key.
///
/// The maximum representable value is reserved as [`Key::SENTINEL`], the
/// marker of an empty slot. It can never be stored as a data key.
pub trait Key: Copy + Eq + Ord + Debug + Send + Sync + 'static {
    /// The reserved "slot empty" key.
    const SENTINEL: Self;

    /// Widens the key for hashing.
    fn as_u64(self) -> u64;

    #[inline]
    fn is_sentinel(self) -> bool {
        self == Self::SENTINEL
    }
}

macro_rules! impl_key {
    ($($t:ty),*) => {
        $(
            impl Key for $t {
                const SENTINEL: Self = <$t>::MAX;

                #[inline]
                fn as_u64(self) -> u64 {
                    self as u64
                }
            }
        )*
    };
}

impl_key!(u8, u16, u32, u64, usize);

/// A payload stored next to a key.
///
/// Payloads are copied in and out of the table, never borrowed, so that
/// lock-free lookups can hand out values while inserts run concurrently.
pub trait Payload: Copy + Default + Send + Sync + 'static {}

impl<T> Payload for T where T: Copy + Default + Send + Sync + 'static {}
