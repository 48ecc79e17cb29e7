use hashtables::{
    cuckoo::{BalancedKicking, BiasedKicking},
    hash::{FromSample, Identity, LinearModel, Murmur3Finalizer, XxHash3},
    probing::{LinearProbing, QuadraticProbing},
    reduction::{Clamp, FastRange, Modulo},
    Chained, Cuckoo, HashTable, InsertError, Key, Probing, RobinHoodProbing,
};
use paste::paste;

const CAPACITY: usize = 4_096;

fn dataset<K: Key + TryFrom<u64>>(count: u64) -> Vec<K> {
    (0..count)
        .filter_map(|i| K::try_from(i.wrapping_mul(0x9e37_79b9) % 1_000_003).ok())
        .collect()
}

fn exercise<K, T>(table: &mut T, keys: &[K])
where
    K: Key + Into<u64>,
    T: HashTable<K, u64>,
{
    let empty_size = table.byte_size();
    assert!(empty_size > 0);
    assert!(!table.name().is_empty());
    assert!(!table.hash_name().is_empty());
    assert!(!table.reducer_name().is_empty());

    for &key in keys {
        assert_eq!(table.insert(key, key.into() + 1), Ok(true), "{}", table.name());
    }
    for &key in keys {
        assert_eq!(table.lookup(key), Some(key.into() + 1));
    }

    match table.insert(K::SENTINEL, 0) {
        Ok(false) | Err(InsertError::SentinelKey) => {}
        other => panic!("{}: sentinel insert returned {other:?}", table.name()),
    }
    assert_eq!(table.lookup(K::SENTINEL), None);

    let stats = table.lookup_statistics(keys);
    assert!(stats.values().all(|v| v.is_finite()));

    table.clear();
    for &key in keys {
        assert_eq!(table.lookup(key), None);
    }
    assert_eq!(table.byte_size(), empty_size);
}

macro_rules! generate_property_test {
    ($name:ident, $key:ty, $table_init:expr) => {
        paste! {
            #[test]
            fn [<test_ $name _round_trip>]() {
                let keys = dataset::<$key>(CAPACITY as u64 / 2);
                let mut table = $table_init;
                exercise(&mut table, &keys);
                // Tables are reusable after clearing.
                exercise(&mut table, &keys);
            }
        }
    };
}

generate_property_test!(
    chained,
    u64,
    Chained::<u64, u64, Murmur3Finalizer, FastRange, 1>::new(CAPACITY, Murmur3Finalizer)
);
generate_property_test!(
    chained_u32,
    u32,
    Chained::<u32, u64, XxHash3, Modulo, 4>::new(CAPACITY / 4, XxHash3::default())
);
generate_property_test!(
    linear_probing,
    u64,
    Probing::<u64, u64, XxHash3, FastRange, LinearProbing, 8>::new(CAPACITY, XxHash3::default())
);
generate_property_test!(
    quadratic_probing_u32,
    u32,
    Probing::<u32, u64, Murmur3Finalizer, FastRange, QuadraticProbing>::new(
        CAPACITY,
        Murmur3Finalizer
    )
);
generate_property_test!(
    robin_hood_probing,
    u64,
    RobinHoodProbing::<u64, u64, Murmur3Finalizer, Modulo, LinearProbing, 4>::new(
        CAPACITY,
        Murmur3Finalizer
    )
);
generate_property_test!(
    balanced_cuckoo,
    u64,
    Cuckoo::<u64, u64, Murmur3Finalizer, XxHash3, FastRange, BalancedKicking>::new(
        CAPACITY,
        Murmur3Finalizer,
        XxHash3::default()
    )
);
generate_property_test!(
    biased_cuckoo_u32,
    u32,
    Cuckoo::<u32, u64, XxHash3, XxHash3, FastRange, BiasedKicking<20>, 2>::new(
        CAPACITY,
        XxHash3::with_seed(11),
        XxHash3::with_seed(12)
    )
);

#[test]
fn learned_model_keeps_keys_in_order() {
    let keys: Vec<u64> = (0..2_000).map(|i| 1_000 + i * i).collect();
    let model = <LinearModel as FromSample<u64>>::from_sample(&keys, keys.len());
    let table = Chained::<u64, u64, LinearModel, Clamp, 2>::new(keys.len(), model);

    for &key in &keys {
        assert!(table.insert(key, key));
    }

    let (min, max) = (50_000, 900_000);
    let mut found = table.lookup_range(min, max);
    found.sort_unstable();
    let expected: Vec<u64> = keys
        .iter()
        .copied()
        .filter(|k| (min..=max).contains(k))
        .collect();
    assert_eq!(found, expected);
}

#[test]
fn identity_hash_into_probing_table() {
    let table = Probing::<u64, u64, Identity, Modulo, LinearProbing>::new(16, Identity);
    for key in [0, 16, 32] {
        assert_eq!(table.insert(key, key), Ok(true));
    }
    let stats = table.lookup_statistics(&[0, 16, 32]);
    assert_eq!(stats["max_psl"], 2.0);
    assert_eq!(stats["total_psl"], 3.0);
}
