#![cfg(test)]

// Property tests for ChainedHashTable kept inside the crate so they can use
// the structural audit.

use crate::chained_table::ChainedHashTable;
use crate::error::TableError;
use crate::key::TableKey;
use proptest::prelude::*;
use std::collections::{BTreeSet, HashMap};

// Pool-indexed operations to improve shrinking: indices shrink to earlier
// keys, pool length shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum OpI {
    Insert(usize, i32),
    Remove(usize),
    Get(usize),
    Contains(String),
    Iterate,
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<OpI>)> {
    proptest::collection::vec("[a-z]{0,4}", 1..=12).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let contains_pool = proptest::sample::select(pool.clone());
        let op = prop_oneof![
            3 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Insert(i, v)),
            2 => idx.clone().prop_map(OpI::Remove),
            2 => idx.clone().prop_map(OpI::Get),
            1 => prop_oneof![contains_pool, "[a-z]{0,4}".prop_map(|s| s)].prop_map(OpI::Contains),
            1 => Just(OpI::Iterate),
        ];
        proptest::collection::vec(op, 1..80).prop_map(move |ops| (pool.clone(), ops))
    })
}

fn arb_shape() -> impl Strategy<Value = (usize, f64)> {
    (1usize..=16, prop_oneof![Just(0.75), 0.2f64..3.0])
}

/// Drive `sut` and a `HashMap` model with the same operations and check the
/// table's observable state after each step.
fn run_against_model<K>(
    sut: &mut ChainedHashTable<K, i32>,
    pool: &[String],
    ops: Vec<OpI>,
    key: impl Fn(&str) -> K,
) -> Result<(), TestCaseError>
where
    K: TableKey + Clone + Ord + std::hash::Hash + std::fmt::Debug,
{
    let mut model: HashMap<K, i32> = HashMap::new();
    for op in ops {
        let capacity_before = sut.capacity();
        match op {
            OpI::Insert(i, v) => {
                let k = key(pool[i].as_str());
                let already = model.contains_key(&k);
                match sut.insert(k.clone(), v) {
                    Ok(()) => {
                        prop_assert!(!already, "insert must fail on duplicate");
                        model.insert(k, v);
                        prop_assert!(
                            sut.load_factor() < sut.load_factor_threshold(),
                            "insert returned with load factor at or above threshold"
                        );
                    }
                    Err(TableError::DuplicateKey) => {
                        prop_assert!(already, "duplicate error only when key exists");
                        prop_assert_eq!(sut.capacity(), capacity_before);
                        prop_assert_eq!(sut.get(&k), Ok(&model[&k]));
                    }
                    Err(e) => prop_assert!(false, "unexpected insert error {:?}", e),
                }
            }
            OpI::Remove(i) => {
                let k = key(pool[i].as_str());
                let expected = model.remove(&k);
                prop_assert_eq!(sut.remove_entry(&k), Ok(expected.map(|v| (k.clone(), v))));
                prop_assert_eq!(sut.capacity(), capacity_before, "remove never shrinks");
            }
            OpI::Get(i) => {
                let k = key(pool[i].as_str());
                match model.get(&k) {
                    Some(v) => prop_assert_eq!(sut.get(&k), Ok(v)),
                    None => prop_assert_eq!(sut.get(&k), Err(TableError::KeyNotFound)),
                }
            }
            OpI::Contains(s) => {
                let k = key(s.as_str());
                prop_assert_eq!(sut.contains_key(&k), Ok(model.contains_key(&k)));
            }
            OpI::Iterate => {
                let s_keys: BTreeSet<_> = sut.keys().cloned().collect();
                let m_keys: BTreeSet<_> = model.keys().cloned().collect();
                prop_assert_eq!(s_keys, m_keys);
            }
        }

        // Post-conditions after each op
        prop_assert!(sut.capacity() >= capacity_before);
        prop_assert_eq!(sut.num_keys(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
        prop_assert_eq!(
            sut.load_factor(),
            sut.num_keys() as f64 / sut.capacity() as f64
        );
        prop_assert_eq!(sut.audit(), Ok(()));
    }
    Ok(())
}

// Property: state-machine equivalence against std::collections::HashMap for
// arbitrary initial capacities and thresholds.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario(), (cap, threshold) in arb_shape()) {
        let mut sut: ChainedHashTable<String, i32> =
            ChainedHashTable::with_capacity_and_threshold(cap, threshold).unwrap();
        run_against_model(&mut sut, &pool, ops, |s| s.to_string())?;
    }
}

// Key whose hash ignores most of its content, so chains grow long and
// removals hit heads, interiors and tails.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
struct Colliding(String);

impl TableKey for Colliding {
    fn table_hash(&self) -> i64 {
        self.0.len() as i64 % 2
    }
}

// Property: same invariants as above under heavy collisions.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario(), (cap, threshold) in arb_shape()) {
        let mut sut: ChainedHashTable<Colliding, i32> =
            ChainedHashTable::with_capacity_and_threshold(cap, threshold).unwrap();
        run_against_model(&mut sut, &pool, ops, |s| Colliding(s.to_string()))?;
    }
}

// Property: nullable keys reject `None` for every operation in any state,
// without changing the table.
proptest! {
    #[test]
    fn prop_null_key_always_rejected(keys in proptest::collection::vec(any::<i16>(), 0..40)) {
        let mut sut: ChainedHashTable<Option<i16>, ()> = ChainedHashTable::new();
        for k in keys {
            let _ = sut.insert(Some(k), ());
        }
        let (len, cap) = (sut.num_keys(), sut.capacity());
        prop_assert_eq!(sut.insert(None, ()), Err(TableError::IllegalNullKey));
        prop_assert_eq!(sut.get(&None), Err(TableError::IllegalNullKey));
        prop_assert_eq!(sut.remove(&None), Err(TableError::IllegalNullKey));
        prop_assert_eq!((sut.num_keys(), sut.capacity()), (len, cap));
    }
}
