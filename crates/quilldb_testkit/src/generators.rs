//! Property-based test generators using proptest.
//!
//! Strategies for random keys, values, entry maps, and store operation
//! sequences, plus a model-based `apply` for checking the binding layer
//! against a plain `BTreeMap`.

use proptest::prelude::*;
use quilldb_core::{Store, StoreResult};
use std::collections::BTreeMap;

/// Strategy for generating store keys (non-empty, arbitrary bytes).
pub fn key_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 1..32)
}

/// Strategy for generating store values (possibly empty, arbitrary bytes).
pub fn value_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..256)
}

/// Strategy for generating an entry map of up to `max` entries.
pub fn entries_strategy(max: usize) -> impl Strategy<Value = BTreeMap<Vec<u8>, Vec<u8>>> {
    prop::collection::btree_map(key_strategy(), value_strategy(), 0..max)
}

/// A single store operation, for generated sequences.
#[derive(Debug, Clone)]
pub enum StoreOp {
    /// Upsert a key.
    Put(Vec<u8>, Vec<u8>),
    /// Append onto a key.
    Append(Vec<u8>, Vec<u8>),
    /// Delete a key.
    Delete(Vec<u8>),
}

/// Strategy for generating operation sequences of up to `max` steps.
///
/// Keys are drawn from a small alphabet so that operations collide often.
pub fn ops_strategy(max: usize) -> impl Strategy<Value = Vec<StoreOp>> {
    let small_key = prop::sample::select(vec![
        b"a".to_vec(),
        b"b".to_vec(),
        b"c".to_vec(),
        b"d".to_vec(),
    ]);
    let op = prop_oneof![
        (small_key.clone(), value_strategy()).prop_map(|(k, v)| StoreOp::Put(k, v)),
        (small_key.clone(), value_strategy()).prop_map(|(k, v)| StoreOp::Append(k, v)),
        small_key.prop_map(StoreOp::Delete),
    ];
    prop::collection::vec(op, 0..max)
}

/// Applies an operation to a store and, in lockstep, to a model map.
///
/// # Errors
///
/// Propagates the store's failure; the model is only touched on success.
pub fn apply_op(
    store: &Store,
    model: &mut BTreeMap<Vec<u8>, Vec<u8>>,
    op: &StoreOp,
) -> StoreResult<()> {
    match op {
        StoreOp::Put(key, value) => {
            store.store(key, value)?;
            model.insert(key.clone(), value.clone());
        }
        StoreOp::Append(key, value) => {
            store.append(key, value)?;
            model.entry(key.clone()).or_default().extend_from_slice(value);
        }
        StoreOp::Delete(key) => {
            store.delete(key)?;
            model.remove(key);
        }
    }
    Ok(())
}

/// Collects a store's full contents through the pairs adapter.
///
/// # Errors
///
/// Propagates the first traversal failure.
pub fn collect_pairs(store: &Store) -> StoreResult<BTreeMap<Vec<u8>, Vec<u8>>> {
    store.pairs()?.collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn store_matches_model(ops in ops_strategy(32)) {
            let store = Store::open_in_memory();
            let mut model = BTreeMap::new();

            for op in &ops {
                apply_op(&store, &mut model, op).unwrap();
            }

            prop_assert_eq!(collect_pairs(&store).unwrap(), model);
        }

        #[test]
        fn traversal_follows_model_order(entries in entries_strategy(24)) {
            let store = Store::open_in_memory();
            for (key, value) in &entries {
                store.store(key, value).unwrap();
            }

            let keys: Vec<Vec<u8>> =
                store.keys().unwrap().map(Result::unwrap).collect();
            let expected: Vec<Vec<u8>> = entries.keys().cloned().collect();
            prop_assert_eq!(keys, expected);
        }

        #[test]
        fn bracket_always_ends_idle(ops in ops_strategy(16), fail in any::<bool>()) {
            use quilldb_core::{StoreError, TxnState};

            let store = Store::open_in_memory();
            let result: StoreResult<()> = store.transaction(|s| {
                let mut model = BTreeMap::new();
                for op in &ops {
                    apply_op(s, &mut model, op)?;
                }
                if fail {
                    Err(StoreError::open("forced"))
                } else {
                    Ok(())
                }
            });

            prop_assert_eq!(result.is_err(), fail);
            prop_assert_eq!(store.txn_state(), TxnState::Idle);
            if fail {
                // Every bracketed write was discarded.
                prop_assert!(collect_pairs(&store).unwrap().is_empty());
            }
        }
    }
}
