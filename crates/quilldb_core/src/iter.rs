//! Lazy enumeration adapters over a cursor traversal.
//!
//! Each adapter owns its own cursor, drives the canonical traversal
//! (position on the first entry, yield while valid, advance), and projects
//! a different view of each step. Sequences are lazy, finite, one-shot, and
//! fused; the cursor is released when the traversal ends or the adapter is
//! dropped, so abandoning an iteration midway leaks nothing.

use crate::cursor::Cursor;
use crate::error::StoreResult;
use std::iter::FusedIterator;

/// A key-value entry yielded by [`Entries`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// The entry's key.
    pub key: Vec<u8>,
    /// The entry's value.
    pub value: Vec<u8>,
}

/// Shared traversal state: one cursor, driven forward a step at a time.
#[derive(Debug)]
struct Scan {
    cursor: Cursor,
    done: bool,
}

impl Scan {
    fn new(mut cursor: Cursor) -> StoreResult<Self> {
        cursor.reset()?;
        Ok(Self {
            cursor,
            done: false,
        })
    }

    /// Projects the current entry with `read`, then advances.
    ///
    /// Ends the sequence (releasing the cursor) at the first invalid
    /// position or failure; a failure is yielded before the sequence fuses.
    fn step<T>(&mut self, read: impl FnOnce(&Cursor) -> StoreResult<T>) -> Option<StoreResult<T>> {
        if self.done {
            return None;
        }
        if !self.cursor.is_valid() {
            self.finish();
            return None;
        }
        let item = read(&self.cursor);
        if item.is_err() {
            self.finish();
            return Some(item);
        }
        if let Err(err) = self.cursor.next() {
            self.finish();
            return Some(Err(err));
        }
        Some(item)
    }

    fn finish(&mut self) {
        self.done = true;
        let _ = self.cursor.release();
    }
}

/// Lazy sequence of full [`Entry`] values in key order.
///
/// Created by [`crate::Store::entries`]. One-shot: a second pass needs a
/// fresh adapter.
#[derive(Debug)]
pub struct Entries {
    scan: Scan,
}

impl Entries {
    pub(crate) fn new(cursor: Cursor) -> StoreResult<Self> {
        Ok(Self {
            scan: Scan::new(cursor)?,
        })
    }
}

impl Iterator for Entries {
    type Item = StoreResult<Entry>;

    fn next(&mut self) -> Option<Self::Item> {
        self.scan.step(|cur| {
            Ok(Entry {
                key: cur.key()?,
                value: cur.value()?,
            })
        })
    }
}

impl FusedIterator for Entries {}

/// Lazy sequence of keys in key order.
///
/// Created by [`crate::Store::keys`].
#[derive(Debug)]
pub struct Keys {
    scan: Scan,
}

impl Keys {
    pub(crate) fn new(cursor: Cursor) -> StoreResult<Self> {
        Ok(Self {
            scan: Scan::new(cursor)?,
        })
    }
}

impl Iterator for Keys {
    type Item = StoreResult<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.scan.step(|cur| cur.key())
    }
}

impl FusedIterator for Keys {}

/// Lazy sequence of values in key order.
///
/// Created by [`crate::Store::values`].
#[derive(Debug)]
pub struct Values {
    scan: Scan,
}

impl Values {
    pub(crate) fn new(cursor: Cursor) -> StoreResult<Self> {
        Ok(Self {
            scan: Scan::new(cursor)?,
        })
    }
}

impl Iterator for Values {
    type Item = StoreResult<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.scan.step(|cur| cur.value())
    }
}

impl FusedIterator for Values {}

/// Lazy sequence of `(key, value)` tuples in key order.
///
/// Created by [`crate::Store::pairs`].
#[derive(Debug)]
pub struct Pairs {
    scan: Scan,
}

impl Pairs {
    pub(crate) fn new(cursor: Cursor) -> StoreResult<Self> {
        Ok(Self {
            scan: Scan::new(cursor)?,
        })
    }
}

impl Iterator for Pairs {
    type Item = StoreResult<(Vec<u8>, Vec<u8>)>;

    fn next(&mut self) -> Option<Self::Item> {
        self.scan.step(|cur| Ok((cur.key()?, cur.value()?)))
    }
}

impl FusedIterator for Pairs {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Store;

    fn seeded() -> Store {
        let store = Store::open_in_memory();
        store.store(b"k1", b"v1").unwrap();
        store.store(b"k2", b"v2").unwrap();
        store.store(b"k3", b"v3").unwrap();
        store
    }

    #[test]
    fn keys_in_order_once_each() {
        let store = seeded();
        let keys: Vec<Vec<u8>> = store.keys().unwrap().map(Result::unwrap).collect();
        assert_eq!(keys, vec![b"k1".to_vec(), b"k2".to_vec(), b"k3".to_vec()]);
    }

    #[test]
    fn values_follow_key_order() {
        let store = seeded();
        let values: Vec<Vec<u8>> = store.values().unwrap().map(Result::unwrap).collect();
        assert_eq!(values, vec![b"v1".to_vec(), b"v2".to_vec(), b"v3".to_vec()]);
    }

    #[test]
    fn entries_carry_key_and_value() {
        let store = seeded();
        let entries: Vec<Entry> = store.entries().unwrap().map(Result::unwrap).collect();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].key, b"k1".to_vec());
        assert_eq!(entries[0].value, b"v1".to_vec());
    }

    #[test]
    fn pairs_are_tuples() {
        let store = seeded();
        let pairs: Vec<(Vec<u8>, Vec<u8>)> =
            store.pairs().unwrap().map(Result::unwrap).collect();
        assert_eq!(pairs[2], (b"k3".to_vec(), b"v3".to_vec()));
    }

    #[test]
    fn empty_store_yields_nothing() {
        let store = Store::open_in_memory();
        assert_eq!(store.entries().unwrap().count(), 0);
    }

    #[test]
    fn exhausted_iterator_stays_fused() {
        let store = seeded();
        let mut keys = store.keys().unwrap();
        while keys.next().is_some() {}
        assert!(keys.next().is_none());
        assert!(keys.next().is_none());
    }

    #[test]
    fn iteration_is_lazy() {
        let store = seeded();
        let mut entries = store.entries().unwrap();

        let first = entries.next().unwrap().unwrap();
        assert_eq!(first.key, b"k1".to_vec());
        // Two elements remain unconsumed; dropping the adapter must release
        // the cursor without draining them.
        drop(entries);

        // A fresh traversal still sees everything.
        assert_eq!(store.keys().unwrap().count(), 3);
    }

    #[test]
    fn second_pass_needs_fresh_adapter() {
        let store = seeded();
        let first: Vec<_> = store.keys().unwrap().map(Result::unwrap).collect();
        let second: Vec<_> = store.keys().unwrap().map(Result::unwrap).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn adapters_do_not_block_writes_after_drop() {
        let store = seeded();
        {
            let _entries = store.entries().unwrap();
        }
        store.store(b"k4", b"v4").unwrap();
        assert_eq!(store.keys().unwrap().count(), 4);
    }
}
