//! Cursor over a store's key ordering.

use crate::error::{StoreError, StoreResult};
use crate::store::StoreInner;
use quilldb_engine::{CursorId, KvEngine, SeekBias};
use std::sync::Weak;

/// A movable, ordered position over a store's keys.
///
/// A cursor holds a **weak** back-reference to its store: it does not keep
/// the store alive, and every operation fails once the store is closed or
/// dropped. Release is idempotent and also happens automatically on drop,
/// so a cursor can never outlive the engine-side resource it names.
///
/// A freshly opened cursor is not on an entry; position it with
/// [`reset`](Cursor::reset), [`seek_last`](Cursor::seek_last), or
/// [`seek`](Cursor::seek) before reading.
///
/// # Example
///
/// ```rust
/// use quilldb_core::Store;
///
/// let store = Store::open_in_memory();
/// store.store(b"a", b"1").unwrap();
///
/// let mut cur = store.cursor().unwrap();
/// cur.reset().unwrap();
/// assert!(cur.is_valid());
/// assert_eq!(cur.key().unwrap(), b"a");
/// cur.release().unwrap();
/// ```
#[derive(Debug)]
pub struct Cursor {
    store: Weak<StoreInner>,
    id: CursorId,
    released: bool,
}

impl Cursor {
    pub(crate) fn new(store: Weak<StoreInner>, id: CursorId) -> Self {
        Self {
            store,
            id,
            released: false,
        }
    }

    /// Runs an engine cursor operation, translating lifecycle failures.
    fn with_engine<T>(
        &self,
        op: impl FnOnce(&mut dyn KvEngine, CursorId) -> quilldb_engine::EngineResult<T>,
    ) -> StoreResult<T> {
        if self.released {
            return Err(StoreError::InvalidCursor);
        }
        let inner = self.store.upgrade().ok_or(StoreError::Closed)?;
        inner.ensure_open()?;
        let mut engine = inner.engine.lock();
        op(engine.as_mut(), self.id).map_err(StoreError::from_cursor_op)
    }

    /// Moves the cursor to the first entry in key order.
    ///
    /// This is the canonical traversal start: `reset()`, then read and
    /// `next()` while [`is_valid`](Cursor::is_valid) holds. On an empty
    /// store the cursor is left invalid.
    ///
    /// # Errors
    ///
    /// Fails if the cursor is released or the store is closed.
    pub fn reset(&mut self) -> StoreResult<()> {
        self.with_engine(|engine, id| engine.cursor_first(id))
    }

    /// Moves the cursor to the last entry in key order.
    ///
    /// # Errors
    ///
    /// Fails if the cursor is released or the store is closed.
    pub fn seek_last(&mut self) -> StoreResult<()> {
        self.with_engine(|engine, id| engine.cursor_last(id))
    }

    /// Positions the cursor at `key` per the given bias. The cursor is left
    /// invalid if no entry matches.
    ///
    /// # Errors
    ///
    /// Fails if the cursor is released or the store is closed.
    pub fn seek(&mut self, key: &[u8], bias: SeekBias) -> StoreResult<()> {
        self.with_engine(|engine, id| engine.cursor_seek(id, key, bias))
    }

    /// Advances one entry in key order.
    ///
    /// Advancing a cursor that is not on an entry is a silent no-op; the
    /// cursor stays invalid.
    ///
    /// # Errors
    ///
    /// Fails if the cursor is released or the store is closed.
    pub fn next(&mut self) -> StoreResult<()> {
        self.with_engine(|engine, id| engine.cursor_next(id))
    }

    /// Retreats one entry in key order, mirroring [`next`](Cursor::next).
    ///
    /// # Errors
    ///
    /// Fails if the cursor is released or the store is closed.
    pub fn prev(&mut self) -> StoreResult<()> {
        self.with_engine(|engine, id| engine.cursor_prev(id))
    }

    /// Reports whether the cursor currently denotes an existing entry.
    ///
    /// Released cursors, cursors past either boundary, and cursors whose
    /// store has closed all report `false`.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.with_engine(|engine, id| engine.cursor_valid(id))
            .unwrap_or(false)
    }

    /// Reads the key under the cursor.
    ///
    /// # Errors
    ///
    /// Fails with [`StoreError::InvalidCursor`] unless
    /// [`is_valid`](Cursor::is_valid) holds.
    pub fn key(&self) -> StoreResult<Vec<u8>> {
        self.with_engine(|engine, id| engine.cursor_key(id))
    }

    /// Reads the value under the cursor.
    ///
    /// # Errors
    ///
    /// Fails with [`StoreError::InvalidCursor`] unless
    /// [`is_valid`](Cursor::is_valid) holds.
    pub fn value(&self) -> StoreResult<Vec<u8>> {
        self.with_engine(|engine, id| engine.cursor_value(id))
    }

    /// Deletes the entry under the cursor. The cursor moves to the next
    /// entry in key order, or becomes invalid if none remains.
    ///
    /// # Errors
    ///
    /// Fails if the cursor is not on an entry or the store is read-only.
    pub fn delete_entry(&mut self) -> StoreResult<()> {
        self.with_engine(|engine, id| engine.cursor_delete(id))
    }

    /// Releases the cursor, detaching it from its store. Idempotent.
    ///
    /// After release, [`is_valid`](Cursor::is_valid) reports `false` and
    /// accessors fail with [`StoreError::InvalidCursor`].
    ///
    /// # Errors
    ///
    /// Fails if the engine rejects the release.
    pub fn release(&mut self) -> StoreResult<()> {
        if self.released {
            return Ok(());
        }
        self.released = true;

        // A closed or dropped store has already torn the cursor down on the
        // engine side; nothing is left to release.
        let Some(inner) = self.store.upgrade() else {
            return Ok(());
        };
        if !inner.is_open() {
            return Ok(());
        }
        let mut engine = inner.engine.lock();
        engine
            .cursor_release(self.id)
            .map_err(StoreError::from_cursor_op)
    }
}

impl Drop for Cursor {
    fn drop(&mut self) {
        let _ = self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Store;

    fn seeded() -> Store {
        let store = Store::open_in_memory();
        store.store(b"a", b"1").unwrap();
        store.store(b"b", b"2").unwrap();
        store.store(b"c", b"3").unwrap();
        store
    }

    #[test]
    fn fresh_cursor_is_not_valid() {
        let store = seeded();
        let cur = store.cursor().unwrap();
        assert!(!cur.is_valid());
        assert!(matches!(cur.key(), Err(StoreError::InvalidCursor)));
    }

    #[test]
    fn reset_positions_on_first_entry() {
        let store = seeded();
        let mut cur = store.cursor().unwrap();
        cur.reset().unwrap();
        assert!(cur.is_valid());
        assert_eq!(cur.key().unwrap(), b"a");
        assert_eq!(cur.value().unwrap(), b"1");
    }

    #[test]
    fn reset_on_empty_store_leaves_invalid() {
        let store = Store::open_in_memory();
        let mut cur = store.cursor().unwrap();
        cur.reset().unwrap();
        assert!(!cur.is_valid());
    }

    #[test]
    fn walks_both_directions() {
        let store = seeded();
        let mut cur = store.cursor().unwrap();

        cur.reset().unwrap();
        cur.next().unwrap();
        assert_eq!(cur.key().unwrap(), b"b");

        cur.seek_last().unwrap();
        assert_eq!(cur.key().unwrap(), b"c");
        cur.prev().unwrap();
        assert_eq!(cur.key().unwrap(), b"b");
    }

    #[test]
    fn next_past_end_is_noop() {
        let store = seeded();
        let mut cur = store.cursor().unwrap();
        cur.seek_last().unwrap();
        cur.next().unwrap();
        assert!(!cur.is_valid());
        // Still a no-op once invalid.
        cur.next().unwrap();
        assert!(!cur.is_valid());
    }

    #[test]
    fn seek_with_bias() {
        let store = seeded();
        let mut cur = store.cursor().unwrap();

        cur.seek(b"b", SeekBias::Exact).unwrap();
        assert_eq!(cur.key().unwrap(), b"b");

        cur.seek(b"ab", SeekBias::GreaterOrEqual).unwrap();
        assert_eq!(cur.key().unwrap(), b"b");

        cur.seek(b"ab", SeekBias::LessOrEqual).unwrap();
        assert_eq!(cur.key().unwrap(), b"a");

        cur.seek(b"ab", SeekBias::Exact).unwrap();
        assert!(!cur.is_valid());
    }

    #[test]
    fn delete_entry_advances() {
        let store = seeded();
        let mut cur = store.cursor().unwrap();
        cur.reset().unwrap();
        cur.delete_entry().unwrap();

        assert_eq!(store.fetch(b"a").unwrap(), None);
        assert_eq!(cur.key().unwrap(), b"b");
    }

    #[test]
    fn release_is_idempotent() {
        let store = seeded();
        let mut cur = store.cursor().unwrap();
        cur.reset().unwrap();

        cur.release().unwrap();
        cur.release().unwrap();

        assert!(!cur.is_valid());
        assert!(matches!(cur.key(), Err(StoreError::InvalidCursor)));
        assert!(matches!(cur.next(), Err(StoreError::InvalidCursor)));
    }

    #[test]
    fn cursor_fails_after_store_close() {
        let store = seeded();
        let mut cur = store.cursor().unwrap();
        cur.reset().unwrap();

        store.close().unwrap();

        assert!(!cur.is_valid());
        assert!(matches!(cur.key(), Err(StoreError::Closed)));
        // Release after close still succeeds (nothing left to release).
        cur.release().unwrap();
    }

    #[test]
    fn cursor_does_not_keep_store_alive() {
        let cur = {
            let store = seeded();
            let mut cur = store.cursor().unwrap();
            cur.reset().unwrap();
            cur
        };
        assert!(!cur.is_valid());
        assert!(matches!(cur.key(), Err(StoreError::Closed)));
    }

    #[test]
    fn two_cursors_share_one_store() {
        let store = seeded();
        let mut first = store.cursor().unwrap();
        let mut second = store.cursor().unwrap();

        first.reset().unwrap();
        second.seek_last().unwrap();

        assert_eq!(first.key().unwrap(), b"a");
        assert_eq!(second.key().unwrap(), b"c");

        first.next().unwrap();
        assert_eq!(first.key().unwrap(), b"b");
        assert_eq!(second.key().unwrap(), b"c");
    }
}
