//! Key-value engine trait definition.

use crate::error::EngineResult;

/// Identifies an open cursor within an engine.
///
/// Cursor ids are engine-scoped and opaque. They are handed out by
/// [`KvEngine::cursor_open`] and become invalid after
/// [`KvEngine::cursor_release`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CursorId(pub u64);

impl CursorId {
    /// Returns the raw id value.
    #[must_use]
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// How a cursor seek matches against the target key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SeekBias {
    /// Position only on an exact match.
    #[default]
    Exact,
    /// Position on the target or the smallest key greater than it.
    GreaterOrEqual,
    /// Position on the target or the largest key less than it.
    LessOrEqual,
}

/// An embedded key-value engine.
///
/// This is the complete surface QuillDB consumes. Engines are **opaque
/// ordered byte stores**: keys and values are byte strings, iteration
/// follows the engine's native key ordering, and transactions bracket
/// point writes atomically.
///
/// # Invariants
///
/// - `get` returns exactly the bytes last `put` (or `append`ed) for the key
/// - cursors observe the engine's native key ordering
/// - after `txn_rollback`, writes made since `txn_begin` are not visible
/// - `close` is idempotent; every other operation fails once closed
///
/// # Implementors
///
/// - [`super::MemoryEngine`] - For testing and ephemeral stores
/// - [`super::FileEngine`] - Snapshot-file persistence
pub trait KvEngine: Send {
    /// Reads the value stored for `key`, or `None` if absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine is closed or the read fails.
    fn get(&self, key: &[u8]) -> EngineResult<Option<Vec<u8>>>;

    /// Stores `value` for `key`, replacing any existing value.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine is closed, read-only, or the write
    /// fails.
    fn put(&mut self, key: &[u8], value: &[u8]) -> EngineResult<()>;

    /// Appends `value` to the existing value for `key`, creating the entry
    /// if absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine is closed, read-only, or the write
    /// fails.
    fn append(&mut self, key: &[u8], value: &[u8]) -> EngineResult<()>;

    /// Deletes `key`, returning whether it existed.
    ///
    /// Deleting an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine is closed, read-only, or the delete
    /// fails.
    fn delete(&mut self, key: &[u8]) -> EngineResult<bool>;

    /// Returns the length of the value stored for `key` without
    /// materializing it, or `None` if absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine is closed or the read fails.
    fn value_size(&self, key: &[u8]) -> EngineResult<Option<u64>>;

    /// Begins a transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine is closed, read-only, or cannot start
    /// a transaction.
    fn txn_begin(&mut self) -> EngineResult<()>;

    /// Commits the current transaction, making its writes durable.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine is closed or the commit fails.
    fn txn_commit(&mut self) -> EngineResult<()>;

    /// Rolls back the current transaction, discarding its writes.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine is closed or the rollback fails.
    fn txn_rollback(&mut self) -> EngineResult<()>;

    /// Opens a cursor. The cursor starts in an invalid position and must be
    /// positioned with `cursor_first`, `cursor_last`, or `cursor_seek`
    /// before reading.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine is closed.
    fn cursor_open(&mut self) -> EngineResult<CursorId>;

    /// Releases a cursor. Releasing an unknown id is an error; callers are
    /// expected to release each cursor exactly once.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine is closed or the id is unknown.
    fn cursor_release(&mut self, id: CursorId) -> EngineResult<()>;

    /// Positions the cursor on the first entry in key order.
    ///
    /// The cursor becomes invalid if the store is empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine is closed or the id is unknown.
    fn cursor_first(&mut self, id: CursorId) -> EngineResult<()>;

    /// Positions the cursor on the last entry in key order.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine is closed or the id is unknown.
    fn cursor_last(&mut self, id: CursorId) -> EngineResult<()>;

    /// Positions the cursor at `key` per the given bias. The cursor becomes
    /// invalid if no entry matches.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine is closed or the id is unknown.
    fn cursor_seek(&mut self, id: CursorId, key: &[u8], bias: SeekBias) -> EngineResult<()>;

    /// Advances the cursor one entry in key order. Advancing past the last
    /// entry leaves the cursor invalid; advancing an invalid cursor is a
    /// no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine is closed or the id is unknown.
    fn cursor_next(&mut self, id: CursorId) -> EngineResult<()>;

    /// Retreats the cursor one entry in key order, mirroring `cursor_next`.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine is closed or the id is unknown.
    fn cursor_prev(&mut self, id: CursorId) -> EngineResult<()>;

    /// Reports whether the cursor currently denotes an existing entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine is closed or the id is unknown.
    fn cursor_valid(&self, id: CursorId) -> EngineResult<bool>;

    /// Reads the key under the cursor.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine is closed, the id is unknown, or the
    /// cursor is not on an entry.
    fn cursor_key(&self, id: CursorId) -> EngineResult<Vec<u8>>;

    /// Reads the value under the cursor.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine is closed, the id is unknown, or the
    /// cursor is not on an entry.
    fn cursor_value(&self, id: CursorId) -> EngineResult<Vec<u8>>;

    /// Deletes the entry under the cursor. The cursor moves to the next
    /// entry in key order, or becomes invalid if none remains.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine is closed, read-only, the id is
    /// unknown, or the cursor is not on an entry.
    fn cursor_delete(&mut self, id: CursorId) -> EngineResult<()>;

    /// Closes the engine, releasing its backing store. Idempotent. A
    /// transaction still open at close is rolled back, never committed.
    ///
    /// # Errors
    ///
    /// Returns an error if final persistence fails.
    fn close(&mut self) -> EngineResult<()>;
}
