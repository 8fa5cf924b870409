//! In-memory engine for testing and ephemeral stores.

use crate::engine::{CursorId, KvEngine, SeekBias};
use crate::error::{EngineError, EngineResult};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;

type Entries = BTreeMap<Vec<u8>, Vec<u8>>;

/// An in-memory key-value engine.
///
/// Entries live in a `BTreeMap`, so the native key ordering is plain
/// lexicographic byte order. Transactions take an undo snapshot of the whole
/// map at `txn_begin`; rollback restores it, commit discards it.
///
/// Suitable for:
/// - Unit tests
/// - Integration tests
/// - Ephemeral stores that don't need persistence
///
/// # Example
///
/// ```rust
/// use quilldb_engine::{KvEngine, MemoryEngine};
///
/// let mut engine = MemoryEngine::new();
/// engine.put(b"a", b"1").unwrap();
/// engine.txn_begin().unwrap();
/// engine.put(b"b", b"2").unwrap();
/// engine.txn_rollback().unwrap();
/// assert_eq!(engine.get(b"b").unwrap(), None);
/// ```
#[derive(Debug, Default)]
pub struct MemoryEngine {
    state: RwLock<State>,
    read_only: bool,
}

#[derive(Debug, Default)]
struct State {
    entries: Entries,
    /// Undo snapshot taken at `txn_begin`; `Some` while a transaction is open.
    undo: Option<Entries>,
    /// Open cursors: id -> current key (`None` when not on an entry).
    cursors: HashMap<u64, Option<Vec<u8>>>,
    next_cursor: u64,
    closed: bool,
}

impl MemoryEngine {
    /// Creates a new empty in-memory engine.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an engine pre-populated with the given entries.
    ///
    /// Useful for seeding test scenarios.
    #[must_use]
    pub fn with_entries(entries: BTreeMap<Vec<u8>, Vec<u8>>) -> Self {
        Self {
            state: RwLock::new(State {
                entries,
                ..State::default()
            }),
            read_only: false,
        }
    }

    /// Marks the engine read-only; all writes fail with
    /// [`EngineError::ReadOnly`].
    #[must_use]
    pub fn read_only(mut self, value: bool) -> Self {
        self.read_only = value;
        self
    }

    /// Returns a copy of all stored entries.
    ///
    /// Useful for testing and for engines layered on top of this one.
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<Vec<u8>, Vec<u8>> {
        self.state.read().entries.clone()
    }

    /// Returns the number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.read().entries.len()
    }

    /// Returns true if the engine holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn ensure_writable(&self, state: &State) -> EngineResult<()> {
        if state.closed {
            return Err(EngineError::Closed);
        }
        if self.read_only {
            return Err(EngineError::ReadOnly);
        }
        Ok(())
    }
}

impl State {
    fn ensure_open(&self) -> EngineResult<()> {
        if self.closed {
            Err(EngineError::Closed)
        } else {
            Ok(())
        }
    }

    fn position(&self, id: CursorId) -> EngineResult<&Option<Vec<u8>>> {
        self.cursors
            .get(&id.0)
            .ok_or(EngineError::InvalidCursor(id.0))
    }

    /// Key the cursor denotes, if it is on an entry that still exists.
    fn entry_key(&self, id: CursorId) -> EngineResult<Option<&Vec<u8>>> {
        match self.position(id)? {
            Some(key) if self.entries.contains_key(key) => Ok(Some(key)),
            _ => Ok(None),
        }
    }

    fn set_position(&mut self, id: CursorId, pos: Option<Vec<u8>>) -> EngineResult<()> {
        match self.cursors.get_mut(&id.0) {
            Some(slot) => {
                *slot = pos;
                Ok(())
            }
            None => Err(EngineError::InvalidCursor(id.0)),
        }
    }
}

impl KvEngine for MemoryEngine {
    fn get(&self, key: &[u8]) -> EngineResult<Option<Vec<u8>>> {
        let state = self.state.read();
        state.ensure_open()?;
        Ok(state.entries.get(key).cloned())
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> EngineResult<()> {
        let mut state = self.state.write();
        self.ensure_writable(&state)?;
        state.entries.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn append(&mut self, key: &[u8], value: &[u8]) -> EngineResult<()> {
        let mut state = self.state.write();
        self.ensure_writable(&state)?;
        state
            .entries
            .entry(key.to_vec())
            .or_default()
            .extend_from_slice(value);
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> EngineResult<bool> {
        let mut state = self.state.write();
        self.ensure_writable(&state)?;
        Ok(state.entries.remove(key).is_some())
    }

    fn value_size(&self, key: &[u8]) -> EngineResult<Option<u64>> {
        let state = self.state.read();
        state.ensure_open()?;
        Ok(state.entries.get(key).map(|v| v.len() as u64))
    }

    fn txn_begin(&mut self) -> EngineResult<()> {
        let mut state = self.state.write();
        self.ensure_writable(&state)?;
        if state.undo.is_some() {
            return Err(EngineError::busy("transaction already active"));
        }
        state.undo = Some(state.entries.clone());
        Ok(())
    }

    fn txn_commit(&mut self) -> EngineResult<()> {
        let mut state = self.state.write();
        state.ensure_open()?;
        if state.undo.take().is_none() {
            return Err(EngineError::busy("no active transaction"));
        }
        Ok(())
    }

    fn txn_rollback(&mut self) -> EngineResult<()> {
        let mut state = self.state.write();
        state.ensure_open()?;
        match state.undo.take() {
            Some(snapshot) => {
                state.entries = snapshot;
                Ok(())
            }
            None => Err(EngineError::busy("no active transaction")),
        }
    }

    fn cursor_open(&mut self) -> EngineResult<CursorId> {
        let mut state = self.state.write();
        state.ensure_open()?;
        let id = state.next_cursor;
        state.next_cursor += 1;
        state.cursors.insert(id, None);
        Ok(CursorId(id))
    }

    fn cursor_release(&mut self, id: CursorId) -> EngineResult<()> {
        let mut state = self.state.write();
        state.ensure_open()?;
        state
            .cursors
            .remove(&id.0)
            .map(|_| ())
            .ok_or(EngineError::InvalidCursor(id.0))
    }

    fn cursor_first(&mut self, id: CursorId) -> EngineResult<()> {
        let mut state = self.state.write();
        state.ensure_open()?;
        let first = state.entries.keys().next().cloned();
        state.set_position(id, first)
    }

    fn cursor_last(&mut self, id: CursorId) -> EngineResult<()> {
        let mut state = self.state.write();
        state.ensure_open()?;
        let last = state.entries.keys().next_back().cloned();
        state.set_position(id, last)
    }

    fn cursor_seek(&mut self, id: CursorId, key: &[u8], bias: SeekBias) -> EngineResult<()> {
        let mut state = self.state.write();
        state.ensure_open()?;
        let target = match bias {
            SeekBias::Exact => state.entries.get_key_value(key).map(|(k, _)| k.clone()),
            SeekBias::GreaterOrEqual => state
                .entries
                .range::<[u8], _>((Bound::Included(key), Bound::Unbounded))
                .next()
                .map(|(k, _)| k.clone()),
            SeekBias::LessOrEqual => state
                .entries
                .range::<[u8], _>((Bound::Unbounded, Bound::Included(key)))
                .next_back()
                .map(|(k, _)| k.clone()),
        };
        state.set_position(id, target)
    }

    fn cursor_next(&mut self, id: CursorId) -> EngineResult<()> {
        let mut state = self.state.write();
        state.ensure_open()?;
        let next = match state.position(id)? {
            Some(current) => state
                .entries
                .range::<Vec<u8>, _>((Bound::Excluded(current), Bound::Unbounded))
                .next()
                .map(|(k, _)| k.clone()),
            // Advancing a cursor that is not on an entry stays invalid.
            None => return Ok(()),
        };
        state.set_position(id, next)
    }

    fn cursor_prev(&mut self, id: CursorId) -> EngineResult<()> {
        let mut state = self.state.write();
        state.ensure_open()?;
        let prev = match state.position(id)? {
            Some(current) => state
                .entries
                .range::<Vec<u8>, _>((Bound::Unbounded, Bound::Excluded(current)))
                .next_back()
                .map(|(k, _)| k.clone()),
            None => return Ok(()),
        };
        state.set_position(id, prev)
    }

    fn cursor_valid(&self, id: CursorId) -> EngineResult<bool> {
        let state = self.state.read();
        state.ensure_open()?;
        Ok(state.entry_key(id)?.is_some())
    }

    fn cursor_key(&self, id: CursorId) -> EngineResult<Vec<u8>> {
        let state = self.state.read();
        state.ensure_open()?;
        state
            .entry_key(id)?
            .cloned()
            .ok_or(EngineError::InvalidCursor(id.0))
    }

    fn cursor_value(&self, id: CursorId) -> EngineResult<Vec<u8>> {
        let state = self.state.read();
        state.ensure_open()?;
        let key = state
            .entry_key(id)?
            .cloned()
            .ok_or(EngineError::InvalidCursor(id.0))?;
        Ok(state.entries[&key].clone())
    }

    fn cursor_delete(&mut self, id: CursorId) -> EngineResult<()> {
        let mut state = self.state.write();
        self.ensure_writable(&state)?;
        let key = state
            .entry_key(id)?
            .cloned()
            .ok_or(EngineError::InvalidCursor(id.0))?;
        let next = state
            .entries
            .range::<Vec<u8>, _>((Bound::Excluded(&key), Bound::Unbounded))
            .next()
            .map(|(k, _)| k.clone());
        state.entries.remove(&key);
        state.set_position(id, next)
    }

    fn close(&mut self) -> EngineResult<()> {
        let mut state = self.state.write();
        if state.closed {
            return Ok(());
        }
        // An open transaction is rolled back, never committed.
        if let Some(snapshot) = state.undo.take() {
            state.entries = snapshot;
        }
        state.cursors.clear();
        state.closed = true;
        Ok(())
    }
}
