//! Fault-injecting engine wrapper.
//!
//! Wraps any [`KvEngine`] and fails selected operations on demand, for
//! exercising the binding layer's failure paths: begin failures, commit
//! failures, and the abort-fails-while-propagating case.

use quilldb_engine::{CursorId, EngineError, EngineResult, KvEngine, SeekBias};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared switches controlling which operations fail.
///
/// Clone the handle before boxing the engine to keep control of the faults
/// after the store takes ownership.
#[derive(Debug, Default, Clone)]
pub struct FaultSwitches {
    inner: Arc<Switches>,
}

#[derive(Debug, Default)]
struct Switches {
    fail_begin: AtomicBool,
    fail_commit: AtomicBool,
    fail_rollback: AtomicBool,
    fail_put: AtomicBool,
    fail_release: AtomicBool,
}

impl FaultSwitches {
    /// Creates switches with every fault disabled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `txn_begin` fail.
    pub fn fail_begin(&self, value: bool) {
        self.inner.fail_begin.store(value, Ordering::SeqCst);
    }

    /// Makes `txn_commit` fail.
    pub fn fail_commit(&self, value: bool) {
        self.inner.fail_commit.store(value, Ordering::SeqCst);
    }

    /// Makes `txn_rollback` fail.
    pub fn fail_rollback(&self, value: bool) {
        self.inner.fail_rollback.store(value, Ordering::SeqCst);
    }

    /// Makes `put` fail.
    pub fn fail_put(&self, value: bool) {
        self.inner.fail_put.store(value, Ordering::SeqCst);
    }

    /// Makes `cursor_release` fail.
    pub fn fail_release(&self, value: bool) {
        self.inner.fail_release.store(value, Ordering::SeqCst);
    }

    fn tripped(&self, switch: &AtomicBool, op: &str) -> EngineResult<()> {
        if switch.load(Ordering::SeqCst) {
            Err(EngineError::busy(format!("injected {op} failure")))
        } else {
            Ok(())
        }
    }
}

/// An engine wrapper that fails selected operations.
///
/// All other operations delegate to the wrapped engine untouched.
///
/// # Example
///
/// ```rust
/// use quilldb_core::Store;
/// use quilldb_engine::MemoryEngine;
/// use quilldb_testkit::FlakyEngine;
///
/// let (engine, faults) = FlakyEngine::wrap(MemoryEngine::new());
/// let store = Store::open_with_engine(Box::new(engine));
///
/// faults.fail_commit(true);
/// let result = store.transaction(|s| s.store(b"k", b"v"));
/// assert!(result.is_err());
/// ```
#[derive(Debug)]
pub struct FlakyEngine<E> {
    inner: E,
    switches: FaultSwitches,
}

impl<E: KvEngine> FlakyEngine<E> {
    /// Wraps an engine, returning the wrapper and its fault switches.
    pub fn wrap(inner: E) -> (Self, FaultSwitches) {
        let switches = FaultSwitches::new();
        (
            Self {
                inner,
                switches: switches.clone(),
            },
            switches,
        )
    }
}

impl<E: KvEngine> KvEngine for FlakyEngine<E> {
    fn get(&self, key: &[u8]) -> EngineResult<Option<Vec<u8>>> {
        self.inner.get(key)
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> EngineResult<()> {
        self.switches
            .tripped(&self.switches.inner.fail_put, "put")?;
        self.inner.put(key, value)
    }

    fn append(&mut self, key: &[u8], value: &[u8]) -> EngineResult<()> {
        self.inner.append(key, value)
    }

    fn delete(&mut self, key: &[u8]) -> EngineResult<bool> {
        self.inner.delete(key)
    }

    fn value_size(&self, key: &[u8]) -> EngineResult<Option<u64>> {
        self.inner.value_size(key)
    }

    fn txn_begin(&mut self) -> EngineResult<()> {
        self.switches
            .tripped(&self.switches.inner.fail_begin, "begin")?;
        self.inner.txn_begin()
    }

    fn txn_commit(&mut self) -> EngineResult<()> {
        if let Err(err) = self
            .switches
            .tripped(&self.switches.inner.fail_commit, "commit")
        {
            // A failed commit leaves no transaction open, mirroring engines
            // that roll back on commit failure.
            let _ = self.inner.txn_rollback();
            return Err(err);
        }
        self.inner.txn_commit()
    }

    fn txn_rollback(&mut self) -> EngineResult<()> {
        self.switches
            .tripped(&self.switches.inner.fail_rollback, "rollback")?;
        self.inner.txn_rollback()
    }

    fn cursor_open(&mut self) -> EngineResult<CursorId> {
        self.inner.cursor_open()
    }

    fn cursor_release(&mut self, id: CursorId) -> EngineResult<()> {
        self.switches
            .tripped(&self.switches.inner.fail_release, "release")?;
        self.inner.cursor_release(id)
    }

    fn cursor_first(&mut self, id: CursorId) -> EngineResult<()> {
        self.inner.cursor_first(id)
    }

    fn cursor_last(&mut self, id: CursorId) -> EngineResult<()> {
        self.inner.cursor_last(id)
    }

    fn cursor_seek(&mut self, id: CursorId, key: &[u8], bias: SeekBias) -> EngineResult<()> {
        self.inner.cursor_seek(id, key, bias)
    }

    fn cursor_next(&mut self, id: CursorId) -> EngineResult<()> {
        self.inner.cursor_next(id)
    }

    fn cursor_prev(&mut self, id: CursorId) -> EngineResult<()> {
        self.inner.cursor_prev(id)
    }

    fn cursor_valid(&self, id: CursorId) -> EngineResult<bool> {
        self.inner.cursor_valid(id)
    }

    fn cursor_key(&self, id: CursorId) -> EngineResult<Vec<u8>> {
        self.inner.cursor_key(id)
    }

    fn cursor_value(&self, id: CursorId) -> EngineResult<Vec<u8>> {
        self.inner.cursor_value(id)
    }

    fn cursor_delete(&mut self, id: CursorId) -> EngineResult<()> {
        self.inner.cursor_delete(id)
    }

    fn close(&mut self) -> EngineResult<()> {
        self.inner.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quilldb_core::{Store, StoreError, TxnState};
    use quilldb_engine::MemoryEngine;

    fn flaky_store() -> (Store, FaultSwitches) {
        let (engine, faults) = FlakyEngine::wrap(MemoryEngine::new());
        (Store::open_with_engine(Box::new(engine)), faults)
    }

    #[test]
    fn begin_failure_surfaces_as_transaction_start() {
        let (store, faults) = flaky_store();
        faults.fail_begin(true);

        let result: Result<(), _> = store.transaction(|_| Ok(()));
        assert!(matches!(result, Err(StoreError::TransactionStart { .. })));
        assert_eq!(store.txn_state(), TxnState::Idle);
    }

    #[test]
    fn commit_failure_propagates() {
        let (store, faults) = flaky_store();
        faults.fail_commit(true);

        let result = store.transaction(|s| s.store(b"k", b"v"));
        assert!(matches!(result, Err(StoreError::Engine(_))));
        assert_eq!(store.txn_state(), TxnState::Idle);
    }

    #[test]
    fn abort_failure_carries_both_errors() {
        let (store, faults) = flaky_store();
        faults.fail_rollback(true);

        let result: Result<(), _> = store.transaction(|s| {
            s.store(b"k", b"v")?;
            Err(StoreError::open("work failure"))
        });

        match result {
            Err(StoreError::AbortFailed { original, abort }) => {
                assert!(matches!(*original, StoreError::Open { .. }));
                assert!(matches!(*abort, StoreError::Engine(_)));
            }
            other => panic!("expected AbortFailed, got {other:?}"),
        }
        assert_eq!(store.txn_state(), TxnState::Idle);
    }

    #[test]
    fn work_failure_from_engine_aborts() {
        let (store, faults) = flaky_store();
        store.store(b"a", b"1").unwrap();
        faults.fail_put(true);

        let result: Result<(), _> = store.transaction(|s| {
            s.delete(b"a")?;
            s.store(b"b", b"2")
        });

        assert!(matches!(result, Err(StoreError::Engine(_))));
        // The failed bracket was rolled back wholesale.
        assert_eq!(store.fetch(b"a").unwrap(), Some(b"1".to_vec()));
        assert_eq!(store.fetch(b"b").unwrap(), None);
    }

    #[test]
    fn work_failure_outranks_release_failure() {
        let (store, faults) = flaky_store();
        store.store(b"a", b"1").unwrap();
        faults.fail_release(true);

        // Both the work and the trailing cursor release fail; the work's
        // failure is the one surfaced.
        let result: Result<(), _> =
            store.with_cursor(|_| Err(StoreError::open("work failed")));
        assert!(matches!(result, Err(StoreError::Open { .. })));
    }

    #[test]
    fn release_failure_propagates_when_work_succeeds() {
        let (store, faults) = flaky_store();
        store.store(b"a", b"1").unwrap();
        faults.fail_release(true);

        let result = store.with_cursor(|cur| cur.reset());
        assert!(matches!(result, Err(StoreError::Engine(_))));
    }

    #[test]
    fn faults_can_be_cleared() {
        let (store, faults) = flaky_store();
        faults.fail_commit(true);
        assert!(store.transaction(|s| s.store(b"k", b"v")).is_err());

        faults.fail_commit(false);
        store.transaction(|s| s.store(b"k", b"v")).unwrap();
        assert_eq!(store.fetch(b"k").unwrap(), Some(b"v".to_vec()));
    }
}
