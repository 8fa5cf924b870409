//! Transaction bracketing on a store handle.
//!
//! A transaction is a mode of the store, not a separate object: at most one
//! bracket is active per handle, guarded by a state machine. The bracketing
//! call [`Store::transaction`] decides commit-vs-abort **once**, on the
//! outcome of the work it ran - any failure, store-related or not, discards
//! the transaction.

use crate::error::{StoreError, StoreResult};
use crate::store::Store;
use tracing::{debug, trace};

/// State of a store's transaction controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TxnState {
    /// No transaction is active.
    #[default]
    Idle,
    /// A transaction bracket is open.
    Active,
    /// A commit is in flight.
    Committing,
    /// An abort is in flight.
    Aborting,
}

impl Store {
    /// Begins a transaction.
    ///
    /// # Errors
    ///
    /// - [`StoreError::TransactionActive`] if a bracket is already open
    ///   (nesting is not supported)
    /// - [`StoreError::TransactionStart`] if the engine fails to begin; the
    ///   controller stays `Idle`
    pub fn begin(&self) -> StoreResult<()> {
        self.inner.ensure_open()?;
        let mut state = self.inner.txn.lock();
        if *state != TxnState::Idle {
            return Err(StoreError::TransactionActive);
        }
        self.inner
            .engine
            .lock()
            .txn_begin()
            .map_err(|source| StoreError::TransactionStart { source })?;
        *state = TxnState::Active;
        trace!("transaction begun");
        Ok(())
    }

    /// Commits the active transaction.
    ///
    /// On engine failure the error propagates and the controller returns to
    /// `Idle`; the engine's own disposition of the transaction is whatever
    /// the engine reports.
    ///
    /// # Errors
    ///
    /// - [`StoreError::TransactionIdle`] if no transaction is active
    /// - the engine's failure, passed through
    pub fn commit(&self) -> StoreResult<()> {
        self.inner.ensure_open()?;
        let mut state = self.inner.txn.lock();
        if *state != TxnState::Active {
            return Err(StoreError::TransactionIdle);
        }
        *state = TxnState::Committing;
        let result = self.inner.engine.lock().txn_commit();
        *state = TxnState::Idle;
        trace!(ok = result.is_ok(), "transaction commit");
        result.map_err(Into::into)
    }

    /// Aborts the active transaction, discarding its writes.
    ///
    /// # Errors
    ///
    /// - [`StoreError::TransactionIdle`] if no transaction is active
    /// - the engine's failure, passed through
    pub fn abort(&self) -> StoreResult<()> {
        self.inner.ensure_open()?;
        let mut state = self.inner.txn.lock();
        if *state != TxnState::Active {
            return Err(StoreError::TransactionIdle);
        }
        *state = TxnState::Aborting;
        let result = self.inner.engine.lock().txn_rollback();
        *state = TxnState::Idle;
        trace!(ok = result.is_ok(), "transaction abort");
        result.map_err(Into::into)
    }

    /// Returns the current transaction controller state.
    #[must_use]
    pub fn txn_state(&self) -> TxnState {
        *self.inner.txn.lock()
    }

    /// Executes a unit of work inside a transaction bracket.
    ///
    /// The bracket is: `begin()`, run `work`, then commit if it returned
    /// `Ok` or abort if it returned `Err`. The decision is made once, on the
    /// returned outcome - every failure aborts, whether or not it came from
    /// the store.
    ///
    /// ```rust
    /// use quilldb_core::{Store, StoreError};
    ///
    /// let store = Store::open_in_memory();
    /// let result: Result<(), _> = store.transaction(|s| {
    ///     s.store(b"k", b"v")?;
    ///     Err(StoreError::open("forced failure"))
    /// });
    /// assert!(result.is_err());
    /// assert_eq!(store.fetch(b"k").unwrap(), None);
    /// ```
    ///
    /// # Errors
    ///
    /// - [`StoreError::TransactionStart`] if `begin` fails; no commit or
    ///   abort is attempted
    /// - the work's failure, re-raised unchanged after the abort ran
    /// - [`StoreError::AbortFailed`] carrying both failures if the abort
    ///   itself failed while a work failure was being propagated
    /// - a commit failure, passed through, if the work succeeded but the
    ///   engine could not commit
    pub fn transaction<T, F>(&self, work: F) -> StoreResult<T>
    where
        F: FnOnce(&Store) -> StoreResult<T>,
    {
        self.begin()?;
        match work(self) {
            Ok(value) => {
                self.commit()?;
                debug!("transaction committed");
                Ok(value)
            }
            Err(original) => {
                debug!("transaction aborting after work failure");
                match self.abort() {
                    Ok(()) => Err(original),
                    Err(abort) => Err(StoreError::AbortFailed {
                        original: Box::new(original),
                        abort: Box::new(abort),
                    }),
                }
            }
        }
    }
}
