//! Error types for store operations.

use quilldb_engine::EngineError;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in the binding layer.
///
/// Point-lookup misses are not errors; [`crate::Store::fetch`] returns
/// `Ok(None)` for an absent key.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An error surfaced by the underlying engine, passed through opaquely.
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    /// The backing store could not be created, accessed, or understood.
    #[error("cannot open store: {message}")]
    Open {
        /// Description of the open failure.
        message: String,
    },

    /// An operation was issued through a closed store handle.
    #[error("store is closed")]
    Closed,

    /// An accessor was used on a released or invalid cursor.
    #[error("cursor is released or not on an entry")]
    InvalidCursor,

    /// `begin` was called while a transaction bracket was already active.
    #[error("a transaction is already active on this store")]
    TransactionActive,

    /// `commit` or `abort` was called with no active transaction.
    #[error("no transaction is active on this store")]
    TransactionIdle,

    /// The engine failed to start a transaction.
    #[error("failed to begin transaction: {source}")]
    TransactionStart {
        /// The engine failure.
        #[source]
        source: EngineError,
    },

    /// A transaction abort failed while a work failure was being propagated.
    ///
    /// Neither failure is hidden: the original work failure and the abort
    /// failure are both carried here.
    #[error("transaction abort failed: {abort} (while handling: {original})")]
    AbortFailed {
        /// The failure raised by the bracketed work.
        original: Box<StoreError>,
        /// The failure raised by the abort itself.
        abort: Box<StoreError>,
    },
}

impl StoreError {
    /// Creates an open error.
    pub fn open(message: impl Into<String>) -> Self {
        Self::Open {
            message: message.into(),
        }
    }

    /// Maps an engine error raised by a cursor operation onto the binding
    /// layer's taxonomy.
    pub(crate) fn from_cursor_op(err: EngineError) -> Self {
        match err {
            EngineError::InvalidCursor(_) => Self::InvalidCursor,
            EngineError::Closed => Self::Closed,
            other => Self::Engine(other),
        }
    }
}
