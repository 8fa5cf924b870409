//! Error types for engine operations.

use std::io;
use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that can occur inside a key-value engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The backing store is malformed or incompatible.
    #[error("engine store corrupted: {0}")]
    Corrupted(String),

    /// The engine has been closed.
    #[error("engine is closed")]
    Closed,

    /// A write was attempted on a read-only engine.
    #[error("engine is read-only")]
    ReadOnly,

    /// Another process holds the backing store's lock.
    #[error("engine store is locked by another process")]
    Locked,

    /// A cursor operation referenced an unknown or released cursor, or
    /// read through a cursor that is not on an entry.
    #[error("invalid cursor id {0}")]
    InvalidCursor(u64),

    /// The engine cannot service the request right now.
    #[error("engine busy: {0}")]
    Busy(String),
}

impl EngineError {
    /// Creates a corruption error.
    pub fn corrupted(message: impl Into<String>) -> Self {
        Self::Corrupted(message.into())
    }

    /// Creates a busy error.
    pub fn busy(message: impl Into<String>) -> Self {
        Self::Busy(message.into())
    }
}
