//! # QuillDB Core
//!
//! Binding layer over an embedded key-value engine.
//!
//! This crate wraps any [`quilldb_engine::KvEngine`] in a deterministic
//! resource-lifecycle and transaction-state contract:
//!
//! - [`Store`] - the owned handle to the engine, with scoped or manual close
//! - [`Cursor`] - an ordered position over the store's keys, released no
//!   later than its store closes
//! - transaction bracketing - commit on success, abort on any failure
//! - lazy enumeration adapters over a cursor traversal
//!
//! The engine behind the trait owns the on-disk format, durability, and
//! isolation; this layer only guarantees that handles, cursors, and
//! transaction brackets are opened and released in a disciplined order.
//!
//! ## Example
//!
//! ```rust
//! use quilldb_core::Store;
//!
//! let store = Store::open_in_memory();
//! store.store(b"a", b"1").unwrap();
//! store.transaction(|s| {
//!     s.store(b"b", b"2")?;
//!     Ok(())
//! })
//! .unwrap();
//! assert_eq!(store.fetch(b"b").unwrap(), Some(b"2".to_vec()));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod cursor;
mod error;
mod iter;
mod store;
mod transaction;

pub use config::Config;
pub use cursor::Cursor;
pub use error::{StoreError, StoreResult};
pub use iter::{Entries, Entry, Keys, Pairs, Values};
pub use store::Store;
pub use transaction::TxnState;

pub use quilldb_engine::SeekBias;
