//! # QuillDB Engine
//!
//! Key-value engine trait and reference engines for QuillDB.
//!
//! This crate defines the narrow surface QuillDB consumes from an embedded
//! key-value engine: point operations, cursors over the engine's native key
//! ordering, and transaction begin/commit/rollback. The binding layer in
//! `quilldb_core` never looks past this trait - page management, tree
//! balancing, and durability belong entirely to the engine behind it.
//!
//! ## Available Engines
//!
//! - [`MemoryEngine`] - For testing and ephemeral stores
//! - [`FileEngine`] - Snapshot-file persistence with advisory locking
//!
//! External engines plug in by implementing [`KvEngine`].
//!
//! ## Example
//!
//! ```rust
//! use quilldb_engine::{KvEngine, MemoryEngine};
//!
//! let mut engine = MemoryEngine::new();
//! engine.put(b"k", b"v").unwrap();
//! assert_eq!(engine.get(b"k").unwrap(), Some(b"v".to_vec()));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod engine;
mod error;
mod file;
mod memory;

pub use engine::{CursorId, KvEngine, SeekBias};
pub use error::{EngineError, EngineResult};
pub use file::FileEngine;
pub use memory::MemoryEngine;
