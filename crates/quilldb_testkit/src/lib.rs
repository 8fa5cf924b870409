//! # QuillDB Testkit
//!
//! Test utilities for QuillDB.
//!
//! This crate provides:
//! - Test fixtures and store helpers
//! - A fault-injecting engine for exercising failure paths
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust
//! use quilldb_testkit::prelude::*;
//!
//! let store = TestStore::memory();
//! store.store(b"k", b"v").unwrap();
//! assert_eq!(store.fetch(b"k").unwrap(), Some(b"v".to_vec()));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod faults;
pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::faults::*;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use faults::*;
pub use fixtures::*;
pub use generators::*;
