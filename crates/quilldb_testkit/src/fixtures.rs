//! Test fixtures and store helpers.
//!
//! Convenience wrappers for setting up stores in tests, with automatic
//! cleanup of file-backed stores.

use quilldb_core::{Config, Store, StoreResult};
use std::path::PathBuf;
use tempfile::TempDir;

/// A test store with automatic cleanup.
pub struct TestStore {
    /// The store instance.
    pub store: Store,
    /// The temporary directory (kept alive to delay cleanup). `None` for
    /// in-memory stores.
    temp_dir: Option<TempDir>,
}

impl TestStore {
    /// Creates a new in-memory test store.
    #[must_use]
    pub fn memory() -> Self {
        Self {
            store: Store::open_in_memory(),
            temp_dir: None,
        }
    }

    /// Creates a new file-backed test store in a temporary directory.
    ///
    /// # Panics
    ///
    /// Panics if the temporary directory or store cannot be created.
    #[must_use]
    pub fn file() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp directory");
        let path = temp_dir.path().join("test.qdb");
        let store = Store::open(&path).expect("failed to open file store");
        Self {
            store,
            temp_dir: Some(temp_dir),
        }
    }

    /// Returns the backing file path, or `None` for in-memory stores.
    #[must_use]
    pub fn path(&self) -> Option<PathBuf> {
        self.temp_dir.as_ref().map(|d| d.path().join("test.qdb"))
    }

    /// Closes the store and reopens it from the same path, returning the
    /// new fixture.
    ///
    /// # Panics
    ///
    /// Panics on in-memory stores, or if close/reopen fails.
    #[must_use]
    pub fn reopen(self) -> Self {
        let temp_dir = self.temp_dir.expect("reopen needs a file-backed store");
        self.store.close().expect("failed to close store");

        let path = temp_dir.path().join("test.qdb");
        let store = Store::open(&path).expect("failed to reopen store");
        Self {
            store,
            temp_dir: Some(temp_dir),
        }
    }
}

impl std::ops::Deref for TestStore {
    type Target = Store;

    fn deref(&self) -> &Store {
        &self.store
    }
}

/// Seeds a store with the given entries.
///
/// # Errors
///
/// Propagates the first failing write.
pub fn seed_store(store: &Store, entries: &[(&[u8], &[u8])]) -> StoreResult<()> {
    for (key, value) in entries {
        store.store(key, value)?;
    }
    Ok(())
}

/// Opens an in-memory store pre-seeded with `count` entries keyed
/// `key-0000` .. and valued `value-0000` ...
#[must_use]
pub fn seeded_memory_store(count: usize) -> Store {
    let store = Store::open_in_memory();
    for i in 0..count {
        let key = format!("key-{i:04}");
        let value = format!("value-{i:04}");
        store
            .store(key.as_bytes(), value.as_bytes())
            .expect("seed write failed");
    }
    store
}

/// Opens a file-backed store with a custom configuration inside a fresh
/// temporary directory, returning both.
///
/// # Panics
///
/// Panics if the temporary directory cannot be created.
///
/// # Errors
///
/// Propagates the open failure.
pub fn open_temp_store(config: Config) -> StoreResult<(Store, TempDir)> {
    let temp_dir = TempDir::new().expect("failed to create temp directory");
    let path = temp_dir.path().join("test.qdb");
    let store = Store::open_with_config(&path, config)?;
    Ok((store, temp_dir))
}
