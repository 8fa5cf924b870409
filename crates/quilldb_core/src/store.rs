//! Store handle: the owned connection to an embedded key-value engine.

use crate::config::Config;
use crate::cursor::Cursor;
use crate::error::{StoreError, StoreResult};
use crate::iter::{Entries, Keys, Pairs, Values};
use crate::transaction::TxnState;
use parking_lot::{Mutex, RwLock};
use quilldb_engine::{EngineResult, FileEngine, KvEngine, MemoryEngine};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// Shared state behind a [`Store`]; cursors hold weak references to this.
pub(crate) struct StoreInner {
    /// The engine connection.
    pub(crate) engine: Mutex<Box<dyn KvEngine>>,
    /// Whether the handle is open.
    pub(crate) is_open: RwLock<bool>,
    /// Transaction controller state.
    pub(crate) txn: Mutex<TxnState>,
}

impl StoreInner {
    pub(crate) fn is_open(&self) -> bool {
        *self.is_open.read()
    }

    pub(crate) fn ensure_open(&self) -> StoreResult<()> {
        if self.is_open() {
            Ok(())
        } else {
            Err(StoreError::Closed)
        }
    }
}

/// The owned handle to an embedded key-value store.
///
/// A `Store` is the single entry point for point operations, cursors,
/// enumeration, and transaction bracketing. It is exclusively owned by the
/// caller that opened it; cursors borrow from it weakly and never extend
/// its lifetime.
///
/// # Opening a store
///
/// ```rust,ignore
/// use quilldb_core::{Config, Store};
///
/// let store = Store::open("data.qdb")?;
/// store.store(b"key", b"value")?;
/// store.close()?;
/// ```
///
/// For tests and ephemeral data, use [`Store::open_in_memory`]. Dropping a
/// store closes it; [`Store::with`] scopes the whole lifetime to a closure.
pub struct Store {
    pub(crate) inner: Arc<StoreInner>,
}

impl Store {
    /// Opens a file-backed store with default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Open`] if the backing file cannot be created,
    /// accessed, locked, or parsed.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Self::open_with_config(path, Config::default())
    }

    /// Opens a file-backed store with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Open`] if:
    /// - the store exists and `error_if_exists` is set
    /// - the store is missing and `create_if_missing` is unset
    /// - the backing file cannot be created, accessed, locked, or parsed
    pub fn open_with_config(path: impl AsRef<Path>, config: Config) -> StoreResult<Self> {
        let path = path.as_ref();

        if config.error_if_exists && path.exists() {
            return Err(StoreError::open(format!(
                "store already exists and error_if_exists is set: {}",
                path.display()
            )));
        }
        if !config.create_if_missing && !path.exists() {
            return Err(StoreError::open(format!(
                "store does not exist and create_if_missing is unset: {}",
                path.display()
            )));
        }

        let engine = if config.read_only {
            FileEngine::open_read_only(path)
        } else {
            FileEngine::open(path)
        }
        .map_err(|err| StoreError::open(err.to_string()))?;

        debug!(path = %path.display(), read_only = config.read_only, "store opened");
        Ok(Self::open_with_engine(Box::new(engine)))
    }

    /// Opens a fresh transient store backed by [`MemoryEngine`].
    ///
    /// Data is lost when the store is closed.
    #[must_use]
    pub fn open_in_memory() -> Self {
        Self::open_with_engine(Box::new(MemoryEngine::new()))
    }

    /// Wraps an already-constructed engine in a store handle.
    ///
    /// This is how external engines plug in.
    #[must_use]
    pub fn open_with_engine(engine: Box<dyn KvEngine>) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                engine: Mutex::new(engine),
                is_open: RwLock::new(true),
                txn: Mutex::new(TxnState::Idle),
            }),
        }
    }

    /// Opens a store, runs `work` against it, and closes it on every exit
    /// path before returning.
    ///
    /// # Errors
    ///
    /// Propagates the open failure, the work's failure, or (on the success
    /// path) a close failure.
    pub fn with<T, F>(path: impl AsRef<Path>, config: Config, work: F) -> StoreResult<T>
    where
        F: FnOnce(&Store) -> StoreResult<T>,
    {
        let store = Self::open_with_config(path, config)?;
        let result = work(&store);
        let closed = store.close();
        match result {
            Ok(value) => {
                closed?;
                Ok(value)
            }
            // The work's failure outranks a close failure.
            Err(err) => {
                if let Err(close_err) = closed {
                    warn!(error = %close_err, "store close failed while handling work failure");
                }
                Err(err)
            }
        }
    }

    /// Closes the store, releasing the engine connection. Idempotent.
    ///
    /// Cursors still referencing this store become invalid; their
    /// operations fail with [`StoreError::Closed`].
    ///
    /// # Errors
    ///
    /// Returns an error if the engine's final persistence fails.
    pub fn close(&self) -> StoreResult<()> {
        let mut open = self.inner.is_open.write();
        if !*open {
            return Ok(());
        }
        self.inner.engine.lock().close()?;
        *open = false;
        debug!("store closed");
        Ok(())
    }

    /// Reports whether the store is open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.inner.is_open()
    }

    /// Runs a point operation against the engine.
    fn with_engine<T>(
        &self,
        op: impl FnOnce(&mut dyn KvEngine) -> EngineResult<T>,
    ) -> StoreResult<T> {
        self.inner.ensure_open()?;
        op(self.inner.engine.lock().as_mut()).map_err(Into::into)
    }

    /// Point lookup. An absent key is `Ok(None)`, not an error.
    ///
    /// # Errors
    ///
    /// Fails if the store is closed or the engine read fails.
    pub fn fetch(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        self.with_engine(|engine| engine.get(key))
    }

    /// Point upsert: stores `value` for `key`, overwriting any existing
    /// value.
    ///
    /// # Errors
    ///
    /// Fails if the store is closed, read-only, or the engine write fails.
    pub fn store(&self, key: &[u8], value: &[u8]) -> StoreResult<()> {
        self.with_engine(|engine| engine.put(key, value))
    }

    /// Appends `value` onto the existing value for `key`, creating the
    /// entry if absent.
    ///
    /// # Errors
    ///
    /// Fails if the store is closed, read-only, or the engine write fails.
    pub fn append(&self, key: &[u8], value: &[u8]) -> StoreResult<()> {
        self.with_engine(|engine| engine.append(key, value))
    }

    /// Deletes `key`, returning whether it existed. Deleting an absent key
    /// is a no-op returning `false`.
    ///
    /// # Errors
    ///
    /// Fails if the store is closed, read-only, or the engine delete fails.
    pub fn delete(&self, key: &[u8]) -> StoreResult<bool> {
        self.with_engine(|engine| engine.delete(key))
    }

    /// Returns the stored value's length for `key` without materializing
    /// it, or `None` if absent.
    ///
    /// # Errors
    ///
    /// Fails if the store is closed or the engine read fails.
    pub fn value_size(&self, key: &[u8]) -> StoreResult<Option<u64>> {
        self.with_engine(|engine| engine.value_size(key))
    }

    /// Opens a cursor over this store's key ordering.
    ///
    /// The cursor starts off any entry; position it before reading. Release
    /// it explicitly or let it drop.
    ///
    /// # Errors
    ///
    /// Fails if the store is closed.
    pub fn cursor(&self) -> StoreResult<Cursor> {
        let id = self.with_engine(|engine| engine.cursor_open())?;
        Ok(Cursor::new(Arc::downgrade(&self.inner), id))
    }

    /// Opens a cursor, runs `work` with it, and releases it on every exit
    /// path before returning.
    ///
    /// # Errors
    ///
    /// Propagates the work's failure, or (on the success path) a release
    /// failure.
    pub fn with_cursor<T, F>(&self, work: F) -> StoreResult<T>
    where
        F: FnOnce(&mut Cursor) -> StoreResult<T>,
    {
        let mut cursor = self.cursor()?;
        let result = work(&mut cursor);
        let released = cursor.release();
        match result {
            Ok(value) => {
                released?;
                Ok(value)
            }
            Err(err) => {
                if let Err(release_err) = released {
                    warn!(error = %release_err, "cursor release failed while handling work failure");
                }
                Err(err)
            }
        }
    }

    /// Returns a lazy sequence of all entries in key order.
    ///
    /// # Errors
    ///
    /// Fails if the store is closed.
    pub fn entries(&self) -> StoreResult<Entries> {
        Entries::new(self.cursor()?)
    }

    /// Returns a lazy sequence of all keys in key order.
    ///
    /// # Errors
    ///
    /// Fails if the store is closed.
    pub fn keys(&self) -> StoreResult<Keys> {
        Keys::new(self.cursor()?)
    }

    /// Returns a lazy sequence of all values in key order.
    ///
    /// # Errors
    ///
    /// Fails if the store is closed.
    pub fn values(&self) -> StoreResult<Values> {
        Values::new(self.cursor()?)
    }

    /// Returns a lazy sequence of all `(key, value)` tuples in key order.
    ///
    /// # Errors
    ///
    /// Fails if the store is closed.
    pub fn pairs(&self) -> StoreResult<Pairs> {
        Pairs::new(self.cursor()?)
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("is_open", &self.is_open())
            .field("txn_state", &self.txn_state())
            .finish_non_exhaustive()
    }
}

impl Drop for Store {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_in_memory() {
        let store = Store::open_in_memory();
        assert!(store.is_open());
    }

    #[test]
    fn fetch_store_delete() {
        let store = Store::open_in_memory();

        assert_eq!(store.fetch(b"k").unwrap(), None);
        store.store(b"k", b"v").unwrap();
        assert_eq!(store.fetch(b"k").unwrap(), Some(b"v".to_vec()));

        store.store(b"k", b"v2").unwrap();
        assert_eq!(store.fetch(b"k").unwrap(), Some(b"v2".to_vec()));

        assert!(store.delete(b"k").unwrap());
        assert!(!store.delete(b"k").unwrap());
        assert_eq!(store.fetch(b"k").unwrap(), None);
    }

    #[test]
    fn append_and_value_size() {
        let store = Store::open_in_memory();
        store.append(b"log", b"abc").unwrap();
        store.append(b"log", b"def").unwrap();
        assert_eq!(store.fetch(b"log").unwrap(), Some(b"abcdef".to_vec()));
        assert_eq!(store.value_size(b"log").unwrap(), Some(6));
        assert_eq!(store.value_size(b"absent").unwrap(), None);
    }

    #[test]
    fn close_is_idempotent() {
        let store = Store::open_in_memory();
        store.close().unwrap();
        store.close().unwrap();
        assert!(!store.is_open());
    }

    #[test]
    fn operations_fail_after_close() {
        let store = Store::open_in_memory();
        store.store(b"k", b"v").unwrap();
        store.close().unwrap();

        assert!(matches!(store.fetch(b"k"), Err(StoreError::Closed)));
        assert!(matches!(store.store(b"k", b"v"), Err(StoreError::Closed)));
        assert!(matches!(store.cursor(), Err(StoreError::Closed)));
        assert!(matches!(store.entries(), Err(StoreError::Closed)));
    }

    #[test]
    fn aborted_transaction_leaves_prior_writes_intact() {
        // Open store S; store a and b; a bracketed write of c fails.
        let store = Store::open_in_memory();
        store.store(b"a", b"1").unwrap();
        store.store(b"b", b"2").unwrap();

        let result: StoreResult<()> = store.transaction(|s| {
            s.store(b"c", b"3")?;
            Err(StoreError::open("boom"))
        });
        assert!(result.is_err());

        assert_eq!(store.fetch(b"c").unwrap(), None);
        assert_eq!(store.fetch(b"a").unwrap(), Some(b"1".to_vec()));
        assert_eq!(store.fetch(b"b").unwrap(), Some(b"2".to_vec()));
    }

    #[test]
    fn with_cursor_releases_on_success() {
        let store = Store::open_in_memory();
        store.store(b"a", b"1").unwrap();

        let key = store
            .with_cursor(|cur| {
                cur.reset()?;
                cur.key()
            })
            .unwrap();
        assert_eq!(key, b"a".to_vec());
    }

    #[test]
    fn with_cursor_releases_on_failure() {
        let store = Store::open_in_memory();
        let result: StoreResult<()> =
            store.with_cursor(|_| Err(StoreError::open("work failed")));
        assert!(matches!(result, Err(StoreError::Open { .. })));

        // The cursor was released; the store still closes cleanly.
        store.close().unwrap();
    }

    #[test]
    fn debug_output_names_state() {
        let store = Store::open_in_memory();
        let repr = format!("{store:?}");
        assert!(repr.contains("is_open: true"));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn store_then_fetch_roundtrips(
                key in prop::collection::vec(any::<u8>(), 1..32),
                value in prop::collection::vec(any::<u8>(), 0..256),
            ) {
                let store = Store::open_in_memory();
                store.store(&key, &value).unwrap();
                prop_assert_eq!(store.fetch(&key).unwrap(), Some(value.clone()));
                prop_assert_eq!(store.value_size(&key).unwrap(), Some(value.len() as u64));

                store.delete(&key).unwrap();
                prop_assert_eq!(store.fetch(&key).unwrap(), None);
            }
        }
    }
}
