//! Snapshot-file engine for persistent stores.

use crate::engine::{CursorId, KvEngine, SeekBias};
use crate::error::{EngineError, EngineResult};
use crate::memory::MemoryEngine;
use fs2::FileExt;
use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// Magic bytes at the start of a snapshot file.
const MAGIC: &[u8; 8] = b"QUILLDB1";

/// A file-backed key-value engine.
///
/// Entries are held in memory and persisted as a single snapshot file on
/// commit and on close, written atomically via a temp file and rename. A
/// sidecar `.lock` file carries an fs2 advisory lock for the lifetime of
/// the engine: exclusive for read-write engines, shared for read-only
/// ones. The lock lives on the sidecar rather than the data file itself
/// because the atomic rename replaces the data file's inode on every
/// persist, which would detach a lock held on it.
///
/// This is a reference engine. It provides real persistence across restarts
/// but no incremental durability - writes made outside a transaction are
/// only persisted at commit or close.
///
/// # Snapshot format
///
/// ```text
/// magic "QUILLDB1" | u64 count | count x (u32 klen | u32 vlen | key | value)
/// ```
///
/// All integers are little-endian. A file that does not parse fails open
/// with [`EngineError::Corrupted`].
#[derive(Debug)]
pub struct FileEngine {
    path: PathBuf,
    /// Sidecar lock file, never renamed; holds the advisory lock and
    /// unlocks when the engine drops.
    lock_file: File,
    inner: MemoryEngine,
    read_only: bool,
    closed: bool,
}

impl FileEngine {
    /// Opens or creates a snapshot file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be created or read
    /// - Another process holds the lock (`Locked`)
    /// - The file exists but is not a valid snapshot (`Corrupted`)
    pub fn open(path: &Path) -> EngineResult<Self> {
        Self::open_inner(path, false)
    }

    /// Opens an existing snapshot file read-only.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, locked exclusively
    /// elsewhere, or malformed.
    pub fn open_read_only(path: &Path) -> EngineResult<Self> {
        Self::open_inner(path, true)
    }

    fn open_inner(path: &Path, read_only: bool) -> EngineResult<Self> {
        let mut file = if read_only {
            OpenOptions::new().read(true).open(path)?
        } else {
            OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(false)
                .open(path)?
        };

        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(lock_path(path))?;
        // Fully qualified to avoid clashing with the std file-lock methods.
        let locked = if read_only {
            FileExt::try_lock_shared(&lock_file)
        } else {
            FileExt::try_lock_exclusive(&lock_file)
        };
        if locked.is_err() {
            return Err(EngineError::Locked);
        }

        let mut raw = Vec::new();
        file.read_to_end(&mut raw)?;
        let entries = decode_snapshot(&raw)?;

        Ok(Self {
            path: path.to_path_buf(),
            lock_file,
            inner: MemoryEngine::with_entries(entries).read_only(read_only),
            read_only,
            closed: false,
        })
    }

    /// Returns the path of the backing snapshot file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the current entries to the snapshot file atomically.
    fn persist(&self) -> EngineResult<()> {
        let tmp_path = self.path.with_extension("tmp");
        let encoded = encode_snapshot(&self.inner.snapshot());

        let mut tmp = File::create(&tmp_path)?;
        tmp.write_all(&encoded)?;
        tmp.sync_all()?;
        std::fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }

    fn ensure_open(&self) -> EngineResult<()> {
        if self.closed {
            Err(EngineError::Closed)
        } else {
            Ok(())
        }
    }
}

fn lock_path(path: &Path) -> PathBuf {
    path.with_extension("lock")
}

fn read_u64(raw: &[u8], pos: usize) -> EngineResult<u64> {
    let bytes: [u8; 8] = raw
        .get(pos..pos + 8)
        .and_then(|slice| slice.try_into().ok())
        .ok_or_else(|| EngineError::corrupted("truncated record header"))?;
    Ok(u64::from_le_bytes(bytes))
}

fn read_u32(raw: &[u8], pos: usize) -> EngineResult<u32> {
    let bytes: [u8; 4] = raw
        .get(pos..pos + 4)
        .and_then(|slice| slice.try_into().ok())
        .ok_or_else(|| EngineError::corrupted("truncated record header"))?;
    Ok(u32::from_le_bytes(bytes))
}

fn encode_snapshot(entries: &BTreeMap<Vec<u8>, Vec<u8>>) -> Vec<u8> {
    let mut out = Vec::with_capacity(16 + entries.len() * 16);
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&(entries.len() as u64).to_le_bytes());
    for (key, value) in entries {
        out.extend_from_slice(&(key.len() as u32).to_le_bytes());
        out.extend_from_slice(&(value.len() as u32).to_le_bytes());
        out.extend_from_slice(key);
        out.extend_from_slice(value);
    }
    out
}

fn decode_snapshot(raw: &[u8]) -> EngineResult<BTreeMap<Vec<u8>, Vec<u8>>> {
    // A zero-length file is a fresh store.
    if raw.is_empty() {
        return Ok(BTreeMap::new());
    }
    if raw.len() < MAGIC.len() + 8 || &raw[..MAGIC.len()] != MAGIC {
        return Err(EngineError::corrupted("bad snapshot header"));
    }

    let mut pos = MAGIC.len();
    let count = read_u64(raw, pos)?;
    pos += 8;

    let mut entries = BTreeMap::new();
    for _ in 0..count {
        let klen = read_u32(raw, pos)? as usize;
        let vlen = read_u32(raw, pos + 4)? as usize;
        pos += 8;

        if raw.len() < pos + klen + vlen {
            return Err(EngineError::corrupted("truncated record body"));
        }
        let key = raw[pos..pos + klen].to_vec();
        pos += klen;
        let value = raw[pos..pos + vlen].to_vec();
        pos += vlen;
        entries.insert(key, value);
    }

    if pos != raw.len() {
        return Err(EngineError::corrupted("trailing bytes after records"));
    }
    Ok(entries)
}

impl KvEngine for FileEngine {
    fn get(&self, key: &[u8]) -> EngineResult<Option<Vec<u8>>> {
        self.ensure_open()?;
        self.inner.get(key)
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> EngineResult<()> {
        self.ensure_open()?;
        self.inner.put(key, value)
    }

    fn append(&mut self, key: &[u8], value: &[u8]) -> EngineResult<()> {
        self.ensure_open()?;
        self.inner.append(key, value)
    }

    fn delete(&mut self, key: &[u8]) -> EngineResult<bool> {
        self.ensure_open()?;
        self.inner.delete(key)
    }

    fn value_size(&self, key: &[u8]) -> EngineResult<Option<u64>> {
        self.ensure_open()?;
        self.inner.value_size(key)
    }

    fn txn_begin(&mut self) -> EngineResult<()> {
        self.ensure_open()?;
        self.inner.txn_begin()
    }

    fn txn_commit(&mut self) -> EngineResult<()> {
        self.ensure_open()?;
        self.inner.txn_commit()?;
        self.persist()
    }

    fn txn_rollback(&mut self) -> EngineResult<()> {
        self.ensure_open()?;
        // The file already holds the last committed snapshot.
        self.inner.txn_rollback()
    }

    fn cursor_open(&mut self) -> EngineResult<CursorId> {
        self.ensure_open()?;
        self.inner.cursor_open()
    }

    fn cursor_release(&mut self, id: CursorId) -> EngineResult<()> {
        self.ensure_open()?;
        self.inner.cursor_release(id)
    }

    fn cursor_first(&mut self, id: CursorId) -> EngineResult<()> {
        self.ensure_open()?;
        self.inner.cursor_first(id)
    }

    fn cursor_last(&mut self, id: CursorId) -> EngineResult<()> {
        self.ensure_open()?;
        self.inner.cursor_last(id)
    }

    fn cursor_seek(&mut self, id: CursorId, key: &[u8], bias: SeekBias) -> EngineResult<()> {
        self.ensure_open()?;
        self.inner.cursor_seek(id, key, bias)
    }

    fn cursor_next(&mut self, id: CursorId) -> EngineResult<()> {
        self.ensure_open()?;
        self.inner.cursor_next(id)
    }

    fn cursor_prev(&mut self, id: CursorId) -> EngineResult<()> {
        self.ensure_open()?;
        self.inner.cursor_prev(id)
    }

    fn cursor_valid(&self, id: CursorId) -> EngineResult<bool> {
        self.ensure_open()?;
        self.inner.cursor_valid(id)
    }

    fn cursor_key(&self, id: CursorId) -> EngineResult<Vec<u8>> {
        self.ensure_open()?;
        self.inner.cursor_key(id)
    }

    fn cursor_value(&self, id: CursorId) -> EngineResult<Vec<u8>> {
        self.ensure_open()?;
        self.inner.cursor_value(id)
    }

    fn cursor_delete(&mut self, id: CursorId) -> EngineResult<()> {
        self.ensure_open()?;
        self.inner.cursor_delete(id)
    }

    fn close(&mut self) -> EngineResult<()> {
        if self.closed {
            return Ok(());
        }
        // Closing the inner engine rolls back any transaction still open, so
        // the snapshot written below never contains uncommitted writes.
        self.inner.close()?;
        if !self.read_only {
            self.persist()?;
        }
        self.closed = true;
        let _ = FileExt::unlock(&self.lock_file);
        Ok(())
    }
}

impl Drop for FileEngine {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
