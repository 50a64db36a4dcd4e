//! SQLite and in-memory [`FingerprintStore`] implementations.

use log::{debug, warn};
use rusqlite::{Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::errors::StoreError;
use crate::{CacheEntry, Fingerprint};

use super::{
    FingerprintStore, SELECT_FINGERPRINT_SQL, UPSERT_FINGERPRINT_SQL, entry_count, open_db,
};

/// Fingerprint store backed by one SQLite connection (the `.chimpsync` file).
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// Open (or create) the cache file at `path`.
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        Ok(Self::new(open_db(path)?))
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

fn unix_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

impl FingerprintStore for SqliteStore {
    fn get(&self, id: &str) -> Result<Option<Fingerprint>, StoreError> {
        let fp = self
            .conn
            .prepare_cached(SELECT_FINGERPRINT_SQL)?
            .query_row([id], |row| row.get::<_, String>(0))
            .optional()?;
        Ok(fp.map(Fingerprint::from_stored))
    }

    fn set(&mut self, entry: &CacheEntry) -> Result<(), StoreError> {
        self.conn.prepare_cached(UPSERT_FINGERPRINT_SQL)?.execute((
            entry.id.as_str(),
            entry.fingerprint.as_str(),
            unix_secs(),
        ))?;
        Ok(())
    }

    /// Reclaim WAL space after the run's writes (checkpoint and truncate WAL file).
    fn flush(&mut self) -> Result<(), StoreError> {
        self.conn
            .query_row("PRAGMA wal_checkpoint(TRUNCATE)", [], |_| Ok(()))?;
        Ok(())
    }
}

/// Process-local store. Used for tests and as the fallback when the cache file cannot be opened.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, Fingerprint>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FingerprintStore for MemoryStore {
    fn get(&self, id: &str) -> Result<Option<Fingerprint>, StoreError> {
        Ok(self.entries.get(id).cloned())
    }

    fn set(&mut self, entry: &CacheEntry) -> Result<(), StoreError> {
        self.entries
            .insert(entry.id.clone(), entry.fingerprint.clone());
        Ok(())
    }
}

/// Open the SQLite store at `path`; if that fails, warn and fall back to an empty in-memory store
/// so the run proceeds as if nothing was cached.
pub fn open_store_or_memory(path: &Path) -> Box<dyn FingerprintStore> {
    match SqliteStore::open(path) {
        Ok(store) => {
            debug!(
                "Fingerprint cache: {} ({} entries)",
                path.display(),
                entry_count(store.connection()).unwrap_or(0)
            );
            Box::new(store)
        }
        Err(e) => {
            warn!(
                "Fingerprint cache unavailable at {} ({:#}); every campaign will be treated as new",
                path.display(),
                e
            );
            Box::new(MemoryStore::new())
        }
    }
}
