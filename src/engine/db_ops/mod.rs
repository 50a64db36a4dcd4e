//! Fingerprint store: schema, open/load, and the [`FingerprintStore`] seam used by the reconciler.

mod connection;
mod store;

pub use connection::{entry_count, load_fingerprints, open_db, open_db_in_memory};
pub use store::{MemoryStore, SqliteStore, open_store_or_memory};

use crate::errors::StoreError;
use crate::{CacheEntry, Fingerprint};

/// Persistent key-value cache of last-seen fingerprints, keyed by output id.
///
/// Reads happen once per campaign during reconciliation; writes happen once per emitted record,
/// sequentially, after its content was fetched.
pub trait FingerprintStore {
    /// Stored fingerprint for `id`, or `Ok(None)` when nothing was cached.
    fn get(&self, id: &str) -> Result<Option<Fingerprint>, StoreError>;

    /// Upsert one entry.
    fn set(&mut self, entry: &CacheEntry) -> Result<(), StoreError>;

    /// Make writes durable. Default is a no-op.
    fn flush(&mut self) -> Result<(), StoreError> {
        Ok(())
    }
}

impl<S: FingerprintStore + ?Sized> FingerprintStore for Box<S> {
    fn get(&self, id: &str) -> Result<Option<Fingerprint>, StoreError> {
        (**self).get(id)
    }

    fn set(&mut self, entry: &CacheEntry) -> Result<(), StoreError> {
        (**self).set(entry)
    }

    fn flush(&mut self) -> Result<(), StoreError> {
        (**self).flush()
    }
}

/// WAL tuning pragmas (synchronous, autocheckpoint, size limit). Use after PRAGMA journal_mode = WAL.
pub(crate) const WAL_PRAGMAS: &str = r#"
        PRAGMA synchronous = NORMAL;
        PRAGMA wal_autocheckpoint = 10000;
        PRAGMA journal_size_limit = 67108864;
        "#;

/// Upsert statement for the fingerprints table.
pub(crate) const UPSERT_FINGERPRINT_SQL: &str =
    "INSERT OR REPLACE INTO fingerprints (id, fingerprint, updated_at) VALUES (?1, ?2, ?3)";

pub(crate) const SELECT_FINGERPRINT_SQL: &str =
    "SELECT fingerprint FROM fingerprints WHERE id = ?1";

/// Schema for the fingerprints table.
pub(crate) const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS fingerprints (
    id TEXT PRIMARY KEY,
    fingerprint TEXT NOT NULL,
    updated_at INTEGER NOT NULL
);
"#;
