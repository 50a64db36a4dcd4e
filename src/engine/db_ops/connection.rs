//! Open and load the fingerprint cache database.

use anyhow::{Context, Result};
use rusqlite::Connection;
use std::collections::HashMap;
use std::path::Path;

use crate::Fingerprint;

use super::{SCHEMA, WAL_PRAGMAS};

/// Enable WAL and apply schema to an open connection (idempotent).
fn apply_wal_and_schema(conn: &Connection) -> Result<()> {
    conn.query_row("PRAGMA journal_mode = WAL", [], |_| Ok(()))
        .context("enable WAL")?;
    conn.execute_batch(WAL_PRAGMAS).context("set WAL pragmas")?;
    conn.execute_batch(SCHEMA).context("create schema")?;
    Ok(())
}

/// Open or create the cache DB and ensure schema + WAL. Creates the parent directory if needed.
pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create cache directory {}", parent.display()))?;
    }
    let conn = Connection::open(path).context("open database")?;
    apply_wal_and_schema(&conn)?;
    Ok(conn)
}

/// Open an in-memory DB with the same schema (tests, dry runs; no WAL pragmas needed).
pub fn open_db_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory().context("open in-memory database")?;
    conn.execute_batch(SCHEMA).context("create schema")?;
    Ok(conn)
}

/// Load every cached entry into a map: id -> fingerprint.
pub fn load_fingerprints(conn: &Connection) -> Result<HashMap<String, Fingerprint>> {
    let mut stmt = conn.prepare("SELECT id, fingerprint FROM fingerprints")?;
    let rows = stmt.query_map([], |row| {
        let id: String = row.get(0)?;
        let fingerprint: String = row.get(1)?;
        Ok((id, Fingerprint::from_stored(fingerprint)))
    })?;
    let mut map = HashMap::new();
    for row in rows {
        let (id, fp) = row?;
        map.insert(id, fp);
    }
    Ok(map)
}

/// Number of cached entries, or None if the query fails.
pub fn entry_count(conn: &Connection) -> Option<usize> {
    conn.query_row("SELECT COUNT(*) FROM fingerprints", [], |row| {
        row.get::<_, i64>(0)
    })
    .ok()
    .map(|n| n.max(0) as usize)
}
