//! SQLite-backed store.
//!
//! One database file holds the whole namespace in the `kv` table. Batches are
//! applied inside a single SQLite transaction, so a crash mid-apply leaves
//! the previous state intact.

use std::path::Path;

use rusqlite::{Connection, OptionalExtension};

use crate::{migrations, KvRead, KvStore, Result, WriteBatch};

const UPSERT: &str = "INSERT INTO kv (key, value) VALUES (?1, ?2)
     ON CONFLICT(key) DO UPDATE SET value = excluded.value";

/// Persistent store on top of a SQLite connection.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open or create the store at the given path.
    ///
    /// Configures WAL mode and runs any pending migrations.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        configure(&conn)?;
        migrations::run(&conn)?;
        Ok(Self { conn })
    }

    /// Open an in-memory store (for testing).
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        configure(&conn)?;
        migrations::run(&conn)?;
        Ok(Self { conn })
    }

    /// Number of stored keys.
    pub fn len(&self) -> Result<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM kv", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Whether the store holds no keys.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

/// Configure SQLite pragmas.
fn configure(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA busy_timeout = 5000;
         PRAGMA synchronous = NORMAL;",
    )?;
    Ok(())
}

impl KvRead for SqliteStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }
}

impl KvStore for SqliteStore {
    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        self.conn.execute(UPSERT, rusqlite::params![key, value])?;
        Ok(())
    }

    fn apply(&mut self, batch: WriteBatch) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(UPSERT)?;
            for (key, value) in batch.iter() {
                stmt.execute(rusqlite::params![key, value])?;
            }
        }
        tx.commit()?;
        Ok(())
    }
}
