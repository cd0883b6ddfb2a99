//! # verity-store
//!
//! Key-value storage seam for the judge.
//!
//! The judge sees one flat namespace of opaque byte keys. Every operation
//! reads through an [`Overlay`] that buffers its writes; the buffer becomes a
//! [`WriteBatch`] that a [`KvStore`] applies atomically, or is dropped when
//! the operation fails.
//!
//! ## Modules
//!
//! - [`keys`] — typed, injective composite key encoding
//! - [`codec`] — value encodings (big-endian integers, CBOR records)
//! - [`overlay`] — write-buffering view over a store
//! - [`memory`] — `BTreeMap`-backed store for tests and replay
//! - [`sqlite`] — SQLite-backed persistent store

pub mod codec;
pub mod keys;
pub mod memory;
pub mod migrations;
pub mod overlay;
pub mod schema;
pub mod sqlite;

use std::collections::BTreeMap;

pub use keys::StoreKey;
pub use memory::MemoryStore;
pub use overlay::Overlay;
pub use sqlite::SqliteStore;

/// Current schema version.
pub const SCHEMA_VERSION: u32 = 1;

/// Storage error types.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("migration failed: {0}")]
    Migration(String),

    #[error("codec error: {0}")]
    Codec(String),

    #[error("inconsistent stored state: {0}")]
    Corrupt(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Read access to the key-value namespace.
pub trait KvRead {
    /// Fetch the value stored under `key`, if any.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;
}

/// A key-value store the judge can commit to.
pub trait KvStore: KvRead {
    /// Store `value` under `key`, replacing any previous value.
    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<()>;

    /// Apply every write in `batch` as one unit.
    ///
    /// Implementations backed by fallible media must either apply all writes
    /// or none of them.
    fn apply(&mut self, batch: WriteBatch) -> Result<()> {
        for (key, value) in batch {
            self.put(&key, &value)?;
        }
        Ok(())
    }
}

/// Writes buffered by one operation, keyed and deduplicated.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WriteBatch {
    writes: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl WriteBatch {
    /// Create an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer a write. A later write to the same key wins.
    pub fn put(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.writes.insert(key, value);
    }

    /// Look up a buffered value.
    pub fn get(&self, key: &[u8]) -> Option<&Vec<u8>> {
        self.writes.get(key)
    }

    /// Number of distinct keys written.
    pub fn len(&self) -> usize {
        self.writes.len()
    }

    /// Whether the batch is empty.
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// Iterate over buffered writes in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&Vec<u8>, &Vec<u8>)> {
        self.writes.iter()
    }
}

impl IntoIterator for WriteBatch {
    type Item = (Vec<u8>, Vec<u8>);
    type IntoIter = std::collections::btree_map::IntoIter<Vec<u8>, Vec<u8>>;

    fn into_iter(self) -> Self::IntoIter {
        self.writes.into_iter()
    }
}
