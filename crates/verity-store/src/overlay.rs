//! Write-buffering view over a store.
//!
//! Reads consult the buffered writes first, then the base store. Nothing
//! reaches the base store until the caller turns the overlay into a
//! [`WriteBatch`] and applies it.

use crate::{KvRead, Result, WriteBatch};

/// A pending operation's view of the namespace.
pub struct Overlay<'a> {
    base: &'a dyn KvRead,
    writes: WriteBatch,
}

impl<'a> Overlay<'a> {
    /// Start an empty overlay on top of `base`.
    pub fn new(base: &'a dyn KvRead) -> Self {
        Self {
            base,
            writes: WriteBatch::new(),
        }
    }

    /// Buffer a write.
    pub fn put(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.writes.put(key, value);
    }

    /// Number of keys written so far.
    pub fn pending(&self) -> usize {
        self.writes.len()
    }

    /// Finish the operation, yielding its writes.
    pub fn into_batch(self) -> WriteBatch {
        self.writes
    }
}

impl KvRead for Overlay<'_> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        match self.writes.get(key) {
            Some(value) => Ok(Some(value.clone())),
            None => self.base.get(key),
        }
    }
}
