//! In-memory store

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::path::{split_key, NAMESPACE_SEPARATOR};
use super::KeyValueStore;
use crate::Result;

/// Keeps artifacts in a map keyed by the normalized path they would have on
/// disk (`Vendor/Pkg/Service`), so keys collide exactly when the filesystem
/// store's paths would.
#[derive(Debug)]
pub struct MemoryStore {
    separator: char,
    entries: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            separator: NAMESPACE_SEPARATOR,
            entries: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn with_separator(mut self, separator: char) -> Self {
        self.separator = separator;
        self
    }

    /// Normalized keys currently stored
    pub fn keys(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn storage_key(&self, key: &str) -> Result<String> {
        let (mut segments, leaf) = split_key(key, self.separator)?;
        segments.push(leaf);
        Ok(segments.join("/"))
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, Vec<u8>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStore for MemoryStore {
    fn put(&self, key: &str, value: &[u8]) -> Result<()> {
        let key = self.storage_key(key)?;
        self.lock().insert(key, value.to_vec());
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let Ok(key) = self.storage_key(key) else {
            return Ok(None);
        };
        Ok(self.lock().get(&key).cloned())
    }

    fn delete_all(&self) -> usize {
        let mut entries = self.lock();
        let removed = entries.len();
        entries.clear();
        removed
    }
}
