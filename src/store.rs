//! Store Module
//!
//! The flat in-memory key-value map that commands operate on.

use std::collections::HashMap;

use bytes::Bytes;
use parking_lot::RwLock;

/// In-memory key-value map
///
/// Owned by the engine and handed to the dispatcher; nothing reaches it
/// through global state.
#[derive(Debug, Default)]
pub struct Store {
    data: RwLock<HashMap<Bytes, Bytes>>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a value by key (read lock)
    pub fn get(&self, key: &[u8]) -> Option<Bytes> {
        self.data.read().get(key).cloned()
    }

    /// Insert or overwrite a key (write lock)
    pub fn set(&self, key: Bytes, value: Bytes) {
        self.data.write().insert(key, value);
    }

    /// Remove a key, returning whether it existed
    pub fn remove(&self, key: &[u8]) -> bool {
        self.data.write().remove(key).is_some()
    }

    pub fn contains(&self, key: &[u8]) -> bool {
        self.data.read().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    /// Copy of the whole map, sorted by key
    pub fn snapshot(&self) -> Vec<(Bytes, Bytes)> {
        let mut entries: Vec<_> = self
            .data
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        entries.sort();
        entries
    }
}
