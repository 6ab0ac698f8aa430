//! In-memory key-value store.

use parking_lot::RwLock;
use std::collections::HashMap;

use crate::ports::KeyValueStore;

/// `KeyValueStore` backed by a locked map. Share it through `Arc` to inspect
/// what a verifier has persisted.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    entries: RwLock<HashMap<Vec<u8>, Vec<u8>>>,
}

impl InMemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys written.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl KeyValueStore for InMemoryStore {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.entries.read().get(key).cloned()
    }

    fn set(&self, key: &[u8], value: Vec<u8>) {
        self.entries.write().insert(key.to_vec(), value);
    }
}
