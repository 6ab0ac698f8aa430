//! # Outbound Ports
//!
//! Persistent storage the verifier depends on.

/// Opaque key-value store provided by the host.
///
/// Writes made during a failed call are never issued: the verifier commits
/// with a single [`KeyValueStore::set`] after all checks pass.
pub trait KeyValueStore: Send + Sync {
    /// Read a value.
    fn get(&self, key: &[u8]) -> Option<Vec<u8>>;

    /// Write a value.
    fn set(&self, key: &[u8], value: Vec<u8>);
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for std::sync::Arc<S> {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        (**self).get(key)
    }

    fn set(&self, key: &[u8], value: Vec<u8>) {
        (**self).set(key, value)
    }
}
