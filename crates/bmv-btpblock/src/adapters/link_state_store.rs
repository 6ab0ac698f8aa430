//! Persistence of [`LinkState`] on top of a [`KeyValueStore`].

use bmv_codec::Encodable;
use tracing::trace;

use crate::domain::{BmvError, LinkState};
use crate::ports::KeyValueStore;

/// Storage key of the link state record.
pub const LINK_STATE_KEY: &[u8] = b"bmv/link_state";

/// Typed access to the link state record.
pub struct LinkStateStore<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> LinkStateStore<S> {
    /// Wrap a raw store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Load the record; `None` if the link was never initialised.
    pub fn load(&self) -> Result<Option<LinkState>, BmvError> {
        self.store
            .get(LINK_STATE_KEY)
            .map(|bytes| LinkState::from_stored(&bytes))
            .transpose()
    }

    /// Load the record, failing if absent.
    pub fn load_existing(&self) -> Result<LinkState, BmvError> {
        self.load()?.ok_or_else(|| {
            BmvError::LinkStateInvariantViolation("link state not initialised".into())
        })
    }

    /// Persist the record.
    pub fn save(&self, state: &LinkState) {
        let bytes = state.to_rlp();
        trace!(len = bytes.len(), "Persisting link state");
        self.store.set(LINK_STATE_KEY, bytes);
    }

    /// Raw encoded record, for byte-level comparisons.
    pub fn raw(&self) -> Option<Vec<u8>> {
        self.store.get(LINK_STATE_KEY)
    }
}
