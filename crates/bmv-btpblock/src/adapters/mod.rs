//! # Adapters Layer (Hexagonal Architecture)
//!
//! Storage adapters behind the outbound ports.

mod link_state_store;
mod memory_store;

pub use link_state_store::{LinkStateStore, LINK_STATE_KEY};
pub use memory_store::InMemoryStore;
