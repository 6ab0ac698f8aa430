//! # Algorithms Module
//!
//! Hashing, signature recovery, quorum and the two state transitions driven
//! by relay elements.

pub mod block_update;
pub mod hash_tree;
pub mod message_proof;
pub mod quorum;
pub mod signature;

pub use block_update::{apply_block_update, bootstrap_genesis, decision_for, AppliedUpdate};
pub use hash_tree::{hash_concat, keccak256, root_from_path, section_hash, HASH_ALGORITHM};
pub use message_proof::{
    build_message_proof, compute_messages_root, extract_messages, ProveResult,
};
pub use quorum::verify_quorum;
pub use signature::{
    address_from_pubkey, recover_identity, SIGNATURE_ALGORITHM, SIGNATURE_LENGTH,
};
