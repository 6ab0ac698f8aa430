//! # BTP Block Message Verifier
//!
//! Verifies relayed block updates and message proofs for one inbound BTP
//! link and hands the proven messages to the local message center in order.
//!
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! A relayer submits relay messages carrying two kinds of elements:
//! - Block updates: a new network section signed by a quorum of the
//!   current validator set, optionally rotating that set
//! - Message proofs: a slice of a network section's message tree, proven
//!   against its committed root
//!
//! The verifier keeps a single persisted link state and returns the
//! verified messages, never the same message twice.
//!
//! ## Verification Rules
//!
//! | Check | Failure |
//! |-------|---------|
//! | Update number continues the link | `AlreadyVerified` / `NotVerifiable` |
//! | `prev` equals the stored section hash | `PrevHashMismatch` |
//! | More than 2/3 of validators signed | `QuorumNotMet` |
//! | Revealed proof context matches its hash | `InvalidProofContext` |
//! | Proof slice starts at the next message | `ProofOffsetMismatch` |
//! | Recomputed root and leaf count match | `InvalidMerkleProof` |
//!
//! ## Module Structure
//!
//! ```text
//! bmv-btpblock/
//! ├── domain/          # Wire types, LinkState, errors, invariants
//! ├── algorithms/      # Hashing, signature recovery, quorum, state transitions
//! ├── ports/           # BmvApi (inbound) + KeyValueStore (outbound)
//! ├── adapters/        # In-memory store, LinkState persistence
//! ├── application/     # BtpMessageVerifier orchestrating everything
//! └── config.rs        # BmvConfig
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod algorithms;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

// Re-exports
pub use adapters::{InMemoryStore, LinkStateStore, LINK_STATE_KEY};
pub use algorithms::{
    apply_block_update, bootstrap_genesis, build_message_proof, compute_messages_root,
    decision_for, extract_messages, keccak256, recover_identity, root_from_path,
    section_hash, verify_quorum, AppliedUpdate, ProveResult, HASH_ALGORITHM,
    SIGNATURE_ALGORITHM,
};
pub use application::BtpMessageVerifier;
pub use config::BmvConfig;
pub use domain::{
    BlockHeader, BlockUpdate, BmvError, BmvStatus, BmvStatusExtra, BtpAddress, Direction,
    EthAddress, Hash, LinkState, MessageProof, NetworkSection, NetworkTypeSection,
    NetworkTypeSectionDecision, ProofContext, ProofNode, Proofs, RelayElement, RelayMessage,
    SectionToRoot, CODE_ALREADY_VERIFIED, CODE_NOT_VERIFIABLE, CODE_UNKNOWN,
};
pub use ports::{BmvApi, KeyValueStore};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
