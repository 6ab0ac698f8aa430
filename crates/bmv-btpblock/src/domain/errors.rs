//! # Domain Errors
//!
//! Error types for the BTP block message verifier. Every variant is terminal
//! for the relay message being handled; nothing is retried internally.

use bmv_codec::CodecError;
use thiserror::Error;

use super::value_objects::EthAddress;

/// Hash type alias (32-byte keccak-256)
pub type Hash = [u8; 32];

/// BTP error code for failures with no dedicated code.
pub const CODE_UNKNOWN: u32 = 25;
/// BTP error code: the update is ahead of verifier state.
pub const CODE_NOT_VERIFIABLE: u32 = 26;
/// BTP error code: the update was already applied.
pub const CODE_ALREADY_VERIFIED: u32 = 27;

/// Block message verifier errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BmvError {
    /// Input did not decode under the canonical encoding.
    #[error("Malformed encoding: {0}")]
    MalformedEncoding(#[from] CodecError),

    /// A signature could not be parsed or no key could be recovered from it.
    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    /// A recovered signer is not in the active validator set.
    #[error("Invalid validator: {0}")]
    UnknownSigner(EthAddress),

    /// The same validator signed twice in one proof bundle.
    #[error("Duplicated validator: {0}")]
    DuplicateSigner(EthAddress),

    /// Not enough distinct validators signed the decision.
    #[error("Not enough proof parts: validators {validators}, proof parts {verified}")]
    QuorumNotMet {
        /// Distinct valid signatures
        verified: usize,
        /// Size of the active validator set
        validators: usize,
    },

    /// The update declares a sequence beyond what the verifier expects; the
    /// relay must deliver the missing predecessor first.
    #[error("Not verifiable block update: expected first message sn {expected}, got {declared}")]
    NotVerifiable {
        /// First message sn the verifier expects next
        expected: u64,
        /// First message sn the update declares
        declared: u64,
    },

    /// The update was already applied.
    #[error("Already verified: expected first message sn {expected}, got {declared}")]
    AlreadyVerified {
        /// First message sn the verifier expects next
        expected: u64,
        /// First message sn the update declares
        declared: u64,
    },

    /// The caller's sequence does not match the link's next sequence.
    #[error("Invalid sequence: expected {expected}, got {actual}")]
    SequenceMismatch {
        /// Sequence derived from link state
        expected: u64,
        /// Sequence supplied by the caller
        actual: u64,
    },

    /// A message proof does not reconstruct the committed message root.
    #[error("Invalid merkle proof: {0}")]
    InvalidMerkleProof(String),

    /// Link state is not in a state that admits this operation.
    #[error("Link state invariant violated: {0}")]
    LinkStateInvariantViolation(String),

    /// The update is for a different network section.
    #[error("Invalid network id: expected {expected}, got {actual}")]
    NetworkIdMismatch {
        /// Network id bound at bootstrap
        expected: u64,
        /// Network id in the header
        actual: u64,
    },

    /// The update's `prev` does not extend the accepted section chain.
    #[error("Mismatch network section hash")]
    PrevHashMismatch,

    /// A rotation was flagged but the committed hash did not change.
    #[error("Mismatch update flag")]
    MismatchUpdateFlag,

    /// The revealed proof context does not match its committed hash.
    #[error("Invalid proof context: {0}")]
    InvalidProofContext(String),

    /// A message proof does not start where extraction left off.
    #[error("Invalid ProofInLeft: expected offset {expected}, got {actual}")]
    ProofOffsetMismatch {
        /// Messages already consumed from the batch
        expected: u64,
        /// Leaves covered by the proof's left nodes
        actual: u64,
    },

    /// The caller or link addresses are not the configured ones.
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// A BTP address string could not be parsed.
    #[error("Invalid BTP address: {0}")]
    InvalidBtpAddress(String),

    /// Configuration rejected at construction.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl BmvError {
    /// BTP error code reported to the message center.
    pub fn code(&self) -> u32 {
        match self {
            BmvError::NotVerifiable { .. } => CODE_NOT_VERIFIABLE,
            BmvError::AlreadyVerified { .. } => CODE_ALREADY_VERIFIED,
            _ => CODE_UNKNOWN,
        }
    }

    /// Whether the failure is a harmless replay of applied evidence.
    pub fn is_already_verified(&self) -> bool {
        matches!(self, BmvError::AlreadyVerified { .. })
    }
}
