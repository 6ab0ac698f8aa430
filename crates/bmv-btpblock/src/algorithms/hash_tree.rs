//! # Hash Tree Builder
//!
//! Canonical hashes of BTP block metadata and section-tree root
//! reconstruction.
//!
//! ## Algorithm
//!
//! ```text
//! ns        = keccak(rlp[nid, updateNumber, prev, messageCount, messageRoot])
//! nsRoot    = fold(ns, networkSectionToRoot)
//! nts       = keccak(rlp[nextProofContextHash, nsRoot])
//! decision  = keccak(rlp[srcNetworkId, networkTypeId, height, round, nts])
//! ```

use bmv_codec::Encodable;
use sha3::{Digest, Keccak256};

use crate::domain::{
    Direction, Hash, NetworkSection, NetworkTypeSection, NetworkTypeSectionDecision,
    SectionToRoot,
};

/// Hash function used for every tree, section and decision hash.
pub const HASH_ALGORITHM: &str = "keccak-256";

/// Keccak-256.
pub fn keccak256(data: &[u8]) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    finalize(hasher)
}

/// `keccak(left ‖ right)`.
pub fn hash_concat(left: &[u8], right: &[u8]) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update(left);
    hasher.update(right);
    finalize(hasher)
}

fn finalize(hasher: Keccak256) -> Hash {
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&hasher.finalize());
    hash
}

/// Hash of a network section over its canonical encoding.
pub fn section_hash(
    nid: u64,
    update_number: u64,
    prev: Option<Hash>,
    message_count: u64,
    message_root: Option<Hash>,
) -> Hash {
    NetworkSection {
        nid,
        update_number,
        prev,
        message_count,
        message_root,
    }
    .hash()
}

impl NetworkSection {
    /// Canonical hash.
    pub fn hash(&self) -> Hash {
        keccak256(&self.to_rlp())
    }
}

impl NetworkTypeSection {
    /// Canonical hash.
    pub fn hash(&self) -> Hash {
        keccak256(&self.to_rlp())
    }
}

impl NetworkTypeSectionDecision {
    /// Hash the validators sign.
    pub fn hash(&self) -> Hash {
        keccak256(&self.to_rlp())
    }
}

/// Fold a leaf up a section-tree path.
///
/// A zero-length sibling leaves the accumulator unchanged. So does a step
/// whose direction is neither LEFT nor RIGHT.
pub fn root_from_path(leaf: Hash, path: &[SectionToRoot]) -> Hash {
    path.iter().fold(leaf, |acc, step| {
        if step.value.is_empty() {
            return acc;
        }
        match step.dir {
            Direction::Left => hash_concat(&step.value, &acc),
            Direction::Right => hash_concat(&acc, &step.value),
            Direction::Other(_) => acc,
        }
    })
}
