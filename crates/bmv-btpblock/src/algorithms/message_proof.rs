//! # Message Proof Extractor
//!
//! Message tree root reconstruction and ordered extraction of revealed
//! messages against link state.
//!
//! ## Tree Shape
//!
//! Leaves are `keccak(message)`. A tree over `n > 1` leaves splits at the
//! largest power of two strictly below `n`:
//!
//! ```text
//! n = 5:          root
//!               /      \
//!           h0123       4
//!           /   \
//!        h01     h23
//! ```
//!
//! A proof carries subtree roots left of the revealed run, the run itself,
//! and subtree roots to its right. Each node must sit exactly on a subtree
//! boundary of that shape.

use std::iter::Peekable;

use tracing::debug;

use super::hash_tree::{hash_concat, keccak256};
use crate::domain::{
    invariant_batch_open, BlockHeader, BmvError, Hash, LinkState, MessageProof, ProofNode,
};

/// Outcome of folding a message proof.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProveResult {
    /// Leaves covered by the left nodes.
    pub offset: u64,
    /// Leaves covered by the whole proof.
    pub total: u64,
    /// Reconstructed root.
    pub root: Hash,
}

/// Largest power of two strictly below `n` (`n >= 2`).
fn split_point(n: u64) -> u64 {
    1u64 << (63 - (n - 1).leading_zeros())
}

fn fold<I>(nodes: &mut Peekable<I>, size: u64) -> Result<Hash, BmvError>
where
    I: Iterator<Item = (u64, Hash)>,
{
    let &(leaves, value) = nodes
        .peek()
        .ok_or_else(|| BmvError::InvalidMerkleProof("proof ends inside the tree".into()))?;
    if leaves == size {
        nodes.next();
        return Ok(value);
    }
    if leaves > size || size == 1 {
        return Err(BmvError::InvalidMerkleProof(format!(
            "node of {leaves} leaves straddles a subtree of {size}"
        )));
    }
    let left_size = split_point(size);
    let left = fold(nodes, left_size)?;
    let right = fold(nodes, size - left_size)?;
    Ok(hash_concat(&left, &right))
}

fn sum_leaves(nodes: &[ProofNode]) -> Result<u64, BmvError> {
    nodes.iter().try_fold(0u64, |acc, node| {
        if node.num_of_leaf == 0 {
            return Err(BmvError::InvalidMerkleProof("node with zero leaves".into()));
        }
        acc.checked_add(node.num_of_leaf)
            .ok_or_else(|| BmvError::InvalidMerkleProof("leaf count overflow".into()))
    })
}

impl MessageProof {
    /// Fold the proof back to its root.
    pub fn prove(&self) -> Result<ProveResult, BmvError> {
        let offset = sum_leaves(&self.left)?;
        let right = sum_leaves(&self.right)?;
        let total = offset
            .checked_add(self.messages.len() as u64)
            .and_then(|n| n.checked_add(right))
            .ok_or_else(|| BmvError::InvalidMerkleProof("leaf count overflow".into()))?;
        if total == 0 {
            return Err(BmvError::InvalidMerkleProof("empty proof".into()));
        }

        let mut nodes = self
            .left
            .iter()
            .map(|n| (n.num_of_leaf, n.value))
            .chain(self.messages.iter().map(|m| (1, keccak256(m))))
            .chain(self.right.iter().map(|n| (n.num_of_leaf, n.value)))
            .peekable();
        let root = fold(&mut nodes, total)?;
        if nodes.next().is_some() {
            return Err(BmvError::InvalidMerkleProof("unconsumed proof nodes".into()));
        }
        Ok(ProveResult {
            offset,
            total,
            root,
        })
    }
}

fn subtree_root(leaves: &[Hash]) -> Hash {
    if leaves.len() == 1 {
        return leaves[0];
    }
    let split = split_point(leaves.len() as u64) as usize;
    hash_concat(&subtree_root(&leaves[..split]), &subtree_root(&leaves[split..]))
}

/// Root over `messages`; `None` for an empty batch.
pub fn compute_messages_root(messages: &[Vec<u8>]) -> Option<Hash> {
    if messages.is_empty() {
        return None;
    }
    let leaves: Vec<Hash> = messages.iter().map(|m| keccak256(m)).collect();
    Some(subtree_root(&leaves))
}

/// Build a proof revealing `messages[from..to]`.
pub fn build_message_proof(
    messages: &[Vec<u8>],
    from: usize,
    to: usize,
) -> Result<MessageProof, BmvError> {
    if from >= to || to > messages.len() {
        return Err(BmvError::InvalidMerkleProof(format!(
            "invalid range {from}..{to} of {}",
            messages.len()
        )));
    }
    let leaves: Vec<Hash> = messages.iter().map(|m| keccak256(m)).collect();
    let mut proof = MessageProof {
        messages: messages[from..to].to_vec(),
        ..Default::default()
    };
    collect_nodes(&leaves, 0, from, to, &mut proof);
    Ok(proof)
}

fn collect_nodes(
    leaves: &[Hash],
    start: usize,
    from: usize,
    to: usize,
    proof: &mut MessageProof,
) {
    let end = start + leaves.len();
    if end <= from {
        proof.left.push(ProofNode::new(leaves.len() as u64, subtree_root(leaves)));
        return;
    }
    if start >= to {
        proof.right.push(ProofNode::new(leaves.len() as u64, subtree_root(leaves)));
        return;
    }
    if start >= from && end <= to {
        return;
    }
    let split = split_point(leaves.len() as u64) as usize;
    collect_nodes(&leaves[..split], start, from, to, proof);
    collect_nodes(&leaves[split..], start + split, from, to, proof);
}

/// Verify `proof` against the open batch and advance the sequence.
///
/// `paired` is the header of a block update applied earlier in the same
/// relay message; its batch must be consumed from the first leaf.
pub fn extract_messages(
    state: &mut LinkState,
    proof: &MessageProof,
    paired: Option<&BlockHeader>,
) -> Result<Vec<Vec<u8>>, BmvError> {
    invariant_batch_open(state)?;
    let result = proof.prove()?;

    let processed = state.processed_message_count()?;
    if processed != result.offset {
        return Err(BmvError::ProofOffsetMismatch {
            expected: processed,
            actual: result.offset,
        });
    }

    let (expected_root, expected_count) = match paired {
        Some(header) => {
            if result.offset != 0 {
                return Err(BmvError::ProofOffsetMismatch {
                    expected: 0,
                    actual: result.offset,
                });
            }
            (header.message_root, header.message_count)
        }
        None => (state.last_messages_root, state.last_message_count),
    };

    if result.total != expected_count {
        return Err(BmvError::InvalidMerkleProof(format!(
            "mismatch message count: offset {}, expected {expected_count}, got {}",
            result.offset, result.total
        )));
    }
    if expected_root != Some(result.root) {
        return Err(BmvError::InvalidMerkleProof("mismatch messages root".into()));
    }

    let consumed = proof.messages.len() as u64;
    let remaining = result.total - result.offset - consumed;
    if remaining == 0 {
        state.last_messages_root = None;
    }
    state.last_sequence = state
        .last_sequence
        .checked_add(consumed)
        .ok_or_else(|| BmvError::LinkStateInvariantViolation("sequence overflow".into()))?;

    debug!(
        offset = result.offset,
        count = consumed,
        remaining,
        "Message proof accepted"
    );
    Ok(proof.messages.clone())
}
