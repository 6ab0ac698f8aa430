//! # Block Update Processor
//!
//! Validates one BTP block header against link state and applies it:
//! sequence and chain checks, quorum over the signed decision, validator
//! rotation, and commitment of the new batch.

use bmv_codec::Decodable;
use tracing::debug;

use super::hash_tree::{keccak256, root_from_path};
use super::quorum::verify_quorum;
use crate::domain::{
    invariant_batch_closed, invariant_bootstrapped, invariant_height_monotonic, BlockHeader,
    BlockUpdate, BmvError, Hash, LinkState, NetworkTypeSection, NetworkTypeSectionDecision,
    ProofContext,
};

/// What an accepted block update changed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AppliedUpdate {
    /// Distinct validators that signed.
    pub verified_signatures: usize,
    /// Whether the validator set rotated.
    pub rotated: bool,
    /// New link height.
    pub height: u64,
    /// Messages in the new batch.
    pub message_count: u64,
}

/// Bootstrap an uninitialised link from a trusted genesis header.
///
/// No signatures are checked; the header is the trust anchor.
pub fn bootstrap_genesis(state: &mut LinkState, header: &BlockHeader) -> Result<(), BmvError> {
    if header.prev.is_some() {
        return Err(BmvError::LinkStateInvariantViolation(
            "genesis header must not link to a previous section".into(),
        ));
    }
    let proof_context = reveal_proof_context(header)?;
    let first_sn = external_sn(state, header.first_message_sn())?;

    state.network_id = Some(header.nid);
    state.proof_context = Some(proof_context);
    state.proof_context_hash = Some(header.next_proof_context_hash);
    state.last_network_section_hash = Some(header.network_section().hash());
    state.last_sequence = header.first_message_sn();
    state.last_messages_root = header.message_root;
    state.last_message_count = header.message_count;
    state.last_first_message_sn = first_sn;
    state.height = header.main_height;
    Ok(())
}

/// Validate `update` against `state` and apply it.
pub fn apply_block_update(
    state: &mut LinkState,
    update: &BlockUpdate,
) -> Result<AppliedUpdate, BmvError> {
    invariant_bootstrapped(state)?;
    let header = &update.header;

    let expected = state
        .last_first_message_sn
        .checked_add(state.last_message_count)
        .and_then(|sn| sn.checked_sub(state.sequence_offset))
        .ok_or_else(|| {
            BmvError::LinkStateInvariantViolation("first message sn out of range".into())
        })?;
    let declared = header.first_message_sn();
    if expected > declared {
        return Err(BmvError::AlreadyVerified { expected, declared });
    }
    if expected < declared {
        return Err(BmvError::NotVerifiable { expected, declared });
    }

    let section_hash = header.network_section().hash();
    if state.last_network_section_hash == Some(section_hash) {
        return Err(BmvError::AlreadyVerified { expected, declared });
    }

    invariant_batch_closed(state)?;
    if let Some(nid) = state.network_id {
        if nid != header.nid {
            return Err(BmvError::NetworkIdMismatch {
                expected: nid,
                actual: header.nid,
            });
        }
    }
    if state.last_network_section_hash != header.prev {
        return Err(BmvError::PrevHashMismatch);
    }

    let decision = decision_for(state, header, section_hash);
    let validators = state
        .proof_context
        .as_ref()
        .ok_or_else(|| BmvError::LinkStateInvariantViolation("no validator set".into()))?;
    let verified_signatures = verify_quorum(&decision.hash(), &update.proofs, validators)?;

    let rotated = header.has_next_proof_context();
    let next_validators = if rotated {
        if state.proof_context_hash == Some(header.next_proof_context_hash) {
            return Err(BmvError::MismatchUpdateFlag);
        }
        Some(reveal_proof_context(header)?)
    } else {
        None
    };

    invariant_height_monotonic(state.height, header.main_height)?;
    let first_sn = external_sn(state, declared)?;

    if let Some(validators) = next_validators {
        debug!(
            validators = validators.len(),
            hash = %hex::encode(header.next_proof_context_hash),
            "Validator set rotated"
        );
        state.proof_context = Some(validators);
        state.proof_context_hash = Some(header.next_proof_context_hash);
    }
    state.last_messages_root = header.message_root;
    state.last_message_count = header.message_count;
    state.last_first_message_sn = first_sn;
    state.last_network_section_hash = Some(section_hash);
    state.height = header.main_height;

    Ok(AppliedUpdate {
        verified_signatures,
        rotated,
        height: header.main_height,
        message_count: header.message_count,
    })
}

/// The decision validators must have signed for `header`.
pub fn decision_for(
    state: &LinkState,
    header: &BlockHeader,
    section_hash: Hash,
) -> NetworkTypeSectionDecision {
    let type_section = NetworkTypeSection {
        next_proof_context_hash: header.next_proof_context_hash,
        network_sections_root: root_from_path(section_hash, &header.network_section_to_root),
    };
    NetworkTypeSectionDecision {
        src_network_id: state.src_network_id.as_bytes().to_vec(),
        network_type_id: state.network_type_id,
        height: header.main_height,
        round: header.round,
        network_type_section_hash: type_section.hash(),
    }
}

fn reveal_proof_context(header: &BlockHeader) -> Result<ProofContext, BmvError> {
    let raw = header
        .next_proof_context
        .as_deref()
        .ok_or_else(|| BmvError::InvalidProofContext("next proof context missing".into()))?;
    if keccak256(raw) != header.next_proof_context_hash {
        return Err(BmvError::InvalidProofContext(
            "mismatch hash of next proof context".into(),
        ));
    }
    let context = ProofContext::from_rlp(raw)?;
    if context.is_empty() {
        return Err(BmvError::InvalidProofContext("empty validator set".into()));
    }
    Ok(context)
}

fn external_sn(state: &LinkState, sn: u64) -> Result<u64, BmvError> {
    sn.checked_add(state.sequence_offset)
        .ok_or_else(|| BmvError::LinkStateInvariantViolation("sequence overflow".into()))
}
