//! # Quorum Verifier
//!
//! Checks that a decision hash is signed by more than two thirds of the
//! active validator set.
//!
//! Recovery runs in parallel; membership and duplicate checks then run in
//! slot order so the first offending slot decides the error.

use rayon::prelude::*;
use std::collections::HashSet;

use super::signature::recover_identity;
use crate::domain::{has_quorum, BmvError, EthAddress, Hash, ProofContext, Proofs};

/// Verify `proofs` over `decision_hash` against `validators`.
///
/// Returns the number of distinct valid signers.
pub fn verify_quorum(
    decision_hash: &Hash,
    proofs: &Proofs,
    validators: &ProofContext,
) -> Result<usize, BmvError> {
    let recovered: Vec<Result<EthAddress, BmvError>> = proofs
        .signatures
        .par_iter()
        .filter_map(|slot| slot.as_deref())
        .map(|sig| recover_identity(decision_hash, sig))
        .collect();

    let mut seen = HashSet::with_capacity(recovered.len());
    for signer in recovered {
        let signer = signer?;
        if !validators.is_validator(&signer) {
            return Err(BmvError::UnknownSigner(signer));
        }
        if !seen.insert(signer) {
            return Err(BmvError::DuplicateSigner(signer));
        }
    }

    let verified = seen.len();
    if !has_quorum(verified, validators.len()) {
        return Err(BmvError::QuorumNotMet {
            verified,
            validators: validators.len(),
        });
    }
    Ok(verified)
}
