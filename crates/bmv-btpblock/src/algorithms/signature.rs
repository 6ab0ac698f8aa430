//! # Signature / Identity Verifier
//!
//! ECDSA secp256k1 public key recovery and address derivation.

use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};

use super::hash_tree::keccak256;
use crate::domain::{BmvError, EthAddress, Hash};

/// Signature scheme validators sign decisions with.
pub const SIGNATURE_ALGORITHM: &str = "ecdsa-secp256k1";

/// Length of an `r ‖ s ‖ v` signature.
pub const SIGNATURE_LENGTH: usize = 65;

/// Recover the signer address of `message_hash`.
///
/// `signature` is `r ‖ s ‖ v` with `v` in {0, 1, 27, 28}. High-S
/// signatures are rejected by recovery.
pub fn recover_identity(message_hash: &Hash, signature: &[u8]) -> Result<EthAddress, BmvError> {
    if signature.len() != SIGNATURE_LENGTH {
        return Err(BmvError::InvalidSignature(format!(
            "expected {SIGNATURE_LENGTH} bytes, got {}",
            signature.len()
        )));
    }

    let recovery_id = parse_recovery_id(signature[64])?;
    let sig = Signature::from_slice(&signature[..64])
        .map_err(|e| BmvError::InvalidSignature(format!("bad r/s: {e}")))?;

    let key = VerifyingKey::recover_from_prehash(message_hash, &sig, recovery_id)
        .map_err(|e| BmvError::InvalidSignature(format!("recovery failed: {e}")))?;

    Ok(address_from_pubkey(&key))
}

/// Address of a public key: last 20 bytes of keccak of the uncompressed
/// point without its format byte.
pub fn address_from_pubkey(public_key: &VerifyingKey) -> EthAddress {
    let point = public_key.to_encoded_point(false);
    let hash = keccak256(&point.as_bytes()[1..]);
    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..]);
    EthAddress(address)
}

fn parse_recovery_id(v: u8) -> Result<RecoveryId, BmvError> {
    let id = match v {
        0 | 27 => 0,
        1 | 28 => 1,
        _ => {
            return Err(BmvError::InvalidSignature(format!(
                "invalid recovery id {v}"
            )))
        }
    };
    RecoveryId::try_from(id)
        .map_err(|_| BmvError::InvalidSignature(format!("invalid recovery id {v}")))
}
