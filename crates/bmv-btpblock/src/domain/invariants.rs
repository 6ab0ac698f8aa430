//! # Domain Invariants
//!
//! Rules on link state that must hold before a transition is applied.

use super::entities::LinkState;
use super::errors::BmvError;

/// Quorum threshold: `verified * 3 > validators * 2`.
pub fn has_quorum(verified: usize, validators: usize) -> bool {
    verified.saturating_mul(3) > validators.saturating_mul(2)
}

/// Smallest number of signatures that satisfies [`has_quorum`].
pub fn quorum_size(validators: usize) -> usize {
    validators * 2 / 3 + 1
}

/// Invariant: no block update while messages of the prior batch are open.
pub fn invariant_batch_closed(state: &LinkState) -> Result<(), BmvError> {
    let remain = state.remain_message_count()?;
    if remain != 0 {
        return Err(BmvError::LinkStateInvariantViolation(format!(
            "remain must be zero, {remain} messages outstanding"
        )));
    }
    Ok(())
}

/// Invariant: a message proof needs an open batch.
pub fn invariant_batch_open(state: &LinkState) -> Result<u64, BmvError> {
    let remain = state.remain_message_count()?;
    if remain == 0 {
        return Err(BmvError::LinkStateInvariantViolation(
            "remaining message count must be greater than zero".into(),
        ));
    }
    Ok(remain)
}

/// Invariant: the link was bootstrapped from a genesis header.
pub fn invariant_bootstrapped(state: &LinkState) -> Result<(), BmvError> {
    if !state.is_bootstrapped() {
        return Err(BmvError::LinkStateInvariantViolation(
            "link has no trust anchor".into(),
        ));
    }
    Ok(())
}

/// Invariant: height never decreases.
pub fn invariant_height_monotonic(current: u64, new: u64) -> Result<(), BmvError> {
    if new < current {
        return Err(BmvError::LinkStateInvariantViolation(format!(
            "height would go backwards: {current} -> {new}"
        )));
    }
    Ok(())
}
