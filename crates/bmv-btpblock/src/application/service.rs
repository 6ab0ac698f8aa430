//! # BTP Message Verifier Service
//!
//! Application service that drives relay messages through the block update
//! and message proof transitions.
//!
//! Every call loads the link state once, applies all elements to a working
//! copy and commits it with a single store write. Any error discards the
//! working copy, so persisted state is only ever replaced as a whole.

use bmv_codec::Decodable;
use bmv_telemetry::{
    metric_inc, BLOCK_UPDATES_VERIFIED, LINK_HEIGHT, MESSAGES_EXTRACTED, QUORUM_SIGNATURES,
    RELAY_MESSAGES, VALIDATOR_ROTATIONS,
};
use tracing::{debug, info, warn};

use crate::adapters::LinkStateStore;
use crate::algorithms::{apply_block_update, bootstrap_genesis, extract_messages, AppliedUpdate};
use crate::config::BmvConfig;
use crate::domain::{
    invariant_bootstrapped, BlockHeader, BmvError, BmvStatus, BmvStatusExtra, BtpAddress,
    LinkState, RelayElement, RelayMessage,
};
use crate::ports::{BmvApi, KeyValueStore};

/// Block message verifier for one BTP link.
pub struct BtpMessageVerifier<S: KeyValueStore> {
    store: LinkStateStore<S>,
}

/// Work done by one relay message, recorded once it commits.
#[derive(Default)]
struct CallSummary {
    updates: Vec<AppliedUpdate>,
    messages: Vec<Vec<u8>>,
}

impl<S: KeyValueStore> BtpMessageVerifier<S> {
    /// Create the link state from `config` and persist it.
    ///
    /// With a genesis header the link is bootstrapped immediately; without
    /// one it stays configured but rejects relay messages.
    pub fn initialize(store: S, config: &BmvConfig) -> Result<Self, BmvError> {
        config.validate()?;
        let store = LinkStateStore::new(store);
        if store.load()?.is_some() {
            return Err(BmvError::LinkStateInvariantViolation(
                "link state already initialised".into(),
            ));
        }

        let mut state = LinkState::new(
            config.src_network_id.clone(),
            config.network_type_id,
            config.bmc.clone(),
            config.sequence_offset,
        );
        if let Some(header) = config.decode_genesis_header()? {
            bootstrap_genesis(&mut state, &header)?;
            info!(
                src = %state.src_network_id,
                height = state.height,
                validators = state.proof_context.as_ref().map_or(0, |pc| pc.len()),
                "Link bootstrapped from genesis header"
            );
        }
        store.save(&state);
        LINK_HEIGHT.set(height_gauge(state.height));

        Ok(Self { store })
    }

    /// Resume a verifier from persisted state.
    pub fn open(store: S) -> Result<Self, BmvError> {
        let store = LinkStateStore::new(store);
        let state = store.load_existing()?;
        debug!(src = %state.src_network_id, height = state.height, "Link state loaded");
        Ok(Self { store })
    }

    /// Current persisted link state.
    pub fn link_state(&self) -> Result<LinkState, BmvError> {
        self.store.load_existing()
    }

    /// Decoded status extra.
    pub fn status_extra(&self) -> Result<BmvStatusExtra, BmvError> {
        Ok(self.store.load_existing()?.status_extra())
    }

    fn check_accessible(
        state: &LinkState,
        caller: &str,
        bmc: &str,
        prev: &str,
    ) -> Result<(), BmvError> {
        let current: BtpAddress = bmc.parse()?;
        let previous: BtpAddress = prev.parse()?;
        if previous.network != state.network() {
            return Err(BmvError::AccessDenied(format!("invalid prev bmc: {prev}")));
        }
        if caller != state.bmc {
            return Err(BmvError::AccessDenied(format!("invalid caller bmc: {caller}")));
        }
        if current.account != state.bmc {
            return Err(BmvError::AccessDenied(format!("invalid current bmc: {bmc}")));
        }
        Ok(())
    }

    fn process(
        &self,
        caller: &str,
        bmc: &str,
        prev: &str,
        seq: u64,
        msg: &[u8],
    ) -> Result<CallSummary, BmvError> {
        let state = self.store.load_existing()?;
        Self::check_accessible(&state, caller, bmc, prev)?;

        let expected = state.next_sequence()?;
        if expected != seq {
            return Err(BmvError::SequenceMismatch {
                expected,
                actual: seq,
            });
        }
        invariant_bootstrapped(&state)?;

        let relay = RelayMessage::from_rlp(msg)?;
        let mut working = state;
        let mut summary = CallSummary::default();
        let mut paired: Option<BlockHeader> = None;

        for (index, element) in relay.elements.into_iter().enumerate() {
            match element {
                RelayElement::BlockUpdate(update) => {
                    debug!(index, height = update.header.main_height, "Block update element");
                    let applied = apply_block_update(&mut working, &update)?;
                    summary.updates.push(applied);
                    paired = Some(update.header);
                }
                RelayElement::MessageProof(proof) => {
                    debug!(index, messages = proof.messages.len(), "Message proof element");
                    let messages = extract_messages(&mut working, &proof, paired.as_ref())?;
                    paired = None;
                    summary.messages.extend(messages);
                }
            }
        }

        self.store.save(&working);
        LINK_HEIGHT.set(height_gauge(working.height));
        Ok(summary)
    }
}

impl<S: KeyValueStore> BmvApi for BtpMessageVerifier<S> {
    fn handle_relay_message(
        &mut self,
        caller: &str,
        bmc: &str,
        prev: &str,
        seq: u64,
        msg: &[u8],
    ) -> Result<Vec<Vec<u8>>, BmvError> {
        match self.process(caller, bmc, prev, seq, msg) {
            Ok(summary) => {
                for update in &summary.updates {
                    metric_inc!(BLOCK_UPDATES_VERIFIED);
                    QUORUM_SIGNATURES.observe(update.verified_signatures as f64);
                    if update.rotated {
                        metric_inc!(VALIDATOR_ROTATIONS);
                    }
                    info!(
                        height = update.height,
                        messages = update.message_count,
                        signatures = update.verified_signatures,
                        rotated = update.rotated,
                        "Block update verified"
                    );
                }
                MESSAGES_EXTRACTED.inc_by(summary.messages.len() as u64);
                metric_inc!(RELAY_MESSAGES, &["accepted"]);
                if !summary.messages.is_empty() {
                    info!(seq, count = summary.messages.len(), "Messages extracted");
                }
                Ok(summary.messages)
            }
            Err(e) => {
                let outcome = match &e {
                    BmvError::AlreadyVerified { .. } => "already_verified",
                    BmvError::NotVerifiable { .. } => "not_verifiable",
                    _ => "rejected",
                };
                metric_inc!(RELAY_MESSAGES, &[outcome]);
                warn!(seq, code = e.code(), error = %e, "Relay message rejected");
                Err(e)
            }
        }
    }

    fn get_status(&self) -> Result<BmvStatus, BmvError> {
        Ok(self.store.load_existing()?.status())
    }
}

fn height_gauge(height: u64) -> i64 {
    i64::try_from(height).unwrap_or(i64::MAX)
}
