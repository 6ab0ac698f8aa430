//! # Test Fixtures
//!
//! A simulated source chain and relayer driving a real verifier.
//!
//! - [`Validators`]: secp256k1 keys and the proof context they form
//! - [`SourceChain`]: produces BTP block headers and signs their decisions
//! - [`Link`]: a verifier over an in-memory store plus the chain feeding it

use std::sync::Arc;

use bmv_btpblock::{
    keccak256, root_from_path, BlockHeader, BlockUpdate, BmvApi, BmvConfig, BmvError,
    BtpMessageVerifier, EthAddress, Hash, InMemoryStore, KeyValueStore, LinkState,
    MessageProof, NetworkTypeSection, NetworkTypeSectionDecision, ProofContext, Proofs,
    RelayElement, RelayMessage, LINK_STATE_KEY,
};
use bmv_btpblock::algorithms::{address_from_pubkey, compute_messages_root};
use bmv_btpblock::domain::quorum_size;
use bmv_codec::Encodable;
use k256::ecdsa::SigningKey;

/// Source network id used by every fixture.
pub const SRC_NETWORK_ID: &str = "btp://0x1.icon";
/// Network type id used by every fixture.
pub const NETWORK_TYPE_ID: u32 = 1;
/// Network id of the simulated section.
pub const NID: u64 = 1;
/// Account of the destination message center.
pub const BMC: &str = "cx0000000000000000000000000000000000000001";
/// Account of the source message center.
pub const SRC_BMC: &str = "0x5cc307268a1393ab9a764a20dace848ab8275c46";
/// Main height of the genesis header.
pub const GENESIS_HEIGHT: u64 = 100;

/// A validator set with its signing keys.
pub struct Validators {
    keys: Vec<SigningKey>,
}

impl Validators {
    /// `n` fresh random validators.
    pub fn random(n: usize) -> Self {
        Self {
            keys: (0..n)
                .map(|_| SigningKey::random(&mut rand::thread_rng()))
                .collect(),
        }
    }

    /// Number of validators.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Validator addresses in slot order.
    pub fn addresses(&self) -> Vec<EthAddress> {
        self.keys
            .iter()
            .map(|k| address_from_pubkey(k.verifying_key()))
            .collect()
    }

    /// The proof context these validators form.
    pub fn context(&self) -> ProofContext {
        ProofContext::new(self.addresses())
    }

    /// Encoded proof context as revealed in a header.
    pub fn encoded_context(&self) -> Vec<u8> {
        self.context().to_rlp()
    }

    /// Committed hash of the proof context.
    pub fn context_hash(&self) -> Hash {
        keccak256(&self.encoded_context())
    }

    /// Signature of validator `index` over `hash`.
    pub fn signature(&self, index: usize, hash: &Hash) -> Vec<u8> {
        let (sig, recid) = self.keys[index]
            .sign_prehash_recoverable(hash)
            .expect("prehash signing");
        let mut out = sig.to_bytes().to_vec();
        out.push(recid.to_byte());
        out
    }

    /// Slot-aligned proofs signed by the validators in `signers`.
    pub fn sign(&self, hash: &Hash, signers: &[usize]) -> Proofs {
        Proofs {
            signatures: (0..self.len())
                .map(|i| signers.contains(&i).then(|| self.signature(i, hash)))
                .collect(),
        }
    }
}

/// Numbered message payloads.
pub fn messages(prefix: &str, n: usize) -> Vec<Vec<u8>> {
    (0..n).map(|i| format!("{prefix}-{i}").into_bytes()).collect()
}

/// Simulated source chain producing one network section per block.
pub struct SourceChain {
    validators: Validators,
    /// Main height of the last produced block.
    pub height: u64,
    /// Source sequence of the next batch's first message.
    pub next_sn: u64,
    /// Hash of the last produced network section.
    pub last_section_hash: Option<Hash>,
}

impl SourceChain {
    /// A chain signed by `validators`, not yet at genesis.
    pub fn new(validators: Validators) -> Self {
        Self {
            validators,
            height: GENESIS_HEIGHT,
            next_sn: 0,
            last_section_hash: None,
        }
    }

    /// Active validators.
    pub fn validators(&self) -> &Validators {
        &self.validators
    }

    /// Genesis header carrying the current validator set; commits it.
    pub fn genesis(&mut self) -> BlockHeader {
        let header = BlockHeader {
            main_height: GENESIS_HEIGHT,
            round: 0,
            next_proof_context_hash: self.validators.context_hash(),
            network_section_to_root: vec![],
            nid: NID,
            update_number: self.next_sn << 1,
            prev: None,
            message_count: 0,
            message_root: None,
            next_proof_context: Some(self.validators.encoded_context()),
        };
        self.commit(&header);
        header
    }

    /// Next header carrying `messages`, not committed.
    pub fn next_header(&self, messages: &[Vec<u8>]) -> BlockHeader {
        BlockHeader {
            main_height: self.height + 1,
            round: 0,
            next_proof_context_hash: self.validators.context_hash(),
            network_section_to_root: vec![],
            nid: NID,
            update_number: self.next_sn << 1,
            prev: self.last_section_hash,
            message_count: messages.len() as u64,
            message_root: compute_messages_root(messages),
            next_proof_context: None,
        }
    }

    /// Next header handing over to `next`, not committed.
    pub fn rotation_header(&self, messages: &[Vec<u8>], next: &Validators) -> BlockHeader {
        let mut header = self.next_header(messages);
        header.update_number |= 1;
        header.next_proof_context_hash = next.context_hash();
        header.next_proof_context = Some(next.encoded_context());
        header
    }

    /// The decision validators sign for `header`.
    pub fn decision(&self, header: &BlockHeader) -> NetworkTypeSectionDecision {
        let section = header.network_section().hash();
        NetworkTypeSectionDecision {
            src_network_id: SRC_NETWORK_ID.as_bytes().to_vec(),
            network_type_id: NETWORK_TYPE_ID,
            height: header.main_height,
            round: header.round,
            network_type_section_hash: NetworkTypeSection {
                next_proof_context_hash: header.next_proof_context_hash,
                network_sections_root: root_from_path(section, &header.network_section_to_root),
            }
            .hash(),
        }
    }

    /// Sign `header` with the validators in `signers`.
    pub fn sign(&self, header: BlockHeader, signers: &[usize]) -> BlockUpdate {
        let proofs = self.validators.sign(&self.decision(&header).hash(), signers);
        BlockUpdate { header, proofs }
    }

    /// Sign `header` with a bare quorum.
    pub fn sign_quorum(&self, header: BlockHeader) -> BlockUpdate {
        let signers: Vec<usize> = (0..quorum_size(self.validators.len())).collect();
        self.sign(header, &signers)
    }

    /// Advance the chain past `header`.
    pub fn commit(&mut self, header: &BlockHeader) {
        self.height = header.main_height;
        self.next_sn = header.first_message_sn() + header.message_count;
        self.last_section_hash = Some(header.network_section().hash());
    }

    /// Hand signing over to `next`.
    pub fn rotate(&mut self, next: Validators) {
        self.validators = next;
    }

    /// Produce, quorum-sign and commit a block carrying `messages`.
    pub fn produce(&mut self, messages: &[Vec<u8>]) -> BlockUpdate {
        let update = self.sign_quorum(self.next_header(messages));
        self.commit(&update.header);
        update
    }
}

/// Encode relay elements into a relay message payload.
pub fn relay(elements: Vec<RelayElement>) -> Vec<u8> {
    RelayMessage { elements }.to_rlp()
}

/// Block update element.
pub fn update_element(update: BlockUpdate) -> RelayElement {
    RelayElement::BlockUpdate(update)
}

/// Message proof element.
pub fn proof_element(proof: MessageProof) -> RelayElement {
    RelayElement::MessageProof(proof)
}

/// Verifier configuration for the fixture link.
pub fn config(sequence_offset: u64, genesis: &BlockHeader) -> BmvConfig {
    BmvConfig {
        src_network_id: SRC_NETWORK_ID.to_string(),
        network_type_id: NETWORK_TYPE_ID,
        bmc: BMC.to_string(),
        sequence_offset,
        genesis_header: Some(genesis.to_rlp()),
    }
}

/// A bootstrapped verifier with the chain feeding it.
pub struct Link {
    /// Backing store, shared with the verifier.
    pub store: Arc<InMemoryStore>,
    /// Verifier under test.
    pub verifier: BtpMessageVerifier<Arc<InMemoryStore>>,
    /// Source chain.
    pub chain: SourceChain,
}

impl Link {
    /// Link with `n` validators and no sequence offset.
    pub fn new(n: usize) -> Self {
        Self::with_offset(n, 0)
    }

    /// Link with `n` validators and a sequence offset.
    pub fn with_offset(n: usize, sequence_offset: u64) -> Self {
        let mut chain = SourceChain::new(Validators::random(n));
        let genesis = chain.genesis();
        let store = Arc::new(InMemoryStore::new());
        let verifier =
            BtpMessageVerifier::initialize(Arc::clone(&store), &config(sequence_offset, &genesis))
                .expect("initialize verifier");
        Self {
            store,
            verifier,
            chain,
        }
    }

    /// Address of the destination message center.
    pub fn bmc_address() -> String {
        format!("btp://0x2.dst/{BMC}")
    }

    /// Address of the source message center.
    pub fn prev_address() -> String {
        format!("btp://0x1.icon/{SRC_BMC}")
    }

    /// Persisted link state.
    pub fn state(&self) -> LinkState {
        self.verifier.link_state().expect("link state")
    }

    /// Raw persisted link state bytes.
    pub fn raw_state(&self) -> Option<Vec<u8>> {
        self.store.get(LINK_STATE_KEY)
    }

    /// Sequence the verifier expects next.
    pub fn next_seq(&self) -> u64 {
        self.state().next_sequence().expect("next sequence")
    }

    /// Submit `elements` with the expected sequence.
    pub fn submit(&mut self, elements: Vec<RelayElement>) -> Result<Vec<Vec<u8>>, BmvError> {
        let seq = self.next_seq();
        self.submit_at(seq, elements)
    }

    /// Submit `elements` declaring `seq`.
    pub fn submit_at(
        &mut self,
        seq: u64,
        elements: Vec<RelayElement>,
    ) -> Result<Vec<Vec<u8>>, BmvError> {
        self.submit_raw(seq, &relay(elements))
    }

    /// Submit an already encoded payload.
    pub fn submit_raw(&mut self, seq: u64, msg: &[u8]) -> Result<Vec<Vec<u8>>, BmvError> {
        self.verifier
            .handle_relay_message(BMC, &Self::bmc_address(), &Self::prev_address(), seq, msg)
    }
}
