//! # Domain Entities
//!
//! Decoded relay payload structures and the persisted per-link state.

use bmv_codec::{decode_list, encode_list, CodecError, Decodable, Encodable, Reader, Writer};

use super::errors::{BmvError, Hash};
use super::value_objects::{
    BmvStatus, BmvStatusExtra, EthAddress, NetworkSection, ProofNode, SectionToRoot,
};

/// BTP block header for one network type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockHeader {
    /// Main chain height.
    pub main_height: u64,
    /// Consensus round.
    pub round: u32,
    /// Hash of the validator set that signs the next block.
    pub next_proof_context_hash: Hash,
    /// Path from this network's section up to the sections root.
    pub network_section_to_root: Vec<SectionToRoot>,
    /// Network id.
    pub nid: u64,
    /// `(first message sn << 1) | rotation flag`.
    pub update_number: u64,
    /// Previous network section hash.
    pub prev: Option<Hash>,
    /// Messages in this block's batch.
    pub message_count: u64,
    /// Message tree root.
    pub message_root: Option<Hash>,
    /// Revealed validator set, present when rotating.
    pub next_proof_context: Option<Vec<u8>>,
}

impl BlockHeader {
    /// Source-side sequence of this batch's first message.
    pub fn first_message_sn(&self) -> u64 {
        self.update_number >> 1
    }

    /// Whether the rotation flag is set.
    pub fn has_next_proof_context(&self) -> bool {
        self.update_number & 1 == 1
    }

    /// The network section this header describes.
    pub fn network_section(&self) -> NetworkSection {
        NetworkSection {
            nid: self.nid,
            update_number: self.update_number,
            prev: self.prev,
            message_count: self.message_count,
            message_root: self.message_root,
        }
    }
}

impl Encodable for BlockHeader {
    fn encode(&self, w: &mut Writer) {
        w.begin_list();
        w.write_u64(self.main_height);
        w.write_u64(u64::from(self.round));
        w.write_bytes(&self.next_proof_context_hash);
        encode_list(w, &self.network_section_to_root);
        w.write_u64(self.nid);
        w.write_u64(self.update_number);
        self.prev.encode(w);
        w.write_u64(self.message_count);
        self.message_root.encode(w);
        self.next_proof_context.encode(w);
        w.end_list();
    }
}

impl Decodable for BlockHeader {
    fn decode(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        let mut list = r.read_list()?;
        let header = Self {
            main_height: list.read_u64()?,
            round: list.read_u32()?,
            next_proof_context_hash: list.read_array::<32>()?,
            network_section_to_root: decode_list(&mut list)?,
            nid: list.read_u64()?,
            update_number: list.read_u64()?,
            prev: Option::decode(&mut list)?,
            message_count: list.read_u64()?,
            message_root: Option::decode(&mut list)?,
            next_proof_context: Option::decode(&mut list)?,
        };
        list.finish()?;
        Ok(header)
    }
}

/// Signature slots aligned with the validator set; absent slots are `None`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Proofs {
    /// 65-byte `r ‖ s ‖ v` signatures.
    pub signatures: Vec<Option<Vec<u8>>>,
}

impl Encodable for Proofs {
    fn encode(&self, w: &mut Writer) {
        encode_list(w, &self.signatures);
    }
}

impl Decodable for Proofs {
    fn decode(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            signatures: decode_list(r)?,
        })
    }
}

/// A header plus the quorum signatures over its decision.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockUpdate {
    /// Decoded header.
    pub header: BlockHeader,
    /// Signature bundle.
    pub proofs: Proofs,
}

impl Encodable for BlockUpdate {
    fn encode(&self, w: &mut Writer) {
        w.begin_list();
        w.write_bytes(&self.header.to_rlp());
        w.write_bytes(&self.proofs.to_rlp());
        w.end_list();
    }
}

impl Decodable for BlockUpdate {
    fn decode(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        let mut list = r.read_list()?;
        let header = BlockHeader::from_rlp(list.read_bytes()?)?;
        let proofs = Proofs::from_rlp(list.read_bytes()?)?;
        list.finish()?;
        Ok(Self { header, proofs })
    }
}

/// The validator set allowed to sign decisions.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProofContext {
    /// Validator addresses in slot order.
    pub validators: Vec<EthAddress>,
}

impl ProofContext {
    /// Create from addresses.
    pub fn new(validators: Vec<EthAddress>) -> Self {
        Self { validators }
    }

    /// Number of validators.
    pub fn len(&self) -> usize {
        self.validators.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    /// Membership test.
    pub fn is_validator(&self, address: &EthAddress) -> bool {
        self.validators.contains(address)
    }
}

impl Encodable for ProofContext {
    fn encode(&self, w: &mut Writer) {
        encode_list(w, &self.validators);
    }
}

impl Decodable for ProofContext {
    fn decode(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            validators: decode_list(r)?,
        })
    }
}

/// Inclusion proof for a contiguous run of messages in one batch.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MessageProof {
    /// Subtree roots left of the revealed run.
    pub left: Vec<ProofNode>,
    /// Revealed messages.
    pub messages: Vec<Vec<u8>>,
    /// Subtree roots right of the revealed run.
    pub right: Vec<ProofNode>,
}

impl Encodable for MessageProof {
    fn encode(&self, w: &mut Writer) {
        w.begin_list();
        encode_list(w, &self.left);
        encode_list(w, &self.messages);
        encode_list(w, &self.right);
        w.end_list();
    }
}

impl Decodable for MessageProof {
    fn decode(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        let mut list = r.read_list()?;
        let proof = Self {
            left: decode_list(&mut list)?,
            messages: decode_list(&mut list)?,
            right: decode_list(&mut list)?,
        };
        list.finish()?;
        Ok(proof)
    }
}

/// One typed element of a relay message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RelayElement {
    /// Type tag 1.
    BlockUpdate(BlockUpdate),
    /// Type tag 2.
    MessageProof(MessageProof),
}

impl RelayElement {
    /// Wire tag of a block update.
    pub const TYPE_BLOCK_UPDATE: u64 = 1;
    /// Wire tag of a message proof.
    pub const TYPE_MESSAGE_PROOF: u64 = 2;

    /// Wire tag.
    pub fn type_tag(&self) -> u64 {
        match self {
            RelayElement::BlockUpdate(_) => Self::TYPE_BLOCK_UPDATE,
            RelayElement::MessageProof(_) => Self::TYPE_MESSAGE_PROOF,
        }
    }
}

impl Encodable for RelayElement {
    fn encode(&self, w: &mut Writer) {
        let payload = match self {
            RelayElement::BlockUpdate(update) => update.to_rlp(),
            RelayElement::MessageProof(proof) => proof.to_rlp(),
        };
        w.begin_list();
        w.write_u64(self.type_tag());
        w.write_bytes(&payload);
        w.end_list();
    }
}

impl Decodable for RelayElement {
    fn decode(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        let mut list = r.read_list()?;
        let tag = list.read_u64()?;
        let payload = list.read_bytes()?;
        list.finish()?;
        match tag {
            Self::TYPE_BLOCK_UPDATE => {
                BlockUpdate::from_rlp(payload).map(RelayElement::BlockUpdate)
            }
            Self::TYPE_MESSAGE_PROOF => {
                MessageProof::from_rlp(payload).map(RelayElement::MessageProof)
            }
            tag => Err(CodecError::UnknownTag {
                kind: "relay element",
                tag,
            }),
        }
    }
}

/// Ordered relay payload.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RelayMessage {
    /// Elements in arrival order.
    pub elements: Vec<RelayElement>,
}

impl Encodable for RelayMessage {
    fn encode(&self, w: &mut Writer) {
        encode_list(w, &self.elements);
    }
}

impl Decodable for RelayMessage {
    fn decode(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            elements: decode_list(r)?,
        })
    }
}

/// Current persisted layout version.
pub const LINK_STATE_VERSION: u64 = 1;

/// Persisted per-link verifier state.
///
/// `last_sequence` counts messages in source numbering; the externally
/// visible sequence is `sequence_offset + last_sequence`.
/// `last_first_message_sn` is kept in external numbering.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LinkState {
    /// Source network id, e.g. `btp://0x1.icon`.
    pub src_network_id: String,
    /// Network type id on the source chain.
    pub network_type_id: u32,
    /// Address of the message center allowed to call.
    pub bmc: String,
    /// Offset between internal and external sequence numbers.
    pub sequence_offset: u64,
    /// Network id bound at bootstrap.
    pub network_id: Option<u64>,
    /// Active validator set.
    pub proof_context: Option<ProofContext>,
    /// Committed hash of the validator set for the next block.
    pub proof_context_hash: Option<Hash>,
    /// Hash of the last accepted network section.
    pub last_network_section_hash: Option<Hash>,
    /// Root of the open batch; cleared once fully extracted.
    pub last_messages_root: Option<Hash>,
    /// Size of the last batch.
    pub last_message_count: u64,
    /// External sequence of the last batch's first message.
    pub last_first_message_sn: u64,
    /// Internal sequence counter.
    pub last_sequence: u64,
    /// Last verified main chain height.
    pub height: u64,
}

impl LinkState {
    /// Fresh state for a configured, not yet bootstrapped link.
    pub fn new(
        src_network_id: String,
        network_type_id: u32,
        bmc: String,
        sequence_offset: u64,
    ) -> Self {
        Self {
            src_network_id,
            network_type_id,
            bmc,
            sequence_offset,
            ..Default::default()
        }
    }

    /// Network name of the source: the text after the last `/`.
    pub fn network(&self) -> &str {
        self.src_network_id
            .rsplit('/')
            .next()
            .unwrap_or(self.src_network_id.as_str())
    }

    /// Sequence the next relay message must declare.
    pub fn next_sequence(&self) -> Result<u64, BmvError> {
        self.sequence_offset
            .checked_add(self.last_sequence)
            .ok_or_else(|| BmvError::LinkStateInvariantViolation("sequence overflow".into()))
    }

    /// Messages of the current batch already extracted.
    pub fn processed_message_count(&self) -> Result<u64, BmvError> {
        self.next_sequence()?
            .checked_sub(self.last_first_message_sn)
            .ok_or_else(|| {
                BmvError::LinkStateInvariantViolation(
                    "sequence behind first message sn".into(),
                )
            })
    }

    /// Messages of the current batch not yet extracted.
    pub fn remain_message_count(&self) -> Result<u64, BmvError> {
        self.last_message_count
            .checked_sub(self.processed_message_count()?)
            .ok_or_else(|| {
                BmvError::LinkStateInvariantViolation(
                    "processed more messages than the batch holds".into(),
                )
            })
    }

    /// Whether a genesis header has been applied.
    pub fn is_bootstrapped(&self) -> bool {
        self.network_id.is_some() && self.proof_context.is_some()
    }

    /// Status view for relays.
    pub fn status(&self) -> BmvStatus {
        BmvStatus {
            height: self.height,
            extra: self.status_extra().to_rlp(),
        }
    }

    /// Decoded status extra.
    pub fn status_extra(&self) -> BmvStatusExtra {
        BmvStatusExtra {
            sequence_offset: self.sequence_offset,
            last_first_message_sn: self.last_first_message_sn,
            last_message_count: self.last_message_count,
        }
    }
}

impl Encodable for LinkState {
    fn encode(&self, w: &mut Writer) {
        w.begin_list();
        w.write_u64(LINK_STATE_VERSION);
        self.src_network_id.encode(w);
        w.write_u64(u64::from(self.network_type_id));
        self.bmc.encode(w);
        w.write_u64(self.sequence_offset);
        self.network_id.encode(w);
        self.proof_context.encode(w);
        self.proof_context_hash.encode(w);
        self.last_network_section_hash.encode(w);
        self.last_messages_root.encode(w);
        w.write_u64(self.last_message_count);
        w.write_u64(self.last_first_message_sn);
        w.write_u64(self.last_sequence);
        w.write_u64(self.height);
        w.end_list();
    }
}

impl LinkState {
    /// Decode a persisted record, checking its layout version.
    pub fn from_stored(bytes: &[u8]) -> Result<Self, BmvError> {
        let mut r = Reader::new(bytes);
        let mut list = r.read_list()?;
        let version = list.read_u64()?;
        if version != LINK_STATE_VERSION {
            return Err(BmvError::LinkStateInvariantViolation(format!(
                "unsupported link state version {version}"
            )));
        }
        let state = Self {
            src_network_id: String::decode(&mut list)?,
            network_type_id: list.read_u32()?,
            bmc: String::decode(&mut list)?,
            sequence_offset: list.read_u64()?,
            network_id: Option::decode(&mut list)?,
            proof_context: Option::decode(&mut list)?,
            proof_context_hash: Option::decode(&mut list)?,
            last_network_section_hash: Option::decode(&mut list)?,
            last_messages_root: Option::decode(&mut list)?,
            last_message_count: list.read_u64()?,
            last_first_message_sn: list.read_u64()?,
            last_sequence: list.read_u64()?,
            height: list.read_u64()?,
        };
        list.finish()?;
        r.finish()?;
        Ok(state)
    }
}
