//! # Domain Value Objects
//!
//! Immutable value types: addresses, hash-tree path steps, and the section
//! and decision structures whose canonical encodings get hashed and signed.

use bmv_codec::{CodecError, Decodable, Encodable, Reader, Writer};
use serde::{Deserialize, Serialize};
use serde_with::{hex::Hex, serde_as};
use std::fmt;
use std::str::FromStr;

use super::errors::{BmvError, Hash};

/// Ethereum-style validator address (last 20 bytes of keccak256(pubkey)).
#[serde_as]
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EthAddress(#[serde_as(as = "Hex")] pub [u8; 20]);

impl EthAddress {
    /// Raw address bytes.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl fmt::Display for EthAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for EthAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EthAddress({self})")
    }
}

impl Encodable for EthAddress {
    fn encode(&self, w: &mut Writer) {
        w.write_bytes(&self.0);
    }
}

impl Decodable for EthAddress {
    fn decode(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        r.read_array::<20>().map(EthAddress)
    }
}

/// BTP address: `btp://<network>/<account>`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BtpAddress {
    /// Network part, e.g. `0x1.icon`.
    pub network: String,
    /// Account part, e.g. the message center contract address.
    pub account: String,
}

const BTP_SCHEME: &str = "btp://";

impl FromStr for BtpAddress {
    type Err = BmvError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s
            .strip_prefix(BTP_SCHEME)
            .ok_or_else(|| BmvError::InvalidBtpAddress(s.to_string()))?;
        match rest.split_once('/') {
            Some((network, account))
                if !network.is_empty() && !account.is_empty() && !account.contains('/') =>
            {
                Ok(Self {
                    network: network.to_string(),
                    account: account.to_string(),
                })
            }
            _ => Err(BmvError::InvalidBtpAddress(s.to_string())),
        }
    }
}

impl fmt::Display for BtpAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{BTP_SCHEME}{}/{}", self.network, self.account)
    }
}

/// Side on which a sibling sits in a section-tree path step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// Sibling is on the left: `hash(sibling ‖ acc)`.
    Left,
    /// Sibling is on the right: `hash(acc ‖ sibling)`.
    Right,
    /// Unrecognised tag; the step leaves the accumulator unchanged.
    Other(u64),
}

impl Direction {
    /// Wire tag for `Left`.
    pub const LEFT: u64 = 0;
    /// Wire tag for `Right`.
    pub const RIGHT: u64 = 1;

    /// Map a wire tag.
    pub fn from_tag(tag: u64) -> Self {
        match tag {
            Self::LEFT => Direction::Left,
            Self::RIGHT => Direction::Right,
            other => Direction::Other(other),
        }
    }

    /// Wire tag.
    pub fn tag(&self) -> u64 {
        match self {
            Direction::Left => Self::LEFT,
            Direction::Right => Self::RIGHT,
            Direction::Other(tag) => *tag,
        }
    }
}

/// One step of the path from a network section up to the sections root.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionToRoot {
    /// Which side the sibling is on.
    pub dir: Direction,
    /// Sibling hash (may be empty).
    #[serde_as(as = "Hex")]
    pub value: Vec<u8>,
}

impl SectionToRoot {
    /// Sibling on the left.
    pub fn left(value: Hash) -> Self {
        Self {
            dir: Direction::Left,
            value: value.to_vec(),
        }
    }

    /// Sibling on the right.
    pub fn right(value: Hash) -> Self {
        Self {
            dir: Direction::Right,
            value: value.to_vec(),
        }
    }
}

impl Encodable for SectionToRoot {
    fn encode(&self, w: &mut Writer) {
        w.begin_list();
        w.write_u64(self.dir.tag());
        w.write_bytes(&self.value);
        w.end_list();
    }
}

impl Decodable for SectionToRoot {
    fn decode(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        let mut list = r.read_list()?;
        let dir = Direction::from_tag(list.read_u64()?);
        let value = list.read_bytes()?.to_vec();
        list.finish()?;
        Ok(Self { dir, value })
    }
}

/// A subtree root in a message proof, with the number of leaves it covers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProofNode {
    /// Leaves under this subtree.
    pub num_of_leaf: u64,
    /// Subtree root hash.
    pub value: Hash,
}

impl ProofNode {
    /// Create a proof node.
    pub fn new(num_of_leaf: u64, value: Hash) -> Self {
        Self { num_of_leaf, value }
    }
}

impl Encodable for ProofNode {
    fn encode(&self, w: &mut Writer) {
        w.begin_list();
        w.write_u64(self.num_of_leaf);
        w.write_bytes(&self.value);
        w.end_list();
    }
}

impl Decodable for ProofNode {
    fn decode(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        let mut list = r.read_list()?;
        let num_of_leaf = list.read_u64()?;
        let value = list.read_array::<32>()?;
        list.finish()?;
        Ok(Self { num_of_leaf, value })
    }
}

/// Per-network metadata of one BTP block; its hash links consecutive updates.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NetworkSection {
    /// Network id of the link's section.
    pub nid: u64,
    /// `(first message sn << 1) | rotation flag`.
    pub update_number: u64,
    /// Hash of the previous network section (`None` at genesis).
    pub prev: Option<Hash>,
    /// Messages in this section's batch.
    pub message_count: u64,
    /// Root of the batch's message tree (`None` when empty).
    pub message_root: Option<Hash>,
}

impl Encodable for NetworkSection {
    fn encode(&self, w: &mut Writer) {
        w.begin_list();
        w.write_u64(self.nid);
        w.write_u64(self.update_number);
        self.prev.encode(w);
        w.write_u64(self.message_count);
        self.message_root.encode(w);
        w.end_list();
    }
}

impl Decodable for NetworkSection {
    fn decode(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        let mut list = r.read_list()?;
        let section = Self {
            nid: list.read_u64()?,
            update_number: list.read_u64()?,
            prev: Option::decode(&mut list)?,
            message_count: list.read_u64()?,
            message_root: Option::decode(&mut list)?,
        };
        list.finish()?;
        Ok(section)
    }
}

/// Binds the next validator-set commitment to the network sections root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NetworkTypeSection {
    /// Hash of the validator set that signs the next block.
    pub next_proof_context_hash: Hash,
    /// Root of all network sections of this network type.
    pub network_sections_root: Hash,
}

impl Encodable for NetworkTypeSection {
    fn encode(&self, w: &mut Writer) {
        w.begin_list();
        w.write_bytes(&self.next_proof_context_hash);
        w.write_bytes(&self.network_sections_root);
        w.end_list();
    }
}

impl Decodable for NetworkTypeSection {
    fn decode(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        let mut list = r.read_list()?;
        let section = Self {
            next_proof_context_hash: list.read_array::<32>()?,
            network_sections_root: list.read_array::<32>()?,
        };
        list.finish()?;
        Ok(section)
    }
}

/// The statement validators sign for one block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NetworkTypeSectionDecision {
    /// Source network id (e.g. `0x1.icon`).
    pub src_network_id: Vec<u8>,
    /// Network type id on the source chain.
    pub network_type_id: u32,
    /// Main chain block height.
    pub height: u64,
    /// Consensus round.
    pub round: u32,
    /// Hash of the network type section.
    pub network_type_section_hash: Hash,
}

impl Encodable for NetworkTypeSectionDecision {
    fn encode(&self, w: &mut Writer) {
        w.begin_list();
        w.write_bytes(&self.src_network_id);
        w.write_u64(u64::from(self.network_type_id));
        w.write_u64(self.height);
        w.write_u64(u64::from(self.round));
        w.write_bytes(&self.network_type_section_hash);
        w.end_list();
    }
}

impl Decodable for NetworkTypeSectionDecision {
    fn decode(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        let mut list = r.read_list()?;
        let decision = Self {
            src_network_id: list.read_bytes()?.to_vec(),
            network_type_id: list.read_u32()?,
            height: list.read_u64()?,
            round: list.read_u32()?,
            network_type_section_hash: list.read_array::<32>()?,
        };
        list.finish()?;
        Ok(decision)
    }
}

/// Extra status fields a relay needs to resume.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BmvStatusExtra {
    /// Offset between internal and router sequence numbers.
    pub sequence_offset: u64,
    /// Router-side sequence of the first message of the last batch.
    pub last_first_message_sn: u64,
    /// Size of the last batch.
    pub last_message_count: u64,
}

impl Encodable for BmvStatusExtra {
    fn encode(&self, w: &mut Writer) {
        w.begin_list();
        w.write_u64(self.sequence_offset);
        w.write_u64(self.last_first_message_sn);
        w.write_u64(self.last_message_count);
        w.end_list();
    }
}

impl Decodable for BmvStatusExtra {
    fn decode(r: &mut Reader<'_>) -> Result<Self, CodecError> {
        let mut list = r.read_list()?;
        let extra = Self {
            sequence_offset: list.read_u64()?,
            last_first_message_sn: list.read_u64()?,
            last_message_count: list.read_u64()?,
        };
        list.finish()?;
        Ok(extra)
    }
}

/// Verifier status as reported to relays and monitoring.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BmvStatus {
    /// Last verified source-chain height.
    pub height: u64,
    /// Encoded [`BmvStatusExtra`].
    #[serde_as(as = "Hex")]
    pub extra: Vec<u8>,
}

impl BmvStatus {
    /// Decode the extra field.
    pub fn decode_extra(&self) -> Result<BmvStatusExtra, CodecError> {
        BmvStatusExtra::from_rlp(&self.extra)
    }
}
