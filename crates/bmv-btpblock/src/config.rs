//! # Verifier Configuration
//!
//! Link identity and bootstrap data supplied when a verifier is created.

use bmv_codec::Decodable;
use serde::{Deserialize, Serialize};
use serde_with::{hex::Hex, serde_as};

use crate::domain::{BlockHeader, BmvError};

/// Block message verifier configuration.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BmvConfig {
    /// Source network id, e.g. `btp://0x1.icon`.
    pub src_network_id: String,

    /// Network type id on the source chain.
    pub network_type_id: u32,

    /// Address of the local message center.
    pub bmc: String,

    /// Offset between the verifier's sequence and the message center's.
    #[serde(default)]
    pub sequence_offset: u64,

    /// Encoded trusted genesis header, hex in serialized form.
    #[serde_as(as = "Option<Hex>")]
    #[serde(default)]
    pub genesis_header: Option<Vec<u8>>,
}

impl Default for BmvConfig {
    fn default() -> Self {
        Self {
            src_network_id: "btp://0x1.icon".to_string(),
            network_type_id: 1,
            bmc: String::new(),
            sequence_offset: 0,
            genesis_header: None,
        }
    }
}

impl BmvConfig {
    /// Create a config for testing.
    pub fn for_testing() -> Self {
        Self {
            src_network_id: "btp://0x1.icon".to_string(),
            network_type_id: 1,
            bmc: "cx0000000000000000000000000000000000000001".to_string(),
            sequence_offset: 0,
            genesis_header: None,
        }
    }

    /// Attach an encoded genesis header.
    pub fn with_genesis_header(mut self, header: Vec<u8>) -> Self {
        self.genesis_header = Some(header);
        self
    }

    /// Check required fields.
    pub fn validate(&self) -> Result<(), BmvError> {
        if self.src_network_id.is_empty() {
            return Err(BmvError::InvalidConfig("src_network_id is empty".into()));
        }
        if self.bmc.is_empty() {
            return Err(BmvError::InvalidConfig("bmc is empty".into()));
        }
        Ok(())
    }

    /// Decode the genesis header, if any.
    pub fn decode_genesis_header(&self) -> Result<Option<BlockHeader>, BmvError> {
        self.genesis_header
            .as_deref()
            .map(BlockHeader::from_rlp)
            .transpose()
            .map_err(BmvError::from)
    }
}
