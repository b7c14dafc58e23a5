//! # Core Domain Entities
//!
//! The source-chain content every validator observes and attests to.
//!
//! ## Clusters
//!
//! - **Identity**: `ChainId`, `Hash`, `ValidatorId`
//! - **Content**: `Block`, `BlockPayload`, `XMsg`, `XReceipt`, `MsgId`
//! - **Confidence**: `ConfLevel`

use serde::{Deserialize, Serialize};
use serde_with::{hex::Hex, serde_as};
use sha3::{Digest, Keccak256};
use std::fmt;

// =============================================================================
// CLUSTER A: IDENTITY
// =============================================================================

/// Numeric identifier of a source chain.
pub type ChainId = u64;

/// A 32-byte Keccak-256 hash.
pub type Hash = [u8; 32];

/// A 64-byte Ed25519 signature.
pub type Signature = [u8; 64];

/// A 32-byte Ed25519 public key.
pub type PublicKey = [u8; 32];

/// Identity of a validator in an attesting validator set.
#[serde_as]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct ValidatorId(#[serde_as(as = "Hex")] pub [u8; 32]);

impl ValidatorId {
    /// Derive a validator id from its public key.
    pub fn from_public_key(public_key: &PublicKey) -> Self {
        Self(keccak256(public_key))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for ValidatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ValidatorId({})", short_hex(&self.0))
    }
}

impl fmt::Display for ValidatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&short_hex(&self.0))
    }
}

/// Keccak-256 of `data`.
pub fn keccak256(data: &[u8]) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// First four bytes of `bytes` as hex, for log fields.
pub fn short_hex(bytes: &[u8]) -> String {
    let end = bytes.len().min(4);
    format!("0x{}", hex::encode(&bytes[..end]))
}

// =============================================================================
// CLUSTER B: CONTENT
// =============================================================================

/// Globally unique identifier of a cross-chain message.
///
/// A message is emitted on `source_chain_id` and addressed to
/// `dest_chain_id`; `stream_offset` is its sequence number within that
/// source/destination stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MsgId {
    pub source_chain_id: ChainId,
    pub dest_chain_id: ChainId,
    pub stream_offset: u64,
}

impl MsgId {
    pub fn new(source_chain_id: ChainId, dest_chain_id: ChainId, stream_offset: u64) -> Self {
        Self {
            source_chain_id,
            dest_chain_id,
            stream_offset,
        }
    }

    /// Hash identifying this message in the `MsgLink` table.
    pub fn hash(&self) -> Hash {
        let mut buf = [0u8; 24];
        buf[..8].copy_from_slice(&self.source_chain_id.to_be_bytes());
        buf[8..16].copy_from_slice(&self.dest_chain_id.to_be_bytes());
        buf[16..].copy_from_slice(&self.stream_offset.to_be_bytes());
        keccak256(&buf)
    }
}

/// A cross-chain message emitted by a source-chain block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct XMsg {
    pub id: MsgId,
    #[serde(default, with = "hex_bytes")]
    pub data: Vec<u8>,
}

/// Receipt recorded on the destination chain after a message was consumed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct XReceipt {
    pub msg_id: MsgId,
    pub success: bool,
}

/// The application content of a block.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BlockPayload {
    /// Messages emitted by this block.
    #[serde(default)]
    pub msgs: Vec<XMsg>,
    /// Receipts for messages consumed by this block.
    #[serde(default)]
    pub receipts: Vec<XReceipt>,
}

/// A source chain's content at one height.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub chain_id: ChainId,
    pub height: u64,
    #[serde_as(as = "Hex")]
    pub hash: Hash,
    #[serde(default)]
    pub payload: BlockPayload,
}

impl Block {
    /// Build a block whose hash commits to its chain, height and payload.
    pub fn new(chain_id: ChainId, height: u64, payload: BlockPayload) -> Self {
        let hash = Self::content_hash(chain_id, height, &payload);
        Self {
            chain_id,
            height,
            hash,
            payload,
        }
    }

    /// Keccak-256 commitment over the block's content.
    pub fn content_hash(chain_id: ChainId, height: u64, payload: &BlockPayload) -> Hash {
        let mut hasher = Keccak256::new();
        hasher.update(chain_id.to_be_bytes());
        hasher.update(height.to_be_bytes());
        for msg in &payload.msgs {
            hasher.update(msg.id.hash());
            hasher.update((msg.data.len() as u64).to_be_bytes());
            hasher.update(&msg.data);
        }
        for receipt in &payload.receipts {
            hasher.update(receipt.msg_id.hash());
            hasher.update([u8::from(receipt.success)]);
        }
        hasher.finalize().into()
    }
}

// =============================================================================
// CLUSTER C: CONFIDENCE
// =============================================================================

/// Confidence tier at which a height is considered final.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ConfLevel {
    /// Latest block seen by the source chain client.
    Latest = 1,
    /// Finalized by the source chain's own consensus.
    #[default]
    Finalized = 4,
}

impl ConfLevel {
    pub const ALL: [ConfLevel; 2] = [ConfLevel::Latest, ConfLevel::Finalized];

    /// Every tier implied by an attestation at this level, weakest first.
    pub fn satisfied(self) -> impl Iterator<Item = ConfLevel> {
        Self::ALL.into_iter().filter(move |level| *level <= self)
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(ConfLevel::Latest),
            4 => Some(ConfLevel::Finalized),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ConfLevel::Latest => "latest",
            ConfLevel::Finalized => "finalized",
        }
    }
}

impl fmt::Display for ConfLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(s.trim_start_matches("0x")).map_err(serde::de::Error::custom)
    }
}
