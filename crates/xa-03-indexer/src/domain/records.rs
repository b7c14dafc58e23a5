//! Indexed tables: Block, MsgLink and Cursor rows.

use serde::{Deserialize, Serialize};
use shared_types::{Block, BlockPayload, ChainId, ConfLevel, Hash, MsgId};

/// Auto-increment primary key of the Block table.
pub type BlockId = u64;

/// Finalized block row, carrying the attested payload.
///
/// Unique on `(chain_id, height, hash)`, looked up by `(chain_id, height)`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRecord {
    pub id: BlockId,
    pub chain_id: ChainId,
    pub height: u64,
    pub hash: Hash,
    pub conf_level: ConfLevel,
    pub attested_power: u128,
    pub total_power: u128,
    pub signers: u32,
    pub payload: BlockPayload,
}

impl BlockRecord {
    /// The attested block as it was indexed.
    pub fn block(&self) -> Block {
        Block {
            chain_id: self.chain_id,
            height: self.height,
            hash: self.hash,
            payload: self.payload.clone(),
        }
    }

    pub fn msg_count(&self) -> usize {
        self.payload.msgs.len()
    }

    pub fn receipt_count(&self) -> usize {
        self.payload.receipts.len()
    }
}

/// Cross-chain message link, keyed by `MsgId::hash`.
///
/// `origin_block_id` is write-once. The receipt fields are set at most once,
/// and only after the origin exists.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgLink {
    pub msg_id: MsgId,
    pub origin_block_id: BlockId,
    pub receipt_block_id: Option<BlockId>,
    pub receipt_success: Option<bool>,
}

impl MsgLink {
    pub fn origin(msg_id: MsgId, origin_block_id: BlockId) -> Self {
        Self {
            msg_id,
            origin_block_id,
            receipt_block_id: None,
            receipt_success: None,
        }
    }

    pub fn has_receipt(&self) -> bool {
        self.receipt_block_id.is_some()
    }
}

/// Highest indexed height of a chain at one confidence level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cursor {
    pub chain_id: ChainId,
    pub conf_level: ConfLevel,
    pub height: u64,
}

/// What one `index` call changed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IndexReport {
    pub block_id: BlockId,
    /// The block was indexed by an earlier call; nothing was written.
    pub already_indexed: bool,
    pub msgs_linked: usize,
    pub receipts_linked: usize,
    /// Receipts whose origin message is not indexed.
    pub orphan_receipts: Vec<MsgId>,
    /// Receipts for messages that already have one.
    pub duplicate_receipts: Vec<MsgId>,
    /// Messages already linked to another origin block.
    pub duplicate_origins: Vec<MsgId>,
    pub cursors_advanced: Vec<ConfLevel>,
}

impl IndexReport {
    /// True when the block exposed an upstream ordering problem.
    pub fn has_inconsistencies(&self) -> bool {
        !self.orphan_receipts.is_empty()
            || !self.duplicate_receipts.is_empty()
            || !self.duplicate_origins.is_empty()
    }
}
