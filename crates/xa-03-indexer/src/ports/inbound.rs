//! Driving Ports (API - Inbound)

use crate::domain::{BlockId, BlockRecord, Cursor, IndexReport, MsgLink};
use crate::error::IndexResult;
use shared_types::{Block, ChainId, ConfLevel, Hash};
use xa_02_attestation::Attestation;

/// Write side, driven by the aggregator's delivery path.
///
/// `&mut self` makes the single-writer rule a borrow-checker fact.
pub trait IndexerApi {
    /// Persist an approved attestation together with the block it attests.
    fn index(&mut self, attestation: &Attestation, block: &Block) -> IndexResult<IndexReport>;
}

/// Read side. Never blocks on, nor blocks, the writer.
pub trait IndexQueryApi: Send + Sync {
    /// Up to `limit` blocks of `chain_id` with height `>= from_height`, ascending.
    fn approved_from(
        &self,
        chain_id: ChainId,
        from_height: u64,
        limit: usize,
    ) -> IndexResult<Vec<BlockRecord>>;

    fn block_at(&self, chain_id: ChainId, height: u64) -> IndexResult<Option<BlockRecord>>;

    fn block_by_id(&self, id: BlockId) -> IndexResult<Option<BlockRecord>>;

    fn msg_link(&self, msg_hash: &Hash) -> IndexResult<Option<MsgLink>>;

    fn cursor(&self, chain_id: ChainId, level: ConfLevel) -> IndexResult<Option<u64>>;

    /// Every cursor in chain then level order.
    fn cursors(&self) -> IndexResult<Vec<Cursor>>;
}
