//! Indexer Service - Core business logic
//!
//! ## Write path
//!
//! ```text
//! (Attestation, Block)
//!     │ check block matches attestation
//!     │ (chain, height, hash) indexed? ──yes──→ report existing id
//!     │ another hash at (chain, height)? ──yes──→ ConflictingBlock
//!     │ height != cursor + 1 (or start height)? ──yes──→ CursorRegression / HeightGap
//!     │ allocate block id
//!     │ link origins (write-once)
//!     │ link receipts (origin required, else reported)
//!     │ advance cursors for every satisfied level
//!     └ one atomic batch
//! ```
//!
//! Every check runs before anything is written, so a failed call leaves
//! the tables untouched.

use crate::domain::keys;
use crate::domain::{BlockId, BlockRecord, Cursor, IndexReport, MsgLink};
use crate::error::{IndexError, IndexResult};
use crate::ports::inbound::{IndexQueryApi, IndexerApi};
use crate::ports::outbound::{BatchOperation, IndexMetrics, KeyValueStore, NoopIndexMetrics};
use shared_types::{short_hex, Block, ChainId, ConfLevel, Hash, MsgId};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, error, warn};
use xa_02_attestation::Attestation;

/// Single writer of the index tables.
///
/// Each chain is indexed gap-free: the next height at a confidence level is
/// one above its cursor, or the chain's start height before the first write.
pub struct Indexer<S: KeyValueStore> {
    store: Arc<S>,
    metrics: Arc<dyn IndexMetrics>,
    start_heights: BTreeMap<ChainId, u64>,
}

impl<S: KeyValueStore> Indexer<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            metrics: Arc::new(NoopIndexMetrics),
            start_heights: BTreeMap::new(),
        }
    }

    /// First height accepted for `chain_id` while it has no cursor.
    ///
    /// Chains without a start height accept any first height.
    pub fn with_start_height(mut self, chain_id: ChainId, height: u64) -> Self {
        self.start_heights.insert(chain_id, height);
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn IndexMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Read handle sharing this indexer's store.
    pub fn reader(&self) -> IndexReader<S> {
        IndexReader::new(self.store.clone())
    }

    fn next_block_id(&self) -> IndexResult<BlockId> {
        match self.store.get(keys::BLOCK_SEQUENCE_KEY)? {
            Some(bytes) => keys::decode_u64(&bytes)
                .ok_or_else(|| IndexError::codec("sequence", "expected 8 bytes")),
            None => Ok(1),
        }
    }

    fn read_cursor(&self, chain_id: ChainId, level: ConfLevel) -> IndexResult<Option<u64>> {
        self.store
            .get(&keys::cursor(chain_id, level))?
            .map(|bytes| {
                keys::decode_u64(&bytes)
                    .ok_or_else(|| IndexError::codec("cursor", "expected 8 bytes"))
            })
            .transpose()
    }

    /// Rejects any height other than the next one for the attested level.
    fn check_sequence(&self, chain_id: ChainId, level: ConfLevel, height: u64) -> IndexResult<()> {
        let expected = match self.read_cursor(chain_id, level)? {
            Some(current) if current >= height => {
                error!(
                    chain_id,
                    level = %level,
                    current,
                    attempted = height,
                    "[xa-03] Cursor regression rejected"
                );
                return Err(IndexError::CursorRegression {
                    chain_id,
                    level,
                    current,
                    attempted: height,
                });
            }
            Some(current) => Some(current + 1),
            None => self.start_heights.get(&chain_id).copied(),
        };
        match expected {
            Some(expected) if expected != height => {
                error!(
                    chain_id,
                    level = %level,
                    expected,
                    attempted = height,
                    "[xa-03] Height gap rejected"
                );
                Err(IndexError::HeightGap {
                    chain_id,
                    level,
                    expected,
                    attempted: height,
                })
            }
            _ => Ok(()),
        }
    }
}

impl<S: KeyValueStore> IndexerApi for Indexer<S> {
    fn index(&mut self, attestation: &Attestation, block: &Block) -> IndexResult<IndexReport> {
        if block.chain_id != attestation.chain_id
            || block.height != attestation.height
            || block.hash != attestation.block_hash
        {
            return Err(IndexError::BlockMismatch {
                chain_id: attestation.chain_id,
                height: attestation.height,
                hash: attestation.block_hash,
                actual_chain_id: block.chain_id,
                actual_height: block.height,
                actual_hash: block.hash,
            });
        }
        let chain_id = attestation.chain_id;
        let height = attestation.height;

        if let Some(existing) = self
            .store
            .get(&keys::block_height(chain_id, height, &attestation.block_hash))?
        {
            let block_id = keys::decode_u64(&existing)
                .ok_or_else(|| IndexError::codec("block_height", "expected 8 bytes"))?;
            debug!(chain_id, height, block_id, "[xa-03] Block already indexed");
            return Ok(IndexReport {
                block_id,
                already_indexed: true,
                ..IndexReport::default()
            });
        }
        if let Some((key, _)) = self
            .store
            .prefix_scan(&keys::block_height_prefix(chain_id, height))?
            .into_iter()
            .next()
        {
            return Err(IndexError::ConflictingBlock {
                chain_id,
                height,
                existing: keys::hash_of(&key).unwrap_or_default(),
                attempted: attestation.block_hash,
            });
        }
        self.check_sequence(chain_id, attestation.conf_level, height)?;

        let block_id = self.next_block_id()?;
        let mut report = IndexReport {
            block_id,
            ..IndexReport::default()
        };
        let mut ops = Vec::new();

        let record = BlockRecord {
            id: block_id,
            chain_id,
            height,
            hash: attestation.block_hash,
            conf_level: attestation.conf_level,
            attested_power: attestation.attested_power,
            total_power: attestation.total_power,
            signers: attestation.signatures.len() as u32,
            payload: block.payload.clone(),
        };
        ops.push(BatchOperation::put(
            keys::block(block_id),
            encode("block", &record)?,
        ));
        ops.push(BatchOperation::put(
            keys::block_height(chain_id, height, &attestation.block_hash),
            keys::encode_u64(block_id),
        ));
        ops.push(BatchOperation::put(
            keys::BLOCK_SEQUENCE_KEY,
            keys::encode_u64(block_id + 1),
        ));

        // Links touched by this block, so a message and its receipt in the
        // same payload see each other.
        let mut links: BTreeMap<Hash, MsgLink> = BTreeMap::new();

        for msg in &block.payload.msgs {
            let msg_hash = msg.id.hash();
            match self.load_link(&links, &msg_hash)? {
                Some(link) if link.origin_block_id != block_id => {
                    warn!(
                        chain_id,
                        height,
                        msg = %short_hex(&msg_hash),
                        origin_block_id = link.origin_block_id,
                        "[xa-03] Message already linked to another origin"
                    );
                    report.duplicate_origins.push(msg.id);
                }
                Some(_) => {}
                None => {
                    links.insert(msg_hash, MsgLink::origin(msg.id, block_id));
                    report.msgs_linked += 1;
                }
            }
        }

        for receipt in &block.payload.receipts {
            let msg_hash = receipt.msg_id.hash();
            match self.load_link(&links, &msg_hash)? {
                None => {
                    error!(
                        chain_id,
                        height,
                        msg = %short_hex(&msg_hash),
                        "[xa-03] Receipt precedes its origin message, upstream ordering bug"
                    );
                    report.orphan_receipts.push(receipt.msg_id);
                }
                Some(link) if link.has_receipt() => {
                    warn!(
                        chain_id,
                        height,
                        msg = %short_hex(&msg_hash),
                        receipt_block_id = ?link.receipt_block_id,
                        "[xa-03] Message already has a receipt"
                    );
                    report.duplicate_receipts.push(receipt.msg_id);
                }
                Some(mut link) => {
                    link.receipt_block_id = Some(block_id);
                    link.receipt_success = Some(receipt.success);
                    links.insert(msg_hash, link);
                    report.receipts_linked += 1;
                }
            }
        }

        for (msg_hash, link) in &links {
            ops.push(BatchOperation::put(
                keys::msg_link(msg_hash),
                encode("msg_link", link)?,
            ));
        }

        for level in attestation.conf_level.satisfied() {
            let key = keys::cursor(chain_id, level);
            match self.read_cursor(chain_id, level)? {
                Some(current) if current > height => {
                    error!(
                        chain_id,
                        level = %level,
                        current,
                        attempted = height,
                        "[xa-03] Cursor regression rejected"
                    );
                    return Err(IndexError::CursorRegression {
                        chain_id,
                        level,
                        current,
                        attempted: height,
                    });
                }
                Some(current) if current == height => {}
                _ => {
                    ops.push(BatchOperation::put(key, keys::encode_u64(height)));
                    report.cursors_advanced.push(level);
                }
            }
        }

        self.store.atomic_batch_write(ops)?;

        self.metrics.block_indexed(chain_id, height);
        for _ in &report.orphan_receipts {
            self.metrics.inconsistency(chain_id, "orphan_receipt");
        }
        for _ in &report.duplicate_receipts {
            self.metrics.inconsistency(chain_id, "duplicate_receipt");
        }
        for _ in &report.duplicate_origins {
            self.metrics.inconsistency(chain_id, "duplicate_origin");
        }
        for level in &report.cursors_advanced {
            self.metrics.cursor_advanced(chain_id, *level, height);
        }
        debug!(
            chain_id,
            height,
            block_id,
            hash = %short_hex(&attestation.block_hash),
            msgs = report.msgs_linked,
            receipts = report.receipts_linked,
            "[xa-03] Block indexed"
        );
        Ok(report)
    }
}

impl<S: KeyValueStore> Indexer<S> {
    fn load_link(
        &self,
        pending: &BTreeMap<Hash, MsgLink>,
        msg_hash: &Hash,
    ) -> IndexResult<Option<MsgLink>> {
        if let Some(link) = pending.get(msg_hash) {
            return Ok(Some(link.clone()));
        }
        self.store
            .get(&keys::msg_link(msg_hash))?
            .map(|bytes| decode("msg_link", &bytes))
            .transpose()
    }
}

/// Read handle over the index tables. Cheap to clone.
pub struct IndexReader<S: KeyValueStore> {
    store: Arc<S>,
}

impl<S: KeyValueStore> Clone for IndexReader<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S: KeyValueStore> IndexReader<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Look up a message link by its id.
    pub fn msg_link_for(&self, msg_id: &MsgId) -> IndexResult<Option<MsgLink>> {
        self.msg_link(&msg_id.hash())
    }

    fn block_ids(&self, prefix: &[u8]) -> IndexResult<Vec<(u64, BlockId)>> {
        self.store
            .prefix_scan(prefix)?
            .into_iter()
            .map(|(key, value)| {
                let height = keys::height_of(&key)
                    .ok_or_else(|| IndexError::codec("block_height", "short key"))?;
                let id = keys::decode_u64(&value)
                    .ok_or_else(|| IndexError::codec("block_height", "expected 8 bytes"))?;
                Ok((height, id))
            })
            .collect()
    }
}

impl<S: KeyValueStore> IndexQueryApi for IndexReader<S> {
    fn approved_from(
        &self,
        chain_id: ChainId,
        from_height: u64,
        limit: usize,
    ) -> IndexResult<Vec<BlockRecord>> {
        // At most one row per height, so `limit` keys are enough.
        let rows = self.store.scan_from(
            &keys::chain_prefix(chain_id),
            &keys::block_height_prefix(chain_id, from_height),
            limit,
        )?;
        let mut records = Vec::with_capacity(rows.len());
        for (_, value) in rows {
            let id = keys::decode_u64(&value)
                .ok_or_else(|| IndexError::codec("block_height", "expected 8 bytes"))?;
            if let Some(record) = self.block_by_id(id)? {
                records.push(record);
            }
        }
        Ok(records)
    }

    fn block_at(&self, chain_id: ChainId, height: u64) -> IndexResult<Option<BlockRecord>> {
        match self
            .block_ids(&keys::block_height_prefix(chain_id, height))?
            .first()
        {
            Some((_, id)) => self.block_by_id(*id),
            None => Ok(None),
        }
    }

    fn block_by_id(&self, id: BlockId) -> IndexResult<Option<BlockRecord>> {
        self.store
            .get(&keys::block(id))?
            .map(|bytes| decode("block", &bytes))
            .transpose()
    }

    fn msg_link(&self, msg_hash: &Hash) -> IndexResult<Option<MsgLink>> {
        self.store
            .get(&keys::msg_link(msg_hash))?
            .map(|bytes| decode("msg_link", &bytes))
            .transpose()
    }

    fn cursor(&self, chain_id: ChainId, level: ConfLevel) -> IndexResult<Option<u64>> {
        self.store
            .get(&keys::cursor(chain_id, level))?
            .map(|bytes| {
                keys::decode_u64(&bytes)
                    .ok_or_else(|| IndexError::codec("cursor", "expected 8 bytes"))
            })
            .transpose()
    }

    fn cursors(&self) -> IndexResult<Vec<Cursor>> {
        self.store
            .prefix_scan(keys::CURSOR_PREFIX)?
            .into_iter()
            .map(|(key, value)| {
                let (chain_id, conf_level) = keys::parse_cursor(&key)
                    .ok_or_else(|| IndexError::codec("cursor", "malformed key"))?;
                let height = keys::decode_u64(&value)
                    .ok_or_else(|| IndexError::codec("cursor", "expected 8 bytes"))?;
                Ok(Cursor {
                    chain_id,
                    conf_level,
                    height,
                })
            })
            .collect()
    }
}

fn encode<T: serde::Serialize>(table: &'static str, row: &T) -> IndexResult<Vec<u8>> {
    bincode::serialize(row).map_err(|e| IndexError::codec(table, e))
}

fn decode<T: serde::de::DeserializeOwned>(table: &'static str, bytes: &[u8]) -> IndexResult<T> {
    bincode::deserialize(bytes).map_err(|e| IndexError::codec(table, e))
}
