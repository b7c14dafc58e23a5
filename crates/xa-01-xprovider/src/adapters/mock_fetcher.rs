//! In-memory block fetcher
//!
//! Implements `BlockFetcher` over a map of prepared blocks, with scripted
//! transient failures. Used by tests and local devnets.

use crate::error::FetchError;
use crate::ports::outbound::BlockFetcher;
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use shared_types::{Block, BlockPayload, ChainId};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// Block fetcher backed by an in-memory map.
///
/// Heights without a block report "not yet available".
#[derive(Default)]
pub struct MockBlockFetcher {
    blocks: RwLock<BTreeMap<(ChainId, u64), Block>>,
    failures: Mutex<BTreeMap<ChainId, u32>>,
    fetches: AtomicU64,
}

impl MockBlockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate `count` empty blocks starting at `from`.
    pub fn with_chain(chain_id: ChainId, from: u64, count: u64) -> Self {
        let fetcher = Self::new();
        for height in from..from + count {
            fetcher.insert(Block::new(chain_id, height, BlockPayload::default()));
        }
        fetcher
    }

    /// Make a block available.
    pub fn insert(&self, block: Block) {
        self.blocks
            .write()
            .insert((block.chain_id, block.height), block);
    }

    /// Fail the next `count` fetches for `chain_id` with a transport error.
    pub fn fail_next(&self, chain_id: ChainId, count: u32) {
        *self.failures.lock().entry(chain_id).or_default() += count;
    }

    /// Total fetch calls, including failed ones.
    pub fn fetch_count(&self) -> u64 {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BlockFetcher for MockBlockFetcher {
    async fn fetch_block(
        &self,
        chain_id: ChainId,
        height: u64,
    ) -> Result<Option<Block>, FetchError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);

        {
            let mut failures = self.failures.lock();
            if let Some(remaining) = failures.get_mut(&chain_id) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(FetchError::Transport(format!(
                        "injected failure for chain {chain_id}"
                    )));
                }
            }
        }

        let block = self.blocks.read().get(&(chain_id, height)).cloned();
        if block.is_none() {
            debug!("[xa-01] Mock chain {} has no block at {}", chain_id, height);
        }
        Ok(block)
    }
}
