//! Recently fetched blocks, kept until their attestation is indexed.

use lru::LruCache;
use parking_lot::Mutex;
use shared_types::{Block, ChainId, Hash};
use std::num::NonZeroUsize;

type BlockKey = (ChainId, u64, Hash);

/// Bounded LRU of fetched blocks keyed by `(chain, height, hash)`.
///
/// Keying on the hash means a cached block never stands in for a different
/// block the network attested at the same height.
pub struct BlockCache {
    blocks: Mutex<LruCache<BlockKey, Block>>,
}

impl BlockCache {
    /// A zero capacity is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            blocks: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn insert(&self, block: Block) {
        let key = (block.chain_id, block.height, block.hash);
        self.blocks.lock().put(key, block);
    }

    /// Remove and return a block.
    pub fn take(&self, chain_id: ChainId, height: u64, hash: &Hash) -> Option<Block> {
        self.blocks.lock().pop(&(chain_id, height, *hash))
    }

    pub fn contains(&self, chain_id: ChainId, height: u64, hash: &Hash) -> bool {
        self.blocks.lock().contains(&(chain_id, height, *hash))
    }

    pub fn len(&self) -> usize {
        self.blocks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
