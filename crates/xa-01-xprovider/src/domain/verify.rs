//! Block verification step.

use crate::error::FetchError;
use shared_types::{Block, ChainId};

/// Confirm a fetched block is the one requested.
///
/// Only identity is checked here; content is checked by quorum.
pub fn verify_block(chain_id: ChainId, height: u64, block: &Block) -> Result<(), FetchError> {
    if block.chain_id != chain_id {
        return Err(FetchError::InvalidChainId {
            expected: chain_id,
            actual: block.chain_id,
        });
    }
    if block.height != height {
        return Err(FetchError::InvalidHeight {
            expected: height,
            actual: block.height,
        });
    }
    Ok(())
}
