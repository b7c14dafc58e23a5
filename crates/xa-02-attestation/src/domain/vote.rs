//! Vote entities
//!
//! A vote is the transaction-shaped payload validators submit to the
//! replicated log: `{chain_id, height, block_hash, validator_id, signature}`.

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};
use shared_types::{keccak256, Block, ChainId, Hash, Signature, ValidatorId};

/// Domain separator for vote signatures.
const VOTE_DOMAIN: &[u8] = b"xattest/vote/v1";

/// What a validator claims to have observed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VoteClaim {
    pub chain_id: ChainId,
    pub height: u64,
    pub block_hash: Hash,
}

impl VoteClaim {
    pub fn new(chain_id: ChainId, height: u64, block_hash: Hash) -> Self {
        Self {
            chain_id,
            height,
            block_hash,
        }
    }

    /// Claim for a locally fetched block.
    pub fn for_block(block: &Block) -> Self {
        Self::new(block.chain_id, block.height, block.hash)
    }

    /// Message covered by the validator's signature.
    pub fn signing_message(&self) -> Hash {
        let mut buf = Vec::with_capacity(VOTE_DOMAIN.len() + 48);
        buf.extend_from_slice(VOTE_DOMAIN);
        buf.extend_from_slice(&self.chain_id.to_be_bytes());
        buf.extend_from_slice(&self.height.to_be_bytes());
        buf.extend_from_slice(&self.block_hash);
        keccak256(&buf)
    }
}

/// A signed vote.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub chain_id: ChainId,
    pub height: u64,
    pub block_hash: Hash,
    pub validator_id: ValidatorId,
    #[serde_as(as = "Bytes")]
    pub signature: Signature,
}

impl Vote {
    pub fn new(claim: VoteClaim, validator_id: ValidatorId, signature: Signature) -> Self {
        Self {
            chain_id: claim.chain_id,
            height: claim.height,
            block_hash: claim.block_hash,
            validator_id,
            signature,
        }
    }

    pub fn claim(&self) -> VoteClaim {
        VoteClaim::new(self.chain_id, self.height, self.block_hash)
    }
}
