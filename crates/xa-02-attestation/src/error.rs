//! Error types for the Attestation subsystem

use shared_types::{short_hex, ChainId, Hash, ValidatorId};
use thiserror::Error;

/// Why a vote failed authentication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvalidVoteReason {
    #[error("validator not in the chain's validator set")]
    UnknownValidator,

    #[error("validator holds no voting power")]
    ZeroPower,

    #[error("signature does not verify against the registered key")]
    BadSignature,
}

/// Attestation subsystem errors
///
/// Vote rejections never alter replicated state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttestError {
    /// Bad signature or unauthorized validator
    #[error("Invalid vote from validator {validator}: {reason}")]
    InvalidVote {
        validator: ValidatorId,
        reason: InvalidVoteReason,
    },

    /// Validator voted for two hashes at one height
    #[error(
        "Equivocation by validator {validator} on chain {chain_id} at height {height}: voted {}, then {}",
        short_hex(.existing),
        short_hex(.attempted)
    )]
    Equivocation {
        validator: ValidatorId,
        chain_id: ChainId,
        height: u64,
        existing: Hash,
        attempted: Hash,
    },

    /// Vote height beyond the active window; resubmit once it advances
    #[error("Vote for chain {chain_id} at height {height} exceeds window (max {max_height})")]
    WindowExceeded {
        chain_id: ChainId,
        height: u64,
        max_height: u64,
    },

    /// Chain not registered with the aggregator
    #[error("Unknown chain ID: {0}")]
    UnknownChain(ChainId),

    #[error("Chain {0} is already registered")]
    ChainAlreadyRegistered(ChainId),

    /// Batch exceeds the per-batch vote limit
    #[error("Vote batch too large: {size} votes, limit {limit}")]
    BatchTooLarge { size: usize, limit: usize },

    #[error("Invalid aggregator configuration: {0}")]
    InvalidConfig(String),
}

impl AttestError {
    /// Short label for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            AttestError::InvalidVote { .. } => "invalid_vote",
            AttestError::Equivocation { .. } => "equivocation",
            AttestError::WindowExceeded { .. } => "window_exceeded",
            AttestError::UnknownChain(_) => "unknown_chain",
            AttestError::ChainAlreadyRegistered(_) => "chain_already_registered",
            AttestError::BatchTooLarge { .. } => "batch_too_large",
            AttestError::InvalidConfig(_) => "invalid_config",
        }
    }
}

/// Result type for attestation operations
pub type AttestResult<T> = Result<T, AttestError>;
