//! Error types for the XProvider subsystem

use crate::ports::outbound::CallbackError;
use shared_types::ChainId;
use thiserror::Error;

/// Errors from a single fetch or verify attempt.
///
/// Never surfaced by a stream: every variant is counted, logged and retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Remote client or transport failure
    #[error("fetch failed: {0}")]
    Transport(String),

    /// The remote returned content that could not be decoded
    #[error("malformed block: {0}")]
    Decode(String),

    /// Block claims a different chain than requested
    #[error("invalid block source chain id: expected {expected}, got {actual}")]
    InvalidChainId { expected: ChainId, actual: ChainId },

    /// Block claims a different height than requested
    #[error("invalid block height: expected {expected}, got {actual}")]
    InvalidHeight { expected: u64, actual: u64 },
}

/// Errors returned by streams and the provider.
#[derive(Debug, Error)]
pub enum StreamError {
    /// Shutdown was signaled. Not a failure.
    #[error("stream canceled")]
    Canceled,

    /// Chain is not part of the configured network
    #[error("unknown chain ID for network: {0}")]
    UnknownChain(ChainId),

    /// Chain is configured but no fetcher was supplied for it
    #[error("no fetcher for chain ID {0}")]
    NoFetcher(ChainId),

    /// Delivery failed in synchronous mode
    #[error("{label} callback failed at height {height} on chain {chain_id}: {source}")]
    Callback {
        chain_id: ChainId,
        height: u64,
        label: &'static str,
        source: CallbackError,
    },

    /// Height counter would wrap
    #[error("stream height overflow on chain {0}")]
    HeightOverflow(ChainId),
}

impl StreamError {
    /// True for the distinguished shutdown outcome.
    pub fn is_canceled(&self) -> bool {
        matches!(self, StreamError::Canceled)
    }
}

/// Result type for stream operations
pub type StreamResult<T> = Result<T, StreamError>;
