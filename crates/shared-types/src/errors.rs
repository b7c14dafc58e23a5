//! # Error Types
//!
//! Errors shared across crates.

use crate::entities::{ChainId, ValidatorId};
use thiserror::Error;

/// Network configuration errors. Always fatal at startup.
#[derive(Debug, Clone, Error)]
pub enum NetworkError {
    /// Network file could not be read.
    #[error("Failed to read network file {path}: {reason}")]
    Io { path: String, reason: String },

    /// Network file is not valid JSON for a `NetworkSpec`.
    #[error("Failed to parse network file: {0}")]
    Parse(String),

    #[error("Network defines no chains")]
    NoChains,

    #[error("Duplicate chain ID {0}")]
    DuplicateChainId(ChainId),

    #[error("Duplicate chain name {0}")]
    DuplicateChainName(String),

    #[error("Chain {0} has an empty name")]
    EmptyChainName(ChainId),

    #[error("Duplicate validator {0}")]
    DuplicateValidator(ValidatorId),

    /// Validators are configured but none holds voting power.
    #[error("Validator set has zero total power")]
    ZeroTotalPower,

    /// Chain ID not present in the network.
    #[error("Unknown chain ID for network: {0}")]
    UnknownChain(ChainId),
}
