//! Error types for the Indexer subsystem

use shared_types::{short_hex, ChainId, ConfLevel, Hash};
use thiserror::Error;

/// Key-value backend failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KVStoreError {
    #[error("KV store I/O error: {message}")]
    IOError { message: String },

    #[error("KV store corruption: {message}")]
    CorruptionError { message: String },
}

/// Indexer errors
///
/// A failed `index` call writes nothing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexError {
    #[error(transparent)]
    Store(#[from] KVStoreError),

    /// A stored row failed to decode
    #[error("Corrupt {table} row: {reason}")]
    Codec { table: &'static str, reason: String },

    /// Block handed over with an attestation does not match it
    #[error(
        "Block does not match attestation: expected chain {chain_id} height {height} hash {}, got chain {actual_chain_id} height {actual_height} hash {}",
        short_hex(.hash),
        short_hex(.actual_hash)
    )]
    BlockMismatch {
        chain_id: ChainId,
        height: u64,
        hash: Hash,
        actual_chain_id: ChainId,
        actual_height: u64,
        actual_hash: Hash,
    },

    /// A different block is already indexed at this height
    #[error(
        "Conflicting block at chain {chain_id} height {height}: indexed {}, attempted {}",
        short_hex(.existing),
        short_hex(.attempted)
    )]
    ConflictingBlock {
        chain_id: ChainId,
        height: u64,
        existing: Hash,
        attempted: Hash,
    },

    /// Write would move a cursor backwards
    #[error("Cursor regression for chain {chain_id} level {level}: at {current}, attempted {attempted}")]
    CursorRegression {
        chain_id: ChainId,
        level: ConfLevel,
        current: u64,
        attempted: u64,
    },

    /// Write would skip heights the chain has not indexed yet
    #[error("Height gap for chain {chain_id} level {level}: expected {expected}, attempted {attempted}")]
    HeightGap {
        chain_id: ChainId,
        level: ConfLevel,
        expected: u64,
        attempted: u64,
    },
}

impl IndexError {
    pub(crate) fn codec(table: &'static str, err: impl std::fmt::Display) -> Self {
        IndexError::Codec {
            table,
            reason: err.to_string(),
        }
    }
}

/// Result type for indexer operations
pub type IndexResult<T> = Result<T, IndexError>;
