//! Driven Ports (SPI - Outbound Dependencies)

use crate::error::KVStoreError;
use shared_types::{ChainId, ConfLevel};

/// Key-value backend for the index tables.
///
/// Methods take `&self`: one writer and any number of readers share the
/// store. Implementations must let reads proceed while a batch is being
/// applied (copy-on-write or MVCC snapshots).
pub trait KeyValueStore: Send + Sync {
    /// Get a value by key.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError>;

    /// Entries whose key starts with `prefix`, in ascending key order.
    fn prefix_scan(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, KVStoreError>;

    /// Up to `limit` entries under `prefix` with key `>= start`, ascending.
    fn scan_from(
        &self,
        prefix: &[u8],
        start: &[u8],
        limit: usize,
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>, KVStoreError>;

    /// Apply every operation or none of them.
    fn atomic_batch_write(&self, operations: Vec<BatchOperation>) -> Result<(), KVStoreError>;

    /// Check if a key exists.
    fn exists(&self, key: &[u8]) -> Result<bool, KVStoreError> {
        Ok(self.get(key)?.is_some())
    }
}

/// Batch operation for atomic writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOperation {
    Put { key: Vec<u8>, value: Vec<u8> },
    Delete { key: Vec<u8> },
}

impl BatchOperation {
    pub fn put(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        BatchOperation::Put {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn delete(key: impl Into<Vec<u8>>) -> Self {
        BatchOperation::Delete { key: key.into() }
    }
}

/// Metric sink for indexer events.
pub trait IndexMetrics: Send + Sync {
    fn block_indexed(&self, _chain_id: ChainId, _height: u64) {}

    /// `kind` is `orphan_receipt`, `duplicate_receipt` or `duplicate_origin`.
    fn inconsistency(&self, _chain_id: ChainId, _kind: &'static str) {}

    fn cursor_advanced(&self, _chain_id: ChainId, _level: ConfLevel, _height: u64) {}
}

/// Metrics sink that records nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopIndexMetrics;

impl IndexMetrics for NoopIndexMetrics {}
