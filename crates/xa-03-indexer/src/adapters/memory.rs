//! Copy-on-write in-memory store.
//!
//! The current contents live behind an `Arc`. Readers clone the pointer
//! and work on that snapshot; a batch is applied to a private copy and
//! swapped in with one pointer write. A reader therefore never waits for a
//! batch, and never sees half of one.

use crate::error::KVStoreError;
use crate::ports::outbound::{BatchOperation, KeyValueStore};
use parking_lot::{Mutex, RwLock};
use std::collections::BTreeMap;
use std::sync::Arc;

type Table = BTreeMap<Vec<u8>, Vec<u8>>;

/// In-memory key-value store with snapshot reads.
#[derive(Default)]
pub struct InMemoryKVStore {
    current: RwLock<Arc<Table>>,
    writer: Mutex<()>,
}

impl InMemoryKVStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consistent view of the store at this instant.
    pub fn snapshot(&self) -> Arc<Table> {
        self.current.read().clone()
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }
}

impl KeyValueStore for InMemoryKVStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError> {
        Ok(self.snapshot().get(key).cloned())
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, KVStoreError> {
        let snapshot = self.snapshot();
        Ok(snapshot
            .range(prefix.to_vec()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect())
    }

    fn scan_from(
        &self,
        prefix: &[u8],
        start: &[u8],
        limit: usize,
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>, KVStoreError> {
        let snapshot = self.snapshot();
        let from = start.max(prefix).to_vec();
        Ok(snapshot
            .range(from..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .take(limit)
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect())
    }

    fn atomic_batch_write(&self, operations: Vec<BatchOperation>) -> Result<(), KVStoreError> {
        let _writer = self.writer.lock();
        let mut next = Table::clone(&self.snapshot());
        for op in operations {
            match op {
                BatchOperation::Put { key, value } => {
                    next.insert(key, value);
                }
                BatchOperation::Delete { key } => {
                    next.remove(&key);
                }
            }
        }
        *self.current.write() = Arc::new(next);
        Ok(())
    }
}
