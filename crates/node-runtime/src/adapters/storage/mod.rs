//! # Index Storage
//!
//! The backend behind the indexer, chosen at startup by `XA_STORAGE`.
//!
//! Enable the `rocksdb` feature for the persistent backend:
//!
//! ```toml
//! node-runtime = { path = "...", features = ["rocksdb"] }
//! ```

#[cfg(feature = "rocksdb")]
pub mod rocksdb_adapter;

#[cfg(feature = "rocksdb")]
pub use rocksdb_adapter::{RocksDbConfig, RocksDbStore};

use crate::container::config::{StorageBackend, StorageConfig};
use xa_03_indexer::{BatchOperation, InMemoryKVStore, KVStoreError, KeyValueStore};

/// Index store selected by configuration.
pub enum NodeStore {
    Memory(InMemoryKVStore),
    #[cfg(feature = "rocksdb")]
    RocksDb(RocksDbStore),
}

impl NodeStore {
    pub fn open(config: &StorageConfig) -> Result<Self, KVStoreError> {
        match config.backend {
            StorageBackend::Memory => Ok(NodeStore::Memory(InMemoryKVStore::new())),
            #[cfg(feature = "rocksdb")]
            StorageBackend::RocksDb => Ok(NodeStore::RocksDb(RocksDbStore::open(
                RocksDbConfig {
                    path: config.data_dir.join("index"),
                    ..RocksDbConfig::default()
                },
            )?)),
            #[cfg(not(feature = "rocksdb"))]
            StorageBackend::RocksDb => Err(KVStoreError::IOError {
                message: "node built without the rocksdb feature".to_string(),
            }),
        }
    }

    pub fn backend(&self) -> StorageBackend {
        match self {
            NodeStore::Memory(_) => StorageBackend::Memory,
            #[cfg(feature = "rocksdb")]
            NodeStore::RocksDb(_) => StorageBackend::RocksDb,
        }
    }

    fn inner(&self) -> &dyn KeyValueStore {
        match self {
            NodeStore::Memory(store) => store,
            #[cfg(feature = "rocksdb")]
            NodeStore::RocksDb(store) => store,
        }
    }
}

impl KeyValueStore for NodeStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError> {
        self.inner().get(key)
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, KVStoreError> {
        self.inner().prefix_scan(prefix)
    }

    fn scan_from(
        &self,
        prefix: &[u8],
        start: &[u8],
        limit: usize,
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>, KVStoreError> {
        self.inner().scan_from(prefix, start, limit)
    }

    fn atomic_batch_write(&self, operations: Vec<BatchOperation>) -> Result<(), KVStoreError> {
        self.inner().atomic_batch_write(operations)
    }

    fn exists(&self, key: &[u8]) -> Result<bool, KVStoreError> {
        self.inner().exists(key)
    }
}
