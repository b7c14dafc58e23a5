//! # xa-03-indexer
//!
//! Persists approved attestations as queryable tables.
//!
//! ## Tables
//!
//! | Table   | Key                      | Notes                                  |
//! |---------|--------------------------|----------------------------------------|
//! | Block   | auto-increment id        | unique `(chain, height, hash)`         |
//! | MsgLink | message id hash          | origin write-once, receipt after origin |
//! | Cursor  | `(chain, conf level)`    | never decreases                        |
//!
//! ## Concurrency
//!
//! ```text
//!  Aggregator ──(Attestation, Block)──→ Indexer (&mut, single writer)
//!                                          │ atomic batch
//!                                          ▼
//!                                    KeyValueStore ←── IndexReader (any number)
//! ```
//!
//! Readers never block on the writer: the store serves reads from
//! snapshots (`InMemoryKVStore` swaps an `Arc`, RocksDB uses its own MVCC).

pub mod adapters;
pub mod domain;
pub mod error;
#[cfg(feature = "metrics")]
pub mod metrics;
pub mod ports;
pub mod service;

pub use adapters::InMemoryKVStore;
pub use domain::{BlockId, BlockRecord, Cursor, IndexReport, MsgLink};
pub use error::{IndexError, IndexResult, KVStoreError};
pub use ports::inbound::{IndexQueryApi, IndexerApi};
pub use ports::outbound::{BatchOperation, IndexMetrics, KeyValueStore, NoopIndexMetrics};
pub use service::{IndexReader, Indexer};
