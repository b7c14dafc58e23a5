//! Adapters for the Indexer subsystem ports

pub mod memory;

pub use memory::InMemoryKVStore;
