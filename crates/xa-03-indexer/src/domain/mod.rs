//! Domain layer for the Indexer subsystem

pub mod keys;
pub mod records;

pub use records::{BlockId, BlockRecord, Cursor, IndexReport, MsgLink};
