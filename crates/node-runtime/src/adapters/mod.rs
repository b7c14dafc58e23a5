//! # Adapters
//!
//! Port implementations connecting the subsystems to the node's
//! environment.
//!
//! - `fetcher` - file-backed source-chain client (xa-01 `BlockFetcher`)
//! - `block_cache` - fetched blocks awaiting their attestation
//! - `vote_log` - stream callback, vote log channel and window gate
//! - `storage` - index backends (xa-03 `KeyValueStore`)

pub mod block_cache;
pub mod fetcher;
pub mod storage;
pub mod vote_log;

pub use block_cache::BlockCache;
pub use fetcher::FileBlockFetcher;
pub use storage::NodeStore;
pub use vote_log::{
    vote_log, VoteLogReceiver, VoteLogSender, VotingCallback, WindowGate, WindowGateHandle,
};
