//! # xa-01-xprovider
//!
//! Cross-chain block provider: turns unreliable source-chain clients into
//! ordered, verified, per-chain block streams.
//!
//! ## Overview
//!
//! This subsystem provides:
//! - **Generic Streamer**: fetch → verify → deliver over any element type
//! - **Bounded Backoff**: exponential delay with fast reset after success
//! - **Two Delivery Modes**: retry forever (async) or fail fast (sync)
//! - **Cooperative Cancellation**: checked before every fetch and backoff
//!
//! ## Architecture
//!
//! ```text
//! BlockFetcher ──fetch(h)──→ Streamer ──verify──→ StreamCallback
//!      ↑                        │
//!      └──── backoff, retry ────┘ (unavailable / error / mismatch)
//!                               │
//!                               └── StreamMetrics {chain}
//! ```
//!
//! ## Ordering
//!
//! Each stream delivers heights `from, from+1, ...` with no gaps. Streams
//! of different chains are independent tasks with no shared mutable state.
//!
//! ## Example
//!
//! ```rust,ignore
//! use xa_01_xprovider::{XProvider, XProviderApi, Cancellation};
//!
//! let provider = XProvider::new(network, fetchers);
//! let (shutdown, cancel) = Cancellation::channel();
//!
//! // Retry forever, returns immediately
//! let handle = provider.stream_async(chain_id, 0, callback, cancel)?;
//!
//! shutdown.send(true)?;
//! handle.await?;
//! ```

pub mod adapters;
pub mod domain;
pub mod error;
#[cfg(feature = "metrics")]
pub mod metrics;
pub mod ports;
pub mod service;

pub use domain::{verify_block, Backoff, BackoffConfig, Cancellation, StreamOptions, Streamer};
pub use error::{FetchError, StreamError, StreamResult};
pub use ports::inbound::XProviderApi;
pub use ports::outbound::{
    BlockFetcher, CallbackError, ElementSource, FnCallback, NoopStreamMetrics, StreamCallback,
    StreamMetrics, StreamMetricsFactory,
};
pub use service::{BlockSource, XProvider};
