//! # Inbound Ports
//!
//! API exposed by the XProvider to the node runtime.

use crate::domain::Cancellation;
use crate::error::StreamResult;
use crate::ports::outbound::StreamCallback;
use async_trait::async_trait;
use shared_types::{Block, ChainId};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Per-chain block streaming API.
#[async_trait]
pub trait XProviderApi: Send + Sync {
    /// Spawn a stream that retries every fetch and delivery failure forever.
    ///
    /// Returns immediately. Only fails if the chain is unknown or has no
    /// fetcher; the spawned task ends only on cancellation.
    fn stream_async(
        &self,
        chain_id: ChainId,
        from_height: u64,
        callback: Arc<dyn StreamCallback<Block>>,
        cancel: Cancellation,
    ) -> StreamResult<JoinHandle<()>>;

    /// Stream inline, retrying fetch failures but returning the first
    /// delivery failure.
    async fn stream_blocks(
        &self,
        chain_id: ChainId,
        from_height: u64,
        callback: Arc<dyn StreamCallback<Block>>,
        cancel: Cancellation,
    ) -> StreamResult<()>;
}
