//! # Outbound Ports
//!
//! What a stream needs from the outside world: a way to fetch and verify
//! elements, a place to deliver them, and per-chain metric handles.

use crate::error::FetchError;
use async_trait::async_trait;
use shared_types::{Block, ChainId};
use std::future::Future;
use std::sync::Arc;

/// Error type returned by delivery callbacks.
pub type CallbackError = Box<dyn std::error::Error + Send + Sync>;

/// Remote source-chain client - outbound port.
///
/// `Ok(None)` means the block at `height` is not yet available (not
/// finalized); callers retry later without counting an error.
#[async_trait]
pub trait BlockFetcher: Send + Sync {
    async fn fetch_block(&self, chain_id: ChainId, height: u64)
        -> Result<Option<Block>, FetchError>;
}

/// Fetch/verify strategy pair for one element type.
///
/// The streamer is generic over this pair; any element type plugs in by
/// implementing it.
#[async_trait]
pub trait ElementSource<E: Send + Sync>: Send + Sync {
    /// Fetch the element at `height`, `Ok(None)` if not yet available.
    async fn fetch(&self, chain_id: ChainId, height: u64) -> Result<Option<E>, FetchError>;

    /// Check a fetched element really is the one requested.
    fn verify(&self, chain_id: ChainId, height: u64, elem: &E) -> Result<(), FetchError>;
}

/// Delivery target of a stream.
#[async_trait]
pub trait StreamCallback<E: Send + Sync>: Send + Sync {
    async fn deliver(&self, elem: &E) -> Result<(), CallbackError>;
}

#[async_trait]
impl<E, T> StreamCallback<E> for Arc<T>
where
    E: Send + Sync,
    T: StreamCallback<E> + ?Sized,
{
    async fn deliver(&self, elem: &E) -> Result<(), CallbackError> {
        (**self).deliver(elem).await
    }
}

/// Adapts an async closure into a [`StreamCallback`].
pub struct FnCallback<F>(pub F);

#[async_trait]
impl<E, F, Fut> StreamCallback<E> for FnCallback<F>
where
    E: Clone + Send + Sync + 'static,
    F: Fn(E) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), CallbackError>> + Send + 'static,
{
    async fn deliver(&self, elem: &E) -> Result<(), CallbackError> {
        (self.0)(elem.clone()).await
    }
}

/// Metric handles for one chain's stream.
pub trait StreamMetrics: Send + Sync {
    fn inc_fetch_err(&self);
    fn inc_callback_err(&self);
    fn set_stream_height(&self, height: u64);
}

/// Creates per-chain [`StreamMetrics`] handles, labeled by chain name.
pub trait StreamMetricsFactory: Send + Sync {
    fn for_chain(&self, chain_name: &str) -> Arc<dyn StreamMetrics>;
}

/// Discards all observations.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopStreamMetrics;

impl StreamMetrics for NoopStreamMetrics {
    fn inc_fetch_err(&self) {}
    fn inc_callback_err(&self) {}
    fn set_stream_height(&self, _height: u64) {}
}

impl StreamMetricsFactory for NoopStreamMetrics {
    fn for_chain(&self, _chain_name: &str) -> Arc<dyn StreamMetrics> {
        Arc::new(NoopStreamMetrics)
    }
}
