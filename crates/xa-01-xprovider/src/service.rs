//! # XProvider Service
//!
//! Binds the generic streamer to source-chain blocks: one fetcher and one
//! set of metric handles per configured chain.

use crate::domain::{verify_block, BackoffConfig, Cancellation, StreamOptions, Streamer};
use crate::error::{FetchError, StreamError, StreamResult};
use crate::ports::inbound::XProviderApi;
use crate::ports::outbound::{
    BlockFetcher, ElementSource, NoopStreamMetrics, StreamCallback, StreamMetricsFactory,
};
use async_trait::async_trait;
use shared_types::{Block, ChainId, ChainSpec, NetworkSpec};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info, info_span, Instrument};

/// Element label used in stream logs.
const ELEM_LABEL: &str = "attestation";

/// `ElementSource` over a chain's block fetcher.
pub struct BlockSource {
    fetcher: Arc<dyn BlockFetcher>,
}

impl BlockSource {
    pub fn new(fetcher: Arc<dyn BlockFetcher>) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl ElementSource<Block> for BlockSource {
    async fn fetch(&self, chain_id: ChainId, height: u64) -> Result<Option<Block>, FetchError> {
        self.fetcher.fetch_block(chain_id, height).await
    }

    fn verify(&self, chain_id: ChainId, height: u64, block: &Block) -> Result<(), FetchError> {
        verify_block(chain_id, height, block)
    }
}

type BlockStreamer = Streamer<BlockSource, Arc<dyn StreamCallback<Block>>>;

/// Streams blocks of every configured source chain.
pub struct XProvider {
    network: Arc<NetworkSpec>,
    fetchers: BTreeMap<ChainId, Arc<dyn BlockFetcher>>,
    backoff: BackoffConfig,
    metrics: Arc<dyn StreamMetricsFactory>,
}

impl XProvider {
    pub fn new(
        network: Arc<NetworkSpec>,
        fetchers: BTreeMap<ChainId, Arc<dyn BlockFetcher>>,
    ) -> Self {
        Self {
            network,
            fetchers,
            backoff: BackoffConfig::fast(),
            metrics: Arc::new(NoopStreamMetrics),
        }
    }

    pub fn with_backoff(mut self, backoff: BackoffConfig) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn StreamMetricsFactory>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn network(&self) -> &NetworkSpec {
        &self.network
    }

    /// Chain config and fetcher, or the startup error for an unusable chain.
    fn chain(&self, chain_id: ChainId) -> StreamResult<(&ChainSpec, Arc<dyn BlockFetcher>)> {
        let chain = self
            .network
            .chain(chain_id)
            .ok_or(StreamError::UnknownChain(chain_id))?;
        let fetcher = self
            .fetchers
            .get(&chain_id)
            .cloned()
            .ok_or(StreamError::NoFetcher(chain_id))?;
        Ok((chain, fetcher))
    }

    /// First height a stream for `chain_id` will fetch: never below the
    /// chain's deploy height.
    pub fn start_height(&self, chain_id: ChainId, from_height: u64) -> StreamResult<u64> {
        let (chain, _) = self.chain(chain_id)?;
        Ok(from_height.max(chain.deploy_height))
    }

    fn prepare(
        &self,
        chain_id: ChainId,
        from_height: u64,
        callback: Arc<dyn StreamCallback<Block>>,
        retry_delivery: bool,
    ) -> StreamResult<(BlockStreamer, String, u64)> {
        let (chain, fetcher) = self.chain(chain_id)?;
        let from_height = from_height.max(chain.deploy_height);
        let streamer = Streamer::new(
            BlockSource::new(fetcher),
            callback,
            self.metrics.for_chain(&chain.name),
            StreamOptions {
                elem_label: ELEM_LABEL,
                retry_delivery,
                backoff: self.backoff,
            },
        );
        Ok((streamer, chain.name.clone(), from_height))
    }
}

#[async_trait]
impl XProviderApi for XProvider {
    fn stream_async(
        &self,
        chain_id: ChainId,
        from_height: u64,
        callback: Arc<dyn StreamCallback<Block>>,
        cancel: Cancellation,
    ) -> StreamResult<JoinHandle<()>> {
        let (streamer, name, from_height) = self.prepare(chain_id, from_height, callback, true)?;
        let span = info_span!("xprovider", chain = %name);

        let handle = tokio::spawn(
            async move {
                info!(from_height, "[xa-01] Streaming xprovider blocks");
                match streamer.run::<Block>(chain_id, from_height, cancel).await {
                    Err(StreamError::Canceled) => {
                        info!("[xa-01] Stream stopped on shutdown");
                    }
                    // Retrying mode only ends on cancellation.
                    Err(err) => {
                        error!(error = %err, "[xa-01] Streaming xprovider blocks failed unexpectedly [BUG]");
                    }
                    Ok(()) => {
                        error!("[xa-01] Streaming xprovider blocks ended unexpectedly [BUG]");
                    }
                }
            }
            .instrument(span),
        );

        Ok(handle)
    }

    async fn stream_blocks(
        &self,
        chain_id: ChainId,
        from_height: u64,
        callback: Arc<dyn StreamCallback<Block>>,
        cancel: Cancellation,
    ) -> StreamResult<()> {
        let (streamer, name, from_height) = self.prepare(chain_id, from_height, callback, false)?;
        let span = info_span!("xprovider", chain = %name);

        async move {
            info!(from_height, "[xa-01] Streaming xprovider blocks");
            streamer.run::<Block>(chain_id, from_height, cancel).await
        }
        .instrument(span)
        .await
    }
}
