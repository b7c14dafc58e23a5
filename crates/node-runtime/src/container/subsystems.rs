//! # Subsystem Container
//!
//! Builds every subsystem from the node configuration and wires their
//! adapters.
//!
//! ## Initialization Order
//!
//! ```text
//! 1. Network file        (shared-types NetworkSpec)
//! 2. Index store         (xa-03, resume heights come from its cursors)
//! 3. Aggregator          (xa-02, one registration per chain at its resume height)
//! 4. XProvider           (xa-01, one FileBlockFetcher shared by every chain)
//! ```
//!
//! ## Ownership
//!
//! - The aggregator and the indexer are owned, not shared: the pipeline
//!   task takes them and is their only caller
//! - Everything else is `Arc`-shared between the streams, the pipeline and
//!   the monitor

use std::collections::BTreeMap;
use std::sync::Arc;

use shared_types::{ChainId, ChainSpec, NetworkError, NetworkSpec};
use thiserror::Error;
use tracing::{info, instrument, warn};
use xa_01_xprovider::metrics::PrometheusStreamMetrics;
use xa_01_xprovider::{BlockFetcher, XProvider};
use xa_02_attestation::metrics::PrometheusAttestObserver;
use xa_02_attestation::{
    Aggregator, AttestError, AttestationApi, ChainRegistration, Ed25519VoteSigner,
    Ed25519VoteVerifier, ObserverSet, TracingObserver, ValidatorSet, VoteSigner,
};
use xa_03_indexer::metrics::PrometheusIndexMetrics;
use xa_03_indexer::{IndexError, IndexQueryApi, IndexReader, Indexer, KVStoreError};
use xa_telemetry::MetricsRegistry;

use crate::adapters::{BlockCache, FileBlockFetcher, NodeStore};
use crate::container::config::{ConfigError, NodeConfig};

/// Indexer over the configured backend.
pub type NodeIndexer = Indexer<NodeStore>;

/// Read handle over the configured backend.
pub type NodeReader = IndexReader<NodeStore>;

/// Aggregator verifying ed25519 votes.
pub type NodeAggregator = Aggregator<Ed25519VoteVerifier>;

/// Startup failures.
#[derive(Debug, Error)]
pub enum ContainerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error("Failed to open index store: {0}")]
    Storage(#[from] KVStoreError),

    #[error("Failed to read index: {0}")]
    Index(#[from] IndexError),

    #[error("Failed to configure aggregator: {0}")]
    Attest(#[from] AttestError),

    #[error("Failed to register metrics: {0}")]
    Metrics(#[from] prometheus::Error),
}

/// Central container holding all subsystem instances.
pub struct SubsystemContainer {
    /// Node configuration (immutable after initialization).
    pub config: NodeConfig,
    pub network: Arc<NetworkSpec>,
    pub metrics: MetricsRegistry,

    /// Block streaming (xa-01).
    pub provider: Arc<XProvider>,
    pub fetcher: Arc<FileBlockFetcher>,

    /// Attestation (xa-02). Taken by the pipeline.
    pub aggregator: NodeAggregator,
    pub signer: Arc<Ed25519VoteSigner>,

    /// Indexing (xa-03). Taken by the pipeline.
    pub indexer: NodeIndexer,
    pub reader: NodeReader,

    pub block_cache: Arc<BlockCache>,
    /// First height each chain's stream fetches and its aggregator accepts.
    pub start_heights: BTreeMap<ChainId, u64>,
}

impl SubsystemContainer {
    /// Create a container with all subsystems initialized.
    #[instrument(name = "subsystem_init", skip_all)]
    pub fn new(config: NodeConfig, metrics: MetricsRegistry) -> Result<Self, ContainerError> {
        config.validate()?;
        let seed = config
            .validator_seed
            .ok_or(ConfigError::MissingValidatorSeed)?;

        info!("Initializing X-Attest subsystem container");

        // Network
        let network = Arc::new(NetworkSpec::load(&config.network_file)?);
        let registry = metrics.registry();

        // xa-03: Indexer
        let store = NodeStore::open(&config.storage)?;
        info!(backend = ?store.backend(), "  [xa-03] Index store opened");
        let index_metrics = Arc::new(PrometheusIndexMetrics::register(registry, &network)?);
        let indexer = network.chains.iter().fold(
            Indexer::new(Arc::new(store)).with_metrics(index_metrics),
            |indexer, chain| indexer.with_start_height(chain.id, chain.deploy_height),
        );
        let reader = indexer.reader();

        let mut start_heights = BTreeMap::new();
        for chain in &network.chains {
            start_heights.insert(chain.id, resume_height(&reader, chain)?);
        }

        // xa-02: Aggregator
        let signer = Arc::new(Ed25519VoteSigner::from_seed(seed));
        let validators = ValidatorSet::from_specs(&network.validators);
        if !validators.contains(&signer.validator_id()) {
            warn!(
                validator = %signer.validator_id(),
                "  [xa-02] Local key is not in the validator set, its votes will be rejected"
            );
        }
        let observer = ObserverSet::new()
            .with(Arc::new(TracingObserver::for_network(&network)))
            .with(Arc::new(PrometheusAttestObserver::register(
                registry, &network,
            )?));
        let mut aggregator = Aggregator::new(config.attest.aggregator()?, Ed25519VoteVerifier)?
            .with_observer(Arc::new(observer));
        for chain in &network.chains {
            let start_height = start_heights[&chain.id];
            aggregator.register_chain(ChainRegistration {
                chain_id: chain.id,
                conf_level: chain.conf_level,
                start_height,
                validators: validators.clone(),
            })?;
            info!(
                chain = %chain.name,
                start_height,
                conf_level = %chain.conf_level,
                "  [xa-02] Chain registered"
            );
        }

        // xa-01: XProvider
        let fetcher = Arc::new(FileBlockFetcher::new(config.blocks_dir.clone()));
        let fetchers: BTreeMap<ChainId, Arc<dyn BlockFetcher>> = network
            .chain_ids()
            .map(|id| (id, Arc::clone(&fetcher) as Arc<dyn BlockFetcher>))
            .collect();
        let provider = XProvider::new(Arc::clone(&network), fetchers)
            .with_backoff(config.stream.backoff)
            .with_metrics(Arc::new(PrometheusStreamMetrics::register(registry)?));
        info!(blocks_dir = %config.blocks_dir.display(), "  [xa-01] XProvider initialized");

        let block_cache = Arc::new(BlockCache::new(config.stream.block_cache_capacity));

        Ok(Self {
            config,
            network,
            metrics,
            provider: Arc::new(provider),
            fetcher,
            aggregator,
            signer,
            indexer,
            reader,
            block_cache,
            start_heights,
        })
    }
}

/// One above the chain's cursor at its configured level, never below the
/// deploy height.
pub fn resume_height(reader: &NodeReader, chain: &ChainSpec) -> Result<u64, IndexError> {
    let resumed = reader
        .cursor(chain.id, chain.conf_level)?
        .map_or(0, |height| height.saturating_add(1));
    Ok(resumed.max(chain.deploy_height))
}
