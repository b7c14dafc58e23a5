//! # Attestation Pipeline
//!
//! The single consumer of the vote log. Applies votes to the aggregator in
//! log order and indexes every attestation they surface.
//!
//! ```text
//! vote log ──→ Aggregator::submit_vote ──emitted──→ block (cache or re-fetch)
//!                       │                                   │
//!                       └── WindowGate::advance             └──→ Indexer::index
//! ```
//!
//! Attestations are indexed in the order the aggregator surfaces them, so
//! per-chain cursors advance in height order. The aggregator's watermark has
//! already moved when an attestation reaches the indexer, so a failed write
//! is retried until it lands or shutdown; no height is skipped.

use std::sync::Arc;

use shared_types::{short_hex, Block, ChainId};
use thiserror::Error;
use tracing::{debug, error, info, warn};
use xa_01_xprovider::{verify_block, Backoff, BackoffConfig, BlockFetcher, Cancellation};
use xa_02_attestation::{Attestation, AttestationApi, Vote, VoteOutcome};
use xa_03_indexer::{IndexReport, IndexerApi};

use crate::adapters::{BlockCache, VoteLogReceiver, WindowGateHandle};
use crate::container::{NodeAggregator, NodeIndexer};

/// Failures while handling one vote.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Shutdown was signaled while re-fetching a block or retrying a write.
    #[error("pipeline canceled")]
    Canceled,
}

/// Vote log consumer owning the aggregator and the indexer.
pub struct AttestationPipeline<I = NodeIndexer> {
    aggregator: NodeAggregator,
    indexer: I,
    cache: Arc<BlockCache>,
    fetcher: Arc<dyn BlockFetcher>,
    backoff: BackoffConfig,
    gate: WindowGateHandle,
    votes: VoteLogReceiver,
}

impl<I: IndexerApi> AttestationPipeline<I> {
    pub fn new(
        aggregator: NodeAggregator,
        indexer: I,
        cache: Arc<BlockCache>,
        fetcher: Arc<dyn BlockFetcher>,
        backoff: BackoffConfig,
        gate: WindowGateHandle,
        votes: VoteLogReceiver,
    ) -> Self {
        Self {
            aggregator,
            indexer,
            cache,
            fetcher,
            backoff,
            gate,
            votes,
        }
    }

    /// Consume the vote log until shutdown or until every sender is gone.
    pub async fn run(mut self, mut cancel: Cancellation) {
        info!("[xa-02] Attestation pipeline started");
        loop {
            let vote = tokio::select! {
                _ = cancel.canceled() => {
                    info!("[xa-02] Shutdown signal received");
                    return;
                }
                vote = self.votes.recv() => match vote {
                    Some(vote) => vote,
                    None => {
                        info!("[xa-02] Vote log closed");
                        return;
                    }
                },
            };

            if let Err(PipelineError::Canceled) = self.process(&vote, &mut cancel).await {
                info!("[xa-02] Shutdown signal received");
                return;
            }
        }
    }

    /// Apply one vote and index whatever it surfaced.
    ///
    /// Rejected votes are reported by the aggregator's observer and
    /// otherwise ignored.
    pub async fn process(
        &mut self,
        vote: &Vote,
        cancel: &mut Cancellation,
    ) -> Result<Vec<IndexReport>, PipelineError> {
        let Ok(outcome) = self.aggregator.submit_vote(vote) else {
            return Ok(Vec::new());
        };
        let reports = self.index_emitted(&outcome, cancel).await;
        self.publish_window(vote.chain_id);
        reports
    }

    async fn index_emitted(
        &mut self,
        outcome: &VoteOutcome,
        cancel: &mut Cancellation,
    ) -> Result<Vec<IndexReport>, PipelineError> {
        let mut reports = Vec::with_capacity(outcome.emitted.len());
        for attestation in &outcome.emitted {
            let block = self.block_for(attestation, cancel).await?;
            let report = self.index_until_stored(attestation, &block, cancel).await?;
            debug!(
                chain_id = attestation.chain_id,
                height = attestation.height,
                block_id = report.block_id,
                "[xa-03] Attestation indexed"
            );
            reports.push(report);
        }
        Ok(reports)
    }

    async fn index_until_stored(
        &mut self,
        attestation: &Attestation,
        block: &Block,
        cancel: &mut Cancellation,
    ) -> Result<IndexReport, PipelineError> {
        let mut backoff = Backoff::new(self.backoff);
        loop {
            match self.indexer.index(attestation, block) {
                Ok(report) => return Ok(report),
                Err(e) => error!(
                    chain_id = attestation.chain_id,
                    height = attestation.height,
                    attempts = backoff.attempts().saturating_add(1),
                    error = %e,
                    "[xa-03] Failed to index attestation, retrying"
                ),
            }
            backoff
                .wait(cancel)
                .await
                .map_err(|_| PipelineError::Canceled)?;
        }
    }

    /// The attested block, from the cache or fetched again until the source
    /// serves it.
    async fn block_for(
        &self,
        attestation: &Attestation,
        cancel: &mut Cancellation,
    ) -> Result<Block, PipelineError> {
        let (chain_id, height) = (attestation.chain_id, attestation.height);
        if let Some(block) = self.cache.take(chain_id, height, &attestation.block_hash) {
            return Ok(block);
        }

        let mut backoff = Backoff::new(self.backoff);
        loop {
            if cancel.is_canceled() {
                return Err(PipelineError::Canceled);
            }
            match self.fetcher.fetch_block(chain_id, height).await {
                Ok(Some(block)) => match verify_block(chain_id, height, &block) {
                    Ok(()) if block.hash == attestation.block_hash => return Ok(block),
                    Ok(()) => error!(
                        chain_id,
                        height,
                        attested = %short_hex(&attestation.block_hash),
                        local = %short_hex(&block.hash),
                        "[xa-03] Local source disagrees with attested block"
                    ),
                    Err(e) => {
                        warn!(chain_id, height, error = %e, "[xa-03] Re-fetched block invalid")
                    }
                },
                Ok(None) => debug!(chain_id, height, "[xa-03] Attested block not yet available"),
                Err(e) => warn!(chain_id, height, error = %e, "[xa-03] Failed to re-fetch block"),
            }
            backoff
                .wait(cancel)
                .await
                .map_err(|_| PipelineError::Canceled)?;
        }
    }

    fn publish_window(&self, chain_id: ChainId) {
        if let Ok(chain) = self.aggregator.chain(chain_id) {
            self.gate.advance(chain_id, chain.next_height());
        }
    }
}
