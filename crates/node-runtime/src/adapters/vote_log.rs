//! # Vote Log
//!
//! The ordered sequence of vote transactions fed to the aggregator. In this
//! node it is a bounded mpsc channel: every chain stream appends the local
//! validator's votes, and hosts may append votes received from peers.
//!
//! ```text
//! Streamer(chain A) ─┐
//! Streamer(chain B) ─┼─ VotingCallback ──Vote──→ [ vote log ] ──→ pipeline
//! peers ─────────────┘        │
//!                             └── WindowGate: wait while height > watermark + window
//! ```

use async_trait::async_trait;
use shared_types::{Block, ChainId};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::debug;
use xa_01_xprovider::{CallbackError, StreamCallback};
use xa_02_attestation::{Vote, VoteClaim, VoteSigner};

use super::block_cache::BlockCache;

/// Sending side of the vote log.
pub type VoteLogSender = mpsc::Sender<Vote>;

/// Receiving side of the vote log, owned by the pipeline.
pub type VoteLogReceiver = mpsc::Receiver<Vote>;

pub fn vote_log(capacity: usize) -> (VoteLogSender, VoteLogReceiver) {
    mpsc::channel(capacity.max(1))
}

/// Publishes each chain's next unattested height.
pub struct WindowGateHandle {
    tx: watch::Sender<BTreeMap<ChainId, u64>>,
}

impl WindowGateHandle {
    pub fn advance(&self, chain_id: ChainId, next_height: u64) {
        self.tx.send_modify(|heights| {
            heights.insert(chain_id, next_height);
        });
    }
}

/// Holds streams back while their next vote would fall outside the
/// aggregator's window.
#[derive(Clone)]
pub struct WindowGate {
    window_size: u64,
    rx: watch::Receiver<BTreeMap<ChainId, u64>>,
}

impl WindowGate {
    /// `next_heights` are the heights each chain's aggregator expects next.
    pub fn new(
        window_size: u64,
        next_heights: BTreeMap<ChainId, u64>,
    ) -> (WindowGateHandle, Self) {
        let (tx, rx) = watch::channel(next_heights);
        (WindowGateHandle { tx }, Self { window_size, rx })
    }

    pub fn admits(&self, chain_id: ChainId, height: u64) -> bool {
        Self::in_window(&self.rx.borrow(), self.window_size, chain_id, height)
    }

    fn in_window(
        heights: &BTreeMap<ChainId, u64>,
        window_size: u64,
        chain_id: ChainId,
        height: u64,
    ) -> bool {
        heights
            .get(&chain_id)
            .map_or(true, |next| height < next.saturating_add(window_size))
    }

    /// Resolve once `height` is inside the window. Fails if the pipeline
    /// has stopped.
    pub async fn wait(&self, chain_id: ChainId, height: u64) -> Result<(), CallbackError> {
        let mut rx = self.rx.clone();
        let window_size = self.window_size;
        let opened = rx
            .wait_for(|heights| Self::in_window(heights, window_size, chain_id, height))
            .await
            .is_ok();
        if opened {
            Ok(())
        } else {
            Err("attestation pipeline stopped".into())
        }
    }
}

/// Stream callback that turns every fetched block into a local vote.
pub struct VotingCallback {
    signer: Arc<dyn VoteSigner>,
    cache: Arc<BlockCache>,
    gate: WindowGate,
    log: VoteLogSender,
}

impl VotingCallback {
    pub fn new(
        signer: Arc<dyn VoteSigner>,
        cache: Arc<BlockCache>,
        gate: WindowGate,
        log: VoteLogSender,
    ) -> Self {
        Self {
            signer,
            cache,
            gate,
            log,
        }
    }
}

#[async_trait]
impl StreamCallback<Block> for VotingCallback {
    async fn deliver(&self, block: &Block) -> Result<(), CallbackError> {
        if !self.gate.admits(block.chain_id, block.height) {
            debug!(
                chain_id = block.chain_id,
                height = block.height,
                "[xa-01] Waiting for vote window"
            );
            self.gate.wait(block.chain_id, block.height).await?;
        }

        self.cache.insert(block.clone());
        let vote = self.signer.sign(&VoteClaim::for_block(block));
        self.log
            .send(vote)
            .await
            .map_err(|_| CallbackError::from("vote log closed"))
    }
}
