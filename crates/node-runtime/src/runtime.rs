//! # Node Runtime
//!
//! Spawns the node's tasks from a built [`SubsystemContainer`] and stops
//! them on shutdown.
//!
//! ## Tasks
//!
//! | Task | Count | Stops on |
//! |---|---|---|
//! | XProvider stream | one per chain | shutdown signal |
//! | Attestation pipeline | one | shutdown signal, vote log closed |
//! | Cursor monitor | one | shutdown signal |

use std::sync::Arc;
use std::time::Duration;

use shared_types::{Block, NetworkSpec};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use xa_01_xprovider::{BlockFetcher, Cancellation, StreamCallback, StreamResult, XProviderApi};
use xa_02_attestation::VoteSigner;

use crate::adapters::{vote_log, VoteLogSender, VotingCallback, WindowGate};
use crate::container::{NodeReader, SubsystemContainer};
use crate::handlers::{AttestationPipeline, CursorMonitor};

/// How long `shutdown` waits for each task.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// A running node.
pub struct NodeRuntime {
    network: Arc<NetworkSpec>,
    reader: NodeReader,
    /// Vote log sender kept for votes arriving from outside the node.
    votes: VoteLogSender,
    shutdown_tx: watch::Sender<bool>,
    tasks: Vec<(String, JoinHandle<()>)>,
}

impl NodeRuntime {
    /// Spawn every task. Must be called from within a tokio runtime.
    ///
    /// ## Startup Sequence
    ///
    /// 1. Create the shutdown signal, vote log and window gate
    /// 2. Spawn the attestation pipeline (owns aggregator and indexer)
    /// 3. Spawn one stream per chain from its resume height
    /// 4. Spawn the cursor monitor
    pub fn start(container: SubsystemContainer) -> StreamResult<Self> {
        let SubsystemContainer {
            config,
            network,
            metrics,
            provider,
            fetcher,
            aggregator,
            signer,
            indexer,
            reader,
            block_cache,
            start_heights,
        } = container;

        let (shutdown_tx, cancel) = Cancellation::channel();
        let (votes, votes_rx) = vote_log(config.stream.vote_log_capacity);
        let (gate_handle, gate) =
            WindowGate::new(config.attest.window_size, start_heights.clone());
        let mut tasks = Vec::new();

        let pipeline = AttestationPipeline::new(
            aggregator,
            indexer,
            Arc::clone(&block_cache),
            fetcher as Arc<dyn BlockFetcher>,
            config.stream.backoff,
            gate_handle,
            votes_rx,
        );
        tasks.push((
            "pipeline".to_string(),
            tokio::spawn(pipeline.run(cancel.clone())),
        ));

        let callback: Arc<dyn StreamCallback<Block>> = Arc::new(VotingCallback::new(
            signer as Arc<dyn VoteSigner>,
            block_cache,
            gate,
            votes.clone(),
        ));
        for (&chain_id, &from_height) in &start_heights {
            let started =
                provider.stream_async(chain_id, from_height, Arc::clone(&callback), cancel.clone());
            match started {
                Ok(handle) => tasks.push((network.chain_name(chain_id), handle)),
                Err(e) => {
                    let _ = shutdown_tx.send(true);
                    return Err(e);
                }
            }
            info!(
                chain = %network.chain_name(chain_id),
                from_height,
                "[xa-01] Stream started"
            );
        }

        let monitor = CursorMonitor::new(
            reader.clone(),
            Arc::clone(&network),
            metrics,
            config.telemetry.metrics_file.clone(),
            config.monitor.interval,
        );
        tasks.push(("monitor".to_string(), tokio::spawn(monitor.run(cancel))));

        info!(
            network = %network.name,
            chains = network.chains.len(),
            "All subsystems running"
        );

        Ok(Self {
            network,
            reader,
            votes,
            shutdown_tx,
            tasks,
        })
    }

    pub fn network(&self) -> &NetworkSpec {
        &self.network
    }

    /// Read handle on the index.
    pub fn reader(&self) -> &NodeReader {
        &self.reader
    }

    /// Append votes received from other validators.
    pub fn vote_log(&self) -> VoteLogSender {
        self.votes.clone()
    }

    /// Shutdown the node gracefully.
    ///
    /// ## Shutdown Sequence
    ///
    /// 1. Signal shutdown to every task
    /// 2. Wait for each task, aborting any that overrun the grace period
    pub async fn shutdown(self) {
        info!("Initiating graceful shutdown...");

        if self.shutdown_tx.send(true).is_err() {
            debug!("No task was listening for shutdown");
        }

        for (name, mut handle) in self.tasks {
            match tokio::time::timeout(SHUTDOWN_GRACE, &mut handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => error!(task = %name, error = %e, "Task failed"),
                Err(_) => {
                    warn!(task = %name, "Task did not stop in time, aborting");
                    handle.abort();
                }
            }
        }

        info!("Shutdown complete");
    }
}
