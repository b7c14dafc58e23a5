//! Periodic cursor report and metrics export.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use shared_types::NetworkSpec;
use tracing::{info, warn};
use xa_01_xprovider::Cancellation;
use xa_03_indexer::{Cursor, IndexQueryApi, IndexResult};
use xa_telemetry::MetricsRegistry;

use crate::container::NodeReader;

/// Logs every indexed cursor and rewrites the metrics text file.
pub struct CursorMonitor {
    reader: NodeReader,
    network: Arc<NetworkSpec>,
    metrics: MetricsRegistry,
    metrics_file: Option<PathBuf>,
    interval: Duration,
}

impl CursorMonitor {
    pub fn new(
        reader: NodeReader,
        network: Arc<NetworkSpec>,
        metrics: MetricsRegistry,
        metrics_file: Option<PathBuf>,
        interval: Duration,
    ) -> Self {
        Self {
            reader,
            network,
            metrics,
            metrics_file,
            interval,
        }
    }

    pub async fn run(self, mut cancel: Cancellation) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = cancel.canceled() => {
                    info!("[xa-03] Monitor stopped");
                    return;
                }
                _ = ticker.tick() => self.report(),
            }
        }
    }

    /// One report: cursors to the log, metrics to the text file.
    pub fn report(&self) {
        match self.snapshot() {
            Ok(cursors) if cursors.is_empty() => info!("[xa-03] No cursors indexed yet"),
            Ok(cursors) => {
                for cursor in cursors {
                    info!(
                        chain = %self.network.chain_name(cursor.chain_id),
                        level = %cursor.conf_level,
                        height = cursor.height,
                        "[xa-03] Cursor"
                    );
                }
            }
            Err(e) => warn!(error = %e, "[xa-03] Failed to read cursors"),
        }

        if let Some(path) = &self.metrics_file {
            if let Err(e) = self.metrics.write_textfile(path) {
                warn!(path = %path.display(), error = %e, "Failed to write metrics file");
            }
        }
    }

    pub fn snapshot(&self) -> IndexResult<Vec<Cursor>> {
        self.reader.cursors()
    }
}
