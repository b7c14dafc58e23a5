//! # Indexer Metrics
//!
//! Enable with the `metrics` feature.
//!
//! - `xa_indexer_blocks_total{chain}` - Blocks indexed
//! - `xa_indexer_inconsistencies_total{chain, kind}` - Receipt and origin anomalies
//! - `xa_indexer_cursor{chain, level}` - Current cursor height

use crate::ports::outbound::IndexMetrics;
use prometheus::{IntCounterVec, IntGaugeVec, Opts, Registry};
use shared_types::{ChainId, ConfLevel, NetworkSpec};
use std::collections::BTreeMap;

/// Prometheus-backed [`IndexMetrics`].
#[derive(Clone)]
pub struct PrometheusIndexMetrics {
    names: BTreeMap<ChainId, String>,
    blocks: IntCounterVec,
    inconsistencies: IntCounterVec,
    cursor: IntGaugeVec,
}

impl PrometheusIndexMetrics {
    pub fn register(registry: &Registry, network: &NetworkSpec) -> Result<Self, prometheus::Error> {
        let blocks = IntCounterVec::new(
            Opts::new("xa_indexer_blocks_total", "Total blocks indexed"),
            &["chain"],
        )?;
        let inconsistencies = IntCounterVec::new(
            Opts::new(
                "xa_indexer_inconsistencies_total",
                "Receipts without origin, duplicate receipts and duplicate origins",
            ),
            &["chain", "kind"],
        )?;
        let cursor = IntGaugeVec::new(
            Opts::new("xa_indexer_cursor", "Highest indexed height per confidence level"),
            &["chain", "level"],
        )?;

        registry.register(Box::new(blocks.clone()))?;
        registry.register(Box::new(inconsistencies.clone()))?;
        registry.register(Box::new(cursor.clone()))?;

        Ok(Self {
            names: network
                .chains
                .iter()
                .map(|chain| (chain.id, chain.name.clone()))
                .collect(),
            blocks,
            inconsistencies,
            cursor,
        })
    }

    fn label(&self, chain_id: ChainId) -> String {
        self.names
            .get(&chain_id)
            .cloned()
            .unwrap_or_else(|| chain_id.to_string())
    }
}

impl IndexMetrics for PrometheusIndexMetrics {
    fn block_indexed(&self, chain_id: ChainId, _height: u64) {
        self.blocks.with_label_values(&[&self.label(chain_id)]).inc();
    }

    fn inconsistency(&self, chain_id: ChainId, kind: &'static str) {
        self.inconsistencies
            .with_label_values(&[&self.label(chain_id), kind])
            .inc();
    }

    fn cursor_advanced(&self, chain_id: ChainId, level: ConfLevel, height: u64) {
        self.cursor
            .with_label_values(&[&self.label(chain_id), level.label()])
            .set(i64::try_from(height).unwrap_or(i64::MAX));
    }
}
