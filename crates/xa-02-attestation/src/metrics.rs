//! # Attestation Metrics
//!
//! Prometheus observer for aggregator events. Enable with the `metrics`
//! feature.
//!
//! ## Metrics Exported
//!
//! - `xa_attest_approvals_total{chain}` - Attestations surfaced
//! - `xa_attest_rejections_total{chain, reason}` - Rejected votes by error kind
//! - `xa_attest_pruned_total{chain, reason}` - Candidates evicted without quorum
//! - `xa_attest_watermark{chain}` - Highest surfaced height

use crate::domain::{Attestation, PrunedCandidate, Vote};
use crate::error::AttestError;
use crate::ports::outbound::AttestObserver;
use prometheus::{IntCounterVec, IntGaugeVec, Opts, Registry};
use shared_types::{ChainId, NetworkSpec};
use std::collections::BTreeMap;

/// Observer that records aggregator events on a caller-owned registry.
#[derive(Clone)]
pub struct PrometheusAttestObserver {
    names: BTreeMap<ChainId, String>,
    approvals: IntCounterVec,
    rejections: IntCounterVec,
    pruned: IntCounterVec,
    watermark: IntGaugeVec,
}

impl PrometheusAttestObserver {
    pub fn register(registry: &Registry, network: &NetworkSpec) -> Result<Self, prometheus::Error> {
        let approvals = IntCounterVec::new(
            Opts::new("xa_attest_approvals_total", "Total attestations surfaced"),
            &["chain"],
        )?;
        let rejections = IntCounterVec::new(
            Opts::new("xa_attest_rejections_total", "Total rejected votes"),
            &["chain", "reason"],
        )?;
        let pruned = IntCounterVec::new(
            Opts::new(
                "xa_attest_pruned_total",
                "Total candidates evicted without reaching quorum",
            ),
            &["chain", "reason"],
        )?;
        let watermark = IntGaugeVec::new(
            Opts::new("xa_attest_watermark", "Highest surfaced attestation height"),
            &["chain"],
        )?;

        registry.register(Box::new(approvals.clone()))?;
        registry.register(Box::new(rejections.clone()))?;
        registry.register(Box::new(pruned.clone()))?;
        registry.register(Box::new(watermark.clone()))?;

        Ok(Self {
            names: network
                .chains
                .iter()
                .map(|chain| (chain.id, chain.name.clone()))
                .collect(),
            approvals,
            rejections,
            pruned,
            watermark,
        })
    }

    fn label(&self, chain_id: ChainId) -> String {
        self.names
            .get(&chain_id)
            .cloned()
            .unwrap_or_else(|| chain_id.to_string())
    }
}

impl AttestObserver for PrometheusAttestObserver {
    fn on_vote_rejected(&self, vote: &Vote, error: &AttestError) {
        self.rejections
            .with_label_values(&[&self.label(vote.chain_id), error.kind()])
            .inc();
    }

    fn on_attestation(&self, attestation: &Attestation) {
        self.approvals
            .with_label_values(&[&self.label(attestation.chain_id)])
            .inc();
    }

    fn on_pruned(&self, pruned: &PrunedCandidate) {
        self.pruned
            .with_label_values(&[&self.label(pruned.chain_id), pruned.reason.as_str()])
            .inc();
    }

    fn on_watermark(&self, chain_id: ChainId, watermark: u64) {
        self.watermark
            .with_label_values(&[&self.label(chain_id)])
            .set(i64::try_from(watermark).unwrap_or(i64::MAX));
    }
}
