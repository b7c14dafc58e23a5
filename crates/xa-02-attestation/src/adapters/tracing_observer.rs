//! Structured logging of aggregator events.

use crate::domain::{Attestation, PruneReason, PrunedCandidate, Vote, VoteStatus};
use crate::error::AttestError;
use crate::ports::outbound::AttestObserver;
use shared_types::{short_hex, ChainId, NetworkSpec};
use std::collections::BTreeMap;
use tracing::{debug, error, info, warn};

/// Logs aggregator events with chain names resolved from the network.
#[derive(Clone, Debug, Default)]
pub struct TracingObserver {
    names: BTreeMap<ChainId, String>,
}

impl TracingObserver {
    pub fn new(names: BTreeMap<ChainId, String>) -> Self {
        Self { names }
    }

    pub fn for_network(network: &NetworkSpec) -> Self {
        Self::new(
            network
                .chains
                .iter()
                .map(|chain| (chain.id, chain.name.clone()))
                .collect(),
        )
    }

    fn name(&self, chain_id: ChainId) -> String {
        self.names
            .get(&chain_id)
            .cloned()
            .unwrap_or_else(|| chain_id.to_string())
    }
}

impl AttestObserver for TracingObserver {
    fn on_vote_rejected(&self, vote: &Vote, err: &AttestError) {
        let chain = self.name(vote.chain_id);
        match err {
            AttestError::Equivocation { .. } => error!(
                chain = %chain,
                height = vote.height,
                validator = %vote.validator_id,
                "[xa-02] {}", err
            ),
            AttestError::WindowExceeded { .. } => debug!(
                chain = %chain,
                height = vote.height,
                validator = %vote.validator_id,
                "[xa-02] {}", err
            ),
            _ => warn!(
                chain = %chain,
                height = vote.height,
                validator = %vote.validator_id,
                kind = err.kind(),
                "[xa-02] Vote rejected: {}", err
            ),
        }
    }

    fn on_vote_applied(&self, vote: &Vote, status: &VoteStatus) {
        debug!(
            chain = %self.name(vote.chain_id),
            height = vote.height,
            hash = %short_hex(&vote.block_hash),
            validator = %vote.validator_id,
            status = status.as_str(),
            "[xa-02] Vote applied"
        );
    }

    fn on_attestation(&self, attestation: &Attestation) {
        info!(
            chain = %self.name(attestation.chain_id),
            height = attestation.height,
            hash = %short_hex(&attestation.block_hash),
            power = %attestation.attested_power,
            total = %attestation.total_power,
            signers = attestation.signatures.len(),
            "[xa-02] Attestation approved"
        );
    }

    fn on_pruned(&self, pruned: &PrunedCandidate) {
        let chain = self.name(pruned.chain_id);
        match pruned.reason {
            PruneReason::Superseded => error!(
                chain = %chain,
                height = pruned.height,
                hash = %short_hex(&pruned.block_hash),
                power = %pruned.power,
                voters = pruned.voters,
                "[xa-02] Validators attested a losing block hash, finality failure, resync required"
            ),
            PruneReason::ValidatorSetChanged => warn!(
                chain = %chain,
                height = pruned.height,
                hash = %short_hex(&pruned.block_hash),
                voters = pruned.voters,
                "[xa-02] Candidate dropped on validator set change"
            ),
        }
    }
}
