//! Driving Ports (API - Inbound)
//!
//! The aggregator is driven by the host's ordered transaction pipeline.
//! Calls are synchronous and take `&mut self`: the host guarantees
//! exclusive, sequential access, so no locking happens inside.

use crate::domain::{Attestation, ChainState, PrunedCandidate, ValidatorSet, Vote, VoteOutcome};
use crate::error::AttestResult;
use shared_types::{ChainId, ConfLevel};

/// Registration of a source chain with the aggregator.
#[derive(Clone, Debug)]
pub struct ChainRegistration {
    pub chain_id: ChainId,
    pub conf_level: ConfLevel,
    /// First height that can be attested; the watermark starts one below.
    pub start_height: u64,
    pub validators: ValidatorSet,
}

/// Per-vote results of a batch, in submission order.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub results: Vec<AttestResult<VoteOutcome>>,
}

impl BatchOutcome {
    /// Votes that did not error (no-ops included).
    pub fn accepted(&self) -> usize {
        self.results.iter().filter(|r| r.is_ok()).count()
    }

    pub fn rejected(&self) -> usize {
        self.results.len() - self.accepted()
    }

    /// Every attestation surfaced by the batch, in surfacing order.
    pub fn emitted(&self) -> Vec<&Attestation> {
        self.results
            .iter()
            .filter_map(|r| r.as_ref().ok())
            .flat_map(|outcome| outcome.emitted.iter())
            .collect()
    }
}

/// Primary Attestation API
pub trait AttestationApi {
    /// Add a chain. The same chain cannot be registered twice.
    fn register_chain(&mut self, registration: ChainRegistration) -> AttestResult<()>;

    /// Replace a chain's validator set; returns the candidates pruned.
    fn replace_validator_set(
        &mut self,
        chain_id: ChainId,
        validators: ValidatorSet,
    ) -> AttestResult<Vec<PrunedCandidate>>;

    /// Authenticate and apply one vote.
    fn submit_vote(&mut self, vote: &Vote) -> AttestResult<VoteOutcome>;

    /// Apply votes in order. Each vote succeeds or fails independently;
    /// the whole batch is refused only when it exceeds the batch limit.
    fn submit_votes(&mut self, votes: &[Vote]) -> AttestResult<BatchOutcome>;

    /// Highest surfaced height of a chain.
    fn watermark(&self, chain_id: ChainId) -> AttestResult<Option<u64>>;

    /// Read-only view of a chain's state.
    fn chain(&self, chain_id: ChainId) -> AttestResult<&ChainState>;

    /// Registered chains in id order.
    fn chain_ids(&self) -> Vec<ChainId>;
}
