//! Driven Ports (SPI - Outbound Dependencies)

use crate::domain::{Attestation, PrunedCandidate, Vote, VoteClaim, VoteStatus};
use crate::error::AttestError;
use shared_types::{ChainId, Hash, PublicKey, Signature, ValidatorId};
use std::sync::Arc;

/// Signature check for votes.
///
/// Must be a pure function of its inputs so every validator agrees.
pub trait VoteVerifier: Send + Sync {
    fn verify(&self, public_key: &PublicKey, message: &Hash, signature: &Signature) -> bool;
}

/// Local signing key used to vote on fetched blocks.
pub trait VoteSigner: Send + Sync {
    fn validator_id(&self) -> ValidatorId;

    fn public_key(&self) -> PublicKey;

    fn sign(&self, claim: &VoteClaim) -> Vote;
}

/// Side-effect sink for aggregator events.
///
/// Logging and metrics live behind this trait so the state machine stays
/// pure. All methods default to no-ops.
pub trait AttestObserver: Send + Sync {
    fn on_vote_rejected(&self, _vote: &Vote, _error: &AttestError) {}

    fn on_vote_applied(&self, _vote: &Vote, _status: &VoteStatus) {}

    fn on_attestation(&self, _attestation: &Attestation) {}

    fn on_pruned(&self, _pruned: &PrunedCandidate) {}

    fn on_watermark(&self, _chain_id: ChainId, _watermark: u64) {}
}

/// Observer that ignores everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopObserver;

impl AttestObserver for NoopObserver {}

/// Fan-out to several observers in registration order.
#[derive(Clone, Default)]
pub struct ObserverSet(Vec<Arc<dyn AttestObserver>>);

impl ObserverSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, observer: Arc<dyn AttestObserver>) -> Self {
        self.0.push(observer);
        self
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AttestObserver for ObserverSet {
    fn on_vote_rejected(&self, vote: &Vote, error: &AttestError) {
        self.0.iter().for_each(|o| o.on_vote_rejected(vote, error));
    }

    fn on_vote_applied(&self, vote: &Vote, status: &VoteStatus) {
        self.0.iter().for_each(|o| o.on_vote_applied(vote, status));
    }

    fn on_attestation(&self, attestation: &Attestation) {
        self.0.iter().for_each(|o| o.on_attestation(attestation));
    }

    fn on_pruned(&self, pruned: &PrunedCandidate) {
        self.0.iter().for_each(|o| o.on_pruned(pruned));
    }

    fn on_watermark(&self, chain_id: ChainId, watermark: u64) {
        self.0.iter().for_each(|o| o.on_watermark(chain_id, watermark));
    }
}
