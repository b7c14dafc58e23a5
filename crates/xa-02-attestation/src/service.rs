//! Attestation Aggregator - Core business logic
//!
//! Authenticates votes against replicated validator state, then hands them
//! to the per-chain [`ChainState`] transition. Side effects go to the
//! injected [`AttestObserver`] after the transition has completed.

use crate::domain::{ChainState, PrunedCandidate, QuorumThreshold, ValidatorSet, Vote, VoteOutcome};
use crate::error::{AttestError, AttestResult, InvalidVoteReason};
use crate::ports::inbound::{AttestationApi, BatchOutcome, ChainRegistration};
use crate::ports::outbound::{AttestObserver, NoopObserver, VoteVerifier};
use shared_types::ChainId;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

/// Aggregator configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AggregatorConfig {
    /// Heights above the watermark accepting votes
    pub window_size: u64,
    /// Fraction of total power needed to approve
    pub quorum: QuorumThreshold,
    /// Largest batch accepted by `submit_votes`
    pub max_votes_per_batch: usize,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            window_size: 64,
            quorum: QuorumThreshold::TWO_THIRDS,
            max_votes_per_batch: 1024,
        }
    }
}

impl AggregatorConfig {
    pub fn validate(&self) -> AttestResult<()> {
        if self.window_size == 0 {
            return Err(AttestError::InvalidConfig(
                "window_size must be positive".into(),
            ));
        }
        if self.max_votes_per_batch == 0 {
            return Err(AttestError::InvalidConfig(
                "max_votes_per_batch must be positive".into(),
            ));
        }
        self.quorum.validate()
    }
}

/// Deterministic multi-chain vote aggregator.
pub struct Aggregator<V: VoteVerifier> {
    config: AggregatorConfig,
    verifier: V,
    chains: BTreeMap<ChainId, ChainState>,
    observer: Arc<dyn AttestObserver>,
}

impl<V: VoteVerifier> Aggregator<V> {
    pub fn new(config: AggregatorConfig, verifier: V) -> AttestResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            verifier,
            chains: BTreeMap::new(),
            observer: Arc::new(NoopObserver),
        })
    }

    pub fn with_observer(mut self, observer: Arc<dyn AttestObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    /// Signature and power checks against the chain's validator set.
    fn authenticate(&self, chain: &ChainState, vote: &Vote) -> AttestResult<u64> {
        let invalid = |reason| AttestError::InvalidVote {
            validator: vote.validator_id,
            reason,
        };
        let validator = chain
            .validators()
            .get(&vote.validator_id)
            .ok_or_else(|| invalid(InvalidVoteReason::UnknownValidator))?;
        if validator.power == 0 {
            return Err(invalid(InvalidVoteReason::ZeroPower));
        }
        let message = vote.claim().signing_message();
        if !self
            .verifier
            .verify(&validator.public_key, &message, &vote.signature)
        {
            return Err(invalid(InvalidVoteReason::BadSignature));
        }
        Ok(validator.power)
    }

    fn apply(&mut self, vote: &Vote) -> AttestResult<VoteOutcome> {
        let chain = self
            .chains
            .get(&vote.chain_id)
            .ok_or(AttestError::UnknownChain(vote.chain_id))?;
        let weight = self.authenticate(chain, vote)?;
        let quorum = self.config.quorum;
        let chain = self
            .chains
            .get_mut(&vote.chain_id)
            .ok_or(AttestError::UnknownChain(vote.chain_id))?;
        let outcome = chain.apply(vote, weight, &quorum)?;
        if let Some(last) = outcome.emitted.last() {
            self.observer.on_watermark(last.chain_id, last.height);
        }
        Ok(outcome)
    }

    fn notify(&self, vote: &Vote, result: &AttestResult<VoteOutcome>) {
        match result {
            Ok(outcome) => {
                self.observer.on_vote_applied(vote, &outcome.status);
                for pruned in &outcome.pruned {
                    self.observer.on_pruned(pruned);
                }
                for attestation in &outcome.emitted {
                    self.observer.on_attestation(attestation);
                }
            }
            Err(err) => self.observer.on_vote_rejected(vote, err),
        }
    }
}

impl<V: VoteVerifier> AttestationApi for Aggregator<V> {
    fn register_chain(&mut self, registration: ChainRegistration) -> AttestResult<()> {
        let chain_id = registration.chain_id;
        if self.chains.contains_key(&chain_id) {
            return Err(AttestError::ChainAlreadyRegistered(chain_id));
        }
        info!(
            chain_id,
            start_height = registration.start_height,
            validators = registration.validators.len(),
            total_power = %registration.validators.total_power(),
            conf_level = %registration.conf_level,
            "[xa-02] Chain registered"
        );
        self.chains.insert(
            chain_id,
            ChainState::new(
                chain_id,
                registration.conf_level,
                registration.validators,
                registration.start_height,
                self.config.window_size,
            ),
        );
        Ok(())
    }

    fn replace_validator_set(
        &mut self,
        chain_id: ChainId,
        validators: ValidatorSet,
    ) -> AttestResult<Vec<PrunedCandidate>> {
        let chain = self
            .chains
            .get_mut(&chain_id)
            .ok_or(AttestError::UnknownChain(chain_id))?;
        info!(
            chain_id,
            validators = validators.len(),
            total_power = %validators.total_power(),
            "[xa-02] Validator set replaced"
        );
        let pruned = chain.replace_validators(validators);
        for candidate in &pruned {
            self.observer.on_pruned(candidate);
        }
        Ok(pruned)
    }

    fn submit_vote(&mut self, vote: &Vote) -> AttestResult<VoteOutcome> {
        let result = self.apply(vote);
        self.notify(vote, &result);
        result
    }

    fn submit_votes(&mut self, votes: &[Vote]) -> AttestResult<BatchOutcome> {
        if votes.len() > self.config.max_votes_per_batch {
            return Err(AttestError::BatchTooLarge {
                size: votes.len(),
                limit: self.config.max_votes_per_batch,
            });
        }
        let results = votes.iter().map(|vote| self.submit_vote(vote)).collect();
        Ok(BatchOutcome { results })
    }

    fn watermark(&self, chain_id: ChainId) -> AttestResult<Option<u64>> {
        self.chain(chain_id).map(ChainState::watermark)
    }

    fn chain(&self, chain_id: ChainId) -> AttestResult<&ChainState> {
        self.chains
            .get(&chain_id)
            .ok_or(AttestError::UnknownChain(chain_id))
    }

    fn chain_ids(&self) -> Vec<ChainId> {
        self.chains.keys().copied().collect()
    }
}
