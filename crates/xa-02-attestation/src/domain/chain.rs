//! # Per-Chain Aggregation State
//!
//! Pure transition `(state, vote) -> (state', outcome)`. No clock, no
//! randomness and no I/O: every validator applying the same votes in the
//! same order reaches the same state and surfaces the same attestations.
//!
//! ```text
//!   vote(h, hash, w)
//!        │
//!        ├─ h ≤ watermark ─────────────────→ AlreadyFinalized (no-op)
//!        ├─ h > watermark + window ────────→ WindowExceeded
//!        ├─ voter seen at h, same hash ────→ Duplicate (no-op)
//!        ├─ voter seen at h, other hash ───→ Equivocation
//!        ├─ h already approved (held) ─────→ AlreadyDecided (no-op)
//!        └─ add w ─┬─ below quorum ────────→ Counted
//!                  └─ quorum ──────────────→ Approved
//!                        │ prune losers at h
//!                        └ surface watermark+1, +2, ... while approved
//! ```

use super::attestation::{
    Attestation, PruneReason, PrunedCandidate, VoteOutcome, VoteSignature, VoteStatus,
};
use super::validator::{QuorumThreshold, ValidatorSet};
use super::vote::Vote;
use super::window::{Candidate, HeightSlot, VoteWindow};
use crate::error::{AttestError, AttestResult};
use shared_types::{ChainId, ConfLevel, Hash};

/// Aggregation state for one source chain.
#[derive(Clone, Debug)]
pub struct ChainState {
    chain_id: ChainId,
    conf_level: ConfLevel,
    validators: ValidatorSet,
    /// Lowest height not yet surfaced (`watermark + 1`).
    next_height: u64,
    window: VoteWindow,
}

impl ChainState {
    /// Start a chain whose first attestable height is `start_height`.
    pub fn new(
        chain_id: ChainId,
        conf_level: ConfLevel,
        validators: ValidatorSet,
        start_height: u64,
        window_size: u64,
    ) -> Self {
        Self {
            chain_id,
            conf_level,
            validators,
            next_height: start_height,
            window: VoteWindow::new(window_size),
        }
    }

    pub fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    pub fn conf_level(&self) -> ConfLevel {
        self.conf_level
    }

    pub fn validators(&self) -> &ValidatorSet {
        &self.validators
    }

    /// Highest surfaced height, `None` before the first attestation.
    pub fn watermark(&self) -> Option<u64> {
        self.next_height.checked_sub(1)
    }

    pub fn next_height(&self) -> u64 {
        self.next_height
    }

    /// Highest height accepting votes.
    pub fn max_height(&self) -> u64 {
        self.next_height
            .saturating_add(self.window.size())
            .saturating_sub(1)
    }

    /// Heights approved but waiting on a lower height.
    pub fn held_heights(&self) -> Vec<u64> {
        self.window
            .occupied()
            .into_iter()
            .filter(|slot| slot.approved.is_some())
            .map(|slot| slot.height)
            .collect()
    }

    /// Heights with votes but no winner yet.
    pub fn pending_heights(&self) -> Vec<u64> {
        self.window
            .occupied()
            .into_iter()
            .filter(|slot| slot.approved.is_none())
            .map(|slot| slot.height)
            .collect()
    }

    /// Power currently behind `(height, hash)`.
    pub fn tally(&self, height: u64, block_hash: &Hash) -> u128 {
        self.window
            .get(height)
            .and_then(|slot| slot.candidates.get(block_hash))
            .map(|candidate| candidate.power)
            .unwrap_or(0)
    }

    /// Swap the validator set.
    ///
    /// Pending candidates were weighed against the old set and are pruned.
    /// Approved heights keep their decision.
    pub fn replace_validators(&mut self, validators: ValidatorSet) -> Vec<PrunedCandidate> {
        self.validators = validators;
        self.window
            .clear_pending()
            .into_iter()
            .map(|(height, candidate)| {
                self.pruned(height, candidate, PruneReason::ValidatorSetChanged)
            })
            .collect()
    }

    /// Apply an authenticated vote carrying `weight`.
    ///
    /// Rejections leave the state untouched.
    pub fn apply(
        &mut self,
        vote: &Vote,
        weight: u64,
        quorum: &QuorumThreshold,
    ) -> AttestResult<VoteOutcome> {
        if vote.height < self.next_height {
            return Ok(VoteOutcome::noop(VoteStatus::AlreadyFinalized));
        }
        let max_height = self.max_height();
        if vote.height > max_height {
            return Err(AttestError::WindowExceeded {
                chain_id: self.chain_id,
                height: vote.height,
                max_height,
            });
        }

        let total = self.validators.total_power();
        let slot = self.window.get_or_insert(vote.height);

        if let Some(existing) = slot.voters.get(&vote.validator_id) {
            if *existing == vote.block_hash {
                return Ok(VoteOutcome::noop(VoteStatus::Duplicate));
            }
            return Err(AttestError::Equivocation {
                validator: vote.validator_id,
                chain_id: self.chain_id,
                height: vote.height,
                existing: *existing,
                attempted: vote.block_hash,
            });
        }

        if slot.approved.is_some() {
            return Ok(VoteOutcome::noop(VoteStatus::AlreadyDecided));
        }

        let power = slot.add_vote(vote.validator_id, vote.block_hash, weight, vote.signature);
        if !quorum.is_met(power, total) {
            return Ok(VoteOutcome {
                status: VoteStatus::Counted {
                    power,
                    required: quorum.required_power(total),
                },
                emitted: Vec::new(),
                pruned: Vec::new(),
            });
        }

        let height = vote.height;
        let losers = slot.approve(vote.block_hash, total);
        let pruned = losers
            .into_iter()
            .map(|candidate| self.pruned(height, candidate, PruneReason::Superseded))
            .collect();
        let emitted = self.surface();

        Ok(VoteOutcome {
            status: VoteStatus::Approved {
                held: emitted.is_empty(),
            },
            emitted,
            pruned,
        })
    }

    /// Pop consecutive approved heights starting at the watermark.
    fn surface(&mut self) -> Vec<Attestation> {
        let mut emitted = Vec::new();
        while self
            .window
            .get(self.next_height)
            .is_some_and(|slot| slot.approved.is_some())
        {
            let Some(slot) = self.window.take(self.next_height) else {
                break;
            };
            if let Some(attestation) = self.attestation(slot) {
                emitted.push(attestation);
            }
            self.next_height += 1;
        }
        emitted
    }

    fn attestation(&self, slot: HeightSlot) -> Option<Attestation> {
        let winner_hash = slot.approved?;
        let total_power = slot.approved_total;
        let mut candidates = slot.candidates;
        let winner = candidates.remove(&winner_hash)?;
        Some(Attestation {
            chain_id: self.chain_id,
            height: slot.height,
            block_hash: winner.block_hash,
            conf_level: self.conf_level,
            attested_power: winner.power,
            total_power,
            signatures: winner
                .signatures
                .into_iter()
                .map(|(validator_id, signature)| VoteSignature {
                    validator_id,
                    signature,
                })
                .collect(),
        })
    }

    fn pruned(&self, height: u64, candidate: Candidate, reason: PruneReason) -> PrunedCandidate {
        PrunedCandidate {
            chain_id: self.chain_id,
            height,
            block_hash: candidate.block_hash,
            power: candidate.power,
            voters: candidate.voters(),
            reason,
        }
    }
}
