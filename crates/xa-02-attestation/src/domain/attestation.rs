//! Aggregator outputs: attestations, pruned candidates and vote outcomes.

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};
use shared_types::{ChainId, ConfLevel, Hash, Signature, ValidatorId};

/// A validator's signature carried into an attestation.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteSignature {
    pub validator_id: ValidatorId,
    #[serde_as(as = "Bytes")]
    pub signature: Signature,
}

/// Quorum-approved claim that `chain_id` has `block_hash` at `height`.
///
/// At most one exists per `(chain_id, height)`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attestation {
    pub chain_id: ChainId,
    pub height: u64,
    pub block_hash: Hash,
    pub conf_level: ConfLevel,
    /// Summed power of the validators below.
    pub attested_power: u128,
    /// Total power of the chain's validator set when approved.
    pub total_power: u128,
    /// Supporting signatures in validator id order.
    pub signatures: Vec<VoteSignature>,
}

/// Why a candidate left the window without becoming an attestation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PruneReason {
    /// Another hash reached quorum at the same height.
    Superseded,
    /// The validator set was replaced before quorum.
    ValidatorSetChanged,
}

impl PruneReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            PruneReason::Superseded => "superseded",
            PruneReason::ValidatorSetChanged => "validator_set_changed",
        }
    }
}

/// A candidate evicted without reaching quorum.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrunedCandidate {
    pub chain_id: ChainId,
    pub height: u64,
    pub block_hash: Hash,
    pub power: u128,
    pub voters: usize,
    pub reason: PruneReason,
}

/// Effect a vote had on replicated state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VoteStatus {
    /// Height is at or below the watermark.
    AlreadyFinalized,
    /// Validator already voted this hash at this height.
    Duplicate,
    /// Height already approved (held for ordering); vote has no effect on the outcome.
    AlreadyDecided,
    /// Weight added, quorum not yet met.
    Counted { power: u128, required: u128 },
    /// Vote completed a quorum. `held` when lower heights are still pending.
    Approved { held: bool },
}

impl VoteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoteStatus::AlreadyFinalized => "already_finalized",
            VoteStatus::Duplicate => "duplicate",
            VoteStatus::AlreadyDecided => "already_decided",
            VoteStatus::Counted { .. } => "counted",
            VoteStatus::Approved { .. } => "approved",
        }
    }

    /// True if the vote left replicated state unchanged.
    pub fn is_noop(&self) -> bool {
        matches!(
            self,
            VoteStatus::AlreadyFinalized | VoteStatus::Duplicate | VoteStatus::AlreadyDecided
        )
    }
}

/// Result of applying one vote: the new status plus everything it surfaced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VoteOutcome {
    pub status: VoteStatus,
    /// Attestations surfaced by this vote, in increasing height order.
    pub emitted: Vec<Attestation>,
    pub pruned: Vec<PrunedCandidate>,
}

impl VoteOutcome {
    pub fn noop(status: VoteStatus) -> Self {
        Self {
            status,
            emitted: Vec::new(),
            pruned: Vec::new(),
        }
    }
}
