//! Domain layer for the Attestation subsystem

pub mod attestation;
pub mod chain;
pub mod validator;
pub mod vote;
pub mod window;

pub use attestation::{
    Attestation, PruneReason, PrunedCandidate, VoteOutcome, VoteSignature, VoteStatus,
};
pub use chain::ChainState;
pub use validator::{QuorumThreshold, Validator, ValidatorSet};
pub use vote::{Vote, VoteClaim};
pub use window::{Candidate, HeightSlot, VoteWindow};
