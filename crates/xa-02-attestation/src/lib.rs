//! # xa-02-attestation
//!
//! Deterministic attestation aggregator: turns validator votes on
//! source-chain blocks into an ordered, gap-free stream of
//! quorum-approved attestations per chain.
//!
//! ## Overview
//!
//! - **Stake-weighted quorum**: a candidate `(chain, height, hash)` is
//!   approved once its voters hold `ceil(f × T)` of the chain's power
//! - **Mutual exclusion**: one attestation per `(chain, height)`; losing
//!   candidates at that height are pruned
//! - **Equivocation containment**: a validator's second, conflicting vote
//!   at a height is rejected and never touches the tally
//! - **Ordered output**: approvals above the watermark are held until the
//!   gap below them fills
//! - **Bounded memory**: votes are accepted only within a fixed ring of
//!   heights above the watermark
//!
//! ## Architecture
//!
//! ```text
//!  Vote ──→ Aggregator ──authenticate──→ ChainState::apply ──→ VoteOutcome
//!           │  (VoteVerifier,               (pure)              │
//!           │   ValidatorSet)                                   │ emitted
//!           └──────────── AttestObserver ←──────────────────────┘ pruned
//!                         (logs, metrics)
//! ```
//!
//! ## Determinism
//!
//! | Input           | Source                       |
//! |-----------------|------------------------------|
//! | Vote weight     | Registered validator set     |
//! | Threshold       | `AggregatorConfig::quorum`   |
//! | Identity        | Vote payload + signature     |
//! | Iteration order | `BTreeMap` only              |
//!
//! Nothing reads the clock, randomness or the network. Observers run after
//! a transition completes and cannot influence it.

pub mod adapters;
pub mod domain;
pub mod error;
#[cfg(feature = "metrics")]
pub mod metrics;
pub mod ports;
pub mod service;

pub use adapters::{Ed25519VoteSigner, Ed25519VoteVerifier, TracingObserver};
pub use domain::{
    Attestation, ChainState, PruneReason, PrunedCandidate, QuorumThreshold, Validator,
    ValidatorSet, Vote, VoteClaim, VoteOutcome, VoteSignature, VoteStatus,
};
pub use error::{AttestError, AttestResult, InvalidVoteReason};
pub use ports::inbound::{AttestationApi, BatchOutcome, ChainRegistration};
pub use ports::outbound::{AttestObserver, NoopObserver, ObserverSet, VoteSigner, VoteVerifier};
pub use service::{Aggregator, AggregatorConfig};
