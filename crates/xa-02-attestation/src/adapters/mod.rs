//! Adapters for the Attestation subsystem ports

pub mod ed25519;
pub mod tracing_observer;

pub use ed25519::{Ed25519VoteSigner, Ed25519VoteVerifier};
pub use tracing_observer::TracingObserver;
