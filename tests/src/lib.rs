//! # X-Attest Test Suite
//!
//! Cross-crate tests for the attestation node.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── exploits/         # Hostile validators and malformed votes
//! │   └── vote_attacks.rs
//! │
//! └── integration/      # Provider → aggregator → indexer flows
//!     ├── e2e_attestation.rs
//!     ├── stream_resilience.rs
//!     └── properties.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p xa-tests
//!
//! # By category
//! cargo test -p xa-tests integration::
//! cargo test -p xa-tests exploits::
//!
//! # Benchmarks
//! cargo bench -p xa-tests
//! ```

#![allow(unused_variables)]
#![allow(unused_imports)]
#![allow(dead_code)]

pub mod fixtures;
pub mod integration;
