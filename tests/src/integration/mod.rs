//! # Cross-Crate Integration
//!
//! | Module | Crates |
//! |---|---|
//! | `e2e_attestation` | xa-01 → xa-02 → xa-03 |
//! | `stream_resilience` | xa-01 |
//! | `properties` | xa-02 → xa-03 (proptest) |
//! | `node_lifecycle` | node-runtime |

pub mod e2e_attestation;
pub mod stream_resilience;
