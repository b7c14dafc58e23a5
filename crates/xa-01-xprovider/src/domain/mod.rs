//! Domain layer for the XProvider subsystem

pub mod backoff;
pub mod cancel;
pub mod stream;
pub mod verify;

pub use backoff::{Backoff, BackoffConfig};
pub use cancel::Cancellation;
pub use stream::{StreamOptions, Streamer};
pub use verify::verify_block;
