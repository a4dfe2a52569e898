//! Private relay subsystem.
//!
//! # Data Flow
//! ```text
//! signed payloads (fund, claim, sweep)
//!     → flashbots.rs: eth_sendBundle for head + 1 (signed request)
//!     → SubmissionHandle (target block + tx hashes/nonces)
//!     → flashbots.rs: wait for target block, check receipts and nonces
//!     → InclusionStatus
//! ```
//!
//! # Design Decisions
//! - A bundle is valid for exactly one block; a new attempt means a new bundle
//! - Inclusion is an explicit tagged status, never a numeric sentinel
//! - Claim and sweep are never broadcast individually

pub mod flashbots;
pub mod types;

pub use flashbots::FlashbotsRelay;
pub use types::{BundledTx, InclusionStatus, RelayError, RelayResult, SubmissionHandle};
