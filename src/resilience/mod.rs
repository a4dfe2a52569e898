//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Transient RPC/relay failure during an attempt:
//!     → retries.rs (count consecutive failures, give up past the limit)
//!     → backoff.rs (exponential delay with jitter before the retry)
//! ```
//!
//! # Design Decisions
//! - Transient failures never escalate fees; only a missed block does
//! - Any successful step resets the consecutive failure count
//! - Backoff is capped so a long outage does not stall past the block cadence

pub mod backoff;
pub mod retries;

pub use backoff::calculate_backoff;
pub use retries::{RetryPolicy, TransientTracker};
