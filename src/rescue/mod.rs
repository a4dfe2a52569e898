//! Rescue engine.
//!
//! # Data Flow
//! ```text
//! RescuePlan + wallets + config
//!     → orchestrator.rs (state machine, one attempt in flight)
//!         Preparing:          snapshot.rs → amounts.rs (ledger, guard) → bundle.rs (build, sign)
//!         Submitting:         ports::RelayClient::submit_bundle(head + 1)
//!         AwaitingInclusion:  ports::RelayClient::await_inclusion
//!         Escalating:         fees.rs → wait one block interval → Preparing
//!     → RescueOutcome | RescueError
//! ```
//!
//! # Design Decisions
//! - Chain state is re-read every attempt; nothing but fees and counters carries over
//! - The balance guard runs before anything is signed
//! - Relay rejection is fatal; a missed block is not an error
//! - Transient network failures are retried with backoff, never with higher fees

pub mod amounts;
pub mod bundle;
pub mod fees;
pub mod orchestrator;
pub mod plan;
pub mod ports;
pub mod snapshot;

pub use amounts::{FeeBreakdown, GasBudget, InsufficientFunds};
pub use bundle::{Bundle, BundleBuilder, ChainedNonces, UnsignedBundle};
pub use fees::{FeeController, FeeParameters};
pub use orchestrator::{Limits, Orchestrator, PreparedAttempt, Progress, StopCondition, StopReason};
pub use plan::RescuePlan;
pub use ports::{ChainClient, RelayClient};
pub use snapshot::{AccountState, AttemptSnapshot};

use thiserror::Error;

use crate::blockchain::BlockchainError;
use crate::config::ConfigError;
use crate::relay::RelayError;

/// Process exit status for a fatal error or a stopped run.
pub mod exit_code {
    pub const INCLUDED: u8 = 0;
    pub const INSUFFICIENT_FUNDS: u8 = 1;
    pub const FATAL: u8 = 2;
    pub const STOPPED: u8 = 3;
}

/// How a run that did not fail ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RescueOutcome {
    /// The bundle landed.
    Included { attempts: u32, target_block: u64 },
    /// A termination condition ended the loop first.
    Stopped { reason: StopReason, attempts: u32 },
}

impl RescueOutcome {
    pub fn exit_code(&self) -> u8 {
        match self {
            RescueOutcome::Included { .. } => exit_code::INCLUDED,
            RescueOutcome::Stopped { .. } => exit_code::STOPPED,
        }
    }
}

/// Fatal rescue errors.
#[derive(Debug, Error)]
pub enum RescueError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    InsufficientFunds(#[from] InsufficientFunds),

    /// The relay refused the bundle; carries the state in force at the time.
    #[error("relay rejected bundle on attempt {attempt} ({fees}): {reason}")]
    RelayRejected {
        reason: String,
        attempt: u32,
        fees: FeeParameters,
    },

    #[error(transparent)]
    Chain(#[from] BlockchainError),

    #[error(transparent)]
    Relay(#[from] RelayError),

    #[error("giving up after {failures} consecutive transient failures, last: {last}")]
    TransientExhausted { failures: u32, last: String },
}

impl RescueError {
    /// Whether the failing step may succeed if retried unchanged.
    pub fn is_transient(&self) -> bool {
        match self {
            RescueError::Chain(e) => e.is_transient(),
            RescueError::Relay(e) => e.is_transient(),
            _ => false,
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            RescueError::InsufficientFunds(_) => exit_code::INSUFFICIENT_FUNDS,
            _ => exit_code::FATAL,
        }
    }
}
