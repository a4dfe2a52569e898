//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     CLI → .env → config file → credentials + claim file → validated inputs
//!
//! Signals (signals.rs):
//!     SIGINT (Ctrl-C) → shutdown.rs trigger
//!
//! Shutdown (shutdown.rs):
//!     trigger → engine observes it between attempts → Stopped outcome
//! ```
//!
//! # Design Decisions
//! - Fail fast: every input problem is reported before the first network call
//! - Cancellation never interrupts a submission mid-flight

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
