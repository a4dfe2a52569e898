//! Atomic airdrop rescue through a private bundle relay.

pub mod blockchain;
pub mod config;
pub mod lifecycle;
pub mod observability;
pub mod relay;
pub mod rescue;
pub mod resilience;

pub use config::schema::RescueConfig;
pub use lifecycle::Shutdown;
pub use rescue::{Orchestrator, RescueError, RescueOutcome};
