//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Rescue engine produces:
//!     → logging.rs (structured log events, fee ledger each attempt)
//!     → metrics.rs (attempt, submission and failure counters; fee gauge)
//!     → tracing.rs (root span carrying the run id)
//!
//! Consumers:
//!     → stderr/stdout via tracing-subscriber
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Private keys never appear in logs or metrics
//! - Every log line of a run carries the same run id
//! - Metrics are free when no exporter is installed

pub mod logging;
pub mod metrics;
pub mod tracing;
