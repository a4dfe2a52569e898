//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → RescueConfig (validated, immutable)
//!
//! environment (.env + process env)
//!     → credentials.rs (keys, addresses, RPC endpoint)
//!     → Credentials (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All tunables have defaults to allow running without a file
//! - Secrets never live in the file, only in the environment
//! - Every missing or malformed value is reported at once

pub mod credentials;
pub mod loader;
pub mod schema;
pub mod validation;

pub use credentials::Credentials;
pub use loader::{load_config, ConfigError};
pub use schema::RescueConfig;
pub use schema::{ChainConfig, FeeConfig, GasConfig, RelayConfig, RetryConfig};
pub use validation::ValidationError;
