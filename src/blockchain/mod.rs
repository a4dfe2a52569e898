//! Blockchain integration subsystem.
//!
//! # Data Flow
//! ```text
//! Environment Variables (private keys, RPC URL)
//!     → wallet.rs (key loading, signing)
//!     → client.rs (RPC connection with timeouts and failover)
//!     → contracts.rs (claim / ERC-20 calldata)
//!     → transaction.rs (build and sign EIP-1559 payloads)
//! ```
//!
//! # Security Constraints
//! - Private keys ONLY from environment variables
//! - Never log private keys or sensitive data
//! - All RPC calls have configurable timeouts
//! - Signed payloads are only ever handed to the private relay

pub mod client;
pub mod contracts;
pub mod transaction;
pub mod types;
pub mod wallet;

pub use client::BlockchainClient;
pub use transaction::SignedPayload;
pub use types::{BlockchainError, BlockchainResult, ChainConfig, ChainId};
pub use wallet::Wallet;
