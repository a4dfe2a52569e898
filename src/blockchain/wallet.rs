//! Wallet management and transaction signing.
//!
//! # Security
//! - Private keys are loaded ONLY from environment variables
//! - Keys are never logged or serialized
//! - No local nonce tracking: nonces are re-read from the chain every attempt

use alloy::consensus::TxEip1559;
use alloy::network::TxSignerSync;
use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::{Signature, Signer};

use crate::blockchain::types::{BlockchainError, BlockchainResult};

/// Local signer for one account.
#[derive(Clone)]
pub struct Wallet {
    /// The underlying signer (private key).
    signer: PrivateKeySigner,
}

impl Wallet {
    /// Create a wallet from a hex-encoded private key string.
    ///
    /// # Arguments
    /// * `private_key_hex` - Hex string (with or without 0x prefix)
    ///
    /// # Security
    /// The private key is parsed and stored securely. It is never logged.
    pub fn from_private_key(private_key_hex: &str) -> BlockchainResult<Self> {
        // Strip 0x prefix if present
        let key_hex = private_key_hex.strip_prefix("0x").unwrap_or(private_key_hex);

        let signer: PrivateKeySigner = key_hex
            .parse()
            .map_err(|e| BlockchainError::Wallet(format!("Invalid private key format: {}", e)))?;

        tracing::debug!(address = %signer.address(), "Wallet initialized");

        Ok(Self { signer })
    }

    /// Generate a throwaway identity (used to authenticate relay requests).
    pub fn random() -> Self {
        Self {
            signer: PrivateKeySigner::random(),
        }
    }

    /// Get the wallet's address.
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Sign an EIP-1559 transaction over its signing hash.
    pub fn sign_transaction(&self, tx: &mut TxEip1559) -> BlockchainResult<Signature> {
        self.signer
            .sign_transaction_sync(tx)
            .map_err(|e| BlockchainError::Signing(format!("Transaction signing failed: {}", e)))
    }

    /// Sign arbitrary message bytes (with Ethereum prefix).
    pub async fn sign_message(&self, message: &[u8]) -> BlockchainResult<Signature> {
        self.signer
            .sign_message(message)
            .await
            .map_err(|e| BlockchainError::Signing(format!("Message signing failed: {}", e)))
    }
}

impl std::fmt::Debug for Wallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wallet")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}
