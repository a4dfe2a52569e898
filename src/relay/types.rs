//! Relay submission types and error definitions.

use alloy::primitives::{Address, TxHash, B256};
use thiserror::Error;

use crate::blockchain::types::BlockchainError;
use crate::blockchain::SignedPayload;

/// Transaction metadata retained after submission for the inclusion check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundledTx {
    pub hash: TxHash,
    pub signer: Address,
    pub nonce: u64,
}

impl From<&SignedPayload> for BundledTx {
    fn from(payload: &SignedPayload) -> Self {
        Self {
            hash: payload.hash,
            signer: payload.signer,
            nonce: payload.nonce,
        }
    }
}

/// Proof of an accepted submission, scoped to exactly one target block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionHandle {
    /// Bundle hash reported by the relay, when it returns one.
    pub bundle_hash: Option<B256>,
    /// The only block this bundle is valid for.
    pub target_block: u64,
    /// Bundled transactions, in order.
    pub transactions: Vec<BundledTx>,
}

/// Outcome of the inclusion check for one target block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InclusionStatus {
    /// Every bundled transaction landed in the target block.
    Included,
    /// The target block was produced without the bundle.
    BlockPassedWithoutInclusion,
    /// A bundled nonce was consumed by some other transaction.
    AccountNonceTooHigh,
}

/// Errors returned by the relay client.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The relay refused the bundle (malformed, failed simulation, ...).
    #[error("relay rejected bundle: {0}")]
    Rejected(String),

    /// Connectivity or protocol failure talking to the relay.
    #[error("relay transport error: {0}")]
    Transport(String),

    /// The target block did not arrive before the inclusion deadline.
    #[error("target block {0} not observed before the inclusion deadline")]
    InclusionTimeout(u64),

    /// Chain query made during the inclusion check failed.
    #[error(transparent)]
    Chain(#[from] BlockchainError),
}

impl RelayError {
    /// Whether retrying later may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            RelayError::Rejected(_) => false,
            RelayError::Transport(_) | RelayError::InclusionTimeout(_) => true,
            RelayError::Chain(e) => e.is_transient(),
        }
    }
}

/// Result type for relay operations.
pub type RelayResult<T> = Result<T, RelayError>;
