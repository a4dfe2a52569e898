//! Collaborator interfaces consumed by the rescue engine.
//!
//! The engine never talks to an RPC node or a relay directly; everything goes
//! through these two traits so the retry loop can be driven by mocks.

use alloy::consensus::TxEip1559;
use alloy::primitives::{Address, U256};
use async_trait::async_trait;

use crate::blockchain::{BlockchainResult, SignedPayload, Wallet};
use crate::relay::{InclusionStatus, RelayResult, SubmissionHandle};

/// Chain state queries and transaction signing.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Network chain identifier.
    async fn chain_id(&self) -> BlockchainResult<u64>;

    /// Current head block height.
    async fn block_number(&self) -> BlockchainResult<u64>;

    /// Native balance in wei.
    async fn balance(&self, address: Address) -> BlockchainResult<U256>;

    /// Next nonce for `address`.
    async fn transaction_count(&self, address: Address) -> BlockchainResult<u64>;

    /// ERC-20 balance of `holder`.
    async fn token_balance(&self, token: Address, holder: Address) -> BlockchainResult<U256>;

    /// Sign `tx` with `wallet`.
    async fn sign(&self, tx: TxEip1559, wallet: &Wallet) -> BlockchainResult<SignedPayload>;
}

/// Private bundle relay.
#[async_trait]
pub trait RelayClient: Send + Sync {
    /// Submit `payloads`, in order, as one atomic bundle for `target_block` only.
    async fn submit_bundle(&self, payloads: &[SignedPayload], target_block: u64) -> RelayResult<SubmissionHandle>;

    /// Wait for the handle's target block and report whether the bundle landed.
    async fn await_inclusion(&self, handle: &SubmissionHandle) -> RelayResult<InclusionStatus>;
}
