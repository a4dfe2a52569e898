//! Fresh chain state read at the start of every attempt.

use alloy::primitives::{Address, U256};

use crate::blockchain::BlockchainResult;
use crate::rescue::ports::ChainClient;

/// Nonce and native balance of one account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountState {
    pub address: Address,
    pub nonce: u64,
    pub balance: U256,
}

/// Everything an attempt needs from the chain, read in one pass.
///
/// Never reused across attempts: nonces and balances may move between blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptSnapshot {
    pub chain_id: u64,
    pub funding: AccountState,
    pub at_risk: AccountState,
    /// Token balance of the at-risk account before the claim executes.
    pub token_balance: U256,
}

impl AttemptSnapshot {
    pub async fn fetch<C: ChainClient + ?Sized>(
        chain: &C,
        funding: Address,
        at_risk: Address,
        token: Address,
    ) -> BlockchainResult<Self> {
        let chain_id = chain.chain_id().await?;
        let funding_state = AccountState {
            address: funding,
            nonce: chain.transaction_count(funding).await?,
            balance: chain.balance(funding).await?,
        };
        let at_risk_state = AccountState {
            address: at_risk,
            nonce: chain.transaction_count(at_risk).await?,
            balance: chain.balance(at_risk).await?,
        };
        let token_balance = chain.token_balance(token, at_risk).await?;

        tracing::debug!(
            chain_id,
            funding_nonce = funding_state.nonce,
            funding_balance = %funding_state.balance,
            at_risk_nonce = at_risk_state.nonce,
            token_balance = %token_balance,
            "Chain state read"
        );

        Ok(Self {
            chain_id,
            funding: funding_state,
            at_risk: at_risk_state,
            token_balance,
        })
    }
}
