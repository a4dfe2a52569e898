//! Assembly of the three-transaction rescue bundle.
//!
//! # Bundle layout
//! ```text
//! 1. funding  → at-risk          value = funding amount     nonce = funding nonce
//! 2. at-risk  → claim contract   claim(index, account, amount, proof)
//!                                                            nonce = at-risk nonce
//! 3. at-risk  → token contract   transfer(funding, sweep amount)
//!                                                            nonce = at-risk nonce + 1
//! ```
//!
//! Building is pure; signing goes through [`ChainClient`] so unsigned
//! transactions never leave this module.

use alloy::consensus::TxEip1559;
use alloy::primitives::{Address, Bytes, U256};

use crate::blockchain::contracts::{encode_claim, encode_transfer};
use crate::blockchain::transaction::{eip1559, CallSpec};
use crate::blockchain::{BlockchainResult, SignedPayload, Wallet};
use crate::rescue::amounts::GasBudget;
use crate::rescue::fees::FeeParameters;
use crate::rescue::plan::RescuePlan;
use crate::rescue::ports::ChainClient;
use crate::rescue::snapshot::AttemptSnapshot;

/// Nonces of the claim and sweep transactions.
///
/// Only the claim nonce is stored; the sweep nonce is always the next one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainedNonces {
    claim: u64,
}

impl ChainedNonces {
    /// Chain the at-risk account's next two nonces.
    pub fn starting_at(claim: u64) -> Self {
        Self { claim }
    }

    pub fn claim(&self) -> u64 {
        self.claim
    }

    pub fn sweep(&self) -> u64 {
        self.claim + 1
    }
}

/// The three transactions of one attempt before signing.
#[derive(Debug, Clone, PartialEq)]
pub struct UnsignedBundle {
    pub funding: TxEip1559,
    pub claim: TxEip1559,
    pub sweep: TxEip1559,
}

/// Signed payloads in bundle order: fund, claim, sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bundle {
    pub payloads: [SignedPayload; 3],
}

impl Bundle {
    pub fn as_slice(&self) -> &[SignedPayload] {
        &self.payloads
    }
}

/// Builds bundles from the fixed rescue parameters.
#[derive(Debug, Clone)]
pub struct BundleBuilder {
    gas: GasBudget,
    claim_contract: Address,
    token_contract: Address,
    include_claim_amount: bool,
}

impl BundleBuilder {
    pub fn new(gas: GasBudget, claim_contract: Address, token_contract: Address) -> Self {
        Self {
            gas,
            claim_contract,
            token_contract,
            include_claim_amount: false,
        }
    }

    /// Sweep the claimed amount on top of the pre-claim token balance.
    pub fn include_claim_amount(mut self, include: bool) -> Self {
        self.include_claim_amount = include;
        self
    }

    pub fn gas(&self) -> &GasBudget {
        &self.gas
    }

    pub fn token_contract(&self) -> Address {
        self.token_contract
    }

    /// Token amount the sweep transfers back to the funding account.
    pub fn sweep_amount(&self, snapshot: &AttemptSnapshot, plan: &RescuePlan) -> U256 {
        if self.include_claim_amount {
            snapshot.token_balance.saturating_add(plan.amount)
        } else {
            snapshot.token_balance
        }
    }

    /// Build the unsigned bundle. Same inputs always give the same bundle.
    pub fn build_unsigned(
        &self,
        snapshot: &AttemptSnapshot,
        fees: &FeeParameters,
        plan: &RescuePlan,
        funding_amount: U256,
    ) -> BlockchainResult<UnsignedBundle> {
        let fields = fees.to_fields()?;
        let nonces = ChainedNonces::starting_at(snapshot.at_risk.nonce);
        let chain_id = snapshot.chain_id;

        let funding = eip1559(
            chain_id,
            CallSpec {
                to: snapshot.at_risk.address,
                value: funding_amount,
                input: Bytes::new(),
                nonce: snapshot.funding.nonce,
                gas_limit: self.gas.transfer,
            },
            fields,
        );

        let claim = eip1559(
            chain_id,
            CallSpec {
                to: self.claim_contract,
                value: U256::ZERO,
                input: encode_claim(plan.index, plan.account, plan.amount, &plan.proof),
                nonce: nonces.claim(),
                gas_limit: self.gas.claim,
            },
            fields,
        );

        let sweep = eip1559(
            chain_id,
            CallSpec {
                to: self.token_contract,
                value: U256::ZERO,
                input: encode_transfer(snapshot.funding.address, self.sweep_amount(snapshot, plan)),
                nonce: nonces.sweep(),
                gas_limit: self.gas.token_transfer,
            },
            fields,
        );

        Ok(UnsignedBundle { funding, claim, sweep })
    }

    /// Sign each transaction with the account it spends from.
    pub async fn sign<C: ChainClient + ?Sized>(
        &self,
        chain: &C,
        unsigned: UnsignedBundle,
        funding_wallet: &Wallet,
        at_risk_wallet: &Wallet,
    ) -> BlockchainResult<Bundle> {
        let funding = chain.sign(unsigned.funding, funding_wallet).await?;
        let claim = chain.sign(unsigned.claim, at_risk_wallet).await?;
        let sweep = chain.sign(unsigned.sweep, at_risk_wallet).await?;

        Ok(Bundle {
            payloads: [funding, claim, sweep],
        })
    }
}
