//! Funding amount calculation, the per-attempt fee ledger, and the balance guard.
//!
//! All arithmetic is integer wei. Gas cost of a transaction is taken as its
//! worst case, `gas_limit * max_fee_per_gas`.

use alloy::primitives::utils::format_ether;
use alloy::primitives::U256;

use crate::config::GasConfig;
use crate::rescue::fees::FeeParameters;

/// Fixed gas limits of the three bundled transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasBudget {
    pub transfer: u64,
    pub claim: u64,
    pub token_transfer: u64,
}

impl Default for GasBudget {
    fn default() -> Self {
        Self::from(&GasConfig::default())
    }
}

impl From<&GasConfig> for GasBudget {
    fn from(config: &GasConfig) -> Self {
        Self {
            transfer: config.transfer,
            claim: config.claim,
            token_transfer: config.token_transfer,
        }
    }
}

impl GasBudget {
    /// Worst-case fee of each transaction, in bundle order.
    pub fn costs(&self, max_fee_per_gas: U256) -> [U256; 3] {
        [self.transfer, self.claim, self.token_transfer].map(|limit| U256::from(limit).saturating_mul(max_fee_per_gas))
    }
}

/// Amount to send to the at-risk account.
///
/// `floor((balance - total_gas) * 9 / 10)`, or zero when the balance does not
/// cover the gas. The 10% left behind absorbs balance drift between the read
/// and block inclusion.
pub fn funding_amount(balance: U256, total_gas: U256) -> U256 {
    match balance.checked_sub(total_gas) {
        // 9q + floor(9r / 10) for spendable = 10q + r; never overflows.
        Some(spendable) if !spendable.is_zero() => {
            let ten = U256::from(10u64);
            let nine = U256::from(9u64);
            spendable / ten * nine + spendable % ten * nine / ten
        }
        _ => U256::ZERO,
    }
}

/// Everything the operator sees before an attempt. Pure function of the
/// funding balance, the fees and the gas budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeBreakdown {
    /// Fund, claim and sweep fees, in bundle order.
    pub per_tx: [U256; 3],
    pub total_gas_fee: U256,
    pub amount_to_send: U256,
    pub total_required: U256,
    pub balance: U256,
}

impl FeeBreakdown {
    pub fn compute(balance: U256, fees: &FeeParameters, gas: &GasBudget) -> Self {
        let per_tx = gas.costs(fees.max_fee_per_gas);
        let total_gas_fee = per_tx.iter().fold(U256::ZERO, |acc, fee| acc.saturating_add(*fee));
        let amount_to_send = funding_amount(balance, total_gas_fee);

        Self {
            per_tx,
            total_gas_fee,
            amount_to_send,
            total_required: amount_to_send.saturating_add(total_gas_fee),
            balance,
        }
    }

    /// `total_required - balance` when the balance falls short.
    pub fn shortfall(&self) -> Option<U256> {
        (self.balance < self.total_required).then(|| self.total_required - self.balance)
    }

    /// Halt condition: the funding account cannot cover send + gas.
    pub fn ensure_sufficient(&self) -> Result<(), InsufficientFunds> {
        match self.shortfall() {
            Some(shortfall) => Err(InsufficientFunds {
                required: self.total_required,
                balance: self.balance,
                shortfall,
            }),
            None => Ok(()),
        }
    }
}

impl std::fmt::Display for FeeBreakdown {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "--- Fee Breakdown ---")?;
        writeln!(f, "1 tx (fund at-risk account) : gas fee = {} ETH", format_ether(self.per_tx[0]))?;
        writeln!(f, "2 tx (claim airdrop)        : gas fee = {} ETH", format_ether(self.per_tx[1]))?;
        writeln!(f, "3 tx (sweep token)          : gas fee = {} ETH", format_ether(self.per_tx[2]))?;
        writeln!(f, "Total gas fees              : {} ETH", format_ether(self.total_gas_fee))?;
        writeln!(f, "Amount to send (90%)        : {} ETH", format_ether(self.amount_to_send))?;
        writeln!(f, "Total required (gas + send) : {} ETH", format_ether(self.total_required))?;
        write!(f, "Funding account balance     : {} ETH", format_ether(self.balance))
    }
}

/// The funding account cannot pay for the bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsufficientFunds {
    pub required: U256,
    pub balance: U256,
    pub shortfall: U256,
}

impl std::fmt::Display for InsufficientFunds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "insufficient funding balance: required {} ETH, have {} ETH, short by {} ETH ({} wei)",
            format_ether(self.required),
            format_ether(self.balance),
            format_ether(self.shortfall),
            self.shortfall
        )
    }
}

impl std::error::Error for InsufficientFunds {}
