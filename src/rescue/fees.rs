//! Fee parameters and the escalation policy.

use alloy::primitives::U256;

use crate::blockchain::transaction::FeeFields;
use crate::blockchain::{BlockchainError, BlockchainResult};
use crate::config::FeeConfig;

/// EIP-1559 fee caps in force for one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeParameters {
    pub max_fee_per_gas: U256,
    pub max_priority_fee_per_gas: U256,
}

impl FeeParameters {
    pub fn new(max_fee_per_gas: U256, max_priority_fee_per_gas: U256) -> Self {
        Self {
            max_fee_per_gas,
            max_priority_fee_per_gas,
        }
    }

    /// Narrow to the transaction's `u128` fee fields.
    pub fn to_fields(&self) -> BlockchainResult<FeeFields> {
        let narrow = |v: U256| u128::try_from(v).map_err(|_| BlockchainError::FeeOverflow(v.to_string()));
        Ok(FeeFields {
            max_fee_per_gas: narrow(self.max_fee_per_gas)?,
            max_priority_fee_per_gas: narrow(self.max_priority_fee_per_gas)?,
        })
    }
}

impl std::fmt::Display for FeeParameters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "maxFeePerGas {} wei, maxPriorityFeePerGas {} wei",
            self.max_fee_per_gas, self.max_priority_fee_per_gas
        )
    }
}

impl From<&FeeConfig> for FeeParameters {
    fn from(config: &FeeConfig) -> Self {
        Self::new(
            U256::from(config.max_fee_per_gas_wei),
            U256::from(config.max_priority_fee_per_gas_wei),
        )
    }
}

/// Holds the current fees and raises them after every retryable miss.
///
/// Both fees are multiplied by `(100 + percent) / 100`, truncating, so fees
/// never decrease; with `percent == 0` every attempt reuses the same values.
/// There is deliberately no cap here; ceilings are a termination condition.
#[derive(Debug, Clone)]
pub struct FeeController {
    current: FeeParameters,
    escalation_percent: u32,
    escalations: u32,
}

impl FeeController {
    pub fn new(initial: FeeParameters, escalation_percent: u32) -> Self {
        Self {
            current: initial,
            escalation_percent,
            escalations: 0,
        }
    }

    /// Fees to use for the next attempt.
    pub fn current(&self) -> FeeParameters {
        self.current
    }

    /// Number of escalation steps applied so far.
    pub fn escalations(&self) -> u32 {
        self.escalations
    }

    pub fn escalation_percent(&self) -> u32 {
        self.escalation_percent
    }

    /// Apply one escalation step and return the new fees.
    pub fn escalate(&mut self) -> FeeParameters {
        let factor = U256::from(100u64 + u64::from(self.escalation_percent));
        // On overflow the fee stays put rather than wrapping or shrinking.
        let bump = |fee: U256| fee.checked_mul(factor).map_or(fee, |v| v / U256::from(100u64));

        self.current = FeeParameters::new(
            bump(self.current.max_fee_per_gas),
            bump(self.current.max_priority_fee_per_gas),
        );
        self.escalations += 1;

        tracing::debug!(
            escalations = self.escalations,
            max_fee_per_gas = %self.current.max_fee_per_gas,
            max_priority_fee_per_gas = %self.current.max_priority_fee_per_gas,
            "Fees escalated"
        );
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gwei_1_1() -> FeeParameters {
        FeeParameters::new(U256::from(1_100_000_000u64), U256::from(1_100_000_000u64))
    }

    #[test]
    fn test_ten_percent_truncates_each_step() {
        let mut controller = FeeController::new(gwei_1_1(), 10);
        let expected = [1_210_000_000u64, 1_331_000_000, 1_464_100_000];
        for want in expected {
            let fees = controller.escalate();
            assert_eq!(fees.max_fee_per_gas, U256::from(want));
            assert_eq!(fees.max_priority_fee_per_gas, U256::from(want));
        }
        assert_eq!(controller.escalations(), 3);
    }

    #[test]
    fn test_zero_percent_keeps_fees_identical() {
        let mut controller = FeeController::new(gwei_1_1(), 0);
        for _ in 0..5 {
            assert_eq!(controller.escalate(), gwei_1_1());
        }
    }

    #[test]
    fn test_escalation_is_monotonic() {
        for percent in [0u32, 1, 7, 10, 50, 100] {
            let mut controller = FeeController::new(FeeParameters::new(U256::from(3u64), U256::from(1u64)), percent);
            let mut previous = controller.current();
            for _ in 0..20 {
                let next = controller.escalate();
                assert!(next.max_fee_per_gas >= previous.max_fee_per_gas);
                assert!(next.max_priority_fee_per_gas >= previous.max_priority_fee_per_gas);
                previous = next;
            }
        }
    }

    #[test]
    fn test_small_values_truncate_to_no_change() {
        // 9 * 110 / 100 = 9 (integer floor)
        let mut controller = FeeController::new(FeeParameters::new(U256::from(9u64), U256::from(9u64)), 10);
        assert_eq!(controller.escalate().max_fee_per_gas, U256::from(9u64));
    }

    #[test]
    fn test_to_fields_rejects_oversized_fee() {
        let fees = FeeParameters::new(U256::MAX, U256::from(1u64));
        assert!(matches!(fees.to_fields(), Err(BlockchainError::FeeOverflow(_))));
        assert_eq!(gwei_1_1().to_fields().unwrap().max_fee_per_gas, 1_100_000_000u128);
    }
}
