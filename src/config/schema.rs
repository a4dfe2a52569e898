//! Configuration schema definitions.
//!
//! Tunables live in an optional TOML file. Every section has defaults so an
//! empty (or absent) file yields the baseline behavior: 1.1 gwei fees, no
//! escalation, unbounded retries one block apart.

use serde::{Deserialize, Serialize};

/// Root configuration for a rescue run.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RescueConfig {
    /// Chain RPC settings (the endpoint itself comes from the environment).
    pub chain: ChainConfig,

    /// Private relay settings.
    pub relay: RelayConfig,

    /// Starting fee parameters and escalation policy.
    pub fees: FeeConfig,

    /// Per-transaction gas limits.
    pub gas: GasConfig,

    /// Retry loop timing and termination conditions.
    pub retry: RetryConfig,

    /// Sweep transaction policy.
    pub sweep: SweepConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Chain RPC configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ChainConfig {
    /// Expected chain ID. When set, the RPC must report the same value.
    pub chain_id: Option<u64>,

    /// Failover JSON-RPC endpoint URLs, tried in order after the primary.
    pub failover_urls: Vec<String>,

    /// RPC request timeout in seconds.
    pub rpc_timeout_secs: u64,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            chain_id: None,
            failover_urls: Vec::new(),
            rpc_timeout_secs: 10,
        }
    }
}

/// Private relay configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Relay JSON-RPC endpoint.
    pub url: String,

    /// HTTP request timeout in seconds.
    pub request_timeout_secs: u64,

    /// How often to poll the chain head while waiting for the target block.
    pub poll_interval_ms: u64,

    /// Upper bound on a single inclusion wait.
    pub inclusion_timeout_secs: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            url: "https://relay.flashbots.net".to_string(),
            request_timeout_secs: 10,
            poll_interval_ms: 1000,
            inclusion_timeout_secs: 60,
        }
    }
}

/// Fee configuration, all values in wei.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FeeConfig {
    /// Starting max fee per gas.
    pub max_fee_per_gas_wei: u64,

    /// Starting max priority fee per gas.
    pub max_priority_fee_per_gas_wei: u64,

    /// Percentage added to both fees after every non-inclusion (0 = never raise).
    pub escalation_percent: u32,
}

impl Default for FeeConfig {
    fn default() -> Self {
        Self {
            max_fee_per_gas_wei: 1_100_000_000, // 1.1 gwei
            max_priority_fee_per_gas_wei: 1_100_000_000,
            escalation_percent: 0,
        }
    }
}

/// Gas limits for the three bundled transactions.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GasConfig {
    /// Plain native-token transfer (funding).
    pub transfer: u64,

    /// Airdrop claim call.
    pub claim: u64,

    /// ERC-20 transfer (sweep).
    pub token_transfer: u64,
}

impl Default for GasConfig {
    fn default() -> Self {
        Self {
            transfer: 21_000,
            claim: 240_000,
            token_transfer: 50_000,
        }
    }
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Delay between a non-inclusion and the next attempt, in milliseconds.
    pub block_interval_ms: u64,

    /// Stop after this many submitted bundles. Unbounded when absent.
    pub max_attempts: Option<u32>,

    /// Stop once the escalated max fee per gas would exceed this value (wei).
    pub max_fee_per_gas_wei: Option<u64>,

    /// Base delay for exponential backoff on transient failures.
    pub transient_base_delay_ms: u64,

    /// Maximum delay for exponential backoff on transient failures.
    pub transient_max_delay_ms: u64,

    /// Consecutive transient failures tolerated before giving up.
    pub max_consecutive_transient_failures: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            block_interval_ms: 12_000,
            max_attempts: None,
            max_fee_per_gas_wei: None,
            transient_base_delay_ms: 500,
            transient_max_delay_ms: 10_000,
            max_consecutive_transient_failures: 10,
        }
    }
}

/// Sweep transaction configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SweepConfig {
    /// Add the claim amount to the live token balance when sizing the sweep.
    /// The claim credits the at-risk account earlier in the same block.
    pub include_claim_amount: bool,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Prometheus exporter bind address. Disabled when absent.
    pub metrics_address: Option<String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_address: None,
        }
    }
}
