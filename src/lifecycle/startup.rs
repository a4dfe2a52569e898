//! Startup orchestration.
//!
//! # Responsibilities
//! - Load the `.env` file, the TOML tunables, the credentials and the claim file
//! - Apply command-line overrides and validate the result
//! - Connect to the chain and the relay once every input is known to be good
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Input problems from every source are merged into one report

use std::path::{Path, PathBuf};

use crate::blockchain::{BlockchainClient, Wallet};
use crate::config::validation::validate_config;
use crate::config::{load_config, ConfigError, Credentials, RescueConfig};
use crate::relay::FlashbotsRelay;
use crate::rescue::{RescueError, RescuePlan};

/// Where inputs come from, plus command-line overrides.
#[derive(Debug, Clone, Default)]
pub struct StartupOptions {
    pub config_path: Option<PathBuf>,
    pub proof_path: PathBuf,
    pub env_file: Option<PathBuf>,
    pub max_attempts: Option<u32>,
    pub escalation_percent: Option<u32>,
}

/// Everything needed to start a rescue, validated.
#[derive(Debug, Clone)]
pub struct RescueInputs {
    pub config: RescueConfig,
    pub credentials: Credentials,
    pub plan: RescuePlan,
}

/// Load `path`, or `./.env` when present.
pub fn load_env_file(path: Option<&Path>) -> Result<(), ConfigError> {
    match path {
        Some(path) => dotenv::from_path(path)
            .map(|_| ())
            .map_err(|e| ConfigError::Parse(format!("env file {}: {}", path.display(), e))),
        None => {
            dotenv::dotenv().ok();
            Ok(())
        }
    }
}

/// Load the tunables and apply overrides.
pub fn load_tunables(options: &StartupOptions) -> Result<RescueConfig, ConfigError> {
    let mut config = load_config(options.config_path.as_deref())?;
    if let Some(max_attempts) = options.max_attempts {
        config.retry.max_attempts = Some(max_attempts);
    }
    if let Some(percent) = options.escalation_percent {
        config.fees.escalation_percent = percent;
    }
    validate_config(&config)?;
    Ok(config)
}

/// Load every input from the process environment and disk.
pub fn load_inputs(options: &StartupOptions) -> Result<RescueInputs, ConfigError> {
    load_inputs_with(options, |key| std::env::var(key).ok())
}

/// Load every input, reading credentials through `lookup`.
pub fn load_inputs_with<F>(options: &StartupOptions, lookup: F) -> Result<RescueInputs, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let config = load_tunables(options);
    let credentials = Credentials::from_lookup(lookup);
    let plan = RescuePlan::load(&options.proof_path);

    match (config, credentials, plan) {
        (Ok(config), Ok(credentials), Ok(plan)) => {
            if plan.account != credentials.at_risk.address() {
                tracing::warn!(
                    claim_account = %plan.account,
                    at_risk = %credentials.at_risk.address(),
                    "Claim account differs from the at-risk account"
                );
            }
            Ok(RescueInputs {
                config,
                credentials,
                plan,
            })
        }
        (config, credentials, plan) => {
            let errors = [config.err(), credentials.err(), plan.err()];
            let merged = errors
                .into_iter()
                .flatten()
                .reduce(ConfigError::merge)
                .unwrap_or_else(|| ConfigError::Validation(Vec::new()));
            Err(merged)
        }
    }
}

/// Build the chain and relay clients and check the chain id.
pub async fn connect(inputs: &RescueInputs) -> Result<(BlockchainClient, FlashbotsRelay), RescueError> {
    let chain = BlockchainClient::new(&inputs.credentials.rpc_url, inputs.config.chain.clone())?;
    let chain_id = chain.verify_chain_id().await?;
    tracing::info!(chain_id = chain_id.0, "Connected to chain");

    let auth = match &inputs.credentials.relay_auth {
        Some(wallet) => wallet.clone(),
        None => {
            let wallet = Wallet::random();
            tracing::info!(identity = %wallet.address(), "Using a random relay identity");
            wallet
        }
    };
    let relay = FlashbotsRelay::new(&inputs.config.relay, auth, chain.clone())?;

    Ok((chain, relay))
}
