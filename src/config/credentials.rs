//! Keys, addresses and endpoints read from the environment.
//!
//! # Security
//! - Private keys are read ONLY from environment variables (or a `.env` file
//!   loaded into the environment by `main`)
//! - Keys are parsed into signers immediately and never logged

use alloy::primitives::Address;

use crate::blockchain::wallet::Wallet;
use crate::config::loader::ConfigError;
use crate::config::validation::ValidationError;

pub const FUNDING_PRIVATE_KEY_ENV: &str = "RESCUE_FUNDING_PRIVATE_KEY";
pub const FUNDING_ADDRESS_ENV: &str = "RESCUE_FUNDING_ADDRESS";
pub const AT_RISK_PRIVATE_KEY_ENV: &str = "RESCUE_AT_RISK_PRIVATE_KEY";
pub const AT_RISK_ADDRESS_ENV: &str = "RESCUE_AT_RISK_ADDRESS";
pub const CLAIM_CONTRACT_ENV: &str = "RESCUE_CLAIM_CONTRACT";
pub const TOKEN_CONTRACT_ENV: &str = "RESCUE_TOKEN_CONTRACT";
pub const RPC_URL_ENV: &str = "RESCUE_RPC_URL";
/// Optional: identity key used to sign relay requests. Random when unset.
pub const RELAY_AUTH_KEY_ENV: &str = "RESCUE_RELAY_AUTH_KEY";

const REQUIRED: [&str; 7] = [
    FUNDING_PRIVATE_KEY_ENV,
    FUNDING_ADDRESS_ENV,
    AT_RISK_PRIVATE_KEY_ENV,
    AT_RISK_ADDRESS_ENV,
    CLAIM_CONTRACT_ENV,
    TOKEN_CONTRACT_ENV,
    RPC_URL_ENV,
];

/// Validated credentials and addresses for a rescue run.
#[derive(Debug, Clone)]
pub struct Credentials {
    /// Safe account that pays for gas and receives the swept tokens.
    pub funding: Wallet,
    /// Compromised account holding the entitlement.
    pub at_risk: Wallet,
    /// Airdrop distributor contract.
    pub claim_contract: Address,
    /// Token paid out by the distributor.
    pub token_contract: Address,
    /// Primary chain RPC endpoint.
    pub rpc_url: String,
    /// Relay identity, if configured.
    pub relay_auth: Option<Wallet>,
}

impl Credentials {
    /// Read credentials through an arbitrary lookup.
    ///
    /// Every missing or malformed value is collected before returning, so a
    /// single error lists everything the operator has to fix.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let mut errors: Vec<ValidationError> = REQUIRED
            .iter()
            .filter(|&&key| get(key).is_none())
            .map(|&key| ValidationError::Missing(key.to_string()))
            .collect();

        let funding = parse_wallet(get(FUNDING_PRIVATE_KEY_ENV), FUNDING_PRIVATE_KEY_ENV, &mut errors);
        let at_risk = parse_wallet(get(AT_RISK_PRIVATE_KEY_ENV), AT_RISK_PRIVATE_KEY_ENV, &mut errors);
        let funding_address = parse_address(get(FUNDING_ADDRESS_ENV), FUNDING_ADDRESS_ENV, &mut errors);
        let at_risk_address = parse_address(get(AT_RISK_ADDRESS_ENV), AT_RISK_ADDRESS_ENV, &mut errors);
        let claim_contract = parse_address(get(CLAIM_CONTRACT_ENV), CLAIM_CONTRACT_ENV, &mut errors);
        let token_contract = parse_address(get(TOKEN_CONTRACT_ENV), TOKEN_CONTRACT_ENV, &mut errors);
        let relay_auth = parse_wallet(get(RELAY_AUTH_KEY_ENV), RELAY_AUTH_KEY_ENV, &mut errors);

        let rpc_url = get(RPC_URL_ENV);
        if let Some(url) = &rpc_url {
            if let Err(e) = url.parse::<url::Url>() {
                errors.push(ValidationError::invalid(RPC_URL_ENV, e.to_string()));
            }
        }

        check_matches(&funding, funding_address, FUNDING_ADDRESS_ENV, &mut errors);
        check_matches(&at_risk, at_risk_address, AT_RISK_ADDRESS_ENV, &mut errors);

        if let (Some(f), Some(a)) = (&funding, &at_risk) {
            if f.address() == a.address() {
                errors.push(ValidationError::invalid(
                    AT_RISK_PRIVATE_KEY_ENV,
                    "funding and at-risk accounts must differ",
                ));
            }
        }

        match (funding, at_risk, claim_contract, token_contract, rpc_url) {
            (Some(funding), Some(at_risk), Some(claim_contract), Some(token_contract), Some(rpc_url))
                if errors.is_empty() =>
            {
                Ok(Self {
                    funding,
                    at_risk,
                    claim_contract,
                    token_contract,
                    rpc_url,
                    relay_auth,
                })
            }
            _ => Err(ConfigError::Validation(errors)),
        }
    }
}

fn parse_wallet(value: Option<String>, key: &str, errors: &mut Vec<ValidationError>) -> Option<Wallet> {
    let value = value?;
    match Wallet::from_private_key(&value) {
        Ok(wallet) => Some(wallet),
        Err(e) => {
            errors.push(ValidationError::invalid(key, e.to_string()));
            None
        }
    }
}

fn parse_address(value: Option<String>, key: &str, errors: &mut Vec<ValidationError>) -> Option<Address> {
    let value = value?;
    match value.parse::<Address>() {
        Ok(address) => Some(address),
        Err(e) => {
            errors.push(ValidationError::invalid(key, e.to_string()));
            None
        }
    }
}

fn check_matches(wallet: &Option<Wallet>, address: Option<Address>, key: &str, errors: &mut Vec<ValidationError>) {
    if let (Some(wallet), Some(address)) = (wallet, address) {
        if wallet.address() != address {
            errors.push(ValidationError::invalid(
                key,
                format!("{} does not match the configured key (derives {})", address, wallet.address()),
            ));
        }
    }
}
