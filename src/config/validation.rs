//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation of the TOML tunables (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, gas limits > 0, fee ordering)
//! - Validate URLs before any network client is built
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RescueConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use thiserror::Error;

use crate::config::schema::RescueConfig;

/// A single configuration problem.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required value is absent.
    #[error("missing required value '{0}'")]
    Missing(String),

    /// A value is present but unusable.
    #[error("invalid value for '{field}': {reason}")]
    Invalid { field: String, reason: String },
}

impl ValidationError {
    pub(crate) fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Validate the tunables, collecting every violation.
pub fn validate_config(config: &RescueConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.chain.rpc_timeout_secs == 0 {
        errors.push(ValidationError::invalid("chain.rpc_timeout_secs", "must be greater than 0"));
    }
    for url in &config.chain.failover_urls {
        if let Err(e) = url.parse::<url::Url>() {
            errors.push(ValidationError::invalid("chain.failover_urls", format!("'{}': {}", url, e)));
        }
    }

    if let Err(e) = config.relay.url.parse::<url::Url>() {
        errors.push(ValidationError::invalid("relay.url", e.to_string()));
    }
    if config.relay.request_timeout_secs == 0 {
        errors.push(ValidationError::invalid("relay.request_timeout_secs", "must be greater than 0"));
    }
    if config.relay.poll_interval_ms == 0 {
        errors.push(ValidationError::invalid("relay.poll_interval_ms", "must be greater than 0"));
    }
    if config.relay.inclusion_timeout_secs == 0 {
        errors.push(ValidationError::invalid("relay.inclusion_timeout_secs", "must be greater than 0"));
    }

    if config.fees.max_fee_per_gas_wei == 0 {
        errors.push(ValidationError::invalid("fees.max_fee_per_gas_wei", "must be greater than 0"));
    }
    if config.fees.max_priority_fee_per_gas_wei > config.fees.max_fee_per_gas_wei {
        errors.push(ValidationError::invalid(
            "fees.max_priority_fee_per_gas_wei",
            "must not exceed fees.max_fee_per_gas_wei",
        ));
    }

    for (field, limit) in [
        ("gas.transfer", config.gas.transfer),
        ("gas.claim", config.gas.claim),
        ("gas.token_transfer", config.gas.token_transfer),
    ] {
        if limit == 0 {
            errors.push(ValidationError::invalid(field, "must be greater than 0"));
        }
    }

    if config.retry.max_attempts == Some(0) {
        errors.push(ValidationError::invalid("retry.max_attempts", "must be at least 1 when set"));
    }
    if let Some(ceiling) = config.retry.max_fee_per_gas_wei {
        if ceiling < config.fees.max_fee_per_gas_wei {
            errors.push(ValidationError::invalid(
                "retry.max_fee_per_gas_wei",
                "must not be below the starting fees.max_fee_per_gas_wei",
            ));
        }
    }
    if config.retry.transient_base_delay_ms > config.retry.transient_max_delay_ms {
        errors.push(ValidationError::invalid(
            "retry.transient_base_delay_ms",
            "must not exceed retry.transient_max_delay_ms",
        ));
    }

    if let Some(addr) = &config.observability.metrics_address {
        if addr.parse::<std::net::SocketAddr>().is_err() {
            errors.push(ValidationError::invalid("observability.metrics_address", format!("'{}' is not a socket address", addr)));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
