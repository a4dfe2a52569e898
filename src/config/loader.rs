//! Configuration loading from disk.

use std::path::Path;
use std::fs;
use crate::config::schema::RescueConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(String),
    Validation(Vec<ValidationError>),
}

impl ConfigError {
    /// Merge validation failures from independent sources into one report.
    ///
    /// Non-validation errors win, since they stop loading outright.
    pub fn merge(self, other: ConfigError) -> ConfigError {
        match (self, other) {
            (ConfigError::Validation(mut a), ConfigError::Validation(b)) => {
                a.extend(b);
                ConfigError::Validation(a)
            }
            (ConfigError::Validation(_), other) => other,
            (this, _) => this,
        }
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<Vec<ValidationError>> for ConfigError {
    fn from(errors: Vec<ValidationError>) -> Self {
        ConfigError::Validation(errors)
    }
}

/// Load and validate tunables from a TOML file.
///
/// Without a path the defaults are used (and still validated).
pub fn load_config(path: Option<&Path>) -> Result<RescueConfig, ConfigError> {
    let config: RescueConfig = match path {
        Some(path) => {
            let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
            toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?
        }
        None => RescueConfig::default(),
    };

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}
