//! Entitlement claim data.
//!
//! The claim file is JSON of the form
//! `{"index": 12, "account": "0x..", "amount": "1000", "merkleProof": ["0x..", ..]}`.
//! `index` and `amount` may be JSON numbers or decimal/hex strings. Proof
//! entries may omit the `0x` prefix.

use alloy::primitives::{Address, B256, U256};
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;

use crate::config::{ConfigError, ValidationError};

/// Immutable description of the claim to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RescuePlan {
    pub index: U256,
    pub account: Address,
    pub amount: U256,
    pub proof: Vec<B256>,
}

#[derive(Debug, Deserialize)]
struct RawClaim {
    index: Option<Value>,
    account: Option<String>,
    amount: Option<Value>,
    #[serde(rename = "merkleProof", alias = "proof")]
    merkle_proof: Option<Vec<String>>,
}

impl RescuePlan {
    /// Load and validate a claim file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        Self::from_json(&content)
    }

    /// Parse and validate claim JSON, reporting every problem at once.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let raw: RawClaim = serde_json::from_str(json).map_err(|e| ConfigError::Parse(format!("claim file: {}", e)))?;
        let mut errors = Vec::new();

        let index = required(raw.index, "index", &mut errors).and_then(|v| parse_uint(&v, "index", &mut errors));
        let amount = required(raw.amount, "amount", &mut errors).and_then(|v| parse_uint(&v, "amount", &mut errors));
        let account = required(raw.account, "account", &mut errors).and_then(|s| match s.trim().parse::<Address>() {
            Ok(a) => Some(a),
            Err(e) => {
                errors.push(ValidationError::invalid("account", e.to_string()));
                None
            }
        });
        let proof = required(raw.merkle_proof, "merkleProof", &mut errors).and_then(|entries| {
            if entries.is_empty() {
                errors.push(ValidationError::invalid("merkleProof", "must contain at least one hash"));
                return None;
            }
            let before = errors.len();
            let parsed: Vec<B256> = entries
                .iter()
                .enumerate()
                .filter_map(|(i, entry)| match normalize_proof_entry(entry).parse::<B256>() {
                    Ok(hash) => Some(hash),
                    Err(e) => {
                        errors.push(ValidationError::invalid(format!("merkleProof[{}]", i), e.to_string()));
                        None
                    }
                })
                .collect();
            (errors.len() == before).then_some(parsed)
        });

        match (index, account, amount, proof) {
            (Some(index), Some(account), Some(amount), Some(proof)) if errors.is_empty() => Ok(Self {
                index,
                account,
                amount,
                proof,
            }),
            _ => Err(ConfigError::Validation(errors)),
        }
    }
}

/// Canonical `0x`-prefixed form of a proof entry.
pub fn normalize_proof_entry(entry: &str) -> String {
    let entry = entry.trim();
    if entry.starts_with("0x") || entry.starts_with("0X") {
        format!("0x{}", &entry[2..])
    } else {
        format!("0x{}", entry)
    }
}

fn required<T>(value: Option<T>, field: &str, errors: &mut Vec<ValidationError>) -> Option<T> {
    if value.is_none() {
        errors.push(ValidationError::Missing(field.to_string()));
    }
    value
}

fn parse_uint(value: &Value, field: &str, errors: &mut Vec<ValidationError>) -> Option<U256> {
    let parsed = match value {
        Value::Number(n) => n
            .as_u64()
            .map(U256::from)
            .ok_or_else(|| format!("{} is not a non-negative integer", n)),
        Value::String(s) => s.trim().parse::<U256>().map_err(|e| e.to_string()),
        other => Err(format!("expected integer or string, got {}", other)),
    };
    match parsed {
        Ok(v) => Some(v),
        Err(reason) => {
            errors.push(ValidationError::invalid(field, reason));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HASH_A: &str = "0101010101010101010101010101010101010101010101010101010101010101";
    const HASH_B: &str = "0x0202020202020202020202020202020202020202020202020202020202020202";

    #[test]
    fn test_parses_mixed_number_and_string_fields() {
        let json = format!(
            r#"{{"index": 42, "account": "0x70997970C51812dc3A010C7d01b50e0d17dc79C8",
                "amount": "1000000000000000000000", "merkleProof": ["{}", "{}"]}}"#,
            HASH_A, HASH_B
        );
        let plan = RescuePlan::from_json(&json).unwrap();
        assert_eq!(plan.index, U256::from(42u64));
        assert_eq!(plan.amount, U256::from(10u64).pow(U256::from(21u64)));
        assert_eq!(plan.proof.len(), 2);
        assert_eq!(plan.proof[0], B256::repeat_byte(0x01));
    }

    #[test]
    fn test_normalizes_proof_prefix() {
        assert_eq!(normalize_proof_entry("abcd"), "0xabcd");
        assert_eq!(normalize_proof_entry("0xabcd"), "0xabcd");
        assert_eq!(normalize_proof_entry(" 0Xabcd "), "0xabcd");
    }

    #[test]
    fn test_reports_all_missing_fields() {
        let err = RescuePlan::from_json("{}").unwrap_err();
        let ConfigError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        assert_eq!(errors.len(), 4);
        for field in ["index", "account", "amount", "merkleProof"] {
            assert!(errors.contains(&ValidationError::Missing(field.to_string())));
        }
    }

    #[test]
    fn test_empty_proof_rejected() {
        let json = r#"{"index": 1, "account": "0x70997970C51812dc3A010C7d01b50e0d17dc79C8",
                       "amount": 5, "merkleProof": []}"#;
        let err = RescuePlan::from_json(json).unwrap_err();
        assert!(err.to_string().contains("at least one hash"));
    }

    #[test]
    fn test_bad_proof_entry_located() {
        let json = format!(
            r#"{{"index": 1, "account": "0x70997970C51812dc3A010C7d01b50e0d17dc79C8",
                "amount": 5, "merkleProof": ["{}", "0x1234"]}}"#,
            HASH_A
        );
        let err = RescuePlan::from_json(&json).unwrap_err();
        assert!(err.to_string().contains("merkleProof[1]"));
    }

    #[test]
    fn test_negative_index_rejected() {
        let json = format!(
            r#"{{"index": -1, "account": "0x70997970C51812dc3A010C7d01b50e0d17dc79C8",
                "amount": 5, "merkleProof": ["{}"]}}"#,
            HASH_A
        );
        let err = RescuePlan::from_json(&json).unwrap_err();
        assert!(err.to_string().contains("index"));
    }
}
