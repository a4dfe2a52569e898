//! Flashbots-style bundle relay client.
//!
//! # Responsibilities
//! - Submit ordered bundles via `eth_sendBundle` for a single target block
//! - Authenticate requests with an `X-Flashbots-Signature` header
//! - Decide inclusion by watching the chain once the target block is produced
//!
//! # Design Decisions
//! - JSON-RPC `error` objects are rejections (fatal); HTTP 5xx/429 and
//!   connection failures are transport errors (retryable)
//! - Inclusion means every bundled transaction has a receipt in the target
//!   block; otherwise a consumed nonce is reported separately from a plain miss

use alloy::hex;
use alloy::primitives::{keccak256, B256};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use tokio::time::{interval, timeout};

use crate::blockchain::{BlockchainClient, SignedPayload, Wallet};
use crate::config::RelayConfig;
use crate::relay::types::{BundledTx, InclusionStatus, RelayError, RelayResult, SubmissionHandle};
use crate::rescue::ports::RelayClient;

/// Header carrying `<address>:<signature>` over the request body.
pub const FLASHBOTS_SIGNATURE_HEADER: &str = "X-Flashbots-Signature";

/// Relay client speaking the Flashbots bundle API.
pub struct FlashbotsRelay {
    http: Client,
    url: url::Url,
    /// Reputation identity; unrelated to the accounts in the bundle.
    auth: Wallet,
    chain: BlockchainClient,
    poll_interval: Duration,
    inclusion_timeout: Duration,
}

impl FlashbotsRelay {
    /// Create a relay client.
    ///
    /// `chain` is used for the inclusion check (head height, receipts, nonces).
    pub fn new(config: &RelayConfig, auth: Wallet, chain: BlockchainClient) -> RelayResult<Self> {
        let url: url::Url = config
            .url
            .parse()
            .map_err(|e| RelayError::Transport(format!("Invalid relay URL '{}': {}", config.url, e)))?;
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| RelayError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        tracing::info!(relay = %url, identity = %auth.address(), "Relay client initialized");

        Ok(Self {
            http,
            url,
            auth,
            chain,
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            inclusion_timeout: Duration::from_secs(config.inclusion_timeout_secs),
        })
    }

    /// POST a signed JSON-RPC request and return its `result`.
    async fn call(&self, method: &str, params: Value) -> RelayResult<Value> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        })
        .to_string();
        let signature = self.signature_header(&body).await?;

        let response = self
            .http
            .post(self.url.clone())
            .header(CONTENT_TYPE, "application/json")
            .header(FLASHBOTS_SIGNATURE_HEADER, signature)
            .body(body)
            .send()
            .await
            .map_err(|e| RelayError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| RelayError::Transport(e.to_string()))?;

        parse_rpc_response(status, &text)
    }

    async fn signature_header(&self, body: &str) -> RelayResult<String> {
        let digest = hex::encode_prefixed(keccak256(body.as_bytes()));
        let signature = self.auth.sign_message(digest.as_bytes()).await?;
        Ok(format!("{}:{}", self.auth.address(), hex::encode_prefixed(signature.as_bytes())))
    }

    /// Poll the chain head until it reaches `target_block`.
    async fn wait_for_block(&self, target_block: u64) -> RelayResult<()> {
        let wait = async {
            let mut ticker = interval(self.poll_interval);
            loop {
                ticker.tick().await;
                let head = self.chain.get_block_number().await?;
                if head >= target_block {
                    return Ok::<(), RelayError>(());
                }
                tracing::debug!(head, target_block, "Waiting for target block");
            }
        };

        match timeout(self.inclusion_timeout, wait).await {
            Ok(result) => result,
            Err(_) => Err(RelayError::InclusionTimeout(target_block)),
        }
    }

    async fn landed_in(&self, tx: &BundledTx, target_block: u64) -> RelayResult<bool> {
        let receipt = self.chain.get_transaction_receipt(tx.hash).await?;
        Ok(receipt.and_then(|r| r.block_number) == Some(target_block))
    }
}

#[async_trait]
impl RelayClient for FlashbotsRelay {
    async fn submit_bundle(&self, payloads: &[SignedPayload], target_block: u64) -> RelayResult<SubmissionHandle> {
        let result = self
            .call("eth_sendBundle", send_bundle_params(payloads, target_block))
            .await?;

        let bundle_hash = result
            .get("bundleHash")
            .and_then(Value::as_str)
            .and_then(|h| h.parse::<B256>().ok());

        tracing::info!(
            target_block,
            bundle_hash = ?bundle_hash,
            transactions = payloads.len(),
            "Bundle accepted by relay"
        );

        Ok(SubmissionHandle {
            bundle_hash,
            target_block,
            transactions: payloads.iter().map(BundledTx::from).collect(),
        })
    }

    async fn await_inclusion(&self, handle: &SubmissionHandle) -> RelayResult<InclusionStatus> {
        self.wait_for_block(handle.target_block).await?;

        let mut included = true;
        for tx in &handle.transactions {
            if !self.landed_in(tx, handle.target_block).await? {
                included = false;
                break;
            }
        }
        if included {
            return Ok(InclusionStatus::Included);
        }

        for tx in &handle.transactions {
            let on_chain = self.chain.get_transaction_count(tx.signer).await?;
            if on_chain > tx.nonce {
                tracing::warn!(
                    signer = %tx.signer,
                    bundled_nonce = tx.nonce,
                    on_chain_nonce = on_chain,
                    "Bundled nonce already consumed"
                );
                return Ok(InclusionStatus::AccountNonceTooHigh);
            }
        }

        Ok(InclusionStatus::BlockPassedWithoutInclusion)
    }
}

impl std::fmt::Debug for FlashbotsRelay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlashbotsRelay")
            .field("url", &self.url.as_str())
            .field("identity", &self.auth.address())
            .finish()
    }
}

/// `eth_sendBundle` params: raw transactions in order plus the hex target block.
pub fn send_bundle_params(payloads: &[SignedPayload], target_block: u64) -> Value {
    let txs: Vec<String> = payloads.iter().map(|p| hex::encode_prefixed(&p.raw)).collect();
    json!([{
        "txs": txs,
        "blockNumber": format!("0x{:x}", target_block),
    }])
}

/// Classify a relay HTTP response.
pub fn parse_rpc_response(status: u16, body: &str) -> RelayResult<Value> {
    if status == 429 || (500..600).contains(&status) {
        return Err(RelayError::Transport(format!("relay returned HTTP {}", status)));
    }

    let payload: Value = serde_json::from_str(body).map_err(|e| {
        if (200..300).contains(&status) {
            RelayError::Transport(format!("unparseable relay response: {}", e))
        } else {
            RelayError::Rejected(format!("HTTP {}: {}", status, body.trim()))
        }
    })?;

    if let Some(error) = payload.get("error").filter(|e| !e.is_null()) {
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .unwrap_or_else(|| error.to_string());
        return Err(RelayError::Rejected(message));
    }

    if !(200..300).contains(&status) {
        return Err(RelayError::Rejected(format!("HTTP {}", status)));
    }

    payload
        .get("result")
        .cloned()
        .ok_or_else(|| RelayError::Transport("relay response missing 'result'".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{Address, Bytes, TxHash};

    fn payload(byte: u8) -> SignedPayload {
        SignedPayload {
            raw: Bytes::from(vec![0x02, byte]),
            hash: TxHash::repeat_byte(byte),
            signer: Address::repeat_byte(byte),
            nonce: byte as u64,
        }
    }

    #[test]
    fn test_send_bundle_params_preserve_order() {
        let params = send_bundle_params(&[payload(1), payload(2), payload(3)], 0x10);
        let txs = params[0]["txs"].as_array().unwrap();
        assert_eq!(txs.len(), 3);
        assert_eq!(txs[0], "0x0201");
        assert_eq!(txs[2], "0x0203");
        assert_eq!(params[0]["blockNumber"], "0x10");
    }

    #[test]
    fn test_parse_success() {
        let result = parse_rpc_response(200, r#"{"jsonrpc":"2.0","id":1,"result":{"bundleHash":"0xab"}}"#).unwrap();
        assert_eq!(result["bundleHash"], "0xab");
    }

    #[test]
    fn test_parse_null_error_is_success() {
        let result = parse_rpc_response(
            200,
            r#"{"jsonrpc":"2.0","id":1,"result":{"bundleHash":"0xab"},"error":null}"#,
        )
        .unwrap();
        assert_eq!(result["bundleHash"], "0xab");
    }

    #[test]
    fn test_parse_rpc_error_is_rejection() {
        let err = parse_rpc_response(
            400,
            r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32000,"message":"bundle simulation reverted"}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, RelayError::Rejected(ref m) if m == "bundle simulation reverted"));
    }

    #[test]
    fn test_parse_server_error_is_transient() {
        let err = parse_rpc_response(503, "Service Unavailable").unwrap_err();
        assert!(err.is_transient());
        let err = parse_rpc_response(429, "").unwrap_err();
        assert!(err.is_transient());
    }

    #[test]
    fn test_parse_garbage_success_body_is_transient() {
        let err = parse_rpc_response(200, "<html>").unwrap_err();
        assert!(err.is_transient());
    }

    #[test]
    fn test_parse_plain_client_error_is_rejection() {
        let err = parse_rpc_response(403, "forbidden").unwrap_err();
        assert!(!err.is_transient());
    }
}
