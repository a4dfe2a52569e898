//! Flashbots relay client against local HTTP stand-ins for the relay and the node.

use alloy::primitives::{Address, Bytes, TxHash, B256};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

use bundle_rescue::blockchain::{BlockchainClient, ChainConfig, SignedPayload, Wallet};
use bundle_rescue::config::RelayConfig;
use bundle_rescue::relay::flashbots::FLASHBOTS_SIGNATURE_HEADER;
use bundle_rescue::relay::{BundledTx, FlashbotsRelay, InclusionStatus, RelayError, SubmissionHandle};
use bundle_rescue::rescue::RelayClient;

mod common;
use common::*;

fn relay_config(url: String) -> RelayConfig {
    RelayConfig {
        url,
        request_timeout_secs: 5,
        poll_interval_ms: 10,
        inclusion_timeout_secs: 5,
    }
}

fn payload(byte: u8, signer: Address, nonce: u64) -> SignedPayload {
    SignedPayload {
        raw: Bytes::from(vec![0x02, byte]),
        hash: TxHash::repeat_byte(byte),
        signer,
        nonce,
    }
}

fn body_of(request: &str) -> Value {
    let body = request.split_once("\r\n\r\n").map(|(_, b)| b).unwrap_or_default();
    serde_json::from_str(body).unwrap_or(Value::Null)
}

/// Node stand-in answering the three calls the inclusion check makes.
///
/// With `receipt_block` set, every transaction has a receipt in that block.
async fn start_node(head: u64, nonce: u64, receipt_block: Option<u64>) -> String {
    let addr = start_programmable_backend(move |request| {
        let body = body_of(&request);
        let result = match body["method"].as_str().unwrap_or_default() {
            "eth_blockNumber" => json!(format!("0x{:x}", head)),
            "eth_getTransactionCount" => json!(format!("0x{:x}", nonce)),
            "eth_getTransactionReceipt" => match receipt_block {
                Some(block) => receipt(&body["params"][0], block),
                None => Value::Null,
            },
            _ => Value::Null,
        };
        (200, json!({"jsonrpc": "2.0", "id": body["id"], "result": result}).to_string())
    })
    .await;
    format!("http://{}", addr)
}

fn receipt(tx_hash: &Value, block: u64) -> Value {
    json!({
        "type": "0x2",
        "status": "0x1",
        "cumulativeGasUsed": "0x5208",
        "logs": [],
        "logsBloom": format!("0x{}", "00".repeat(256)),
        "transactionHash": tx_hash,
        "transactionIndex": "0x0",
        "blockHash": format!("0x{}", "11".repeat(32)),
        "blockNumber": format!("0x{:x}", block),
        "gasUsed": "0x5208",
        "effectiveGasPrice": "0x3b9aca00",
        "from": format!("0x{}", "05".repeat(20)),
        "to": format!("0x{}", "06".repeat(20)),
        "contractAddress": null
    })
}

fn relay_watching(node: &str, inclusion_timeout_secs: u64) -> FlashbotsRelay {
    let chain = BlockchainClient::new(node, ChainConfig::default()).unwrap();
    let config = RelayConfig {
        inclusion_timeout_secs,
        ..relay_config("http://127.0.0.1:1".into())
    };
    FlashbotsRelay::new(&config, Wallet::random(), chain).unwrap()
}

fn unreachable_chain() -> BlockchainClient {
    BlockchainClient::new("http://127.0.0.1:1", ChainConfig::default()).unwrap()
}

#[tokio::test]
async fn test_submit_sends_signed_ordered_bundle() {
    let seen = Arc::new(Mutex::new(Vec::<String>::new()));
    let captured = seen.clone();
    let addr = start_programmable_backend(move |request| {
        captured.lock().unwrap().push(request);
        let hash = format!("0x{}", "ab".repeat(32));
        (200, json!({"jsonrpc": "2.0", "id": 1, "result": {"bundleHash": hash}}).to_string())
    })
    .await;

    let auth = Wallet::random();
    let relay = FlashbotsRelay::new(&relay_config(format!("http://{}", addr)), auth.clone(), unreachable_chain()).unwrap();
    let signer = Address::repeat_byte(0x01);
    let payloads = [payload(1, signer, 0), payload(2, signer, 1), payload(3, signer, 2)];

    let handle = relay.submit_bundle(&payloads, 0x1234).await.unwrap();
    assert_eq!(handle.target_block, 0x1234);
    assert_eq!(handle.bundle_hash, Some(B256::repeat_byte(0xab)));
    assert_eq!(handle.transactions.len(), 3);

    let requests = seen.lock().unwrap();
    let request = &requests[0];
    let body = body_of(request);
    assert_eq!(body["method"], "eth_sendBundle");
    assert_eq!(body["params"][0]["blockNumber"], "0x1234");
    assert_eq!(body["params"][0]["txs"], json!(["0x0201", "0x0202", "0x0203"]));

    let header = request
        .lines()
        .find(|line| {
            line.to_ascii_lowercase()
                .starts_with(&FLASHBOTS_SIGNATURE_HEADER.to_ascii_lowercase())
        })
        .expect("signature header present");
    let value = header.split_once(':').map(|(_, v)| v.trim()).unwrap();
    let (identity, signature) = value.split_once(':').unwrap();
    assert_eq!(identity.parse::<Address>().unwrap(), auth.address());
    assert!(signature.starts_with("0x"));
    assert_eq!(signature.len(), 2 + 130);
}

#[tokio::test]
async fn test_rpc_error_is_rejection() {
    let addr = start_programmable_backend(|_| {
        (
            200,
            json!({"jsonrpc": "2.0", "id": 1, "error": {"code": -32000, "message": "nonce too low"}}).to_string(),
        )
    })
    .await;
    let relay = FlashbotsRelay::new(&relay_config(format!("http://{}", addr)), Wallet::random(), unreachable_chain()).unwrap();

    let err = relay
        .submit_bundle(&[payload(1, Address::ZERO, 0)], 10)
        .await
        .unwrap_err();
    assert!(matches!(err, RelayError::Rejected(ref m) if m == "nonce too low"));
}

#[tokio::test]
async fn test_unavailable_relay_is_transient() {
    let addr = start_programmable_backend(|_| (503, "Service Unavailable".to_string())).await;
    let relay = FlashbotsRelay::new(&relay_config(format!("http://{}", addr)), Wallet::random(), unreachable_chain()).unwrap();

    let err = relay
        .submit_bundle(&[payload(1, Address::ZERO, 0)], 10)
        .await
        .unwrap_err();
    assert!(err.is_transient());
}

fn handle(signer: Address, nonce: u64) -> SubmissionHandle {
    SubmissionHandle {
        bundle_hash: None,
        target_block: 101,
        transactions: vec![BundledTx {
            hash: TxHash::repeat_byte(0x01),
            signer,
            nonce,
        }],
    }
}

#[tokio::test]
async fn test_missed_block_detected() {
    let node = start_node(101, 5, None).await;
    let relay = relay_watching(&node, 5);

    let status = relay.await_inclusion(&handle(Address::repeat_byte(0x05), 5)).await.unwrap();
    assert_eq!(status, InclusionStatus::BlockPassedWithoutInclusion);
}

#[tokio::test]
async fn test_consumed_nonce_detected() {
    let node = start_node(101, 6, None).await;
    let relay = relay_watching(&node, 5);

    let status = relay.await_inclusion(&handle(Address::repeat_byte(0x05), 5)).await.unwrap();
    assert_eq!(status, InclusionStatus::AccountNonceTooHigh);
}

#[tokio::test]
async fn test_included_when_receipts_in_target_block() {
    let node = start_node(101, 6, Some(101)).await;
    let relay = relay_watching(&node, 5);

    let status = relay.await_inclusion(&handle(Address::repeat_byte(0x05), 5)).await.unwrap();
    assert_eq!(status, InclusionStatus::Included);
}

#[tokio::test]
async fn test_receipt_in_other_block_is_a_miss() {
    let node = start_node(102, 5, Some(102)).await;
    let relay = relay_watching(&node, 5);

    let status = relay.await_inclusion(&handle(Address::repeat_byte(0x05), 5)).await.unwrap();
    assert_eq!(status, InclusionStatus::BlockPassedWithoutInclusion);
}

#[tokio::test]
async fn test_stalled_head_times_out() {
    let node = start_node(100, 5, None).await;
    let relay = relay_watching(&node, 1);

    let err = relay
        .await_inclusion(&handle(Address::repeat_byte(0x05), 5))
        .await
        .unwrap_err();
    assert!(matches!(err, RelayError::InclusionTimeout(101)));
    assert!(err.is_transient());
}
