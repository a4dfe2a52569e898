//! Shared mocks for integration tests.
#![allow(dead_code)]

use alloy::consensus::{TxEip1559, TxEnvelope};
use alloy::eips::eip2718::Decodable2718;
use alloy::primitives::{Address, U256};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use bundle_rescue::blockchain::transaction::sign_eip1559;
use bundle_rescue::blockchain::{BlockchainError, BlockchainResult, SignedPayload, Wallet};
use bundle_rescue::relay::{BundledTx, InclusionStatus, RelayError, RelayResult, SubmissionHandle};
use bundle_rescue::rescue::{ChainClient, RelayClient};
use bundle_rescue::resilience::RetryPolicy;

pub const FUNDING_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
pub const AT_RISK_KEY: &str = "59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";
pub const CLAIM_CONTRACT: Address = Address::repeat_byte(0xc1);
pub const TOKEN_CONTRACT: Address = Address::repeat_byte(0x70);

pub fn funding_wallet() -> Wallet {
    Wallet::from_private_key(FUNDING_KEY).unwrap()
}

pub fn at_risk_wallet() -> Wallet {
    Wallet::from_private_key(AT_RISK_KEY).unwrap()
}

/// Millisecond waits so retry loops finish quickly.
pub fn fast_policy() -> RetryPolicy {
    RetryPolicy {
        block_interval: Duration::from_millis(1),
        transient_base_delay: Duration::from_millis(1),
        transient_max_delay: Duration::from_millis(2),
        max_consecutive_transient_failures: 3,
    }
}

/// Decode a signed payload back into its transaction.
pub fn decode(payload: &SignedPayload) -> TxEip1559 {
    let envelope = TxEnvelope::decode_2718(&mut payload.raw.as_ref()).unwrap();
    envelope.as_eip1559().unwrap().tx().clone()
}

#[derive(Debug, Default)]
pub struct ChainState {
    pub chain_id: u64,
    pub head: u64,
    pub balances: HashMap<Address, U256>,
    pub nonces: HashMap<Address, u64>,
    pub token_balance: U256,
    pub sign_calls: u32,
    pub snapshot_reads: u32,
    /// Upcoming `block_number` calls that fail with an RPC error.
    pub block_number_failures: u32,
}

/// In-memory chain. Cloning shares state with the test.
#[derive(Debug, Clone)]
pub struct MockChain {
    pub state: Arc<Mutex<ChainState>>,
}

impl MockChain {
    pub fn new(funding_balance: U256) -> Self {
        let mut state = ChainState {
            chain_id: 1,
            head: 100,
            token_balance: U256::from(250u64),
            ..Default::default()
        };
        state.balances.insert(funding_wallet().address(), funding_balance);
        state.nonces.insert(funding_wallet().address(), 12);
        state.nonces.insert(at_risk_wallet().address(), 5);
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn with<T>(&self, f: impl FnOnce(&mut ChainState) -> T) -> T {
        f(&mut self.state.lock().unwrap())
    }
}

#[async_trait]
impl ChainClient for MockChain {
    async fn chain_id(&self) -> BlockchainResult<u64> {
        Ok(self.with(|s| {
            s.snapshot_reads += 1;
            s.chain_id
        }))
    }

    async fn block_number(&self) -> BlockchainResult<u64> {
        self.with(|s| {
            if s.block_number_failures > 0 {
                s.block_number_failures -= 1;
                return Err(BlockchainError::Rpc("connection reset".into()));
            }
            Ok(s.head)
        })
    }

    async fn balance(&self, address: Address) -> BlockchainResult<U256> {
        Ok(self.with(|s| s.balances.get(&address).copied().unwrap_or_default()))
    }

    async fn transaction_count(&self, address: Address) -> BlockchainResult<u64> {
        Ok(self.with(|s| s.nonces.get(&address).copied().unwrap_or_default()))
    }

    async fn token_balance(&self, _token: Address, _holder: Address) -> BlockchainResult<U256> {
        Ok(self.with(|s| s.token_balance))
    }

    async fn sign(&self, tx: TxEip1559, wallet: &Wallet) -> BlockchainResult<SignedPayload> {
        self.with(|s| s.sign_calls += 1);
        sign_eip1559(wallet, tx)
    }
}

#[derive(Debug, Default)]
pub struct RelayState {
    /// Every accepted bundle with its target block.
    pub submissions: Vec<(Vec<SignedPayload>, u64)>,
    /// Scripted inclusion results; a miss once exhausted.
    pub outcomes: VecDeque<InclusionStatus>,
    /// Reject every submission with this message.
    pub reject: Option<String>,
    /// Upcoming submissions that fail with a transport error.
    pub transport_failures: u32,
    /// Upcoming inclusion checks that time out.
    pub inclusion_timeouts: u32,
    pub inclusion_checks: u32,
}

/// Scripted relay. Every inclusion check advances the shared chain head, and a
/// consumed-nonce result bumps the at-risk nonce the way a competing
/// transaction would.
#[derive(Debug, Clone)]
pub struct MockRelay {
    pub state: Arc<Mutex<RelayState>>,
    chain: MockChain,
}

impl MockRelay {
    pub fn new(chain: &MockChain, outcomes: impl IntoIterator<Item = InclusionStatus>) -> Self {
        let state = RelayState {
            outcomes: outcomes.into_iter().collect(),
            ..Default::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
            chain: chain.clone(),
        }
    }

    /// A relay whose bundles never land.
    pub fn never_including(chain: &MockChain) -> Self {
        Self::new(chain, Vec::<InclusionStatus>::new())
    }

    pub fn with<T>(&self, f: impl FnOnce(&mut RelayState) -> T) -> T {
        f(&mut self.state.lock().unwrap())
    }

    pub fn submission_count(&self) -> usize {
        self.with(|s| s.submissions.len())
    }

    /// Decoded transactions of submission `i`.
    pub fn submitted(&self, i: usize) -> Vec<TxEip1559> {
        self.with(|s| s.submissions[i].0.iter().map(decode).collect())
    }
}

#[async_trait]
impl RelayClient for MockRelay {
    async fn submit_bundle(&self, payloads: &[SignedPayload], target_block: u64) -> RelayResult<SubmissionHandle> {
        self.with(|s| {
            if let Some(reason) = &s.reject {
                return Err(RelayError::Rejected(reason.clone()));
            }
            if s.transport_failures > 0 {
                s.transport_failures -= 1;
                return Err(RelayError::Transport("relay returned HTTP 503".into()));
            }
            s.submissions.push((payloads.to_vec(), target_block));
            Ok(SubmissionHandle {
                bundle_hash: None,
                target_block,
                transactions: payloads.iter().map(BundledTx::from).collect(),
            })
        })
    }

    async fn await_inclusion(&self, handle: &SubmissionHandle) -> RelayResult<InclusionStatus> {
        let status = self.with(|s| {
            s.inclusion_checks += 1;
            if s.inclusion_timeouts > 0 {
                s.inclusion_timeouts -= 1;
                return Err(RelayError::InclusionTimeout(handle.target_block));
            }
            Ok(s.outcomes.pop_front().unwrap_or(InclusionStatus::BlockPassedWithoutInclusion))
        })?;

        let at_risk = at_risk_wallet().address();
        self.chain.with(|c| {
            c.head = c.head.max(handle.target_block);
            if status == InclusionStatus::AccountNonceTooHigh {
                *c.nonces.entry(at_risk).or_default() += 1;
            }
        });
        Ok(status)
    }
}

/// Start a one-response-per-connection HTTP server on an ephemeral port.
///
/// `respond` gets the raw request (head and body) and returns status and body.
pub async fn start_programmable_backend<F>(respond: F) -> SocketAddr
where
    F: Fn(String) -> (u16, String) + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let respond = Arc::new(respond);

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let respond = respond.clone();
            tokio::spawn(async move {
                let request = read_request(&mut socket).await;
                let (status, body) = respond(request);
                let status_text = match status {
                    200 => "200 OK",
                    400 => "400 Bad Request",
                    429 => "429 Too Many Requests",
                    500 => "500 Internal Server Error",
                    503 => "503 Service Unavailable",
                    _ => "200 OK",
                };
                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status_text,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    addr
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => n,
        };
        buf.extend_from_slice(&chunk[..n]);

        let text = String::from_utf8_lossy(&buf);
        if let Some(head_end) = text.find("\r\n\r\n") {
            let content_length = text[..head_end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if buf.len() >= head_end + 4 + content_length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}
