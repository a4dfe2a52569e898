//! Blockchain RPC client with timeout and error handling.
//!
//! # Responsibilities
//! - Connect to JSON-RPC endpoint (primary + failovers)
//! - Query chain state (chain id, block number, balances, nonces, receipts)
//! - Read ERC-20 balances through `eth_call`
//! - Handle timeouts and network errors gracefully

use alloy::consensus::TxEip1559;
use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, TxHash, U256};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::{TransactionReceipt, TransactionRequest};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use crate::blockchain::contracts::{decode_uint_word, encode_balance_of};
use crate::blockchain::transaction::{sign_eip1559, SignedPayload};
use crate::blockchain::types::{BlockchainError, BlockchainResult, ChainConfig, ChainId};
use crate::blockchain::wallet::Wallet;
use crate::rescue::ports::ChainClient;

/// Blockchain RPC client wrapper with failover support.
#[derive(Clone)]
pub struct BlockchainClient {
    /// List of providers (primary + failovers).
    providers: Vec<Arc<dyn Provider + Send + Sync>>,
    /// Primary endpoint, kept for diagnostics.
    rpc_url: String,
    /// Configuration.
    config: ChainConfig,
    /// Request timeout duration.
    timeout_duration: Duration,
}

impl BlockchainClient {
    /// Create a new blockchain client.
    ///
    /// No request is made here; use [`BlockchainClient::verify_chain_id`] to
    /// probe the endpoint.
    ///
    /// # Arguments
    /// * `rpc_url` - Primary JSON-RPC endpoint
    /// * `config` - Chain configuration (failovers, timeout, expected chain)
    pub fn new(rpc_url: &str, config: ChainConfig) -> BlockchainResult<Self> {
        let timeout_duration = Duration::from_secs(config.rpc_timeout_secs);
        let mut providers = Vec::new();

        // 1. Add primary provider
        let primary_url: url::Url = rpc_url.parse().map_err(|e| {
            BlockchainError::Rpc(format!("Invalid RPC URL '{}': {}", rpc_url, e))
        })?;
        providers.push(Arc::new(ProviderBuilder::new().connect_http(primary_url)) as Arc<dyn Provider + Send + Sync>);

        // 2. Add failover providers
        for url_str in &config.failover_urls {
            if let Ok(url) = url_str.parse() {
                providers.push(Arc::new(ProviderBuilder::new().connect_http(url)) as Arc<dyn Provider + Send + Sync>);
            } else {
                tracing::warn!(url = %url_str, "Ignoring invalid failover RPC URL");
            }
        }

        tracing::info!(
            rpc_url = %rpc_url,
            failovers = providers.len() - 1,
            timeout_secs = config.rpc_timeout_secs,
            "Blockchain client initialized"
        );

        Ok(Self {
            providers,
            rpc_url: rpc_url.to_string(),
            config,
            timeout_duration,
        })
    }

    /// Verify the connected chain ID matches configuration, if one is configured.
    ///
    /// Returns the chain ID reported by the node.
    pub async fn verify_chain_id(&self) -> BlockchainResult<ChainId> {
        let chain_id = self.get_chain_id().await?;
        if let Some(expected) = self.config.chain_id {
            if chain_id.0 != expected {
                return Err(BlockchainError::ChainMismatch {
                    expected,
                    actual: chain_id.0,
                });
            }
        }
        Ok(chain_id)
    }

    /// Get the chain ID from the RPC.
    pub async fn get_chain_id(&self) -> BlockchainResult<ChainId> {
        for (i, provider) in self.providers.iter().enumerate() {
            let fut = provider.get_chain_id();
            match timeout(self.timeout_duration, fut).await {
                Ok(Ok(result)) => return Ok(ChainId(result)),
                Ok(Err(e)) => {
                    tracing::warn!(provider_idx = i, error = %e, "RPC error, trying next provider");
                }
                Err(_) => {
                    tracing::warn!(provider_idx = i, "RPC timeout, trying next provider");
                }
            }
        }
        Err(BlockchainError::Rpc("All RPC providers failed".to_string()))
    }

    /// Get the latest block number.
    pub async fn get_block_number(&self) -> BlockchainResult<u64> {
        for (i, provider) in self.providers.iter().enumerate() {
            let fut = provider.get_block_number();
            match timeout(self.timeout_duration, fut).await {
                Ok(Ok(result)) => return Ok(result),
                Ok(Err(e)) => tracing::warn!(provider_idx = i, error = %e, "RPC error"),
                Err(_) => tracing::warn!(provider_idx = i, "RPC timeout"),
            }
        }
        Err(BlockchainError::Rpc("All providers failed to get block number".to_string()))
    }

    /// Get the balance of an address.
    pub async fn get_balance(&self, address: Address) -> BlockchainResult<U256> {
        for (i, provider) in self.providers.iter().enumerate() {
            let fut = provider.get_balance(address);
            match timeout(self.timeout_duration, fut).await {
                Ok(Ok(result)) => return Ok(result),
                Ok(Err(e)) => tracing::warn!(provider_idx = i, error = %e, "RPC error"),
                Err(_) => tracing::warn!(provider_idx = i, "RPC timeout"),
            }
        }
        Err(BlockchainError::Rpc("All providers failed to get balance".to_string()))
    }

    /// Get the transaction count (nonce) for an address.
    pub async fn get_transaction_count(&self, address: Address) -> BlockchainResult<u64> {
        for (i, provider) in self.providers.iter().enumerate() {
            let fut = provider.get_transaction_count(address);
            match timeout(self.timeout_duration, fut).await {
                Ok(Ok(result)) => return Ok(result),
                Ok(Err(e)) => tracing::warn!(provider_idx = i, error = %e, "RPC error"),
                Err(_) => tracing::warn!(provider_idx = i, "RPC timeout"),
            }
        }
        Err(BlockchainError::Rpc("All providers failed to get transaction count".to_string()))
    }

    /// Get a transaction receipt by hash.
    pub async fn get_transaction_receipt(
        &self,
        tx_hash: TxHash,
    ) -> BlockchainResult<Option<TransactionReceipt>> {
        for (i, provider) in self.providers.iter().enumerate() {
            let fut = provider.get_transaction_receipt(tx_hash);
            match timeout(self.timeout_duration, fut).await {
                Ok(Ok(result)) => return Ok(result),
                Ok(Err(e)) => tracing::warn!(provider_idx = i, error = %e, "RPC error"),
                Err(_) => tracing::warn!(provider_idx = i, "RPC timeout"),
            }
        }
        Err(BlockchainError::Rpc("All providers failed to get receipt".to_string()))
    }

    /// Read an ERC-20 balance via `eth_call` against the latest block.
    pub async fn get_token_balance(&self, token: Address, holder: Address) -> BlockchainResult<U256> {
        let request = TransactionRequest::default()
            .with_to(token)
            .with_input(encode_balance_of(holder));

        for (i, provider) in self.providers.iter().enumerate() {
            let fut = provider.call(request.clone());
            match timeout(self.timeout_duration, fut).await {
                Ok(Ok(output)) => {
                    return decode_uint_word(&output).ok_or_else(|| {
                        BlockchainError::Decode(format!(
                            "balanceOf returned {} bytes, expected 32",
                            output.len()
                        ))
                    });
                }
                Ok(Err(e)) => tracing::warn!(provider_idx = i, error = %e, "RPC error"),
                Err(_) => tracing::warn!(provider_idx = i, "RPC timeout"),
            }
        }
        Err(BlockchainError::Rpc("All providers failed to read token balance".to_string()))
    }
}

#[async_trait]
impl ChainClient for BlockchainClient {
    async fn chain_id(&self) -> BlockchainResult<u64> {
        self.get_chain_id().await.map(u64::from)
    }

    async fn block_number(&self) -> BlockchainResult<u64> {
        self.get_block_number().await
    }

    async fn balance(&self, address: Address) -> BlockchainResult<U256> {
        self.get_balance(address).await
    }

    async fn transaction_count(&self, address: Address) -> BlockchainResult<u64> {
        self.get_transaction_count(address).await
    }

    async fn token_balance(&self, token: Address, holder: Address) -> BlockchainResult<U256> {
        self.get_token_balance(token, holder).await
    }

    async fn sign(&self, tx: TxEip1559, wallet: &Wallet) -> BlockchainResult<SignedPayload> {
        sign_eip1559(wallet, tx)
    }
}

impl std::fmt::Debug for BlockchainClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockchainClient")
            .field("rpc_url", &self.rpc_url)
            .field("chain_id", &self.config.chain_id)
            .field("timeout_secs", &self.config.rpc_timeout_secs)
            .finish()
    }
}
