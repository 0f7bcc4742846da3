//! JSON-RPC client for EVM nodes.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use alloy::primitives::{Address, Bytes};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, instrument};

use crate::domain::{AppError, BlockchainError, EvmRpcProvider, RpcConnector};

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    // `null` is a valid result (e.g. a pending receipt)
    #[serde(default)]
    result: Value,
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

/// HTTP JSON-RPC provider bound to one node URL
pub struct HttpEvmRpcProvider {
    http_client: Client,
    rpc_url: String,
    next_id: AtomicU64,
}

impl HttpEvmRpcProvider {
    pub fn new(rpc_url: &str, timeout: Duration) -> Result<Self, AppError> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Blockchain(BlockchainError::Connection(e.to_string())))?;
        Ok(Self::with_client(http_client, rpc_url))
    }

    #[must_use]
    pub fn with_client(http_client: Client, rpc_url: &str) -> Self {
        Self {
            http_client,
            rpc_url: rpc_url.to_string(),
            next_id: AtomicU64::new(1),
        }
    }
}

#[async_trait]
impl EvmRpcProvider for HttpEvmRpcProvider {
    async fn send_request(&self, method: &str, params: Value) -> Result<Value, AppError> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };

        let response = self
            .http_client
            .post(&self.rpc_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::Blockchain(BlockchainError::Timeout(e.to_string()))
                } else {
                    AppError::Blockchain(BlockchainError::Connection(e.to_string()))
                }
            })?;

        let rpc_response: JsonRpcResponse = response
            .json()
            .await
            .map_err(|e| AppError::Blockchain(BlockchainError::InvalidResponse(e.to_string())))?;

        if let Some(error) = rpc_response.error {
            return Err(AppError::Blockchain(BlockchainError::Rpc {
                code: error.code,
                message: error.message,
            }));
        }
        Ok(rpc_response.result)
    }
}

/// Creates HTTP providers sharing one connection pool
#[derive(Clone)]
pub struct HttpRpcConnector {
    http_client: Client,
}

impl HttpRpcConnector {
    pub fn new(timeout: Duration) -> Result<Self, AppError> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Blockchain(BlockchainError::Connection(e.to_string())))?;
        Ok(Self { http_client })
    }
}

impl RpcConnector for HttpRpcConnector {
    fn connect(&self, url: &str) -> Result<Arc<dyn EvmRpcProvider>, AppError> {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(AppError::Blockchain(BlockchainError::Connection(format!(
                "Unsupported node URL {url}"
            ))));
        }
        Ok(Arc::new(HttpEvmRpcProvider::with_client(
            self.http_client.clone(),
            url,
        )))
    }
}

/// Typed wrapper over the handful of `eth_*` methods the connector uses
#[derive(Clone)]
pub struct EvmRpcClient {
    provider: Arc<dyn EvmRpcProvider>,
}

impl EvmRpcClient {
    #[must_use]
    pub fn new(provider: Arc<dyn EvmRpcProvider>) -> Self {
        Self { provider }
    }

    /// Read-only contract call against the latest block
    #[instrument(skip(self, data), fields(to = %to))]
    pub async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, AppError> {
        let result = self
            .provider
            .send_request("eth_call", json!([{ "to": to, "data": data }, "latest"]))
            .await?;
        let hex = result.as_str().ok_or_else(|| {
            AppError::Blockchain(BlockchainError::InvalidResponse(format!(
                "eth_call returned {result}"
            )))
        })?;
        hex.parse::<Bytes>()
            .map_err(|e| AppError::Blockchain(BlockchainError::InvalidResponse(e.to_string())))
    }

    /// Transaction object; fails when the node does not know the hash
    pub async fn get_transaction_by_hash(&self, hash: &str) -> Result<Value, AppError> {
        let tx = self
            .provider
            .send_request("eth_getTransactionByHash", json!([hash]))
            .await?;
        if tx.is_null() {
            return Err(AppError::Blockchain(BlockchainError::EmptyResponse(
                "eth_getTransactionByHash".to_string(),
            )));
        }
        Ok(tx)
    }

    /// Receipt, or `None` while the transaction is pending
    pub async fn get_transaction_receipt(&self, hash: &str) -> Result<Option<Value>, AppError> {
        let receipt = self
            .provider
            .send_request("eth_getTransactionReceipt", json!([hash]))
            .await?;
        Ok((!receipt.is_null()).then_some(receipt))
    }

    #[instrument(skip(self, tx_data))]
    pub async fn send_raw_transaction(&self, tx_data: &str) -> Result<String, AppError> {
        let raw = if tx_data.starts_with("0x") {
            tx_data.to_string()
        } else {
            format!("0x{tx_data}")
        };
        let result = self
            .provider
            .send_request("eth_sendRawTransaction", json!([raw]))
            .await?;
        let hash = result
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| {
                AppError::Blockchain(BlockchainError::EmptyResponse(
                    "eth_sendRawTransaction".to_string(),
                ))
            })?;
        debug!(tx_id = %hash, "Raw transaction accepted");
        Ok(hash)
    }
}
