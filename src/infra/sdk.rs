//! HTTP adapter for the transaction preparation service.
//!
//! Each table entry posts `{body, provider, testnet?}` to
//! `{SDK_URL}/{chain}/{operation}/{variant}` and reads back `{txData}`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::domain::{
    AppError, BlockchainError, PreparationKey, PreparationRequest, TransactionPreparer,
    UpstreamError,
};

#[derive(Debug, Serialize)]
struct PrepareBody<'a> {
    body: &'a serde_json::Value,
    provider: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    testnet: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PrepareResponse {
    tx_data: String,
}

/// Preparer calling a remote SDK service
#[derive(Clone)]
pub struct HttpTransactionPreparer {
    http_client: Client,
    base_url: String,
}

impl HttpTransactionPreparer {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AppError> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Blockchain(BlockchainError::Connection(e.to_string())))?;
        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Table factory sharing one client across all entries
    pub fn factory(self) -> impl Fn(PreparationKey) -> Arc<dyn TransactionPreparer> {
        let shared: Arc<dyn TransactionPreparer> = Arc::new(self);
        move |_| Arc::clone(&shared)
    }

    fn endpoint(&self, key: &PreparationKey) -> String {
        format!("{}/{}", self.base_url, key)
    }
}

#[async_trait]
impl TransactionPreparer for HttpTransactionPreparer {
    #[instrument(skip(self, request), fields(key = %request.key))]
    async fn prepare(&self, request: &PreparationRequest) -> Result<String, AppError> {
        let payload = PrepareBody {
            body: &request.body,
            provider: &request.provider,
            testnet: request.testnet,
        };
        let response = self
            .http_client
            .post(self.endpoint(&request.key))
            .json(&payload)
            .send()
            .await
            .map_err(UpstreamError::transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::from_response(status.as_u16(), &body).into());
        }

        let prepared: PrepareResponse = response.json().await.map_err(UpstreamError::transport)?;
        debug!(len = prepared.tx_data.len(), "Transaction prepared");
        Ok(prepared.tx_data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Chain, OperationKind, Variant};

    #[test]
    fn test_endpoint_uses_table_key() {
        let preparer =
            HttpTransactionPreparer::new("http://sdk:9000/", Duration::from_secs(5)).unwrap();
        let key = PreparationKey::new(Chain::Celo, OperationKind::Mint, Variant::Cashback);
        assert_eq!(preparer.endpoint(&key), "http://sdk:9000/celo/mint/cashback");
    }

    #[test]
    fn test_payload_omits_testnet_when_unset() {
        let body = serde_json::json!({"chain": "ETH"});
        let payload = PrepareBody {
            body: &body,
            provider: "http://node",
            testnet: None,
        };
        let value = serde_json::to_value(&payload).unwrap();
        assert!(value.get("testnet").is_none());
        assert_eq!(value["provider"], "http://node");
    }
}
