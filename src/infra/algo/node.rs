//! HTTP client for Algorand ALGOD and INDEXER nodes.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::domain::{AlgoNodeTransport, AppError, BlockchainError, UpstreamError};

/// Plain reqwest client; node errors surface as [`UpstreamError`]
#[derive(Clone)]
pub struct AlgoNodeClient {
    http_client: Client,
}

fn join(base_url: &str, path: &str) -> String {
    match (base_url.ends_with('/'), path.starts_with('/')) {
        (true, true) => format!("{}{}", base_url.trim_end_matches('/'), path),
        (false, false) if !path.is_empty() => format!("{base_url}/{path}"),
        _ => format!("{base_url}{path}"),
    }
}

impl AlgoNodeClient {
    pub fn new(timeout: Duration) -> Result<Self, AppError> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Blockchain(BlockchainError::Connection(e.to_string())))?;
        Ok(Self { http_client })
    }

    async fn execute(&self, request: RequestBuilder) -> Result<Value, AppError> {
        let response = request.send().await.map_err(UpstreamError::transport)?;
        let status = response.status();
        let body = response.text().await.map_err(UpstreamError::transport)?;

        if !status.is_success() {
            debug!(status = status.as_u16(), "Node returned an error");
            return Err(UpstreamError::from_response(status.as_u16(), &body).into());
        }
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&body).unwrap_or(Value::String(body)))
    }

    /// Submit raw signed transaction bytes to ALGOD
    #[instrument(skip(self, bytes), fields(len = bytes.len()))]
    pub async fn post_raw(&self, base_url: &str, path: &str, bytes: Vec<u8>) -> Result<Value, AppError> {
        let request = self
            .http_client
            .post(join(base_url, path))
            .header(reqwest::header::CONTENT_TYPE, "application/x-binary")
            .body(bytes);
        self.execute(request).await
    }
}

#[async_trait]
impl AlgoNodeTransport for AlgoNodeClient {
    #[instrument(skip(self))]
    async fn get(&self, base_url: &str, path: &str, query: Option<&str>) -> Result<Value, AppError> {
        let mut url = join(base_url, path);
        if let Some(query) = query.filter(|q| !q.is_empty()) {
            url.push('?');
            url.push_str(query);
        }
        self.execute(self.http_client.get(url)).await
    }

    #[instrument(skip(self, body))]
    async fn post(&self, base_url: &str, path: &str, body: Value) -> Result<Value, AppError> {
        self.execute(self.http_client.post(join(base_url, path)).json(&body))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_handles_slashes() {
        assert_eq!(join("http://node", "/v2/status"), "http://node/v2/status");
        assert_eq!(join("http://node/", "/v2/status"), "http://node/v2/status");
        assert_eq!(join("http://node", "v2/status"), "http://node/v2/status");
        assert_eq!(join("http://node", ""), "http://node");
    }
}
