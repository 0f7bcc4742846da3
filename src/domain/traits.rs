//! Domain traits defining contracts for external collaborators.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use super::chain::{AlgoNodeType, Chain, PreparationKey};
use super::error::{AppError, ConfigError};
use super::types::TransactionHash;

/// Node discovery and network selection
#[async_trait]
pub trait NodeProvider: Send + Sync {
    /// Whether the connector runs against test networks
    async fn is_testnet(&self) -> Result<bool, AppError>;

    /// Ordered node URLs for an EVM chain or ALGOD
    async fn get_nodes_url(&self, chain: Chain, testnet: bool) -> Result<Vec<String>, AppError>;

    /// Ordered Algorand node URLs of the given flavour
    async fn get_algo_nodes_url(
        &self,
        node_type: AlgoNodeType,
        testnet: bool,
    ) -> Result<Vec<String>, AppError>;

    /// First configured node for a chain. Algorand resolves to its ALGOD list.
    async fn first_node_url(&self, chain: Chain, testnet: bool) -> Result<String, AppError> {
        let urls = match chain {
            Chain::Algo => self.get_algo_nodes_url(AlgoNodeType::Algod, testnet).await?,
            _ => self.get_nodes_url(chain, testnet).await?,
        };
        urls.into_iter()
            .next()
            .ok_or_else(|| ConfigError::NoNodeUrl(chain.to_string()).into())
    }

    /// Check that at least one node is configured per chain
    async fn health_check(&self) -> Result<(), AppError> {
        Ok(())
    }
}

/// Input of a single preparation call
#[derive(Debug, Clone)]
pub struct PreparationRequest {
    pub key: PreparationKey,
    /// The validated request body
    pub body: Value,
    /// Node URL the preparation runs against
    pub provider: String,
    /// Only set for chains that need the network before resolving contracts
    pub testnet: Option<bool>,
}

/// One entry of the preparation table
#[async_trait]
pub trait TransactionPreparer: Send + Sync {
    /// Produce the transaction payload to store or broadcast
    async fn prepare(&self, request: &PreparationRequest) -> Result<String, AppError>;
}

/// Storage of transactions awaiting KMS signing
#[async_trait]
pub trait KmsStore: Send + Sync {
    async fn health_check(&self) -> Result<(), AppError>;

    /// Persist a pending transaction and return its reference
    async fn store_kms_transaction(
        &self,
        tx_data: &str,
        chain: Chain,
        signature_ids: &[String],
        index: Option<u32>,
    ) -> Result<String, AppError>;

    /// Mark a pending transaction as broadcast
    async fn complete_kms_transaction(&self, id: &str, tx_id: &str) -> Result<(), AppError>;
}

/// Submission of signed transactions
#[async_trait]
pub trait Broadcaster: Send + Sync {
    async fn broadcast(
        &self,
        chain: Chain,
        tx_data: &str,
        signature_id: Option<&str>,
    ) -> Result<TransactionHash, AppError>;
}

/// JSON-RPC transport bound to one EVM node
#[async_trait]
pub trait EvmRpcProvider: Send + Sync {
    async fn send_request(&self, method: &str, params: Value) -> Result<Value, AppError>;
}

/// Builds RPC providers for node URLs resolved at request time
pub trait RpcConnector: Send + Sync {
    fn connect(&self, url: &str) -> Result<Arc<dyn EvmRpcProvider>, AppError>;
}

/// Plain HTTP access to Algorand nodes
#[async_trait]
pub trait AlgoNodeTransport: Send + Sync {
    /// GET `{base_url}{path}` with an optional raw query string
    async fn get(&self, base_url: &str, path: &str, query: Option<&str>)
    -> Result<Value, AppError>;

    /// POST a JSON body to `{base_url}{path}`
    async fn post(&self, base_url: &str, path: &str, body: Value) -> Result<Value, AppError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedNodes;

    #[async_trait]
    impl NodeProvider for FixedNodes {
        async fn is_testnet(&self) -> Result<bool, AppError> {
            Ok(true)
        }

        async fn get_nodes_url(&self, _chain: Chain, _testnet: bool) -> Result<Vec<String>, AppError> {
            Ok(vec!["http://node".to_string()])
        }

        async fn get_algo_nodes_url(
            &self,
            _node_type: AlgoNodeType,
            _testnet: bool,
        ) -> Result<Vec<String>, AppError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_node_provider_default_health_check() {
        let nodes = FixedNodes;
        assert!(nodes.health_check().await.is_ok());
        assert!(nodes.is_testnet().await.unwrap());
    }

    #[tokio::test]
    async fn test_first_node_url_takes_head_of_list() {
        let url = FixedNodes.first_node_url(Chain::Celo, true).await.unwrap();
        assert_eq!(url, "http://node");
    }

    #[tokio::test]
    async fn test_first_node_url_empty_algod_list_is_config_error() {
        let err = FixedNodes.first_node_url(Chain::Algo, true).await.unwrap_err();
        assert!(matches!(err, AppError::Config(ConfigError::NoNodeUrl(chain)) if chain == "ALGO"));
    }
}
