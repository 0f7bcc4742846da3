//! Node URL configuration read from the environment.

use std::collections::HashMap;
use std::env;

use async_trait::async_trait;

use crate::domain::{AlgoNodeType, AppError, Chain, ConfigError, NodeProvider};

fn default_nodes(chain: Chain, testnet: bool) -> &'static str {
    match (chain, testnet) {
        (Chain::Eth, false) => "https://ethereum-rpc.publicnode.com",
        (Chain::Eth, true) => "https://ethereum-sepolia-rpc.publicnode.com",
        (Chain::Bsc, false) => "https://bsc-dataseed.bnbchain.org",
        (Chain::Bsc, true) => "https://data-seed-prebsc-1-s1.bnbchain.org:8545",
        (Chain::Celo, false) => "https://forno.celo.org",
        (Chain::Celo, true) => "https://alfajores-forno.celo-testnet.org",
        (Chain::Algo, false) => "https://mainnet-api.algonode.cloud",
        (Chain::Algo, true) => "https://testnet-api.algonode.cloud",
    }
}

fn default_indexer(testnet: bool) -> &'static str {
    if testnet {
        "https://testnet-idx.algonode.cloud"
    } else {
        "https://mainnet-idx.algonode.cloud"
    }
}

fn variable(chain: Chain, testnet: bool) -> String {
    let prefix = chain.as_str();
    match (chain, testnet) {
        (Chain::Algo, false) => "ALGO_ALGOD_URLS".to_string(),
        (Chain::Algo, true) => "ALGO_TESTNET_ALGOD_URLS".to_string(),
        (_, false) => format!("{prefix}_NODE_URLS"),
        (_, true) => format!("{prefix}_TESTNET_NODE_URLS"),
    }
}

fn split_urls(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .map(|url| url.trim_end_matches('/').to_string())
        .collect()
}

/// Ordered node lists per chain and network
#[derive(Debug, Clone, Default)]
pub struct NodeConfig {
    pub testnet: bool,
    nodes: HashMap<(Chain, bool), Vec<String>>,
    indexers: HashMap<bool, Vec<String>>,
}

impl NodeConfig {
    /// Load from environment variables, falling back to public endpoints
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load using an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let testnet = match lookup("TESTNET").as_deref() {
            None | Some("") | Some("false") | Some("0") => false,
            Some("true") | Some("1") => true,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    key: "TESTNET".to_string(),
                    message: format!("expected true/false, got '{other}'"),
                });
            }
        };

        let mut config = Self {
            testnet,
            ..Default::default()
        };
        for chain in Chain::ALL {
            for network in [false, true] {
                let urls = lookup(&variable(chain, network))
                    .map(|v| split_urls(&v))
                    .unwrap_or_else(|| vec![default_nodes(chain, network).to_string()]);
                config.nodes.insert((chain, network), urls);
            }
        }
        for (network, key) in [
            (false, "ALGO_INDEXER_URLS"),
            (true, "ALGO_TESTNET_INDEXER_URLS"),
        ] {
            let urls = lookup(key)
                .map(|v| split_urls(&v))
                .unwrap_or_else(|| vec![default_indexer(network).to_string()]);
            config.indexers.insert(network, urls);
        }
        Ok(config)
    }

    /// Replace the list of one chain and network
    #[must_use]
    pub fn with_nodes(mut self, chain: Chain, testnet: bool, urls: Vec<String>) -> Self {
        self.nodes.insert((chain, testnet), urls);
        self
    }

    #[must_use]
    pub fn with_indexers(mut self, testnet: bool, urls: Vec<String>) -> Self {
        self.indexers.insert(testnet, urls);
        self
    }

    #[must_use]
    pub fn nodes(&self, chain: Chain, testnet: bool) -> &[String] {
        self.nodes
            .get(&(chain, testnet))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    #[must_use]
    pub fn indexers(&self, testnet: bool) -> &[String] {
        self.indexers
            .get(&testnet)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// [`NodeProvider`] backed by a static [`NodeConfig`]
#[derive(Debug, Clone)]
pub struct EnvNodeProvider {
    config: NodeConfig,
}

impl EnvNodeProvider {
    #[must_use]
    pub fn new(config: NodeConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl NodeProvider for EnvNodeProvider {
    async fn is_testnet(&self) -> Result<bool, AppError> {
        Ok(self.config.testnet)
    }

    async fn get_nodes_url(&self, chain: Chain, testnet: bool) -> Result<Vec<String>, AppError> {
        Ok(self.config.nodes(chain, testnet).to_vec())
    }

    async fn get_algo_nodes_url(
        &self,
        node_type: AlgoNodeType,
        testnet: bool,
    ) -> Result<Vec<String>, AppError> {
        Ok(match node_type {
            AlgoNodeType::Algod => self.config.nodes(Chain::Algo, testnet),
            AlgoNodeType::Indexer => self.config.indexers(testnet),
        }
        .to_vec())
    }

    async fn health_check(&self) -> Result<(), AppError> {
        let testnet = self.config.testnet;
        for chain in Chain::ALL {
            if self.config.nodes(chain, testnet).is_empty() {
                return Err(ConfigError::NoNodeUrl(chain.to_string()).into());
            }
        }
        if self.config.indexers(testnet).is_empty() {
            return Err(ConfigError::NoNodeUrl(AlgoNodeType::Indexer.to_string()).into());
        }
        Ok(())
    }
}
