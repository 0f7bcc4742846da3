//! Mock implementations for testing.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::domain::{
    AlgoNodeTransport, AlgoNodeType, AppError, BlockchainError, Broadcaster, Chain, ConfigError,
    DatabaseError, EvmRpcProvider, KmsStore, NodeProvider, PreparationRequest, RpcConnector,
    TransactionHash, TransactionPreparer, UpstreamError,
};

/// Configuration for mock behavior
#[derive(Debug, Clone, Default)]
pub struct MockConfig {
    pub should_fail: bool,
    pub error_message: Option<String>,
}

impl MockConfig {
    #[must_use]
    pub fn success() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            should_fail: true,
            error_message: Some(message.into()),
        }
    }

    fn check(&self, make: impl FnOnce(String) -> AppError) -> Result<(), AppError> {
        if self.should_fail {
            let msg = self
                .error_message
                .clone()
                .unwrap_or_else(|| "Mock error".to_string());
            return Err(make(msg));
        }
        Ok(())
    }
}

/// Node provider answering `http://{chain}.mock` style URLs
pub struct MockNodeProvider {
    testnet: AtomicBool,
    nodes: HashMap<(Chain, bool), Vec<String>>,
    algo_nodes: HashMap<(AlgoNodeType, bool), Vec<String>>,
    config: MockConfig,
    lookups: AtomicUsize,
}

impl MockNodeProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(MockConfig::success())
    }

    #[must_use]
    pub fn with_config(config: MockConfig) -> Self {
        Self {
            testnet: AtomicBool::new(false),
            nodes: HashMap::new(),
            algo_nodes: HashMap::new(),
            config,
            lookups: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_config(MockConfig::failure(message))
    }

    /// Override the node list of a chain
    #[must_use]
    pub fn with_nodes(mut self, chain: Chain, testnet: bool, urls: Vec<String>) -> Self {
        self.nodes.insert((chain, testnet), urls);
        self
    }

    #[must_use]
    pub fn with_algo_nodes(mut self, node_type: AlgoNodeType, testnet: bool, urls: Vec<String>) -> Self {
        self.algo_nodes.insert((node_type, testnet), urls);
        self
    }

    #[must_use]
    pub fn with_testnet(self, testnet: bool) -> Self {
        self.testnet.store(testnet, Ordering::Relaxed);
        self
    }

    /// Number of node list lookups served
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::Relaxed)
    }

    fn check_should_fail(&self) -> Result<(), AppError> {
        self.config.check(|message| {
            AppError::Config(ConfigError::InvalidValue {
                key: "nodes".to_string(),
                message,
            })
        })
    }
}

impl Default for MockNodeProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NodeProvider for MockNodeProvider {
    async fn is_testnet(&self) -> Result<bool, AppError> {
        self.check_should_fail()?;
        Ok(self.testnet.load(Ordering::Relaxed))
    }

    async fn get_nodes_url(&self, chain: Chain, testnet: bool) -> Result<Vec<String>, AppError> {
        self.check_should_fail()?;
        self.lookups.fetch_add(1, Ordering::Relaxed);
        if let Some(urls) = self.nodes.get(&(chain, testnet)) {
            return Ok(urls.clone());
        }
        let slug = chain.slug();
        Ok(vec![if testnet {
            format!("http://{slug}-testnet.mock")
        } else {
            format!("http://{slug}.mock")
        }])
    }

    async fn get_algo_nodes_url(
        &self,
        node_type: AlgoNodeType,
        testnet: bool,
    ) -> Result<Vec<String>, AppError> {
        self.check_should_fail()?;
        self.lookups.fetch_add(1, Ordering::Relaxed);
        if let Some(urls) = self.algo_nodes.get(&(node_type, testnet)) {
            return Ok(urls.clone());
        }
        let name = match node_type {
            AlgoNodeType::Algod => "algod",
            AlgoNodeType::Indexer => "indexer",
        };
        Ok(vec![if testnet {
            format!("http://{name}-testnet.mock")
        } else {
            format!("http://{name}.mock")
        }])
    }

    async fn health_check(&self) -> Result<(), AppError> {
        self.check_should_fail()
    }
}

/// Preparer returning `signed:{key}` and recording every request
pub struct MockPreparer {
    requests: Arc<Mutex<Vec<PreparationRequest>>>,
    tx_data: Option<String>,
    config: MockConfig,
}

impl MockPreparer {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(MockConfig::success())
    }

    #[must_use]
    pub fn with_config(config: MockConfig) -> Self {
        Self {
            requests: Arc::new(Mutex::new(Vec::new())),
            tx_data: None,
            config,
        }
    }

    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_config(MockConfig::failure(message))
    }

    /// Return a fixed payload instead of `signed:{key}`
    #[must_use]
    pub fn with_tx_data(mut self, tx_data: impl Into<String>) -> Self {
        self.tx_data = Some(tx_data.into());
        self
    }

    pub fn requests(&self) -> Vec<PreparationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Default for MockPreparer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TransactionPreparer for MockPreparer {
    async fn prepare(&self, request: &PreparationRequest) -> Result<String, AppError> {
        self.requests.lock().unwrap().push(request.clone());
        self.config
            .check(|message| AppError::Upstream(UpstreamError::from_response(400, &message)))?;
        Ok(self
            .tx_data
            .clone()
            .unwrap_or_else(|| format!("signed:{}", request.key)))
    }
}

/// A transaction persisted through [`MockKmsStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredKmsTransaction {
    pub id: String,
    pub tx_data: String,
    pub chain: Chain,
    pub signature_ids: Vec<String>,
    pub index: Option<u32>,
}

/// In-memory KMS store handing out `kms-1`, `kms-2`, ...
pub struct MockKmsStore {
    stored: Arc<Mutex<Vec<StoredKmsTransaction>>>,
    completed: Arc<Mutex<Vec<(String, String)>>>,
    config: MockConfig,
    fail_completion: AtomicBool,
    is_healthy: AtomicBool,
}

impl MockKmsStore {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(MockConfig::success())
    }

    #[must_use]
    pub fn with_config(config: MockConfig) -> Self {
        Self {
            stored: Arc::new(Mutex::new(Vec::new())),
            completed: Arc::new(Mutex::new(Vec::new())),
            config,
            fail_completion: AtomicBool::new(false),
            is_healthy: AtomicBool::new(true),
        }
    }

    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_config(MockConfig::failure(message))
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.is_healthy.store(healthy, Ordering::Relaxed);
    }

    /// Make `complete_kms_transaction` fail while storing keeps working
    pub fn set_fail_completion(&self, fail: bool) {
        self.fail_completion.store(fail, Ordering::Relaxed);
    }

    pub fn stored(&self) -> Vec<StoredKmsTransaction> {
        self.stored.lock().unwrap().clone()
    }

    pub fn completed(&self) -> Vec<(String, String)> {
        self.completed.lock().unwrap().clone()
    }

    fn check_should_fail(&self) -> Result<(), AppError> {
        self.config
            .check(|message| AppError::Database(DatabaseError::Query(message)))
    }
}

impl Default for MockKmsStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KmsStore for MockKmsStore {
    async fn health_check(&self) -> Result<(), AppError> {
        if !self.is_healthy.load(Ordering::Relaxed) {
            return Err(AppError::Database(DatabaseError::Connection(
                "Mock unhealthy".to_string(),
            )));
        }
        Ok(())
    }

    async fn store_kms_transaction(
        &self,
        tx_data: &str,
        chain: Chain,
        signature_ids: &[String],
        index: Option<u32>,
    ) -> Result<String, AppError> {
        self.check_should_fail()?;
        let mut stored = self.stored.lock().unwrap();
        let id = format!("kms-{}", stored.len() + 1);
        stored.push(StoredKmsTransaction {
            id: id.clone(),
            tx_data: tx_data.to_string(),
            chain,
            signature_ids: signature_ids.to_vec(),
            index,
        });
        Ok(id)
    }

    async fn complete_kms_transaction(&self, id: &str, tx_id: &str) -> Result<(), AppError> {
        self.check_should_fail()?;
        if self.fail_completion.load(Ordering::Relaxed) {
            return Err(AppError::Database(DatabaseError::NotFound(id.to_string())));
        }
        self.completed
            .lock()
            .unwrap()
            .push((id.to_string(), tx_id.to_string()));
        Ok(())
    }
}

/// Broadcaster recording `(chain, txData, signatureId)` triples
pub struct MockBroadcaster {
    calls: Arc<Mutex<Vec<(Chain, String, Option<String>)>>>,
    result: TransactionHash,
    config: MockConfig,
}

impl MockBroadcaster {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(MockConfig::success())
    }

    #[must_use]
    pub fn with_config(config: MockConfig) -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            result: TransactionHash::new("0xmock_tx_hash"),
            config,
        }
    }

    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_config(MockConfig::failure(message))
    }

    #[must_use]
    pub fn with_result(mut self, result: TransactionHash) -> Self {
        self.result = result;
        self
    }

    pub fn calls(&self) -> Vec<(Chain, String, Option<String>)> {
        self.calls.lock().unwrap().clone()
    }
}

impl Default for MockBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Broadcaster for MockBroadcaster {
    async fn broadcast(
        &self,
        chain: Chain,
        tx_data: &str,
        signature_id: Option<&str>,
    ) -> Result<TransactionHash, AppError> {
        self.calls.lock().unwrap().push((
            chain,
            tx_data.to_string(),
            signature_id.map(str::to_string),
        ));
        self.config
            .check(|message| AppError::Blockchain(BlockchainError::Connection(message)))?;
        Ok(self.result.clone())
    }
}

/// JSON-RPC provider with canned results per method.
///
/// `eth_call` results can be keyed by function selector so one provider can
/// serve several contract reads.
pub struct MockRpcProvider {
    responses: HashMap<String, Value>,
    errors: HashMap<String, String>,
    calls: Arc<Mutex<Vec<(String, Value)>>>,
}

impl MockRpcProvider {
    #[must_use]
    pub fn new() -> Self {
        Self {
            responses: HashMap::new(),
            errors: HashMap::new(),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    #[must_use]
    pub fn with_response(mut self, method: &str, result: Value) -> Self {
        self.responses.insert(method.to_string(), result);
        self
    }

    /// Result of an `eth_call` whose data starts with `selector`
    #[must_use]
    pub fn with_call(mut self, selector: [u8; 4], result: Value) -> Self {
        self.responses
            .insert(format!("eth_call:0x{}", alloy::hex::encode(selector)), result);
        self
    }

    #[must_use]
    pub fn with_error(mut self, method: &str, message: &str) -> Self {
        self.errors.insert(method.to_string(), message.to_string());
        self
    }

    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().unwrap().clone()
    }

    fn selector_key(method: &str, params: &Value) -> Option<String> {
        let data = params.get(0)?.get("data")?.as_str()?;
        Some(format!("{method}:{}", data.get(..10)?))
    }
}

impl Default for MockRpcProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EvmRpcProvider for MockRpcProvider {
    async fn send_request(&self, method: &str, params: Value) -> Result<Value, AppError> {
        self.calls
            .lock()
            .unwrap()
            .push((method.to_string(), params.clone()));

        if let Some(message) = self.errors.get(method) {
            return Err(AppError::Blockchain(BlockchainError::Rpc {
                code: -32000,
                message: message.clone(),
            }));
        }
        Self::selector_key(method, &params)
            .and_then(|key| self.responses.get(&key))
            .or_else(|| self.responses.get(method))
            .cloned()
            .ok_or_else(|| {
                AppError::Blockchain(BlockchainError::Rpc {
                    code: -32601,
                    message: format!("No mock response for {method}"),
                })
            })
    }
}

/// Connector handing out one shared [`MockRpcProvider`]
pub struct MockRpcConnector {
    provider: Arc<MockRpcProvider>,
    urls: Arc<Mutex<Vec<String>>>,
    config: MockConfig,
}

impl MockRpcConnector {
    #[must_use]
    pub fn new(provider: Arc<MockRpcProvider>) -> Self {
        Self {
            provider,
            urls: Arc::new(Mutex::new(Vec::new())),
            config: MockConfig::success(),
        }
    }

    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            provider: Arc::new(MockRpcProvider::new()),
            urls: Arc::new(Mutex::new(Vec::new())),
            config: MockConfig::failure(message),
        }
    }

    /// Node URLs connections were requested for
    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }
}

impl RpcConnector for MockRpcConnector {
    fn connect(&self, url: &str) -> Result<Arc<dyn EvmRpcProvider>, AppError> {
        self.urls.lock().unwrap().push(url.to_string());
        self.config
            .check(|message| AppError::Blockchain(BlockchainError::Connection(message)))?;
        Ok(self.provider.clone())
    }
}

/// A request seen by [`MockAlgoTransport`]
#[derive(Debug, Clone, PartialEq)]
pub struct TransportCall {
    pub method: &'static str,
    pub base_url: String,
    pub path: String,
    pub query: Option<String>,
    pub body: Option<Value>,
}

/// Algorand node transport scripted by path
pub struct MockAlgoTransport {
    responses: HashMap<String, Value>,
    errors: HashMap<String, UpstreamError>,
    calls: Arc<Mutex<Vec<TransportCall>>>,
}

impl MockAlgoTransport {
    #[must_use]
    pub fn new() -> Self {
        Self {
            responses: HashMap::new(),
            errors: HashMap::new(),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    #[must_use]
    pub fn with_response(mut self, path: &str, response: Value) -> Self {
        self.responses.insert(path.to_string(), response);
        self
    }

    /// Answer `path` as a node would with a non-success status
    #[must_use]
    pub fn with_error(mut self, path: &str, status: u16, body: &str) -> Self {
        self.errors
            .insert(path.to_string(), UpstreamError::from_response(status, body));
        self
    }

    pub fn calls(&self) -> Vec<TransportCall> {
        self.calls.lock().unwrap().clone()
    }

    fn respond(&self, call: TransportCall) -> Result<Value, AppError> {
        let path = call.path.clone();
        self.calls.lock().unwrap().push(call);
        if let Some(err) = self.errors.get(&path) {
            return Err(AppError::Upstream(err.clone()));
        }
        Ok(self.responses.get(&path).cloned().unwrap_or(Value::Null))
    }
}

impl Default for MockAlgoTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AlgoNodeTransport for MockAlgoTransport {
    async fn get(
        &self,
        base_url: &str,
        path: &str,
        query: Option<&str>,
    ) -> Result<Value, AppError> {
        self.respond(TransportCall {
            method: "GET",
            base_url: base_url.to_string(),
            path: path.to_string(),
            query: query.map(str::to_string),
            body: None,
        })
    }

    async fn post(&self, base_url: &str, path: &str, body: Value) -> Result<Value, AppError> {
        self.respond(TransportCall {
            method: "POST",
            base_url: base_url.to_string(),
            path: path.to_string(),
            query: None,
            body: Some(body),
        })
    }
}
