//! Algorand node proxy, wallet helpers and payment submission.

use std::sync::Arc;

use secrecy::SecretString;
use serde_json::Value;
use tracing::{info, instrument};

use crate::domain::algo::{AddressResponse, AlgoTransaction, AlgoWallet, BalanceResponse, PayTransactions};
use crate::domain::{
    AlgoNodeTransport, AlgoNodeType, AppError, BlockchainError, Broadcaster, Chain, ConfigError,
    DispatchResult, NodeProvider, OperationKind, TransactionHash,
};
use crate::infra::algo::wallet;

use super::dispatch::Dispatcher;
use super::units::format_units;

const MICROALGO_DECIMALS: usize = 6;

fn missing_field(field: &str, response: &Value) -> AppError {
    AppError::Blockchain(BlockchainError::InvalidResponse(format!(
        "missing '{field}' in {response}"
    )))
}

pub struct AlgoService {
    dispatcher: Arc<Dispatcher>,
    nodes: Arc<dyn NodeProvider>,
    transport: Arc<dyn AlgoNodeTransport>,
    broadcaster: Arc<dyn Broadcaster>,
}

impl AlgoService {
    #[must_use]
    pub fn new(
        dispatcher: Arc<Dispatcher>,
        nodes: Arc<dyn NodeProvider>,
        transport: Arc<dyn AlgoNodeTransport>,
        broadcaster: Arc<dyn Broadcaster>,
    ) -> Self {
        Self {
            dispatcher,
            nodes,
            transport,
            broadcaster,
        }
    }

    async fn node_url(&self, node_type: AlgoNodeType) -> Result<String, AppError> {
        let testnet = self.nodes.is_testnet().await?;
        self.nodes
            .get_algo_nodes_url(node_type, testnet)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ConfigError::NoNodeUrl(node_type.to_string()).into())
    }

    /// Forward a GET to the node; `path` is whatever followed the API key
    #[instrument(skip(self))]
    pub async fn node_get(
        &self,
        node_type: AlgoNodeType,
        path: Option<&str>,
        query: Option<&str>,
    ) -> Result<Value, AppError> {
        let base = self.node_url(node_type).await?;
        let path = path.map(|p| format!("/{}", p.trim_start_matches('/'))).unwrap_or_default();
        self.transport.get(&base, &path, query).await
    }

    /// Forward a POST body to the node
    #[instrument(skip(self, body))]
    pub async fn node_post(
        &self,
        node_type: AlgoNodeType,
        path: Option<&str>,
        body: Value,
    ) -> Result<Value, AppError> {
        let base = self.node_url(node_type).await?;
        let path = path.map(|p| format!("/{}", p.trim_start_matches('/'))).unwrap_or_default();
        self.transport.post(&base, &path, body).await
    }

    /// Derive from a mnemonic, or generate a fresh account
    pub fn generate_wallet(&self, mnemonic: Option<&str>) -> Result<AlgoWallet, AppError> {
        Ok(wallet::generate_wallet(mnemonic)?)
    }

    pub fn generate_address(&self, from_private_key: &str) -> Result<AddressResponse, AppError> {
        let secret = SecretString::from(from_private_key.to_string());
        let address = wallet::address_from_secret(&secret)?;
        Ok(AddressResponse { address })
    }

    /// Balance in ALGO
    #[instrument(skip(self))]
    pub async fn get_balance(&self, address: &str) -> Result<BalanceResponse, AppError> {
        let base = self.node_url(AlgoNodeType::Algod).await?;
        let account = self
            .transport
            .get(&base, &format!("/v2/accounts/{address}"), None)
            .await?;
        let micro = account
            .get("amount")
            .and_then(Value::as_u64)
            .ok_or_else(|| missing_field("amount", &account))?;
        Ok(BalanceResponse {
            balance: format_units(&micro.to_string(), MICROALGO_DECIMALS),
        })
    }

    pub async fn send_transaction(&self, tx: &AlgoTransaction) -> Result<DispatchResult, AppError> {
        self.dispatcher
            .submit(OperationKind::NativeTransfer, tx)
            .await
    }

    #[instrument(skip(self, tx_data))]
    pub async fn broadcast(
        &self,
        tx_data: &str,
        signature_id: Option<&str>,
    ) -> Result<TransactionHash, AppError> {
        let result = self
            .broadcaster
            .broadcast(Chain::Algo, tx_data, signature_id)
            .await?;
        info!(tx_id = %result.tx_id, "Algorand transaction broadcast");
        Ok(result)
    }

    /// Latest round known to ALGOD
    pub async fn get_current_block(&self) -> Result<u64, AppError> {
        let base = self.node_url(AlgoNodeType::Algod).await?;
        let status = self.transport.get(&base, "/v2/status", None).await?;
        status
            .get("last-round")
            .and_then(Value::as_u64)
            .ok_or_else(|| missing_field("last-round", &status))
    }

    pub async fn get_block(&self, round: u64) -> Result<Value, AppError> {
        let base = self.node_url(AlgoNodeType::Indexer).await?;
        self.transport
            .get(&base, &format!("/v2/blocks/{round}"), None)
            .await
    }

    pub async fn get_transaction(&self, txid: &str) -> Result<Value, AppError> {
        let base = self.node_url(AlgoNodeType::Indexer).await?;
        let mut response = self
            .transport
            .get(&base, &format!("/v2/transactions/{txid}"), None)
            .await?;
        response
            .get_mut("transaction")
            .map(Value::take)
            .ok_or_else(|| missing_field("transaction", &response))
    }

    /// Payment transactions in a time window, one indexer page at a time
    #[instrument(skip(self))]
    pub async fn get_pay_transactions(
        &self,
        from: &str,
        to: &str,
        limit: Option<u32>,
        next: Option<&str>,
    ) -> Result<PayTransactions, AppError> {
        let base = self.node_url(AlgoNodeType::Indexer).await?;
        let mut query = format!(
            "tx-type=pay&after-time={}&before-time={}",
            urlencoding::encode(from),
            urlencoding::encode(to)
        );
        if let Some(limit) = limit {
            query.push_str(&format!("&limit={limit}"));
        }
        if let Some(next) = next {
            query.push_str(&format!("&next={}", urlencoding::encode(next)));
        }

        let mut page = self
            .transport
            .get(&base, "/v2/transactions", Some(&query))
            .await?;
        let next_token = page
            .get("next-token")
            .and_then(Value::as_str)
            .map(str::to_string);
        let transactions = match page.get_mut("transactions").map(Value::take) {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        };
        Ok(PayTransactions {
            next_token,
            transactions,
        })
    }
}
