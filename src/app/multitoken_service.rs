//! ERC-1155 multi-token operations on ETH, BSC and CELO.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::domain::multitoken::{
    BurnMultiToken, BurnMultiTokenBatch, DeployMultiToken, MetadataResponse, MintMultiToken,
    MintMultiTokenBatch, RoyaltyResponse, TokensResponse, TransferMultiToken,
    TransferMultiTokenBatch, UpdateCashbackMultiToken,
};
use crate::domain::{
    AppError, Chain, Currency, DispatchResult, DomainError, NodeProvider, OperationKind,
    RpcConnector,
};
use crate::infra::evm::{EvmRpcClient, MultiTokenContract};

use super::dispatch::{Dispatcher, MULTI_TOKEN_CHAINS};
use super::units::format_units;

/// Transaction fields that are never returned
const STRIPPED_FIELDS: [&str; 4] = ["r", "s", "v", "hash"];
const WEI_DECIMALS: usize = 18;

pub struct MultiTokenService {
    dispatcher: Arc<Dispatcher>,
    nodes: Arc<dyn NodeProvider>,
    rpc: Arc<dyn RpcConnector>,
}

impl MultiTokenService {
    #[must_use]
    pub fn new(
        dispatcher: Arc<Dispatcher>,
        nodes: Arc<dyn NodeProvider>,
        rpc: Arc<dyn RpcConnector>,
    ) -> Self {
        Self {
            dispatcher,
            nodes,
            rpc,
        }
    }

    pub async fn transfer(&self, body: &TransferMultiToken) -> Result<DispatchResult, AppError> {
        self.dispatcher.submit(OperationKind::Transfer, body).await
    }

    pub async fn transfer_batch(
        &self,
        body: &TransferMultiTokenBatch,
    ) -> Result<DispatchResult, AppError> {
        self.dispatcher
            .submit(OperationKind::TransferBatch, body)
            .await
    }

    /// Mints with the cashback contract call when `authorAddresses` is set
    pub async fn mint(&self, body: &MintMultiToken) -> Result<DispatchResult, AppError> {
        self.dispatcher.submit(OperationKind::Mint, body).await
    }

    pub async fn mint_batch(
        &self,
        body: &MintMultiTokenBatch,
    ) -> Result<DispatchResult, AppError> {
        self.dispatcher.submit(OperationKind::MintBatch, body).await
    }

    pub async fn burn(&self, body: &BurnMultiToken) -> Result<DispatchResult, AppError> {
        self.dispatcher.submit(OperationKind::Burn, body).await
    }

    pub async fn burn_batch(
        &self,
        body: &BurnMultiTokenBatch,
    ) -> Result<DispatchResult, AppError> {
        self.dispatcher.submit(OperationKind::BurnBatch, body).await
    }

    pub async fn deploy(&self, body: &DeployMultiToken) -> Result<DispatchResult, AppError> {
        self.dispatcher.submit(OperationKind::Deploy, body).await
    }

    pub async fn update_cashback(
        &self,
        body: &UpdateCashbackMultiToken,
    ) -> Result<DispatchResult, AppError> {
        self.dispatcher
            .submit(OperationKind::UpdateCashback, body)
            .await
    }

    fn multi_token_chain(currency: &Currency) -> Result<Chain, DomainError> {
        currency
            .chain()
            .filter(|chain| MULTI_TOKEN_CHAINS.contains(chain))
            .ok_or_else(|| DomainError::unsupported_chain(currency))
    }

    /// Client bound to the first node of a multi-token chain
    async fn client(&self, currency: &Currency) -> Result<EvmRpcClient, AppError> {
        let chain = Self::multi_token_chain(currency)?;
        self.connect(chain).await
    }

    async fn connect(&self, chain: Chain) -> Result<EvmRpcClient, AppError> {
        let testnet = self.nodes.is_testnet().await?;
        let url = self.nodes.first_node_url(chain, testnet).await?;
        Ok(EvmRpcClient::new(self.rpc.connect(&url)?))
    }

    async fn contract(
        &self,
        currency: &Currency,
        contract_address: &str,
    ) -> Result<MultiTokenContract, AppError> {
        let client = self.client(currency).await?;
        MultiTokenContract::new(client, contract_address)
            .map_err(|e| DomainError::token_read_failed(e).into())
    }

    #[instrument(skip(self))]
    pub async fn get_metadata(
        &self,
        chain: &Currency,
        token_id: &str,
        contract_address: &str,
    ) -> Result<MetadataResponse, AppError> {
        let contract = self.contract(chain, contract_address).await?;
        let data = contract
            .token_uri(token_id)
            .await
            .map_err(DomainError::token_read_failed)?;
        Ok(MetadataResponse { data })
    }

    /// Royalty recipients and values; values are converted from wei
    #[instrument(skip(self))]
    pub async fn get_royalty(
        &self,
        chain: &Currency,
        token_id: &str,
        contract_address: &str,
    ) -> Result<RoyaltyResponse, AppError> {
        let contract = self.contract(chain, contract_address).await?;
        let (addresses, values) = tokio::try_join!(
            contract.cashback_recipients(token_id),
            contract.cashback_values(token_id)
        )
        .map_err(DomainError::token_read_failed)?;

        Ok(RoyaltyResponse {
            addresses,
            values: values
                .iter()
                .map(|value| format_units(&value.to_string(), WEI_DECIMALS))
                .collect(),
        })
    }

    #[instrument(skip(self))]
    pub async fn get_tokens_of_owner(
        &self,
        chain: &Currency,
        address: &str,
        contract_address: &str,
    ) -> Result<TokensResponse, AppError> {
        let contract = self.contract(chain, contract_address).await?;
        let data = contract
            .tokens_of_owner(address)
            .await
            .map_err(DomainError::token_read_failed)?;
        Ok(TokensResponse { data })
    }

    /// Transaction merged with its receipt.
    ///
    /// A failing receipt lookup is not fatal: the transaction is returned
    /// with an explicit `transactionHash` and no receipt fields.
    #[instrument(skip(self))]
    pub async fn get_transaction(&self, chain: &Currency, hash: &str) -> Result<Value, AppError> {
        let chain = Self::multi_token_chain(chain)?;
        let client = self.connect(chain).await.map_err(|e| {
            debug!(error = %e, "Node unavailable for transaction lookup");
            DomainError::transaction_not_found()
        })?;
        let tx = client.get_transaction_by_hash(hash).await.map_err(|e| {
            debug!(error = %e, "Transaction lookup failed");
            DomainError::transaction_not_found()
        })?;
        let Value::Object(mut tx) = tx else {
            return Err(DomainError::transaction_not_found().into());
        };

        let tx_hash = tx
            .get("hash")
            .and_then(Value::as_str)
            .unwrap_or(hash)
            .to_string();
        for field in STRIPPED_FIELDS {
            tx.remove(field);
        }

        match client.get_transaction_receipt(&tx_hash).await {
            Ok(Some(Value::Object(receipt))) => tx.extend(receipt),
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "Receipt lookup failed");
                tx.insert("transactionHash".to_string(), Value::String(tx_hash));
            }
        }
        Ok(Value::Object(tx))
    }
}
