//! Broadcasting of signed transactions to chain nodes.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info, instrument};

use crate::domain::{
    AppError, Broadcaster, Chain, KmsStore, NodeProvider, RpcConnector, TransactionHash,
    ValidationError,
};

use super::algo::AlgoNodeClient;
use super::evm::EvmRpcClient;

/// Sends raw transactions to the first configured node of each chain
pub struct NodeBroadcaster {
    nodes: Arc<dyn NodeProvider>,
    rpc: Arc<dyn RpcConnector>,
    algod: AlgoNodeClient,
    kms: Arc<dyn KmsStore>,
}

impl NodeBroadcaster {
    #[must_use]
    pub fn new(
        nodes: Arc<dyn NodeProvider>,
        rpc: Arc<dyn RpcConnector>,
        algod: AlgoNodeClient,
        kms: Arc<dyn KmsStore>,
    ) -> Self {
        Self {
            nodes,
            rpc,
            algod,
            kms,
        }
    }

    async fn send(&self, chain: Chain, url: &str, tx_data: &str) -> Result<String, AppError> {
        if chain.is_evm() {
            let client = EvmRpcClient::new(self.rpc.connect(url)?);
            return client.send_raw_transaction(tx_data).await;
        }

        let bytes = alloy::hex::decode(tx_data).map_err(|e| {
            AppError::Validation(ValidationError::InvalidField {
                field: "txData".to_string(),
                message: format!("Transaction data must be hex: {e}"),
            })
        })?;
        let response = self.algod.post_raw(url, "/v2/transactions", bytes).await?;
        response
            .get("txId")
            .and_then(|id| id.as_str())
            .map(str::to_string)
            .ok_or_else(|| AppError::Internal(format!("ALGOD returned no txId: {response}")))
    }
}

#[async_trait]
impl Broadcaster for NodeBroadcaster {
    #[instrument(skip(self, tx_data), fields(chain = %chain))]
    async fn broadcast(
        &self,
        chain: Chain,
        tx_data: &str,
        signature_id: Option<&str>,
    ) -> Result<TransactionHash, AppError> {
        let testnet = self.nodes.is_testnet().await?;
        let url = self.nodes.first_node_url(chain, testnet).await?;
        let tx_id = self.send(chain, &url, tx_data).await?;
        info!(tx_id = %tx_id, "Broadcast accepted");

        let mut result = TransactionHash::new(tx_id);
        if let Some(signature_id) = signature_id {
            // The transaction is already on chain; only the bookkeeping failed.
            if let Err(e) = self
                .kms
                .complete_kms_transaction(signature_id, &result.tx_id)
                .await
            {
                error!(error = %e, signature_id, "Failed to complete KMS transaction");
                result.failed = Some(true);
            }
        }
        Ok(result)
    }
}
