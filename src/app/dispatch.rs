//! Chain dispatch: preparation table lookup, node resolution and the
//! KMS-or-broadcast decision shared by every mutating operation.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::domain::{
    AppError, Broadcaster, Chain, Currency, DispatchResult, DomainError, KmsStore, NodeProvider,
    OperationKind, PreparationKey, PreparationRequest, SignableRequest, TransactionPreparer,
    Variant,
};

/// Chains carrying the ERC-1155 operations
pub const MULTI_TOKEN_CHAINS: [Chain; 3] = [Chain::Eth, Chain::Bsc, Chain::Celo];

/// Lookup table `(chain, operation, variant) -> preparer`
#[derive(Default, Clone)]
pub struct PreparationTable {
    entries: HashMap<PreparationKey, Arc<dyn TransactionPreparer>>,
}

impl PreparationTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every operation the connector serves, asking `factory` for
    /// the preparer of each key.
    pub fn connector<F>(factory: F) -> Self
    where
        F: Fn(PreparationKey) -> Arc<dyn TransactionPreparer>,
    {
        let mut table = Self::new();
        for chain in MULTI_TOKEN_CHAINS {
            for operation in OperationKind::MULTI_TOKEN {
                let key = PreparationKey::new(chain, operation, Variant::Plain);
                table.register(key, factory(key));
                if operation.has_cashback_variant() {
                    let key = PreparationKey::new(chain, operation, Variant::Cashback);
                    table.register(key, factory(key));
                }
            }
        }
        let key = PreparationKey::new(Chain::Algo, OperationKind::NativeTransfer, Variant::Plain);
        table.register(key, factory(key));
        table
    }

    pub fn register(&mut self, key: PreparationKey, preparer: Arc<dyn TransactionPreparer>) {
        self.entries.insert(key, preparer);
    }

    #[must_use]
    pub fn contains(&self, key: &PreparationKey) -> bool {
        self.entries.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Find the preparer for a request. A miss means the chain does not
    /// serve this operation.
    pub fn resolve(
        &self,
        currency: &Currency,
        operation: OperationKind,
        variant: Variant,
    ) -> Result<(PreparationKey, Arc<dyn TransactionPreparer>), DomainError> {
        let key = currency
            .chain()
            .map(|chain| PreparationKey::new(chain, operation, variant))
            .ok_or_else(|| DomainError::unsupported_chain(currency))?;
        self.entries
            .get(&key)
            .map(|preparer| (key, Arc::clone(preparer)))
            .ok_or_else(|| DomainError::unsupported_chain(currency))
    }
}

/// Runs the submission workflow of a mutating request
pub struct Dispatcher {
    table: PreparationTable,
    nodes: Arc<dyn NodeProvider>,
    kms: Arc<dyn KmsStore>,
    broadcaster: Arc<dyn Broadcaster>,
}

impl Dispatcher {
    #[must_use]
    pub fn new(
        table: PreparationTable,
        nodes: Arc<dyn NodeProvider>,
        kms: Arc<dyn KmsStore>,
        broadcaster: Arc<dyn Broadcaster>,
    ) -> Self {
        Self {
            table,
            nodes,
            kms,
            broadcaster,
        }
    }

    /// Prepare the transaction, then store it for KMS signing when the
    /// request names a `signatureId`, otherwise broadcast it.
    #[instrument(skip(self, request), fields(chain = %request.chain(), operation = %operation))]
    pub async fn submit<R: SignableRequest>(
        &self,
        operation: OperationKind,
        request: &R,
    ) -> Result<DispatchResult, AppError> {
        let testnet = self.nodes.is_testnet().await?;
        let (key, preparer) = self
            .table
            .resolve(request.chain(), operation, request.variant())?;
        let chain = key.chain;

        let provider = self.nodes.first_node_url(chain, testnet).await?;
        debug!(%key, %provider, "Preparing transaction");

        let preparation = PreparationRequest {
            key,
            body: serde_json::to_value(request)?,
            provider,
            testnet: chain.requires_testnet_flag().then_some(testnet),
        };
        let tx_data = preparer.prepare(&preparation).await?;

        match request.signature_id() {
            Some(signature_id) => {
                let stored = self
                    .kms
                    .store_kms_transaction(
                        &tx_data,
                        chain,
                        &[signature_id.to_string()],
                        request.index(),
                    )
                    .await?;
                info!(%key, kms_id = %stored, "Transaction stored for KMS signing");
                Ok(DispatchResult::signature(stored))
            }
            None => {
                let hash = self.broadcaster.broadcast(chain, &tx_data, None).await?;
                info!(%key, tx_id = %hash.tx_id, "Transaction broadcast");
                Ok(DispatchResult::Broadcast(hash))
            }
        }
    }
}
