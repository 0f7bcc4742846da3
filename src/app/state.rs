//! Application state management.

use std::sync::Arc;

use tracing::warn;

use crate::domain::{HealthResponse, HealthStatus, KmsStore, NodeProvider};

use super::{AlgoService, MultiTokenService};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub multi_token: Arc<MultiTokenService>,
    pub algo: Arc<AlgoService>,
    pub kms: Arc<dyn KmsStore>,
    pub nodes: Arc<dyn NodeProvider>,
}

impl AppState {
    #[must_use]
    pub fn new(
        multi_token: Arc<MultiTokenService>,
        algo: Arc<AlgoService>,
        kms: Arc<dyn KmsStore>,
        nodes: Arc<dyn NodeProvider>,
    ) -> Self {
        Self {
            multi_token,
            algo,
            kms,
            nodes,
        }
    }

    /// Check the KMS store and node configuration
    pub async fn health_check(&self) -> HealthResponse {
        let (kms, nodes) = tokio::join!(self.kms.health_check(), self.nodes.health_check());

        let kms_store = match kms {
            Ok(()) => HealthStatus::Healthy,
            Err(e) => {
                warn!(error = %e, "KMS store health check failed");
                HealthStatus::Unhealthy
            }
        };
        let nodes = match nodes {
            Ok(()) => HealthStatus::Healthy,
            Err(e) => {
                warn!(error = %e, "Node configuration health check failed");
                HealthStatus::Unhealthy
            }
        };
        HealthResponse::new(kms_store, nodes)
    }
}
