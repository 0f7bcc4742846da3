//! Health endpoints and the OpenAPI document.

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode};
use utoipa::OpenApi;

use crate::app::AppState;
use crate::domain::algo::{
    AddressResponse, AlgoTransaction, AlgoWallet, BalanceResponse, BroadcastTx, PayTransactions,
};
use crate::domain::multitoken::{
    BurnMultiToken, BurnMultiTokenBatch, DeployMultiToken, MetadataResponse, MintMultiToken,
    MintMultiTokenBatch, RoyaltyResponse, TokensResponse, TransferMultiToken,
    TransferMultiTokenBatch, UpdateCashbackMultiToken,
};
use crate::domain::{
    DispatchResult, ErrorResponse, Fee, FieldViolation, HealthResponse, HealthStatus,
    RateLimitResponse, SignatureId, SigningOptions, TransactionHash,
};

use super::{algo, multitoken};

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Chain Connector API",
        version = "0.1.0",
        description = "Algorand node proxy and ERC-1155 multi-token operations on ETH, BSC and CELO",
        license(
            name = "MIT"
        )
    ),
    paths(
        multitoken::transfer_handler,
        multitoken::transfer_batch_handler,
        multitoken::mint_handler,
        multitoken::mint_batch_handler,
        multitoken::burn_handler,
        multitoken::burn_batch_handler,
        multitoken::deploy_handler,
        multitoken::update_cashback_handler,
        multitoken::metadata_handler,
        multitoken::royalty_handler,
        multitoken::tokens_of_owner_handler,
        multitoken::transaction_handler,
        algo::indexer_get_handler,
        algo::indexer_post_handler,
        algo::algod_get_handler,
        algo::algod_post_handler,
        algo::wallet_handler,
        algo::address_handler,
        algo::balance_handler,
        algo::send_transaction_handler,
        algo::broadcast_handler,
        algo::current_block_handler,
        algo::block_handler,
        algo::transaction_handler,
        algo::pay_transactions_handler,
        health_check_handler,
        liveness_handler,
        readiness_handler,
    ),
    components(
        schemas(
            TransferMultiToken,
            TransferMultiTokenBatch,
            MintMultiToken,
            MintMultiTokenBatch,
            BurnMultiToken,
            BurnMultiTokenBatch,
            DeployMultiToken,
            UpdateCashbackMultiToken,
            MetadataResponse,
            RoyaltyResponse,
            TokensResponse,
            AlgoTransaction,
            BroadcastTx,
            AlgoWallet,
            AddressResponse,
            BalanceResponse,
            PayTransactions,
            SigningOptions,
            Fee,
            DispatchResult,
            SignatureId,
            TransactionHash,
            HealthResponse,
            HealthStatus,
            ErrorResponse,
            FieldViolation,
            RateLimitResponse,
        )
    ),
    tags(
        (name = "multitoken", description = "ERC-1155 operations on ETH, BSC and CELO"),
        (name = "algorand", description = "Algorand node proxy, wallets and payments"),
        (name = "health", description = "Health check endpoints")
    )
)]
pub struct ApiDoc;

/// Detailed health check
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Health status", body = HealthResponse)
    )
)]
pub async fn health_check_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let health = state.health_check().await;
    Json(health)
}

/// Kubernetes liveness check
#[utoipa::path(
    get,
    path = "/health/live",
    tag = "health",
    responses(
        (status = 200, description = "Application is alive")
    )
)]
pub async fn liveness_handler() -> StatusCode {
    StatusCode::OK
}

/// Kubernetes readiness check
#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "health",
    responses(
        (status = 200, description = "Application is ready to serve traffic"),
        (status = 503, description = "Application is not ready")
    )
)]
pub async fn readiness_handler(State(state): State<Arc<AppState>>) -> StatusCode {
    let health = state.health_check().await;
    match health.status {
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    }
}
