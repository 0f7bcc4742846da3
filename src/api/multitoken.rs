//! ERC-1155 multi-token endpoints.

use std::sync::Arc;

use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
};
use serde_json::Value;

use crate::app::AppState;
use crate::domain::error::codes;
use crate::domain::multitoken::{
    BurnMultiToken, BurnMultiTokenBatch, DeployMultiToken, MetadataResponse, MintMultiToken,
    MintMultiTokenBatch, OwnerPath, RoyaltyResponse, TokenPath, TokensResponse,
    TransactionPath, TransferMultiToken, TransferMultiTokenBatch, UpdateCashbackMultiToken,
};
use crate::domain::{AppError, DispatchResult, ErrorResponse};

use super::error::{ApiError, validate};

fn fail(err: AppError) -> ApiError {
    ApiError::from_app(err, codes::MULTI_TOKEN)
}

/// Transfer a multi token
#[utoipa::path(
    post,
    path = "/multitoken/transaction",
    tag = "multitoken",
    request_body = TransferMultiToken,
    responses(
        (status = 200, description = "Broadcast hash or KMS signature id", body = DispatchResult),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 403, description = "Chain or SDK failure", body = ErrorResponse)
    )
)]
pub async fn transfer_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<TransferMultiToken>, JsonRejection>,
) -> Result<Json<DispatchResult>, ApiError> {
    let Json(body) = payload?;
    validate(&body)?;
    let result = state.multi_token.transfer(&body).await.map_err(fail)?;
    Ok(Json(result))
}

/// Transfer several multi tokens in one transaction
#[utoipa::path(
    post,
    path = "/multitoken/transaction/batch",
    tag = "multitoken",
    request_body = TransferMultiTokenBatch,
    responses(
        (status = 200, description = "Broadcast hash or KMS signature id", body = DispatchResult),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 403, description = "Chain or SDK failure", body = ErrorResponse)
    )
)]
pub async fn transfer_batch_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<TransferMultiTokenBatch>, JsonRejection>,
) -> Result<Json<DispatchResult>, ApiError> {
    let Json(body) = payload?;
    validate(&body)?;
    let result = state
        .multi_token
        .transfer_batch(&body)
        .await
        .map_err(fail)?;
    Ok(Json(result))
}

/// Mint a multi token
///
/// Supplying `authorAddresses` mints through the cashback contract call.
#[utoipa::path(
    post,
    path = "/multitoken/mint",
    tag = "multitoken",
    request_body = MintMultiToken,
    responses(
        (status = 200, description = "Broadcast hash or KMS signature id", body = DispatchResult),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 403, description = "Chain or SDK failure", body = ErrorResponse)
    )
)]
pub async fn mint_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<MintMultiToken>, JsonRejection>,
) -> Result<Json<DispatchResult>, ApiError> {
    let Json(body) = payload?;
    validate(&body)?;
    let result = state.multi_token.mint(&body).await.map_err(fail)?;
    Ok(Json(result))
}

/// Mint multi tokens for several recipients
#[utoipa::path(
    post,
    path = "/multitoken/mint/batch",
    tag = "multitoken",
    request_body = MintMultiTokenBatch,
    responses(
        (status = 200, description = "Broadcast hash or KMS signature id", body = DispatchResult),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 403, description = "Chain or SDK failure", body = ErrorResponse)
    )
)]
pub async fn mint_batch_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<MintMultiTokenBatch>, JsonRejection>,
) -> Result<Json<DispatchResult>, ApiError> {
    let Json(body) = payload?;
    validate(&body)?;
    let result = state.multi_token.mint_batch(&body).await.map_err(fail)?;
    Ok(Json(result))
}

/// Burn a multi token
#[utoipa::path(
    post,
    path = "/multitoken/burn",
    tag = "multitoken",
    request_body = BurnMultiToken,
    responses(
        (status = 200, description = "Broadcast hash or KMS signature id", body = DispatchResult),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 403, description = "Chain or SDK failure", body = ErrorResponse)
    )
)]
pub async fn burn_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<BurnMultiToken>, JsonRejection>,
) -> Result<Json<DispatchResult>, ApiError> {
    let Json(body) = payload?;
    validate(&body)?;
    let result = state.multi_token.burn(&body).await.map_err(fail)?;
    Ok(Json(result))
}

/// Burn several multi tokens
#[utoipa::path(
    post,
    path = "/multitoken/burn/batch",
    tag = "multitoken",
    request_body = BurnMultiTokenBatch,
    responses(
        (status = 200, description = "Broadcast hash or KMS signature id", body = DispatchResult),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 403, description = "Chain or SDK failure", body = ErrorResponse)
    )
)]
pub async fn burn_batch_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<BurnMultiTokenBatch>, JsonRejection>,
) -> Result<Json<DispatchResult>, ApiError> {
    let Json(body) = payload?;
    validate(&body)?;
    let result = state.multi_token.burn_batch(&body).await.map_err(fail)?;
    Ok(Json(result))
}

/// Deploy a multi token contract
#[utoipa::path(
    post,
    path = "/multitoken/deploy",
    tag = "multitoken",
    request_body = DeployMultiToken,
    responses(
        (status = 200, description = "Broadcast hash or KMS signature id", body = DispatchResult),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 403, description = "Chain or SDK failure", body = ErrorResponse)
    )
)]
pub async fn deploy_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<DeployMultiToken>, JsonRejection>,
) -> Result<Json<DispatchResult>, ApiError> {
    let Json(body) = payload?;
    validate(&body)?;
    let result = state.multi_token.deploy(&body).await.map_err(fail)?;
    Ok(Json(result))
}

/// Update the cashback value of the calling author
#[utoipa::path(
    put,
    path = "/multitoken/royalty",
    tag = "multitoken",
    request_body = UpdateCashbackMultiToken,
    responses(
        (status = 200, description = "Broadcast hash or KMS signature id", body = DispatchResult),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 403, description = "Chain or SDK failure", body = ErrorResponse)
    )
)]
pub async fn update_cashback_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<UpdateCashbackMultiToken>, JsonRejection>,
) -> Result<Json<DispatchResult>, ApiError> {
    let Json(body) = payload?;
    validate(&body)?;
    let result = state
        .multi_token
        .update_cashback(&body)
        .await
        .map_err(fail)?;
    Ok(Json(result))
}

/// Metadata URI of a token
#[utoipa::path(
    get,
    path = "/multitoken/metadata/{chain}/{contractAddress}/{tokenId}",
    tag = "multitoken",
    params(TokenPath),
    responses(
        (status = 200, description = "Token URI", body = MetadataResponse),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 403, description = "Token could not be read", body = ErrorResponse)
    )
)]
pub async fn metadata_handler(
    State(state): State<Arc<AppState>>,
    path: Result<Path<TokenPath>, PathRejection>,
) -> Result<Json<MetadataResponse>, ApiError> {
    let Path(path) = path?;
    validate(&path)?;
    let metadata = state
        .multi_token
        .get_metadata(&path.chain, &path.token_id, &path.contract_address)
        .await
        .map_err(fail)?;
    Ok(Json(metadata))
}

/// Cashback recipients and values of a token
#[utoipa::path(
    get,
    path = "/multitoken/royalty/{chain}/{contractAddress}/{tokenId}",
    tag = "multitoken",
    params(TokenPath),
    responses(
        (status = 200, description = "Royalty recipients and values", body = RoyaltyResponse),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 403, description = "Token could not be read", body = ErrorResponse)
    )
)]
pub async fn royalty_handler(
    State(state): State<Arc<AppState>>,
    path: Result<Path<TokenPath>, PathRejection>,
) -> Result<Json<RoyaltyResponse>, ApiError> {
    let Path(path) = path?;
    validate(&path)?;
    let royalty = state
        .multi_token
        .get_royalty(&path.chain, &path.token_id, &path.contract_address)
        .await
        .map_err(fail)?;
    Ok(Json(royalty))
}

/// Token ids held by an address
#[utoipa::path(
    get,
    path = "/multitoken/address/{chain}/{address}/{contractAddress}",
    tag = "multitoken",
    params(OwnerPath),
    responses(
        (status = 200, description = "Owned token ids", body = TokensResponse),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 403, description = "Token could not be read", body = ErrorResponse)
    )
)]
pub async fn tokens_of_owner_handler(
    State(state): State<Arc<AppState>>,
    path: Result<Path<OwnerPath>, PathRejection>,
) -> Result<Json<TokensResponse>, ApiError> {
    let Path(path) = path?;
    validate(&path)?;
    let tokens = state
        .multi_token
        .get_tokens_of_owner(&path.chain, &path.address, &path.contract_address)
        .await
        .map_err(fail)?;
    Ok(Json(tokens))
}

/// Transaction merged with its receipt
#[utoipa::path(
    get,
    path = "/multitoken/transaction/{chain}/{hash}",
    tag = "multitoken",
    params(TransactionPath),
    responses(
        (status = 200, description = "Transaction and receipt fields", body = Object),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 403, description = "Transaction not found", body = ErrorResponse)
    )
)]
pub async fn transaction_handler(
    State(state): State<Arc<AppState>>,
    path: Result<Path<TransactionPath>, PathRejection>,
) -> Result<Json<Value>, ApiError> {
    let Path(path) = path?;
    validate(&path)?;
    let tx = state
        .multi_token
        .get_transaction(&path.chain, &path.hash)
        .await
        .map_err(fail)?;
    Ok(Json(tx))
}
