//! Algorand endpoints: node proxy, wallets, payments and history.

use std::sync::Arc;

use axum::{
    Json,
    extract::{
        Path, Query, RawQuery, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
};
use serde_json::Value;

use crate::app::AppState;
use crate::domain::algo::{
    AddressResponse, AlgoTransaction, AlgoWallet, BalanceResponse, BroadcastTx,
    GeneratePrivateKey, NodePath, Pagination, PathAddress, PathFromTo, PathRoundNumber,
    PathTransactionId, PayTransactions, QueryMnemonic,
};
use crate::domain::error::codes;
use crate::domain::{AlgoNodeType, AppError, DispatchResult, ErrorResponse, TransactionHash};

use super::error::{ApiError, validate};

fn fail(err: AppError) -> ApiError {
    ApiError::from_app(err, codes::ALGO)
}

fn node_fail(err: AppError) -> ApiError {
    ApiError::from_app(err, codes::ALGO_NODE)
}

async fn proxy_get(
    state: &AppState,
    node_type: AlgoNodeType,
    path: Result<Path<NodePath>, PathRejection>,
    query: Option<String>,
) -> Result<Json<Value>, ApiError> {
    let Path(path) = path?;
    let response = state
        .algo
        .node_get(node_type, path.path.as_deref(), query.as_deref())
        .await
        .map_err(node_fail)?;
    Ok(Json(response))
}

async fn proxy_post(
    state: &AppState,
    node_type: AlgoNodeType,
    path: Result<Path<NodePath>, PathRejection>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Path(path) = path?;
    let Json(body) = body?;
    let response = state
        .algo
        .node_post(node_type, path.path.as_deref(), body)
        .await
        .map_err(node_fail)?;
    Ok(Json(response))
}

/// Forward a GET request to the Algorand indexer
#[utoipa::path(
    get,
    path = "/algorand/node/indexer/{xApiKey}/{path}",
    tag = "algorand",
    params(
        ("xApiKey" = String, Path, description = "Caller API key"),
        ("path" = String, Path, description = "Indexer path, e.g. v2/accounts")
    ),
    responses(
        (status = 200, description = "Indexer response", body = Object),
        (status = 403, description = "Node failure", body = ErrorResponse)
    )
)]
pub async fn indexer_get_handler(
    State(state): State<Arc<AppState>>,
    path: Result<Path<NodePath>, PathRejection>,
    RawQuery(query): RawQuery,
) -> Result<Json<Value>, ApiError> {
    proxy_get(&state, AlgoNodeType::Indexer, path, query).await
}

/// Forward a POST request to the Algorand indexer
#[utoipa::path(
    post,
    path = "/algorand/node/indexer/{xApiKey}/{path}",
    tag = "algorand",
    params(
        ("xApiKey" = String, Path, description = "Caller API key"),
        ("path" = String, Path, description = "Indexer path")
    ),
    request_body = Object,
    responses(
        (status = 200, description = "Indexer response", body = Object),
        (status = 400, description = "Malformed body", body = ErrorResponse),
        (status = 403, description = "Node failure", body = ErrorResponse)
    )
)]
pub async fn indexer_post_handler(
    State(state): State<Arc<AppState>>,
    path: Result<Path<NodePath>, PathRejection>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    proxy_post(&state, AlgoNodeType::Indexer, path, body).await
}

/// Forward a GET request to ALGOD
#[utoipa::path(
    get,
    path = "/algorand/node/algod/{xApiKey}/{path}",
    tag = "algorand",
    params(
        ("xApiKey" = String, Path, description = "Caller API key"),
        ("path" = String, Path, description = "ALGOD path, e.g. v2/status")
    ),
    responses(
        (status = 200, description = "ALGOD response", body = Object),
        (status = 403, description = "Node failure", body = ErrorResponse)
    )
)]
pub async fn algod_get_handler(
    State(state): State<Arc<AppState>>,
    path: Result<Path<NodePath>, PathRejection>,
    RawQuery(query): RawQuery,
) -> Result<Json<Value>, ApiError> {
    proxy_get(&state, AlgoNodeType::Algod, path, query).await
}

/// Forward a POST request to ALGOD
#[utoipa::path(
    post,
    path = "/algorand/node/algod/{xApiKey}/{path}",
    tag = "algorand",
    params(
        ("xApiKey" = String, Path, description = "Caller API key"),
        ("path" = String, Path, description = "ALGOD path")
    ),
    request_body = Object,
    responses(
        (status = 200, description = "ALGOD response", body = Object),
        (status = 400, description = "Malformed body", body = ErrorResponse),
        (status = 403, description = "Node failure", body = ErrorResponse)
    )
)]
pub async fn algod_post_handler(
    State(state): State<Arc<AppState>>,
    path: Result<Path<NodePath>, PathRejection>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    proxy_post(&state, AlgoNodeType::Algod, path, body).await
}

/// Generate an Algorand wallet
///
/// With a `mnemonic` the account is restored instead of generated.
#[utoipa::path(
    get,
    path = "/algorand/wallet",
    tag = "algorand",
    params(QueryMnemonic),
    responses(
        (status = 200, description = "Address and secret", body = AlgoWallet),
        (status = 400, description = "Invalid mnemonic", body = ErrorResponse)
    )
)]
pub async fn wallet_handler(
    State(state): State<Arc<AppState>>,
    query: Result<Query<QueryMnemonic>, QueryRejection>,
) -> Result<Json<AlgoWallet>, ApiError> {
    let Query(query) = query?;
    validate(&query)?;
    let wallet = state
        .algo
        .generate_wallet(query.mnemonic.as_deref())
        .map_err(fail)?;
    Ok(Json(wallet))
}

/// Address of a secret key
#[utoipa::path(
    get,
    path = "/algorand/address/{fromPrivateKey}",
    tag = "algorand",
    params(GeneratePrivateKey),
    responses(
        (status = 200, description = "Derived address", body = AddressResponse),
        (status = 400, description = "Invalid secret", body = ErrorResponse)
    )
)]
pub async fn address_handler(
    State(state): State<Arc<AppState>>,
    path: Result<Path<GeneratePrivateKey>, PathRejection>,
) -> Result<Json<AddressResponse>, ApiError> {
    let Path(path) = path?;
    validate(&path)?;
    let address = state
        .algo
        .generate_address(&path.from_private_key)
        .map_err(fail)?;
    Ok(Json(address))
}

/// Account balance in ALGO
#[utoipa::path(
    get,
    path = "/algorand/account/balance/{address}",
    tag = "algorand",
    params(PathAddress),
    responses(
        (status = 200, description = "Balance", body = BalanceResponse),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 403, description = "Node failure", body = ErrorResponse)
    )
)]
pub async fn balance_handler(
    State(state): State<Arc<AppState>>,
    path: Result<Path<PathAddress>, PathRejection>,
) -> Result<Json<BalanceResponse>, ApiError> {
    let Path(path) = path?;
    validate(&path)?;
    let balance = state.algo.get_balance(&path.address).await.map_err(fail)?;
    Ok(Json(balance))
}

/// Send ALGO
#[utoipa::path(
    post,
    path = "/algorand/transaction",
    tag = "algorand",
    request_body = AlgoTransaction,
    responses(
        (status = 200, description = "Broadcast hash or KMS signature id", body = DispatchResult),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 403, description = "Preparation or broadcast failure", body = ErrorResponse)
    )
)]
pub async fn send_transaction_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AlgoTransaction>, JsonRejection>,
) -> Result<Json<DispatchResult>, ApiError> {
    let Json(body) = payload?;
    validate(&body)?;
    let result = state.algo.send_transaction(&body).await.map_err(fail)?;
    Ok(Json(result))
}

/// Broadcast a signed Algorand transaction
#[utoipa::path(
    post,
    path = "/algorand/broadcast",
    tag = "algorand",
    request_body = BroadcastTx,
    responses(
        (status = 200, description = "Transaction id", body = TransactionHash),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 403, description = "Broadcast failure", body = ErrorResponse)
    )
)]
pub async fn broadcast_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<BroadcastTx>, JsonRejection>,
) -> Result<Json<TransactionHash>, ApiError> {
    let Json(body) = payload?;
    validate(&body)?;
    let result = state
        .algo
        .broadcast(&body.tx_data, body.signature_id.as_deref())
        .await
        .map_err(fail)?;
    Ok(Json(result))
}

/// Current round
#[utoipa::path(
    get,
    path = "/algorand/block/current",
    tag = "algorand",
    responses(
        (status = 200, description = "Latest round", body = u64),
        (status = 403, description = "Node failure", body = ErrorResponse)
    )
)]
pub async fn current_block_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<u64>, ApiError> {
    let round = state.algo.get_current_block().await.map_err(fail)?;
    Ok(Json(round))
}

/// Block by round
#[utoipa::path(
    get,
    path = "/algorand/block/{roundNumber}",
    tag = "algorand",
    params(PathRoundNumber),
    responses(
        (status = 200, description = "Block", body = Object),
        (status = 400, description = "Invalid round", body = ErrorResponse),
        (status = 403, description = "Node failure", body = ErrorResponse)
    )
)]
pub async fn block_handler(
    State(state): State<Arc<AppState>>,
    path: Result<Path<PathRoundNumber>, PathRejection>,
) -> Result<Json<Value>, ApiError> {
    let Path(path) = path?;
    let block = state
        .algo
        .get_block(path.round_number)
        .await
        .map_err(fail)?;
    Ok(Json(block))
}

/// Transaction by id
#[utoipa::path(
    get,
    path = "/algorand/transaction/{txid}",
    tag = "algorand",
    params(PathTransactionId),
    responses(
        (status = 200, description = "Transaction", body = Object),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 403, description = "Node failure", body = ErrorResponse)
    )
)]
pub async fn transaction_handler(
    State(state): State<Arc<AppState>>,
    path: Result<Path<PathTransactionId>, PathRejection>,
) -> Result<Json<Value>, ApiError> {
    let Path(path) = path?;
    validate(&path)?;
    let tx = state
        .algo
        .get_transaction(&path.txid)
        .await
        .map_err(fail)?;
    Ok(Json(tx))
}

/// Payment transactions in a time window
#[utoipa::path(
    get,
    path = "/algorand/transactions/{from}/{to}",
    tag = "algorand",
    params(PathFromTo, Pagination),
    responses(
        (status = 200, description = "One page of payments", body = PayTransactions),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 403, description = "Node failure", body = ErrorResponse)
    )
)]
pub async fn pay_transactions_handler(
    State(state): State<Arc<AppState>>,
    path: Result<Path<PathFromTo>, PathRejection>,
    query: Result<Query<Pagination>, QueryRejection>,
) -> Result<Json<PayTransactions>, ApiError> {
    let Path(path) = path?;
    let Query(page) = query?;
    validate(&path)?;
    validate(&page)?;
    let transactions = state
        .algo
        .get_pay_transactions(&path.from, &path.to, page.limit, page.next.as_deref())
        .await
        .map_err(fail)?;
    Ok(Json(transactions))
}
