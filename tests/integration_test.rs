//! Integration tests for the API.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use chain_connector::api::create_router;
use chain_connector::app::{AlgoService, AppState, Dispatcher, MultiTokenService, PreparationTable};
use chain_connector::domain::{HealthResponse, HealthStatus, TransactionHash};
use chain_connector::test_utils::{
    MockAlgoTransport, MockBroadcaster, MockKmsStore, MockNodeProvider, MockPreparer,
    MockRpcConnector, MockRpcProvider,
};

const ADDR: &str = "0x687422eEA2cB73B5d3e242bA5456b782919AFc85";
const HASH: &str = "0xe6e7340394958674cdf8606936d292f565e4ecc476aaa8b258ec8a141f7c75d7";

struct TestApp {
    kms: Arc<MockKmsStore>,
    broadcaster: Arc<MockBroadcaster>,
    state: Arc<AppState>,
}

fn create_test_app(preparer: MockPreparer, kms: MockKmsStore, rpc: MockRpcProvider) -> TestApp {
    let preparer = Arc::new(preparer);
    let kms = Arc::new(kms);
    let broadcaster = Arc::new(MockBroadcaster::new().with_result(TransactionHash::new(HASH)));
    let nodes = Arc::new(MockNodeProvider::new());

    let dispatcher = Arc::new(Dispatcher::new(
        PreparationTable::connector(move |_| preparer.clone()),
        nodes.clone(),
        kms.clone(),
        broadcaster.clone(),
    ));
    let multi_token = Arc::new(MultiTokenService::new(
        dispatcher.clone(),
        nodes.clone(),
        Arc::new(MockRpcConnector::new(Arc::new(rpc))),
    ));
    let algo = Arc::new(AlgoService::new(
        dispatcher,
        nodes.clone(),
        Arc::new(MockAlgoTransport::new()),
        broadcaster.clone(),
    ));

    TestApp {
        kms: kms.clone(),
        broadcaster,
        state: Arc::new(AppState::new(multi_token, algo, kms, nodes)),
    }
}

fn create_default_app() -> TestApp {
    create_test_app(MockPreparer::new(), MockKmsStore::new(), MockRpcProvider::new())
}

async fn send(app: &TestApp, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let router = create_router(app.state.clone());
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json");
    let request = match body {
        Some(body) => builder.body(Body::from(body.to_string())).unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn mint_body(chain: &str) -> Value {
    json!({
        "chain": chain,
        "to": ADDR,
        "tokenId": "1",
        "amount": "10",
        "contractAddress": ADDR,
        "fromPrivateKey": "0x37b091fc4ce46a56da643f021254612551dbe0944679a6e09cb5724d3085c9ab"
    })
}

#[tokio::test]
async fn test_mint_broadcasts_and_returns_hash() {
    let app = create_default_app();

    let (status, body) = send(&app, "POST", "/multitoken/mint", Some(mint_body("ETH"))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "txId": HASH }));
    assert_eq!(app.broadcaster.calls().len(), 1);
}

#[tokio::test]
async fn test_burn_batch_with_signature_id_returns_kms_reference() {
    let app = create_default_app();
    let payload = json!({
        "chain": "CELO",
        "account": ADDR,
        "tokenId": ["1"],
        "amounts": ["1"],
        "contractAddress": ADDR,
        "signatureId": "sig-1",
        "index": 2
    });

    let (status, body) = send(&app, "POST", "/multitoken/burn/batch", Some(payload)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "signatureId": "kms-1" }));
    assert!(app.broadcaster.calls().is_empty());
    assert_eq!(app.kms.stored()[0].index, Some(2));
}

#[tokio::test]
async fn test_unsupported_chain_is_forbidden() {
    let app = create_default_app();

    let (status, body) = send(&app, "POST", "/multitoken/transaction", Some(json!({
        "chain": "MATIC",
        "to": ADDR,
        "tokenId": "1",
        "amount": "1",
        "contractAddress": ADDR,
        "fromPrivateKey": "0xkey"
    })))
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(
        body,
        json!({ "message": "Unsupported chain MATIC.", "code": "unsuported.chain" })
    );
}

#[tokio::test]
async fn test_invalid_field_is_bad_request() {
    let app = create_default_app();
    let mut payload = mint_body("ETH");
    payload["contractAddress"] = json!("0x123");

    let (status, body) = send(&app, "POST", "/multitoken/mint", Some(payload)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation.failed");
    let fields: Vec<&str> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert!(fields.contains(&"contractAddress"));
    assert!(app.broadcaster.calls().is_empty());
}

#[tokio::test]
async fn test_both_signers_is_bad_request() {
    let app = create_default_app();
    let mut payload = mint_body("BSC");
    payload["signatureId"] = json!("sig-1");

    let (status, body) = send(&app, "POST", "/multitoken/mint", Some(payload)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation.failed");
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = create_default_app();
    let router = create_router(app.state.clone());

    let request = Request::builder()
        .method("POST")
        .uri("/multitoken/deploy")
        .header("Content-Type", "application/json")
        .body(Body::from("{\"chain\": "))
        .unwrap();
    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_preparation_failure_is_wrapped_as_unexpected() {
    let app = create_test_app(
        MockPreparer::failing("insufficient funds for gas"),
        MockKmsStore::new(),
        MockRpcProvider::new(),
    );

    let (status, body) = send(&app, "POST", "/multitoken/mint", Some(mint_body("ETH"))).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(
        body,
        json!({
            "message": "Unexpected error occurred. Reason: insufficient funds for gas",
            "code": "multitoken.error"
        })
    );
    assert!(app.broadcaster.calls().is_empty());
}

#[tokio::test]
async fn test_update_cashback_uses_put() {
    let app = create_default_app();
    let payload = json!({
        "chain": "ETH",
        "tokenId": "1",
        "cashbackValue": "0.5",
        "contractAddress": ADDR,
        "fromPrivateKey": "0xkey"
    });

    let (status, body) = send(&app, "PUT", "/multitoken/royalty", Some(payload)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["txId"], HASH);
}

#[tokio::test]
async fn test_unknown_transaction_is_not_found() {
    let app = create_test_app(
        MockPreparer::new(),
        MockKmsStore::new(),
        MockRpcProvider::new().with_response("eth_getTransactionByHash", Value::Null),
    );

    let (status, body) = send(&app, "GET", &format!("/multitoken/transaction/ETH/{HASH}"), None).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "tx.not.found");
}

#[tokio::test]
async fn test_short_transaction_hash_is_bad_request() {
    let app = create_default_app();
    let (status, _) = send(&app, "GET", "/multitoken/transaction/ETH/0x1234", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_metadata_read() {
    let encoded = alloy::sol_types::SolValue::abi_encode(&"ipfs://token/1".to_string());
    let app = create_test_app(
        MockPreparer::new(),
        MockKmsStore::new(),
        MockRpcProvider::new().with_response(
            "eth_call",
            json!(format!("0x{}", alloy::hex::encode(encoded))),
        ),
    );

    let (status, body) = send(&app, "GET", &format!("/multitoken/metadata/ETH/{ADDR}/1"), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "data": "ipfs://token/1" }));
}

#[tokio::test]
async fn test_health_check() {
    let app = create_default_app();

    let (status, body) = send(&app, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    let health: HealthResponse = serde_json::from_value(body).unwrap();
    assert_eq!(health.status, HealthStatus::Healthy);
}

#[tokio::test]
async fn test_health_degraded_without_kms_store() {
    let app = create_default_app();
    app.kms.set_healthy(false);

    let (_, body) = send(&app, "GET", "/health", None).await;
    let health: HealthResponse = serde_json::from_value(body).unwrap();
    assert_eq!(health.status, HealthStatus::Degraded);
    assert_eq!(health.kms_store, HealthStatus::Unhealthy);

    let (status, _) = send(&app, "GET", "/health/ready", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_liveness() {
    let app = create_default_app();
    let (status, _) = send(&app, "GET", "/health/live", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let app = create_default_app();

    let (status, body) = send(&app, "GET", "/api-docs/openapi.json", None).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"].get("/multitoken/mint").is_some());
    assert!(body["paths"].get("/algorand/broadcast").is_some());
}
