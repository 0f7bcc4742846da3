//! Dispatch and read-path behavior of the multi-token service.

use std::sync::Arc;

use alloy::primitives::{Address, U256, keccak256};
use alloy::sol_types::SolValue;
use serde_json::{Value, json};

use chain_connector::app::{Dispatcher, MultiTokenService, PreparationTable};
use chain_connector::domain::error::codes;
use chain_connector::domain::multitoken::{BurnMultiTokenBatch, MintMultiToken, MintMultiTokenBatch};
use chain_connector::domain::{
    AppError, Chain, DispatchResult, OperationKind, PreparationKey, SignatureId, TransactionHash,
    Variant,
};
use chain_connector::test_utils::{
    MockBroadcaster, MockKmsStore, MockNodeProvider, MockPreparer, MockRpcConnector,
    MockRpcProvider,
};

const ADDR: &str = "0x687422eEA2cB73B5d3e242bA5456b782919AFc85";
const HASH: &str = "0xe6e7340394958674cdf8606936d292f565e4ecc476aaa8b258ec8a141f7c75d7";

struct Harness {
    preparer: Arc<MockPreparer>,
    kms: Arc<MockKmsStore>,
    broadcaster: Arc<MockBroadcaster>,
    nodes: Arc<MockNodeProvider>,
    connector: Arc<MockRpcConnector>,
    service: MultiTokenService,
}

fn harness_with(nodes: MockNodeProvider, rpc: MockRpcProvider) -> Harness {
    harness_with_connector(nodes, MockRpcConnector::new(Arc::new(rpc)))
}

fn harness_with_connector(nodes: MockNodeProvider, connector: MockRpcConnector) -> Harness {
    let preparer = Arc::new(MockPreparer::new());
    let kms = Arc::new(MockKmsStore::new());
    let broadcaster = Arc::new(
        MockBroadcaster::new().with_result(TransactionHash::new(HASH)),
    );
    let nodes = Arc::new(nodes);
    let connector = Arc::new(connector);

    let shared = preparer.clone();
    let dispatcher = Arc::new(Dispatcher::new(
        PreparationTable::connector(move |_| shared.clone()),
        nodes.clone(),
        kms.clone(),
        broadcaster.clone(),
    ));
    let service = MultiTokenService::new(dispatcher, nodes.clone(), connector.clone());

    Harness {
        preparer,
        kms,
        broadcaster,
        nodes,
        connector,
        service,
    }
}

fn harness() -> Harness {
    harness_with(MockNodeProvider::new(), MockRpcProvider::new())
}

fn mint(chain: &str, authors: bool) -> MintMultiToken {
    let mut body = json!({
        "chain": chain,
        "to": ADDR,
        "tokenId": "1",
        "amount": "10",
        "contractAddress": ADDR,
        "fromPrivateKey": "0xkey"
    });
    if authors {
        body["authorAddresses"] = json!([ADDR]);
        body["cashbackValues"] = json!(["0.5"]);
    }
    serde_json::from_value(body).unwrap()
}

fn mint_batch(chain: &str, authors: bool) -> MintMultiTokenBatch {
    let mut body = json!({
        "chain": chain,
        "to": [ADDR],
        "tokenId": [["1", "2"]],
        "amounts": [["10", "20"]],
        "contractAddress": ADDR,
        "fromPrivateKey": "0xkey"
    });
    if authors {
        body["authorAddresses"] = json!([[ADDR]]);
        body["cashbackValues"] = json!([["0.5"]]);
    }
    serde_json::from_value(body).unwrap()
}

fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

fn abi_hex<T: SolValue>(value: T) -> Value {
    json!(format!("0x{}", alloy::hex::encode(value.abi_encode())))
}

#[tokio::test]
async fn test_mint_variant_follows_author_addresses_on_every_chain() {
    for (currency, chain) in [("ETH", Chain::Eth), ("BSC", Chain::Bsc), ("CELO", Chain::Celo)] {
        let h = harness();

        h.service.mint(&mint(currency, true)).await.unwrap();
        h.service.mint(&mint(currency, false)).await.unwrap();
        h.service.mint_batch(&mint_batch(currency, true)).await.unwrap();
        h.service.mint_batch(&mint_batch(currency, false)).await.unwrap();

        let keys: Vec<PreparationKey> = h.preparer.requests().iter().map(|r| r.key).collect();
        assert_eq!(
            keys,
            vec![
                PreparationKey::new(chain, OperationKind::Mint, Variant::Cashback),
                PreparationKey::new(chain, OperationKind::Mint, Variant::Plain),
                PreparationKey::new(chain, OperationKind::MintBatch, Variant::Cashback),
                PreparationKey::new(chain, OperationKind::MintBatch, Variant::Plain),
            ]
        );
    }
}

#[tokio::test]
async fn test_unsupported_chain_fails_before_any_io() {
    let h = harness();

    let err = h.service.mint(&mint("MATIC", false)).await.unwrap_err();
    let AppError::Domain(domain) = err else {
        panic!("expected a domain error, got {err:?}");
    };
    assert_eq!(domain.message, "Unsupported chain MATIC.");
    assert_eq!(domain.code, codes::UNSUPPORTED_CHAIN);

    assert_eq!(h.nodes.lookups(), 0);
    assert!(h.preparer.requests().is_empty());
    assert!(h.kms.stored().is_empty());
    assert!(h.broadcaster.calls().is_empty());
}

#[tokio::test]
async fn test_algorand_is_not_a_multi_token_chain() {
    let h = harness();
    let err = h.service.mint(&mint("ALGO", false)).await.unwrap_err();
    assert!(matches!(err, AppError::Domain(ref d) if d.code == codes::UNSUPPORTED_CHAIN));
    assert!(h.preparer.requests().is_empty());
}

#[tokio::test]
async fn test_plain_eth_mint_is_broadcast_verbatim() {
    let h = harness();

    let result = h.service.mint(&mint("ETH", false)).await.unwrap();

    assert_eq!(result, DispatchResult::Broadcast(TransactionHash::new(HASH)));
    let requests = h.preparer.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].provider, "http://eth.mock");
    assert_eq!(requests[0].testnet, None);
    assert_eq!(
        h.broadcaster.calls(),
        vec![(Chain::Eth, "signed:eth/mint/plain".to_string(), None)]
    );
    assert!(h.kms.stored().is_empty());
}

#[tokio::test]
async fn test_celo_burn_batch_with_signature_id_is_stored_for_kms() {
    let h = harness_with(MockNodeProvider::new().with_testnet(true), MockRpcProvider::new());
    let body: BurnMultiTokenBatch = serde_json::from_value(json!({
        "chain": "CELO",
        "account": ADDR,
        "tokenId": ["1", "2"],
        "amounts": ["1", "1"],
        "contractAddress": ADDR,
        "signatureId": "sig-1",
        "index": 2
    }))
    .unwrap();

    let result = h.service.burn_batch(&body).await.unwrap();

    assert_eq!(
        result,
        DispatchResult::Signature(SignatureId {
            signature_id: "kms-1".to_string()
        })
    );
    let request = &h.preparer.requests()[0];
    assert_eq!(
        request.key,
        PreparationKey::new(Chain::Celo, OperationKind::BurnBatch, Variant::Plain)
    );
    assert_eq!(request.testnet, Some(true));
    assert_eq!(request.provider, "http://celo-testnet.mock");
    assert_eq!(request.body["signatureId"], "sig-1");

    let stored = h.kms.stored();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].chain, Chain::Celo);
    assert_eq!(stored[0].signature_ids, vec!["sig-1".to_string()]);
    assert_eq!(stored[0].index, Some(2));
    assert_eq!(stored[0].tx_data, "signed:celo/burn-batch/plain");
    assert!(h.broadcaster.calls().is_empty());
}

#[tokio::test]
async fn test_signature_id_result_serializes_as_signature_only() {
    let h = harness();
    let mut body = mint("BSC", false);
    body.signing.from_private_key = None;
    body.signing.signature_id = Some("26d3883e-4e17-48b3-a0ee-09a3e484ac83".to_string());

    let result = h.service.mint(&body).await.unwrap();
    assert_eq!(serde_json::to_value(&result).unwrap(), json!({"signatureId": "kms-1"}));
}

#[tokio::test]
async fn test_transaction_with_failing_receipt_keeps_hash() {
    let rpc = MockRpcProvider::new()
        .with_response(
            "eth_getTransactionByHash",
            json!({
                "hash": HASH,
                "from": ADDR,
                "nonce": "0x1",
                "r": "0x01",
                "s": "0x02",
                "v": "0x1b"
            }),
        )
        .with_error("eth_getTransactionReceipt", "receipt unavailable");
    let h = harness_with(MockNodeProvider::new(), rpc);

    let tx = h
        .service
        .get_transaction(&"ETH".parse().unwrap(), HASH)
        .await
        .unwrap();

    assert_eq!(
        tx,
        json!({
            "from": ADDR,
            "nonce": "0x1",
            "transactionHash": HASH
        })
    );
}

#[tokio::test]
async fn test_transaction_merges_receipt() {
    let rpc = MockRpcProvider::new()
        .with_response(
            "eth_getTransactionByHash",
            json!({"hash": HASH, "from": ADDR, "r": "0x01", "s": "0x02", "v": "0x1b"}),
        )
        .with_response(
            "eth_getTransactionReceipt",
            json!({"transactionHash": HASH, "status": "0x1", "gasUsed": "0x5208"}),
        );
    let h = harness_with(MockNodeProvider::new(), rpc);

    let tx = h
        .service
        .get_transaction(&"BSC".parse().unwrap(), HASH)
        .await
        .unwrap();

    assert_eq!(tx["status"], "0x1");
    assert_eq!(tx["transactionHash"], HASH);
    assert!(tx.get("r").is_none());
    assert!(tx.get("hash").is_none());
    assert_eq!(h.connector.urls(), vec!["http://bsc.mock".to_string()]);
}

#[tokio::test]
async fn test_pending_receipt_adds_nothing() {
    let rpc = MockRpcProvider::new()
        .with_response("eth_getTransactionByHash", json!({"hash": HASH, "from": ADDR}))
        .with_response("eth_getTransactionReceipt", Value::Null);
    let h = harness_with(MockNodeProvider::new(), rpc);

    let tx = h
        .service
        .get_transaction(&"CELO".parse().unwrap(), HASH)
        .await
        .unwrap();
    assert_eq!(tx, json!({"from": ADDR}));
}

#[tokio::test]
async fn test_missing_transaction_is_not_found() {
    let rpc = MockRpcProvider::new().with_response("eth_getTransactionByHash", Value::Null);
    let h = harness_with(MockNodeProvider::new(), rpc);

    let err = h
        .service
        .get_transaction(&"ETH".parse().unwrap(), HASH)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Domain(ref d) if d.code == codes::TX_NOT_FOUND));
}

#[tokio::test]
async fn test_transaction_lookup_connect_failure_is_not_found() {
    let h = harness_with_connector(MockNodeProvider::new(), MockRpcConnector::failing("node down"));

    let err = h
        .service
        .get_transaction(&"BSC".parse().unwrap(), HASH)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Domain(ref d) if d.code == codes::TX_NOT_FOUND));
}

#[tokio::test]
async fn test_transaction_lookup_without_nodes_is_not_found() {
    let nodes = MockNodeProvider::new().with_nodes(Chain::Celo, false, Vec::new());
    let h = harness_with(nodes, MockRpcProvider::new());

    let err = h
        .service
        .get_transaction(&"CELO".parse().unwrap(), HASH)
        .await
        .unwrap_err();
    let AppError::Domain(domain) = err else {
        panic!("expected a domain error, got {err:?}");
    };
    assert_eq!(domain.code, codes::TX_NOT_FOUND);
    assert_eq!(
        domain.message,
        "Transaction not found. Possible not exists or is still pending."
    );
    assert!(h.connector.urls().is_empty());
}

#[tokio::test]
async fn test_transaction_lookup_still_rejects_unsupported_chain() {
    let h = harness_with_connector(MockNodeProvider::new(), MockRpcConnector::failing("node down"));

    let err = h
        .service
        .get_transaction(&"ALGO".parse().unwrap(), HASH)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Domain(ref d) if d.code == codes::UNSUPPORTED_CHAIN));
    assert_eq!(h.nodes.lookups(), 0);
}

#[tokio::test]
async fn test_royalty_values_are_converted_from_wei() {
    let recipient: Address = ADDR.parse().unwrap();
    let rpc = MockRpcProvider::new()
        .with_call(
            selector("tokenCashbackRecipients(uint256)"),
            abi_hex(vec![recipient]),
        )
        .with_call(
            selector("tokenCashbackValues(uint256)"),
            abi_hex(vec![U256::from(500_000_000_000_000_000u64)]),
        );
    let h = harness_with(MockNodeProvider::new(), rpc);

    let royalty = h
        .service
        .get_royalty(&"ETH".parse().unwrap(), "1", ADDR)
        .await
        .unwrap();

    assert_eq!(royalty.addresses, vec![recipient.to_checksum(None)]);
    assert_eq!(royalty.values, vec!["0.5".to_string()]);
}

#[tokio::test]
async fn test_failed_token_read_is_domain_error() {
    let rpc = MockRpcProvider::new().with_error("eth_call", "execution reverted");
    let h = harness_with(MockNodeProvider::new(), rpc);

    let err = h
        .service
        .get_metadata(&"ETH".parse().unwrap(), "1", ADDR)
        .await
        .unwrap_err();
    let AppError::Domain(domain) = err else {
        panic!("expected a domain error, got {err:?}");
    };
    assert_eq!(domain.code, codes::NFT_FAILED);
    assert!(domain.message.starts_with("Unable to obtain information for token."));
}

#[tokio::test]
async fn test_read_path_rejects_unsupported_chain() {
    let h = harness();
    let err = h
        .service
        .get_tokens_of_owner(&"TRON".parse().unwrap(), ADDR, ADDR)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Domain(ref d) if d.code == codes::UNSUPPORTED_CHAIN));
    assert!(h.connector.urls().is_empty());
}
