mod common;

use serde_json::{json, Value};
use std::time::Duration;
use wiremock::matchers::{body_partial_json, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{request_body, tx_hash, EchoError, EchoResult, ADDRESS};
use evm_rpc_client::error::{ClientError, ProtocolError, RpcError, ValidationError};
use evm_rpc_client::models::{BlockTag, BlockTransactions};
use evm_rpc_client::RpcClient;

async fn mount_method(server: &MockServer, rpc_method: &str, result: Value) {
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "method": rpc_method })))
        .respond_with(EchoResult(result))
        .mount(server)
        .await;
}

fn receipt_json() -> Value {
    json!({
        "transactionHash": tx_hash(),
        "blockHash": format!("0x{}", "cd".repeat(32)),
        "blockNumber": "0x3039",
        "from": "0x6671f7552df0fbaf762bd40aed1ca3ec670d6161",
        "to": "0x000000000000000000000000000000000000dead",
        "gasUsed": "0x5208",
        "status": "0x1",
        "logs": []
    })
}

#[tokio::test]
async fn test_quantity_helpers() {
    let server = MockServer::start().await;
    mount_method(&server, "eth_blockNumber", json!("0x10")).await;
    mount_method(&server, "eth_chainId", json!("0x1")).await;
    mount_method(&server, "eth_gasPrice", json!("0x3b9aca00")).await;

    let client = RpcClient::new(server.uri()).unwrap();
    assert_eq!(client.block_number().await.unwrap(), 16);
    assert_eq!(client.chain_id().await.unwrap(), 1);
    assert_eq!(client.gas_price().await.unwrap(), 1_000_000_000);
}

#[tokio::test]
async fn test_malformed_quantity_is_unexpected_result() {
    let server = MockServer::start().await;
    mount_method(&server, "eth_blockNumber", json!("sixteen")).await;

    let client = RpcClient::new(server.uri()).unwrap();
    let err = client.block_number().await.unwrap_err();
    assert!(matches!(
        err,
        RpcError::Protocol(ProtocolError::UnexpectedResult { ref method, .. }) if method == "eth_blockNumber"
    ));
}

#[tokio::test]
async fn test_get_balance_sends_normalized_address() {
    let server = MockServer::start().await;
    mount_method(&server, "eth_getBalance", json!("0xde0b6b3a7640000")).await;

    let client = RpcClient::new(server.uri()).unwrap();
    let balance = client
        .get_balance(ADDRESS, BlockTag::Number(0x10))
        .await
        .unwrap();
    assert_eq!(balance, 1_000_000_000_000_000_000);

    let requests = server.received_requests().await.unwrap();
    let body = request_body(&requests[0]);
    assert_eq!(
        body["params"],
        json!(["0x6671f7552df0fbaf762bd40aed1ca3ec670d6161", "0x10"])
    );
}

#[tokio::test]
async fn test_invalid_address_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(EchoResult(json!("0x0")))
        .expect(0)
        .mount(&server)
        .await;

    let client = RpcClient::new(server.uri()).unwrap();
    let err = client
        .get_transaction_count("0x1234", BlockTag::Latest)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ClientError::Validation(ValidationError::InvalidAddress(_))
    ));
}

#[tokio::test]
async fn test_transaction_count() {
    let server = MockServer::start().await;
    mount_method(&server, "eth_getTransactionCount", json!("0x7")).await;

    let client = RpcClient::new(server.uri()).unwrap();
    let nonce = client
        .get_transaction_count(ADDRESS, BlockTag::Pending)
        .await
        .unwrap();
    assert_eq!(nonce, 7);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(request_body(&requests[0])["params"][1], json!("pending"));
}

#[tokio::test]
async fn test_get_block_by_number() {
    let server = MockServer::start().await;
    mount_method(
        &server,
        "eth_getBlockByNumber",
        json!({
            "number": "0x1b4",
            "hash": "0xdc0818cf78f21a8e70579cb46a43643f78291264dda342ae31049421c82d21ae",
            "parentHash": "0xe99e022112df268087ea7eafaf4790497fd21dbeeb6bd7a1721df161a6657a54",
            "timestamp": "0x55ba467c",
            "gasUsed": "0x0",
            "gasLimit": "0x1388",
            "transactions": ["0xaa"]
        }),
    )
    .await;

    let client = RpcClient::new(server.uri()).unwrap();
    let block = client
        .get_block_by_number(BlockTag::Number(436), false)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(block.number_u64().unwrap(), Some(436));
    assert!(matches!(block.transactions, BlockTransactions::Hashes(ref h) if h.len() == 1));

    let requests = server.received_requests().await.unwrap();
    assert_eq!(request_body(&requests[0])["params"], json!(["0x1b4", false]));
}

#[tokio::test]
async fn test_unknown_block_is_none() {
    let server = MockServer::start().await;
    mount_method(&server, "eth_getBlockByNumber", Value::Null).await;

    let client = RpcClient::new(server.uri()).unwrap();
    let block = client
        .get_block_by_number(BlockTag::Finalized, true)
        .await
        .unwrap();
    assert!(block.is_none());
}

#[tokio::test]
async fn test_version_helpers() {
    let server = MockServer::start().await;
    mount_method(&server, "web3_clientVersion", json!("Geth/v1.13.5-stable")).await;
    mount_method(&server, "net_version", json!("1")).await;

    let client = RpcClient::new(server.uri()).unwrap();
    assert_eq!(client.client_version().await.unwrap(), "Geth/v1.13.5-stable");
    assert_eq!(client.net_version().await.unwrap(), "1");
}

#[tokio::test]
async fn test_wait_for_receipt_polls_until_found() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "method": "eth_getTransactionReceipt" })))
        .respond_with(EchoResult(Value::Null))
        .up_to_n_times(2)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "method": "eth_getTransactionReceipt" })))
        .respond_with(EchoResult(receipt_json()))
        .with_priority(2)
        .mount(&server)
        .await;

    let client = RpcClient::new(server.uri()).unwrap();
    let receipt = client
        .wait_for_receipt(&tx_hash(), Duration::from_millis(10), 5)
        .await
        .unwrap();

    assert_eq!(receipt.block_number_u64().unwrap(), 12345);
    assert_eq!(receipt.succeeded(), Some(true));
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_wait_for_receipt_gives_up() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(EchoResult(Value::Null))
        .expect(3)
        .mount(&server)
        .await;

    let client = RpcClient::new(server.uri()).unwrap();
    let err = client
        .wait_for_receipt(&tx_hash(), Duration::from_millis(5), 3)
        .await
        .unwrap_err();

    match err {
        ClientError::PollingExhausted { attempts, .. } => assert_eq!(attempts, 3),
        other => panic!("expected polling exhaustion, got {:?}", other),
    }
}

#[tokio::test]
async fn test_wait_for_receipt_survives_failed_polls() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .up_to_n_times(2)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(EchoResult(receipt_json()))
        .with_priority(2)
        .mount(&server)
        .await;

    let client = RpcClient::new(server.uri()).unwrap();
    let receipt = client
        .wait_for_receipt(&tx_hash(), Duration::from_millis(5), 3)
        .await
        .unwrap();

    assert_eq!(receipt.transaction_hash, tx_hash());
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_wait_for_receipt_counts_errors_as_attempts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(EchoError {
            code: -32000,
            message: "header not found",
        })
        .expect(4)
        .mount(&server)
        .await;

    let client = RpcClient::new(server.uri()).unwrap();
    let err = client
        .wait_for_receipt(&tx_hash(), Duration::from_millis(5), 4)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ClientError::PollingExhausted { attempts: 4, .. }
    ));
    assert_eq!(server.received_requests().await.unwrap().len(), 4);
}

#[tokio::test]
async fn test_wait_for_receipt_always_queries_once() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(EchoResult(receipt_json()))
        .expect(1)
        .mount(&server)
        .await;

    let client = RpcClient::new(server.uri()).unwrap();
    let receipt = client
        .wait_for_receipt(&tx_hash(), Duration::from_millis(5), 0)
        .await
        .unwrap();
    assert_eq!(receipt.succeeded(), Some(true));
}

#[tokio::test]
async fn test_wait_for_receipt_rejects_bad_hash() {
    let client = RpcClient::new("http://127.0.0.1:1").unwrap();
    let err = client
        .wait_for_receipt("0xnothex", Duration::from_millis(1), 3)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ClientError::Validation(ValidationError::InvalidHash(_))
    ));
}
