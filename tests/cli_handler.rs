mod common;

use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, method};
use wiremock::{Mock, MockServer};

use common::{request_body, tx_hash, EchoError, EchoResult, ADDRESS};
use evm_rpc_client::api::{CliHandler, Commands};
use evm_rpc_client::error::{ClientError, RpcError};
use evm_rpc_client::models::BlockTag;
use evm_rpc_client::ClientConfig;

fn handler_for(server: &MockServer) -> CliHandler {
    let mut config = ClientConfig::default();
    config.rpc.endpoint = server.uri();
    CliHandler::new(config).unwrap()
}

#[tokio::test]
async fn test_generic_call_parses_params() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "method": "eth_call" })))
        .respond_with(EchoResult(json!("0x0000000000000000000000000000000000000000000000000000000000000001")))
        .mount(&server)
        .await;

    let handler = handler_for(&server);
    let output = handler
        .execute_command(&Commands::Call {
            method: "eth_call".to_string(),
            params: vec![r#"{"to":"0x01","data":"0x"}"#.to_string(), "latest".to_string()],
        })
        .await
        .unwrap();
    assert!(output.contains("0x0000"));

    let requests = server.received_requests().await.unwrap();
    assert_eq!(
        request_body(&requests[0])["params"],
        json!([{"to": "0x01", "data": "0x"}, "latest"])
    );
}

#[tokio::test]
async fn test_quantity_commands_print_decimal() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "method": "eth_blockNumber" })))
        .respond_with(EchoResult(json!("0x10")))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "method": "eth_getBalance" })))
        .respond_with(EchoResult(json!("0xde0b6b3a7640000")))
        .mount(&server)
        .await;

    let handler = handler_for(&server);
    assert_eq!(
        handler.execute_command(&Commands::BlockNumber).await.unwrap(),
        "16"
    );
    assert_eq!(
        handler
            .execute_command(&Commands::Balance {
                address: ADDRESS.to_string(),
                block: BlockTag::Latest,
            })
            .await
            .unwrap(),
        "1000000000000000000"
    );
}

#[tokio::test]
async fn test_receipt_command_renders_null() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(EchoResult(Value::Null))
        .mount(&server)
        .await;

    let handler = handler_for(&server);
    let output = handler
        .execute_command(&Commands::Receipt {
            hash: tx_hash(),
            wait: false,
            interval_ms: 10,
            max_attempts: 1,
        })
        .await
        .unwrap();
    assert_eq!(output, "null");
}

#[tokio::test]
async fn test_remote_error_propagates() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(EchoError {
            code: -32601,
            message: "Method not found",
        })
        .mount(&server)
        .await;

    let handler = handler_for(&server);
    let err = handler
        .execute_command(&Commands::ClientVersion)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ClientError::Rpc(RpcError::Remote { code: -32601, .. })
    ));
}

#[tokio::test]
async fn test_handler_uses_configured_retry() {
    let mut config = ClientConfig::default();
    config.rpc.endpoint = "http://127.0.0.1:8545".to_string();
    config.retry.max_attempts = 4;

    let handler = CliHandler::new(config).unwrap();
    assert_eq!(handler.client().retry_config().max_attempts, 4);
    assert_eq!(handler.client().endpoint(), "http://127.0.0.1:8545");
}
