#![allow(dead_code)]

use serde_json::{json, Value};
use wiremock::{Request, Respond, ResponseTemplate};

/// Answers every JSON-RPC request with `result`, echoing the request id
pub struct EchoResult(pub Value);

impl Respond for EchoResult {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": request_id(request),
            "result": self.0,
        }))
    }
}

/// Answers every JSON-RPC request with an error object, echoing the request id
pub struct EchoError {
    pub code: i64,
    pub message: &'static str,
}

impl Respond for EchoError {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": request_id(request),
            "error": { "code": self.code, "message": self.message },
        }))
    }
}

pub fn request_id(request: &Request) -> Value {
    request
        .body_json::<Value>()
        .map(|body| body["id"].clone())
        .unwrap_or(Value::Null)
}

pub fn request_body(request: &Request) -> Value {
    request.body_json::<Value>().expect("request body is JSON")
}

pub const ADDRESS: &str = "0x6671f7552df0fbAF762Bd40aEd1cA3ec670d6161";

pub fn tx_hash() -> String {
    format!("0x{}", "ab".repeat(32))
}
