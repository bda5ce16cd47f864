//! JSON-RPC 2.0 wire types and response classification.
//!
//! A response is accepted only when it carries exactly one of `result` and
//! `error` and echoes the request id. A `result` of `null` is a valid
//! result (e.g. an unknown block), so presence is tracked separately from
//! value.

use once_cell::sync::Lazy;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::error::{ProtocolError, RpcError};
use crate::rpc::params::RpcValue;

pub const JSONRPC_VERSION: &str = "2.0";

pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;
pub const INTERNAL_ERROR: i64 = -32603;
/// EIP-1474: request exceeds a node-side limit (rate or size)
pub const LIMIT_EXCEEDED: i64 = -32005;

static KNOWN_ERROR_CODES: Lazy<HashMap<i64, &'static str>> = Lazy::new(|| {
    HashMap::from([
        (PARSE_ERROR, "parse error"),
        (INVALID_REQUEST, "invalid request"),
        (METHOD_NOT_FOUND, "method not found"),
        (INVALID_PARAMS, "invalid params"),
        (INTERNAL_ERROR, "internal error"),
        (-32000, "invalid input"),
        (-32001, "resource not found"),
        (-32002, "resource unavailable"),
        (-32003, "transaction rejected"),
        (-32004, "method not supported"),
        (LIMIT_EXCEEDED, "limit exceeded"),
        (-32006, "JSON-RPC version not supported"),
    ])
});

/// Human-readable name for JSON-RPC 2.0 and EIP-1474 error codes
pub fn error_code_name(code: i64) -> Option<&'static str> {
    KNOWN_ERROR_CODES.get(&code).copied()
}

#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: &'static str,
    pub method: String,
    pub params: Vec<RpcValue>,
    pub id: u64,
}

impl JsonRpcRequest {
    pub fn new(id: u64, method: impl Into<String>, params: Vec<RpcValue>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            method: method.into(),
            params,
            id,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct JsonRpcResponse {
    #[serde(default)]
    pub jsonrpc: Option<String>,
    /// `Some(Value::Null)` when the field is present with a null value
    #[serde(default, deserialize_with = "present")]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<JsonRpcErrorObject>,
    #[serde(default)]
    pub id: Value,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct JsonRpcErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(default)]
    pub data: Option<Value>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Decode a response body for the request with id `expected_id`
pub fn decode_response(body: &[u8], expected_id: u64) -> Result<Value, RpcError> {
    let response: JsonRpcResponse =
        serde_json::from_slice(body).map_err(ProtocolError::InvalidJson)?;
    classify_response(response, expected_id)
}

/// Turn a parsed response into exactly one of a result or an error
pub fn classify_response(response: JsonRpcResponse, expected_id: u64) -> Result<Value, RpcError> {
    if let Some(version) = &response.jsonrpc {
        if version != JSONRPC_VERSION {
            return Err(ProtocolError::UnsupportedVersion(version.clone()).into());
        }
    }

    let id_matches = response.id.as_u64() == Some(expected_id);

    match (response.result, response.error) {
        (None, None) => Err(ProtocolError::MissingResultAndError.into()),
        (Some(result), Some(_)) if !result.is_null() => {
            Err(ProtocolError::BothResultAndError.into())
        }
        (_, Some(error)) => {
            // Nodes answer with a null id when they could not parse the request
            if !id_matches && !response.id.is_null() {
                return Err(ProtocolError::IdMismatch {
                    expected: expected_id,
                    actual: response.id,
                }
                .into());
            }
            Err(RpcError::Remote {
                code: error.code,
                message: error.message,
                data: error.data,
            })
        }
        (Some(result), None) => {
            if !id_matches {
                return Err(ProtocolError::IdMismatch {
                    expected: expected_id,
                    actual: response.id,
                }
                .into());
            }
            Ok(result)
        }
    }
}
