use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;

use crate::error::RpcError;

/// A JSON value as carried in request params and response results.
///
/// Mirrors the JSON data model one-to-one so that parameters keep their
/// wire semantics (a hex string stays a string, `null` stays `null`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum RpcValue {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<RpcValue>),
    Object(BTreeMap<String, RpcValue>),
}

impl RpcValue {
    /// Convert any serializable value, e.g. a filter struct
    pub fn from_serializable<T: Serialize>(value: &T) -> Result<Self, RpcError> {
        serde_json::to_value(value)
            .map(RpcValue::from)
            .map_err(|e| RpcError::InvalidRequest(format!("parameter is not serializable: {}", e)))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, RpcValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            RpcValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            RpcValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            RpcValue::Number(n) => n.as_u64(),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[RpcValue]> {
        match self {
            RpcValue::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&RpcValue> {
        match self {
            RpcValue::Object(map) => map.get(key),
            _ => None,
        }
    }

    pub fn into_json(self) -> Value {
        self.into()
    }
}

impl From<Value> for RpcValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => RpcValue::Null,
            Value::Bool(b) => RpcValue::Bool(b),
            Value::Number(n) => RpcValue::Number(n),
            Value::String(s) => RpcValue::String(s),
            Value::Array(items) => RpcValue::Array(items.into_iter().map(RpcValue::from).collect()),
            Value::Object(map) => RpcValue::Object(
                map.into_iter()
                    .map(|(k, v)| (k, RpcValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<RpcValue> for Value {
    fn from(value: RpcValue) -> Self {
        match value {
            RpcValue::Null => Value::Null,
            RpcValue::Bool(b) => Value::Bool(b),
            RpcValue::Number(n) => Value::Number(n),
            RpcValue::String(s) => Value::String(s),
            RpcValue::Array(items) => Value::Array(items.into_iter().map(Value::from).collect()),
            RpcValue::Object(map) => {
                let object: Map<String, Value> =
                    map.into_iter().map(|(k, v)| (k, Value::from(v))).collect();
                Value::Object(object)
            }
        }
    }
}

impl From<&str> for RpcValue {
    fn from(value: &str) -> Self {
        RpcValue::String(value.to_string())
    }
}

impl From<String> for RpcValue {
    fn from(value: String) -> Self {
        RpcValue::String(value)
    }
}

impl From<bool> for RpcValue {
    fn from(value: bool) -> Self {
        RpcValue::Bool(value)
    }
}

impl From<u64> for RpcValue {
    fn from(value: u64) -> Self {
        RpcValue::Number(value.into())
    }
}

impl From<i64> for RpcValue {
    fn from(value: i64) -> Self {
        RpcValue::Number(value.into())
    }
}

impl<T: Into<RpcValue>> From<Vec<T>> for RpcValue {
    fn from(values: Vec<T>) -> Self {
        RpcValue::Array(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<RpcValue>> From<Option<T>> for RpcValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(RpcValue::Null)
    }
}
