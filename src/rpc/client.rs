use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE, RETRY_AFTER};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::config::RpcConfig;
use crate::error::{ConfigError, RpcError, TransportError};
use crate::logging::{LogContext, MetricsLogger, PerformanceMonitor};
use crate::retry::{RetryConfig, RetryManager};
use crate::rpc::params::RpcValue;
use crate::rpc::protocol::{decode_response, JsonRpcRequest};

const MAX_ERROR_BODY_CHARS: usize = 256;

/// JSON-RPC 2.0 client bound to a single endpoint.
///
/// Cloning is cheap; clones share the connection pool and the request id
/// counter, so ids stay unique across every clone.
#[derive(Clone)]
pub struct RpcClient {
    client: Client,
    endpoint: String,
    timeout_seconds: u64,
    retry: RetryConfig,
    next_id: Arc<AtomicU64>,
}

impl RpcClient {
    /// Client for `endpoint` with default timeout and no credentials
    pub fn new(endpoint: impl Into<String>) -> Result<Self, ConfigError> {
        Self::from_config(&RpcConfig::with_endpoint(endpoint))
    }

    pub fn from_config(config: &RpcConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let context = LogContext::new("rpc_client", "initialization")
            .with_endpoint(&config.endpoint)
            .with_metadata("timeout_seconds", json!(config.timeout_seconds))
            .with_metadata(
                "authenticated",
                json!(config.api_key.is_some() || config.bearer_token.is_some()),
            );
        context.debug("Initializing RPC client");

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .default_headers(build_headers(config)?)
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            timeout_seconds: config.timeout_seconds,
            retry: RetryConfig::disabled(),
            next_id: Arc::new(AtomicU64::new(1)),
        })
    }

    /// Retry retryable failures according to `retry`
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry
    }

    fn next_request_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Invoke `method` and return its result value
    pub async fn call(&self, method: &str, params: Vec<RpcValue>) -> Result<RpcValue, RpcError> {
        self.call_json(method, params).await.map(RpcValue::from)
    }

    /// Invoke `method` and deserialize its result into `T`
    pub async fn call_typed<T>(&self, method: &str, params: Vec<RpcValue>) -> Result<T, RpcError>
    where
        T: DeserializeOwned,
    {
        let value = self.call_json(method, params).await?;
        serde_json::from_value(value)
            .map_err(|e| RpcError::unexpected_result(method.trim(), e.to_string()))
    }

    async fn call_json(&self, method: &str, params: Vec<RpcValue>) -> Result<Value, RpcError> {
        let method = method.trim();
        if method.is_empty() {
            return Err(RpcError::InvalidRequest(
                "method name must not be empty".to_string(),
            ));
        }

        if !self.retry.is_enabled() {
            return self.send(method, params).await;
        }

        RetryManager::new(method, self.retry.clone())
            .execute(|| self.send(method, params.clone()))
            .await
    }

    /// One HTTP round trip with a fresh request id
    async fn send(&self, method: &str, params: Vec<RpcValue>) -> Result<Value, RpcError> {
        let id = self.next_request_id();
        let request = JsonRpcRequest::new(id, method, params);

        LogContext::new("rpc_client", "call")
            .with_method(method)
            .with_request_id(id)
            .trace(&format!("Sending RPC request: {}", method));

        let monitor = PerformanceMonitor::new("rpc_call")
            .with_metadata("method", json!(method))
            .with_metadata("request_id", json!(id));

        let result = self.execute(&request).await;
        let duration = monitor.finish_with_result(&result);
        MetricsLogger::log_rpc_call(method, duration, result.is_ok());

        result
    }

    async fn execute(&self, request: &JsonRpcRequest) -> Result<Value, RpcError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| self.classify_transport_error(e))?;

        let status = response.status();
        let retry_after = parse_retry_after(response.headers());
        let body = response
            .bytes()
            .await
            .map_err(|e| self.classify_transport_error(e))?;

        if !status.is_success() {
            return Err(classify_http_status(status, retry_after, &body, request.id));
        }

        decode_response(&body, request.id)
    }

    fn classify_transport_error(&self, error: reqwest::Error) -> RpcError {
        let error = if error.is_timeout() {
            TransportError::Timeout {
                seconds: self.timeout_seconds,
            }
        } else if error.is_connect() {
            TransportError::Connect(error.to_string())
        } else {
            TransportError::Request(error)
        };
        RpcError::Transport(error)
    }
}

/// Non-2xx responses: keep node error objects, otherwise report the status
fn classify_http_status(
    status: StatusCode,
    retry_after: Option<u64>,
    body: &[u8],
    request_id: u64,
) -> RpcError {
    if let Err(remote @ RpcError::Remote { .. }) = decode_response(body, request_id) {
        return remote;
    }

    let error = match status {
        StatusCode::TOO_MANY_REQUESTS => TransportError::RateLimited {
            retry_after_seconds: retry_after,
        },
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => TransportError::Unauthorized {
            status: status.as_u16(),
        },
        _ => TransportError::HttpStatus {
            status: status.as_u16(),
            body: String::from_utf8_lossy(body)
                .chars()
                .take(MAX_ERROR_BODY_CHARS)
                .collect(),
        },
    };
    RpcError::Transport(error)
}

fn parse_retry_after(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse().ok())
}

fn build_headers(config: &RpcConfig) -> Result<HeaderMap, ConfigError> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    for (name, value) in &config.headers {
        insert_header(&mut headers, name, value, false)?;
    }
    if let Some(api_key) = &config.api_key {
        insert_header(&mut headers, &config.api_key_header, api_key, true)?;
    }
    if let Some(token) = &config.bearer_token {
        insert_header(&mut headers, AUTHORIZATION.as_str(), &format!("Bearer {}", token), true)?;
    }

    Ok(headers)
}

fn insert_header(
    headers: &mut HeaderMap,
    name: &str,
    value: &str,
    sensitive: bool,
) -> Result<(), ConfigError> {
    let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
        ConfigError::InvalidHeader {
            name: name.to_string(),
            reason: e.to_string(),
        }
    })?;
    let mut header_value = HeaderValue::from_str(value).map_err(|e| ConfigError::InvalidHeader {
        name: name.to_string(),
        reason: e.to_string(),
    })?;
    header_value.set_sensitive(sensitive);
    headers.insert(header_name, header_value);
    Ok(())
}
