use serde_json::Value;
use thiserror::Error;

/// Main error type for the EVM RPC client and CLI
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("RPC error: {0}")]
    Rpc(#[from] RpcError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Polling for {what} gave up after {attempts} attempts")]
    PollingExhausted { what: String, attempts: u32 },

    #[error("Failed to render output: {0}")]
    Render(#[from] serde_json::Error),
}

/// Coarse classification of an [`RpcError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RpcErrorKind {
    /// Connection, timeout or HTTP-level failure
    Transport,
    /// Response did not conform to JSON-RPC 2.0 or to the expected shape
    Protocol,
    /// The node answered with an error object
    Remote,
    /// The call was rejected before anything was sent
    InvalidRequest,
}

/// Errors returned by a single JSON-RPC call
#[derive(Error, Debug)]
pub enum RpcError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Remote error: code={code}, message={message}")]
    Remote {
        code: i64,
        message: String,
        data: Option<Value>,
    },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Failures below the JSON-RPC layer
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Request timed out after {seconds} seconds")]
    Timeout { seconds: u64 },

    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Rate limited by endpoint")]
    RateLimited { retry_after_seconds: Option<u64> },

    #[error("Endpoint rejected credentials (HTTP {status})")]
    Unauthorized { status: u16 },

    #[error("Unexpected HTTP status {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// Responses that could not be interpreted
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Response body is not valid JSON-RPC: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Unsupported JSON-RPC version: {0}")]
    UnsupportedVersion(String),

    #[error("Response carries neither result nor error")]
    MissingResultAndError,

    #[error("Response carries both result and error")]
    BothResultAndError,

    #[error("Response id {actual} does not match request id {expected}")]
    IdMismatch { expected: u64, actual: Value },

    #[error("Unexpected result for {method}: {reason}")]
    UnexpectedResult { method: String, reason: String },
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Configuration parsing failed: {0}")]
    Parsing(String),

    #[error("Invalid URL format: {0}")]
    InvalidUrl(String),

    #[error("Invalid header {name}: {reason}")]
    InvalidHeader { name: String, reason: String },

    #[error("Failed to load .env file: {0}")]
    Dotenv(String),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// Input validation errors
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid Ethereum address: {0}")]
    InvalidAddress(String),

    #[error("Invalid hash: {0}")]
    InvalidHash(String),

    #[error("Invalid block tag: {0}")]
    InvalidBlockTag(String),

    #[error("Invalid hex quantity: {0}")]
    InvalidQuantity(String),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, ClientError>;

/// Error severity levels for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// The process cannot continue
    Critical,
    /// The requested operation failed
    High,
    /// Likely transient
    Medium,
    /// Caller input problems
    Low,
}

impl RpcError {
    pub fn kind(&self) -> RpcErrorKind {
        match self {
            RpcError::Transport(_) => RpcErrorKind::Transport,
            RpcError::Protocol(_) => RpcErrorKind::Protocol,
            RpcError::Remote { .. } => RpcErrorKind::Remote,
            RpcError::InvalidRequest(_) => RpcErrorKind::InvalidRequest,
        }
    }

    /// Error code reported by the node, if any
    pub fn code(&self) -> Option<i64> {
        match self {
            RpcError::Remote { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Whether repeating the same call may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            RpcError::Transport(TransportError::Timeout { .. }) => true,
            RpcError::Transport(TransportError::Connect(_)) => true,
            RpcError::Transport(TransportError::RateLimited { .. }) => true,
            RpcError::Transport(TransportError::HttpStatus { status, .. }) => {
                matches!(status, 502 | 503 | 504)
            }
            RpcError::Transport(TransportError::Request(e)) => e.is_timeout() || e.is_connect(),
            RpcError::Remote { code, .. } => *code == crate::rpc::protocol::LIMIT_EXCEEDED,
            _ => false,
        }
    }

    /// Server-suggested delay before retrying, in seconds
    pub fn retry_after(&self) -> Option<u64> {
        match self {
            RpcError::Transport(TransportError::RateLimited { retry_after_seconds }) => {
                *retry_after_seconds
            }
            _ => None,
        }
    }

    pub(crate) fn unexpected_result(method: &str, reason: impl Into<String>) -> Self {
        RpcError::Protocol(ProtocolError::UnexpectedResult {
            method: method.to_string(),
            reason: reason.into(),
        })
    }
}

impl ClientError {
    /// Get the severity level of an error
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            ClientError::Config(_) => ErrorSeverity::Critical,

            ClientError::Rpc(RpcError::Transport(TransportError::Unauthorized { .. })) => {
                ErrorSeverity::High
            }
            ClientError::Rpc(RpcError::Protocol(_)) => ErrorSeverity::High,
            ClientError::Rpc(RpcError::Remote { .. }) => ErrorSeverity::High,

            ClientError::Rpc(RpcError::Transport(_)) => ErrorSeverity::Medium,
            ClientError::PollingExhausted { .. } => ErrorSeverity::Medium,

            ClientError::Rpc(RpcError::InvalidRequest(_)) => ErrorSeverity::Low,
            ClientError::Validation(_) => ErrorSeverity::Low,
            ClientError::Render(_) => ErrorSeverity::Low,
        }
    }

    /// Check if the error is recoverable (can be retried)
    pub fn is_recoverable(&self) -> bool {
        match self {
            ClientError::Rpc(e) => e.is_retryable(),
            ClientError::PollingExhausted { .. } => true,
            ClientError::Config(_) | ClientError::Validation(_) | ClientError::Render(_) => false,
        }
    }
}
