pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod retry;
pub mod rpc;

pub use config::{ClientConfig, LoggingConfig, RpcConfig};
pub use error::{
    ClientError, ConfigError, ProtocolError, Result, RpcError, RpcErrorKind, TransportError,
    ValidationError,
};
pub use logging::{ErrorLogger, LogContext, MetricsLogger, PerformanceMonitor};
pub use models::BlockTag;
pub use retry::{RetryConfig, RetryManager};
pub use rpc::{RpcClient, RpcValue};
