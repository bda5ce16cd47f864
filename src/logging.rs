use log::{debug, error, info, trace, warn};
use reqwest::Url;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use crate::config::LoggingConfig;
use crate::error::{ClientError, ErrorSeverity, RpcError};
use crate::rpc::protocol::error_code_name;

/// Structured logging context
pub struct LogContext {
    pub component: String,
    pub operation: String,
    pub metadata: HashMap<String, Value>,
}

impl LogContext {
    pub fn new(component: &str, operation: &str) -> Self {
        Self {
            component: component.to_string(),
            operation: operation.to_string(),
            metadata: HashMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: &str, value: Value) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }

    pub fn with_method(self, method: &str) -> Self {
        self.with_metadata("method", json!(method))
    }

    pub fn with_request_id(self, id: u64) -> Self {
        self.with_metadata("request_id", json!(id))
    }

    /// Records only scheme, host and port; paths and query strings often carry API keys
    pub fn with_endpoint(self, endpoint: &str) -> Self {
        self.with_metadata("endpoint", json!(endpoint_origin(endpoint)))
    }

    pub fn with_duration_ms(self, duration_ms: u64) -> Self {
        self.with_metadata("duration_ms", json!(duration_ms))
    }

    pub fn with_retry_count(self, retry_count: u32) -> Self {
        self.with_metadata("retry_count", json!(retry_count))
    }

    pub fn with_error_code(self, error_code: i64) -> Self {
        self.with_metadata("error_code", json!(error_code))
    }

    fn format_message(&self, level: &str, message: &str) -> String {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();

        let mut log_entry = json!({
            "timestamp": timestamp,
            "level": level,
            "component": self.component,
            "operation": self.operation,
            "message": message,
        });

        for (key, value) in &self.metadata {
            log_entry[key] = value.clone();
        }

        log_entry.to_string()
    }

    pub fn info(&self, message: &str) {
        info!("{}", self.format_message("INFO", message));
    }

    /// Info-level event for a completed step
    pub fn success(&self, message: &str) {
        info!("{}", self.format_message("INFO", &format!("✅ {}", message)));
    }

    pub fn warn(&self, message: &str) {
        warn!("{}", self.format_message("WARN", message));
    }

    pub fn error(&self, message: &str) {
        error!("{}", self.format_message("ERROR", message));
    }

    pub fn debug(&self, message: &str) {
        debug!("{}", self.format_message("DEBUG", message));
    }

    pub fn trace(&self, message: &str) {
        trace!("{}", self.format_message("TRACE", message));
    }
}

fn endpoint_origin(endpoint: &str) -> String {
    match Url::parse(endpoint) {
        Ok(url) => match (url.host_str(), url.port()) {
            (Some(host), Some(port)) => format!("{}://{}:{}", url.scheme(), host, port),
            (Some(host), None) => format!("{}://{}", url.scheme(), host),
            (None, _) => format!("{}://", url.scheme()),
        },
        Err(_) => "<unparseable endpoint>".to_string(),
    }
}

/// Measures how long an operation takes
pub struct PerformanceMonitor {
    start: Instant,
    operation: String,
    metadata: HashMap<String, Value>,
}

impl PerformanceMonitor {
    pub fn new(operation: &str) -> Self {
        Self {
            start: Instant::now(),
            operation: operation.to_string(),
            metadata: HashMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: &str, value: Value) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    pub fn finish(self) -> u64 {
        let duration = self.elapsed_ms();
        self.into_context(duration)
            .debug(&format!("Operation completed in {}ms", duration));
        duration
    }

    pub fn finish_with_result<T, E>(self, result: &Result<T, E>) -> u64
    where
        E: std::fmt::Display,
    {
        let duration = self.elapsed_ms();
        let context = self.into_context(duration);

        match result {
            Ok(_) => {
                context.debug(&format!("Operation completed successfully in {}ms", duration));
            }
            Err(e) => {
                context
                    .with_metadata("error", json!(e.to_string()))
                    .warn(&format!("Operation failed after {}ms: {}", duration, e));
            }
        }

        duration
    }

    fn into_context(self, duration: u64) -> LogContext {
        let mut context = LogContext::new("performance", &self.operation).with_duration_ms(duration);
        for (key, value) in self.metadata {
            context = context.with_metadata(&key, value);
        }
        context
    }
}

/// Error logging utilities
pub struct ErrorLogger;

impl ErrorLogger {
    pub fn log_error(error: &ClientError, context: Option<LogContext>) {
        let severity = error.severity();

        let mut log_context = context.unwrap_or_else(|| LogContext::new("error", "unknown"));
        log_context = log_context
            .with_metadata("severity", json!(format!("{:?}", severity)))
            .with_metadata("recoverable", json!(error.is_recoverable()));

        if let ClientError::Rpc(rpc_error) = error {
            log_context = Self::annotate_rpc_error(log_context, rpc_error);
        }

        let message = format!("Error occurred: {}", error);

        match severity {
            ErrorSeverity::Critical | ErrorSeverity::High => log_context.error(&message),
            ErrorSeverity::Medium => log_context.warn(&message),
            ErrorSeverity::Low => log_context.info(&message),
        }
    }

    pub fn log_retry_attempt(error: &RpcError, attempt: u32, max_attempts: u32) {
        let context = Self::annotate_rpc_error(
            LogContext::new("retry", "attempt")
                .with_retry_count(attempt)
                .with_metadata("max_attempts", json!(max_attempts)),
            error,
        );

        if attempt >= max_attempts {
            context.error(&format!("Final attempt failed: {}", error));
        } else {
            context.warn(&format!("Attempt {} of {} failed: {}", attempt, max_attempts, error));
        }
    }

    pub fn log_recovery_success(operation: &str, attempts: u32, total_duration_ms: u64) {
        LogContext::new("retry", "recovered")
            .with_metadata("operation", json!(operation))
            .with_retry_count(attempts)
            .with_duration_ms(total_duration_ms)
            .info(&format!(
                "Operation recovered after {} attempts in {}ms",
                attempts, total_duration_ms
            ));
    }

    fn annotate_rpc_error(context: LogContext, error: &RpcError) -> LogContext {
        let context = context.with_metadata("error_kind", json!(format!("{:?}", error.kind())));
        match error.code() {
            Some(code) => {
                let context = context.with_error_code(code);
                match error_code_name(code) {
                    Some(name) => context.with_metadata("error_name", json!(name)),
                    None => context,
                }
            }
            None => context,
        }
    }
}

/// Call-level metrics
pub struct MetricsLogger;

impl MetricsLogger {
    pub fn log_rpc_call(method: &str, duration_ms: u64, success: bool) {
        let context = LogContext::new("metrics", "rpc_call")
            .with_method(method)
            .with_duration_ms(duration_ms)
            .with_metadata("success", json!(success));

        if success {
            context.debug(&format!("RPC call {} completed in {}ms", method, duration_ms));
        } else {
            context.warn(&format!("RPC call {} failed after {}ms", method, duration_ms));
        }
    }

    pub fn log_poll_progress(what: &str, attempt: u32, max_attempts: u32, found: bool) {
        LogContext::new("metrics", "poll")
            .with_metadata("target", json!(what))
            .with_retry_count(attempt)
            .with_metadata("max_attempts", json!(max_attempts))
            .with_metadata("found", json!(found))
            .info(&format!(
                "Polling {}: {} (attempt {}/{})",
                what,
                if found { "found" } else { "pending" },
                attempt,
                max_attempts
            ));
    }
}

/// Initialize logging from configuration; `RUST_LOG` takes precedence
pub fn init_logging(config: &LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    let env = env_logger::Env::default().default_filter_or(config.level.as_str());
    let mut builder = env_logger::Builder::from_env(env);

    if config.format == "json" {
        builder.format(|buf, record| {
            use std::io::Write;

            let message = record.args().to_string();
            if serde_json::from_str::<Value>(&message).is_ok() {
                writeln!(buf, "{}", message)
            } else {
                let entry = json!({
                    "timestamp": chrono::Utc::now().to_rfc3339(),
                    "level": record.level().to_string(),
                    "target": record.target(),
                    "message": message,
                });
                writeln!(buf, "{}", entry)
            }
        });
    } else {
        builder.format(|buf, record| {
            use std::io::Write;

            let message = record.args().to_string();
            // Structured entries are pretty-printed for humans
            if let Ok(json_value) = serde_json::from_str::<Value>(&message) {
                writeln!(
                    buf,
                    "{} [{}] {}",
                    chrono::Utc::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                    record.level(),
                    serde_json::to_string_pretty(&json_value)?
                )
            } else {
                writeln!(
                    buf,
                    "{} [{}] {}: {}",
                    chrono::Utc::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                    record.level(),
                    record.target(),
                    message
                )
            }
        });
    }

    builder.try_init()?;
    debug!("Logging initialized");
    Ok(())
}
