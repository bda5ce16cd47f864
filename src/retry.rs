use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

use crate::error::RpcError;
use crate::logging::{ErrorLogger, LogContext, PerformanceMonitor};

/// Configuration for retry behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts per call, including the first one
    pub max_attempts: u32,
    /// Initial delay between attempts in milliseconds
    pub initial_delay_ms: u64,
    /// Maximum delay between attempts in milliseconds
    pub max_delay_ms: u64,
    /// Multiplier for exponential backoff
    pub backoff_multiplier: f64,
    /// Whether to randomize delays slightly
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::disabled()
    }
}

impl RetryConfig {
    /// One attempt, no retries
    pub fn disabled() -> Self {
        Self {
            max_attempts: 1,
            initial_delay_ms: 500,
            max_delay_ms: 10_000,
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }

    /// Preset for flaky public endpoints
    pub fn for_rpc() -> Self {
        Self {
            max_attempts: 5,
            initial_delay_ms: 1_000,
            max_delay_ms: 30_000,
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.max_attempts > 1
    }
}

/// Retry mechanism with exponential backoff and jitter
pub struct RetryManager {
    config: RetryConfig,
    operation_name: String,
}

impl RetryManager {
    pub fn new(operation_name: &str, config: RetryConfig) -> Self {
        Self {
            config,
            operation_name: operation_name.to_string(),
        }
    }

    /// Execute an operation, retrying retryable failures
    pub async fn execute<T, F, Fut>(&self, operation: F) -> Result<T, RpcError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, RpcError>>,
    {
        let monitor = PerformanceMonitor::new(&format!("retry_{}", self.operation_name));
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            let error = match operation().await {
                Ok(result) => {
                    if attempt > 1 {
                        ErrorLogger::log_recovery_success(
                            &self.operation_name,
                            attempt,
                            monitor.elapsed_ms(),
                        );
                    }
                    return Ok(result);
                }
                Err(error) => error,
            };

            if !error.is_retryable() {
                if attempt > 1 {
                    LogContext::new("retry", &self.operation_name)
                        .with_retry_count(attempt)
                        .with_metadata("reason", serde_json::json!("non_retryable"))
                        .warn(&format!("Non-retryable error, giving up: {}", error));
                }
                return Err(error);
            }

            ErrorLogger::log_retry_attempt(&error, attempt, max_attempts);
            if attempt >= max_attempts {
                return Err(error);
            }

            let delay = match error.retry_after() {
                Some(seconds) => {
                    Duration::from_secs(seconds).min(Duration::from_millis(self.config.max_delay_ms))
                }
                None => self.calculate_delay(attempt),
            };

            LogContext::new("retry", &self.operation_name)
                .with_retry_count(attempt)
                .with_metadata("delay_ms", serde_json::json!(delay.as_millis() as u64))
                .debug(&format!(
                    "Retrying in {}ms (attempt {} of {})",
                    delay.as_millis(),
                    attempt + 1,
                    max_attempts
                ));

            sleep(delay).await;
            attempt += 1;
        }
    }

    /// Calculate delay after the given failed attempt
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        let base_delay = self.config.initial_delay_ms as f64;
        let exponential_delay =
            base_delay * self.config.backoff_multiplier.powi(attempt.saturating_sub(1) as i32);

        let capped_delay = exponential_delay.min(self.config.max_delay_ms as f64);

        let final_delay = if self.config.jitter {
            let jitter_factor = 0.1;
            let jitter = capped_delay * jitter_factor * (rand::random::<f64>() - 0.5);
            (capped_delay + jitter).max(0.0)
        } else {
            capped_delay
        };

        Duration::from_millis(final_delay as u64)
    }
}
