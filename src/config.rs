use reqwest::header::{HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::Path;

use crate::error::ConfigError;
use crate::retry::RetryConfig;

const DEFAULT_CONFIG_FILE: &str = "config.toml";
const REDACTED: &str = "***";

/// Main application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub rpc: RpcConfig,
    pub retry: RetryConfig,
    pub logging: LoggingConfig,
}

/// Node endpoint configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RpcConfig {
    /// JSON-RPC endpoint URL
    pub endpoint: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// API key sent in `api_key_header`
    pub api_key: Option<String>,
    pub api_key_header: String,
    /// Sent as `Authorization: Bearer <token>`
    pub bearer_token: Option<String>,
    /// Extra static headers sent with every request
    pub headers: BTreeMap<String, String>,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8545".to_string(),
            timeout_seconds: 30,
            api_key: None,
            api_key_header: "X-API-KEY".to_string(),
            bearer_token: None,
            headers: BTreeMap::new(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl RpcConfig {
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }

    /// Validate endpoint, timeout and headers
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.endpoint.starts_with("http://") && !self.endpoint.starts_with("https://") {
            return Err(ConfigError::InvalidUrl(self.endpoint.clone()));
        }

        if self.timeout_seconds == 0 || self.timeout_seconds > 300 {
            return Err(ConfigError::InvalidValue {
                key: "rpc.timeout_seconds".to_string(),
                value: self.timeout_seconds.to_string(),
            });
        }

        if let Some(api_key) = &self.api_key {
            validate_header(&self.api_key_header, api_key)?;
        }
        if let Some(token) = &self.bearer_token {
            validate_header("Authorization", &format!("Bearer {}", token))?;
        }
        for (name, value) in &self.headers {
            validate_header(name, value)?;
        }

        Ok(())
    }
}

fn validate_header(name: &str, value: &str) -> Result<(), ConfigError> {
    HeaderName::from_bytes(name.as_bytes()).map_err(|e| ConfigError::InvalidHeader {
        name: name.to_string(),
        reason: e.to_string(),
    })?;
    HeaderValue::from_str(value).map_err(|e| ConfigError::InvalidHeader {
        name: name.to_string(),
        reason: e.to_string(),
    })?;
    Ok(())
}

/// Read an environment variable, treating empty values as unset
fn env_value(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    match env_value(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                value: raw,
            }),
        None => Ok(None),
    }
}

/// Parse `name=value,name2=value2`
fn parse_header_list(raw: &str) -> Result<BTreeMap<String, String>, ConfigError> {
    let mut headers = BTreeMap::new();
    for pair in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (name, value) = pair.split_once('=').ok_or_else(|| ConfigError::InvalidValue {
            key: "RPC_HEADERS".to_string(),
            value: pair.to_string(),
        })?;
        headers.insert(name.trim().to_string(), value.trim().to_string());
    }
    Ok(headers)
}

/// Load variables from `path`, or `.env` in the working directory, if present.
///
/// Variables already set in the process environment win.
pub fn load_dotenv(path: Option<&Path>) -> Result<(), ConfigError> {
    let loaded = match path {
        Some(path) => dotenvy::from_path(path),
        None => dotenvy::dotenv().map(|_| ()),
    };
    match loaded {
        Ok(()) => Ok(()),
        Err(e) if e.not_found() => Ok(()),
        Err(e) => Err(ConfigError::Dotenv(e.to_string())),
    }
}

impl ClientConfig {
    /// Load `.env`, the config file (`path` if given) and environment
    /// overrides, then validate. Environment variables take precedence over
    /// file values.
    pub fn load_with_file(path: Option<&str>) -> Result<Self, ConfigError> {
        load_dotenv(None)?;
        let mut config = match path {
            Some(path) => Self::load_from_path(path)?,
            None => Self::load_from_file()?,
        };
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `CONFIG_FILE` or `./config.toml`; defaults when absent
    pub fn load_from_file() -> Result<Self, ConfigError> {
        let config_path =
            env_value("CONFIG_FILE").unwrap_or_else(|| DEFAULT_CONFIG_FILE.to_string());

        if !Path::new(&config_path).exists() {
            return Ok(Self::default());
        }

        Self::load_from_path(&config_path)
    }

    /// Load from a TOML file that must exist
    pub fn load_from_path(path: &str) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound(path.to_string()))?;
        toml::from_str(&content).map_err(|e| ConfigError::Parsing(e.to_string()))
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(endpoint) = env_value("RPC_URL") {
            self.rpc.endpoint = endpoint;
        }
        if let Some(api_key) = env_value("RPC_API_KEY") {
            self.rpc.api_key = Some(api_key);
        }
        if let Some(header) = env_value("RPC_API_KEY_HEADER") {
            self.rpc.api_key_header = header;
        }
        if let Some(token) = env_value("RPC_BEARER_TOKEN") {
            self.rpc.bearer_token = Some(token);
        }
        if let Some(raw) = env_value("RPC_HEADERS") {
            self.rpc.headers.extend(parse_header_list(&raw)?);
        }
        if let Some(timeout) = parse_env("RPC_TIMEOUT_SECONDS")? {
            self.rpc.timeout_seconds = timeout;
        }

        if let Some(attempts) = parse_env("RPC_MAX_ATTEMPTS")? {
            self.retry.max_attempts = attempts;
        }
        if let Some(delay) = parse_env("RPC_RETRY_DELAY_MS")? {
            self.retry.initial_delay_ms = delay;
        }
        if let Some(delay) = parse_env("RPC_MAX_RETRY_DELAY_MS")? {
            self.retry.max_delay_ms = delay;
        }

        if let Some(level) = env_value("LOG_LEVEL") {
            self.logging.level = level.to_lowercase();
        }
        if let Some(format) = env_value("LOG_FORMAT") {
            self.logging.format = format.to_lowercase();
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.rpc.validate()?;

        if self.retry.max_attempts == 0 || self.retry.max_attempts > 20 {
            return Err(ConfigError::InvalidValue {
                key: "retry.max_attempts".to_string(),
                value: self.retry.max_attempts.to_string(),
            });
        }
        if self.retry.backoff_multiplier < 1.0 {
            return Err(ConfigError::InvalidValue {
                key: "retry.backoff_multiplier".to_string(),
                value: self.retry.backoff_multiplier.to_string(),
            });
        }
        if self.retry.initial_delay_ms > self.retry.max_delay_ms {
            return Err(ConfigError::InvalidValue {
                key: "retry.initial_delay_ms".to_string(),
                value: self.retry.initial_delay_ms.to_string(),
            });
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::InvalidValue {
                key: "logging.level".to_string(),
                value: self.logging.level.clone(),
            });
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            return Err(ConfigError::InvalidValue {
                key: "logging.format".to_string(),
                value: self.logging.format.clone(),
            });
        }

        Ok(())
    }

    /// Copy with credentials masked, for display
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        if config.rpc.api_key.is_some() {
            config.rpc.api_key = Some(REDACTED.to_string());
        }
        if config.rpc.bearer_token.is_some() {
            config.rpc.bearer_token = Some(REDACTED.to_string());
        }
        for value in config.rpc.headers.values_mut() {
            *value = REDACTED.to_string();
        }
        config
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parsing(e.to_string()))
    }

    /// Generate a sample configuration file
    pub fn generate_sample_config() -> Result<String, ConfigError> {
        Self::default().to_toml()
    }
}
