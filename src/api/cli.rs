use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::logging::LogContext;
use crate::models::BlockTag;
use crate::rpc::{RpcClient, RpcValue};

#[derive(Parser, Debug)]
#[command(name = "evm-rpc", version, about = "Query an Ethereum JSON-RPC node")]
pub struct Cli {
    /// Node endpoint URL (overrides RPC_URL and the config file)
    #[arg(long, global = true)]
    pub endpoint: Option<String>,

    /// Path to a TOML configuration file
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Call any method; each param is parsed as JSON, or taken as a string
    Call {
        method: String,
        params: Vec<String>,
    },
    /// Latest block number
    BlockNumber,
    /// Chain id of the connected network
    ChainId,
    /// Current gas price in wei
    GasPrice,
    /// Node client version string
    ClientVersion,
    /// Balance of an address in wei
    Balance {
        address: String,
        #[arg(long, default_value = "latest")]
        block: BlockTag,
    },
    /// Transaction count (nonce) of an address
    Nonce {
        address: String,
        #[arg(long, default_value = "latest")]
        block: BlockTag,
    },
    /// Fetch a block by number or tag
    Block {
        #[arg(default_value = "latest")]
        block: BlockTag,
        /// Include full transaction objects
        #[arg(long)]
        full: bool,
    },
    /// Fetch a transaction receipt
    Receipt {
        hash: String,
        /// Poll until the receipt is available
        #[arg(long)]
        wait: bool,
        #[arg(long, default_value_t = 5000)]
        interval_ms: u64,
        #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u32).range(1..))]
        max_attempts: u32,
    },
    /// Print the effective configuration, or a sample file
    Config {
        #[arg(long)]
        sample: bool,
    },
}

/// Parse a command-line parameter as JSON, falling back to a plain string
pub fn parse_param(raw: &str) -> RpcValue {
    serde_json::from_str::<Value>(raw)
        .map(RpcValue::from)
        .unwrap_or_else(|_| RpcValue::String(raw.to_string()))
}

fn render_json<T: Serialize>(value: &T) -> Result<String, ClientError> {
    Ok(serde_json::to_string_pretty(value)?)
}

pub struct CliHandler {
    config: ClientConfig,
    client: RpcClient,
}

impl CliHandler {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let client = RpcClient::from_config(&config.rpc)?.with_retry(config.retry.clone());
        Ok(Self { config, client })
    }

    pub fn client(&self) -> &RpcClient {
        &self.client
    }

    /// Run a command and return what should be printed
    pub async fn execute_command(&self, command: &Commands) -> Result<String, ClientError> {
        LogContext::new("cli", "execute_command")
            .with_endpoint(self.client.endpoint())
            .debug(&format!("Executing {:?}", command));

        match command {
            Commands::Call { method, params } => {
                let params = params.iter().map(String::as_str).map(parse_param).collect();
                let result = self.client.call(method, params).await?;
                render_json(&result)
            }
            Commands::BlockNumber => Ok(self.client.block_number().await?.to_string()),
            Commands::ChainId => Ok(self.client.chain_id().await?.to_string()),
            Commands::GasPrice => Ok(self.client.gas_price().await?.to_string()),
            Commands::ClientVersion => Ok(self.client.client_version().await?),
            Commands::Balance { address, block } => {
                Ok(self.client.get_balance(address, *block).await?.to_string())
            }
            Commands::Nonce { address, block } => Ok(self
                .client
                .get_transaction_count(address, *block)
                .await?
                .to_string()),
            Commands::Block { block, full } => {
                let found = self.client.get_block_by_number(*block, *full).await?;
                render_json(&found)
            }
            Commands::Receipt {
                hash,
                wait,
                interval_ms,
                max_attempts,
            } => {
                if *wait {
                    let receipt = self
                        .client
                        .wait_for_receipt(hash, Duration::from_millis(*interval_ms), *max_attempts)
                        .await?;
                    render_json(&receipt)
                } else {
                    let receipt = self.client.get_transaction_receipt(hash).await?;
                    render_json(&receipt)
                }
            }
            Commands::Config { sample } => {
                if *sample {
                    Ok(ClientConfig::generate_sample_config()?)
                } else {
                    Ok(self.config.redacted().to_toml()?)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_param() {
        assert_eq!(parse_param("true"), RpcValue::Bool(true));
        assert_eq!(parse_param("42"), RpcValue::Number(42.into()));
        assert_eq!(parse_param("\"quoted\""), RpcValue::String("quoted".to_string()));
        assert_eq!(parse_param("0xabc"), RpcValue::String("0xabc".to_string()));
        assert_eq!(parse_param("latest"), RpcValue::String("latest".to_string()));
        assert_eq!(
            parse_param(r#"{"to":"0x01"}"#).get("to").and_then(RpcValue::as_str),
            Some("0x01")
        );
    }

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::try_parse_from([
            "evm-rpc",
            "--endpoint",
            "https://rpc.example.org",
            "call",
            "eth_getBalance",
            "0x6671f7552df0fbAF762Bd40aEd1cA3ec670d6161",
            "latest",
        ])
        .unwrap();

        assert_eq!(cli.endpoint.as_deref(), Some("https://rpc.example.org"));
        match cli.command {
            Commands::Call { method, params } => {
                assert_eq!(method, "eth_getBalance");
                assert_eq!(params.len(), 2);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_cli_block_tags() {
        let cli = Cli::try_parse_from(["evm-rpc", "block", "0x10", "--full"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Block { block: BlockTag::Number(16), full: true }
        ));

        let cli = Cli::try_parse_from(["evm-rpc", "balance", "0x01", "--block", "finalized"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Balance { block: BlockTag::Finalized, .. }
        ));

        assert!(Cli::try_parse_from(["evm-rpc", "block", "soon"]).is_err());
    }

    #[test]
    fn test_receipt_defaults() {
        let cli = Cli::try_parse_from(["evm-rpc", "receipt", "0xaa", "--wait", "-v"]).unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Receipt {
                wait,
                interval_ms,
                max_attempts,
                ..
            } => {
                assert!(wait);
                assert_eq!(interval_ms, 5000);
                assert_eq!(max_attempts, 60);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_receipt_rejects_zero_attempts() {
        assert!(Cli::try_parse_from(["evm-rpc", "receipt", "0xaa", "--max-attempts", "0"]).is_err());
        assert!(Cli::try_parse_from(["evm-rpc", "receipt", "0xaa", "--max-attempts", "1"]).is_ok());
    }

    #[tokio::test]
    async fn test_config_command_redacts_secrets() {
        let mut config = ClientConfig::default();
        config.rpc.api_key = Some("super-secret".to_string());
        let handler = CliHandler::new(config).unwrap();

        let output = handler
            .execute_command(&Commands::Config { sample: false })
            .await
            .unwrap();
        assert!(output.contains("[rpc]"));
        assert!(!output.contains("super-secret"));

        let sample = handler
            .execute_command(&Commands::Config { sample: true })
            .await
            .unwrap();
        assert!(sample.contains("X-API-KEY"));
    }
}
