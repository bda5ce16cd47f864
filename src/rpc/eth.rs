//! Typed wrappers over read-only `eth_*`, `net_*` and `web3_*` methods.

use serde_json::json;
use std::time::Duration;
use tokio::time::sleep;

use crate::error::{ClientError, RpcError};
use crate::logging::{LogContext, MetricsLogger};
use crate::models::{
    parse_quantity_u128, parse_quantity_u64, validate_address, validate_hash, Block, BlockTag,
    TransactionReceipt,
};
use crate::rpc::client::RpcClient;
use crate::rpc::params::RpcValue;

impl RpcClient {
    async fn quantity_u64(&self, method: &str, params: Vec<RpcValue>) -> Result<u64, RpcError> {
        let hex: String = self.call_typed(method, params).await?;
        parse_quantity_u64(&hex).map_err(|e| RpcError::unexpected_result(method, e.to_string()))
    }

    async fn quantity_u128(&self, method: &str, params: Vec<RpcValue>) -> Result<u128, RpcError> {
        let hex: String = self.call_typed(method, params).await?;
        parse_quantity_u128(&hex).map_err(|e| RpcError::unexpected_result(method, e.to_string()))
    }

    /// Number of the most recent block
    pub async fn block_number(&self) -> Result<u64, RpcError> {
        let block_number = self.quantity_u64("eth_blockNumber", vec![]).await?;
        LogContext::new("rpc_client", "block_number")
            .with_metadata("block_number", json!(block_number))
            .debug(&format!("Retrieved latest block number: {}", block_number));
        Ok(block_number)
    }

    pub async fn chain_id(&self) -> Result<u64, RpcError> {
        self.quantity_u64("eth_chainId", vec![]).await
    }

    /// Current gas price in wei
    pub async fn gas_price(&self) -> Result<u128, RpcError> {
        self.quantity_u128("eth_gasPrice", vec![]).await
    }

    /// Balance of `address` in wei
    pub async fn get_balance(&self, address: &str, block: BlockTag) -> Result<u128, ClientError> {
        let address = validate_address(address)?;
        let balance = self
            .quantity_u128("eth_getBalance", vec![address.into(), block.into()])
            .await?;
        Ok(balance)
    }

    pub async fn get_transaction_count(
        &self,
        address: &str,
        block: BlockTag,
    ) -> Result<u64, ClientError> {
        let address = validate_address(address)?;
        let count = self
            .quantity_u64("eth_getTransactionCount", vec![address.into(), block.into()])
            .await?;
        Ok(count)
    }

    /// `None` when the node does not know the block
    pub async fn get_block_by_number(
        &self,
        block: BlockTag,
        full_transactions: bool,
    ) -> Result<Option<Block>, RpcError> {
        let block: Option<Block> = self
            .call_typed(
                "eth_getBlockByNumber",
                vec![block.into(), full_transactions.into()],
            )
            .await?;

        if let Some(found) = &block {
            LogContext::new("rpc_client", "get_block_by_number")
                .with_metadata("block_number", json!(found.number))
                .with_metadata("transaction_count", json!(found.transactions.len()))
                .debug("Retrieved block");
        }

        Ok(block)
    }

    /// `None` while the transaction is pending or unknown
    pub async fn get_transaction_receipt(
        &self,
        tx_hash: &str,
    ) -> Result<Option<TransactionReceipt>, ClientError> {
        let tx_hash = validate_hash(tx_hash)?;
        let receipt = self
            .call_typed("eth_getTransactionReceipt", vec![tx_hash.into()])
            .await?;
        Ok(receipt)
    }

    pub async fn client_version(&self) -> Result<String, RpcError> {
        self.call_typed("web3_clientVersion", vec![]).await
    }

    pub async fn net_version(&self) -> Result<String, RpcError> {
        self.call_typed("net_version", vec![]).await
    }

    /// Poll for a receipt until it appears or `max_attempts` queries were made.
    ///
    /// Failed queries are logged and count as attempts. At least one query
    /// is always made.
    pub async fn wait_for_receipt(
        &self,
        tx_hash: &str,
        interval: Duration,
        max_attempts: u32,
    ) -> Result<TransactionReceipt, ClientError> {
        let tx_hash = validate_hash(tx_hash)?;
        let max_attempts = max_attempts.max(1);
        let what = format!("receipt {}", tx_hash);

        LogContext::new("rpc_client", "wait_for_receipt")
            .with_metadata("transaction_hash", json!(tx_hash))
            .with_metadata("interval_ms", json!(interval.as_millis() as u64))
            .info(&format!("Starting to poll transaction {}", tx_hash));

        for attempt in 1..=max_attempts {
            match self.get_transaction_receipt(&tx_hash).await {
                Ok(Some(receipt)) => {
                    MetricsLogger::log_poll_progress(&what, attempt, max_attempts, true);
                    LogContext::new("rpc_client", "wait_for_receipt")
                        .with_metadata("transaction_hash", json!(tx_hash))
                        .with_metadata("status", json!(receipt.status))
                        .success(&format!("Receipt found in block {}", receipt.block_number));
                    return Ok(receipt);
                }
                Ok(None) => MetricsLogger::log_poll_progress(&what, attempt, max_attempts, false),
                Err(e) => {
                    LogContext::new("rpc_client", "wait_for_receipt")
                        .with_retry_count(attempt)
                        .error(&format!(
                            "Error polling transaction (attempt {}): {}",
                            attempt, e
                        ));
                }
            }

            if attempt < max_attempts {
                sleep(interval).await;
            }
        }

        Err(ClientError::PollingExhausted {
            what,
            attempts: max_attempts,
        })
    }
}
