use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::models::quantity::{parse_quantity_u128, parse_quantity_u64};

/// Block as returned by `eth_getBlockByNumber`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    /// `None` for pending blocks
    pub number: Option<String>,
    pub hash: Option<String>,
    pub parent_hash: String,
    pub timestamp: String,
    pub gas_used: String,
    pub gas_limit: String,
    #[serde(default)]
    pub base_fee_per_gas: Option<String>,
    #[serde(default)]
    pub miner: Option<String>,
    pub transactions: BlockTransactions,
}

/// Hashes only, or full objects when requested
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BlockTransactions {
    Hashes(Vec<String>),
    Full(Vec<Transaction>),
}

impl BlockTransactions {
    pub fn len(&self) -> usize {
        match self {
            BlockTransactions::Hashes(hashes) => hashes.len(),
            BlockTransactions::Full(txs) => txs.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub hash: String,
    pub from: String,
    pub to: Option<String>,
    pub value: String,
    pub nonce: String,
    pub gas: String,
    #[serde(default)]
    pub gas_price: Option<String>,
    pub input: String,
    pub block_number: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub transaction_hash: String,
    pub block_hash: String,
    pub block_number: String,
    pub from: String,
    pub to: Option<String>,
    pub gas_used: String,
    #[serde(default)]
    pub effective_gas_price: Option<String>,
    #[serde(default)]
    pub contract_address: Option<String>,
    /// `0x1` success, `0x0` failure; absent before Byzantium
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub logs: Vec<Log>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Log {
    pub address: String,
    pub topics: Vec<String>,
    pub data: String,
    #[serde(default)]
    pub block_number: Option<String>,
    #[serde(default)]
    pub transaction_hash: Option<String>,
    #[serde(default)]
    pub log_index: Option<String>,
}

impl Block {
    pub fn number_u64(&self) -> Result<Option<u64>, ValidationError> {
        self.number.as_deref().map(parse_quantity_u64).transpose()
    }

    pub fn timestamp_u64(&self) -> Result<u64, ValidationError> {
        parse_quantity_u64(&self.timestamp)
    }
}

impl Transaction {
    pub fn value_wei(&self) -> Result<u128, ValidationError> {
        parse_quantity_u128(&self.value)
    }
}

impl TransactionReceipt {
    pub fn block_number_u64(&self) -> Result<u64, ValidationError> {
        parse_quantity_u64(&self.block_number)
    }

    /// `None` when the node does not report a status
    pub fn succeeded(&self) -> Option<bool> {
        self.status.as_deref().map(|status| status == "0x1")
    }
}
