pub mod chain;
pub mod quantity;

pub use chain::{Block, BlockTransactions, Log, Transaction, TransactionReceipt};
pub use quantity::{
    normalize_address, parse_quantity_u128, parse_quantity_u64, to_quantity, validate_address,
    validate_hash, BlockTag,
};
