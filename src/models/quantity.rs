use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;
use crate::rpc::params::RpcValue;

/// Parse a `0x`-prefixed hex quantity into a u64
pub fn parse_quantity_u64(hex_str: &str) -> Result<u64, ValidationError> {
    let digits = quantity_digits(hex_str)?;
    u64::from_str_radix(digits, 16)
        .map_err(|e| ValidationError::InvalidQuantity(format!("{}: {}", hex_str, e)))
}

/// Parse a `0x`-prefixed hex quantity into a u128 (wei amounts)
pub fn parse_quantity_u128(hex_str: &str) -> Result<u128, ValidationError> {
    let digits = quantity_digits(hex_str)?;
    u128::from_str_radix(digits, 16)
        .map_err(|e| ValidationError::InvalidQuantity(format!("{}: {}", hex_str, e)))
}

fn quantity_digits(hex_str: &str) -> Result<&str, ValidationError> {
    let digits = hex_str
        .strip_prefix("0x")
        .or_else(|| hex_str.strip_prefix("0X"))
        .ok_or_else(|| ValidationError::InvalidQuantity(format!("{}: missing 0x prefix", hex_str)))?;
    if digits.is_empty() {
        return Err(ValidationError::InvalidQuantity(format!("{}: no digits", hex_str)));
    }
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(ValidationError::InvalidQuantity(format!(
            "{}: contains non-hexadecimal characters",
            hex_str
        )));
    }
    Ok(digits)
}

/// Encode a number as a hex quantity
pub fn to_quantity(value: u64) -> String {
    format!("0x{:x}", value)
}

/// Lowercase an address and strip its 0x prefix
pub fn normalize_address(address: &str) -> String {
    strip_hex_prefix(address.trim()).to_lowercase()
}

fn strip_hex_prefix(value: &str) -> &str {
    value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value)
}

/// Validate a 20-byte hex address and return it in `0x`-prefixed lowercase form
pub fn validate_address(address: &str) -> Result<String, ValidationError> {
    let normalized = normalize_address(address);

    if normalized.len() != 40 {
        return Err(ValidationError::InvalidAddress(format!(
            "{}: expected 40 hex characters, got {}",
            address,
            normalized.len()
        )));
    }
    if !normalized.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ValidationError::InvalidAddress(format!(
            "{}: contains non-hexadecimal characters",
            address
        )));
    }

    Ok(format!("0x{}", normalized))
}

/// Validate a 32-byte hex hash (block or transaction)
pub fn validate_hash(hash: &str) -> Result<String, ValidationError> {
    let digits = strip_hex_prefix(hash.trim()).to_lowercase();

    if digits.len() != 64 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ValidationError::InvalidHash(hash.to_string()));
    }

    Ok(format!("0x{}", digits))
}

/// Block selector accepted by state-reading methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlockTag {
    #[default]
    Latest,
    Earliest,
    Pending,
    Safe,
    Finalized,
    Number(u64),
}

impl fmt::Display for BlockTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockTag::Latest => write!(f, "latest"),
            BlockTag::Earliest => write!(f, "earliest"),
            BlockTag::Pending => write!(f, "pending"),
            BlockTag::Safe => write!(f, "safe"),
            BlockTag::Finalized => write!(f, "finalized"),
            BlockTag::Number(n) => write!(f, "{}", to_quantity(*n)),
        }
    }
}

impl FromStr for BlockTag {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim().to_lowercase();
        match tag.as_str() {
            "latest" => Ok(BlockTag::Latest),
            "earliest" => Ok(BlockTag::Earliest),
            "pending" => Ok(BlockTag::Pending),
            "safe" => Ok(BlockTag::Safe),
            "finalized" => Ok(BlockTag::Finalized),
            _ if tag.starts_with("0x") => parse_quantity_u64(&tag)
                .map(BlockTag::Number)
                .map_err(|_| ValidationError::InvalidBlockTag(s.to_string())),
            _ if !tag.is_empty() && tag.bytes().all(|b| b.is_ascii_digit()) => tag
                .parse::<u64>()
                .map(BlockTag::Number)
                .map_err(|_| ValidationError::InvalidBlockTag(s.to_string())),
            _ => Err(ValidationError::InvalidBlockTag(s.to_string())),
        }
    }
}

impl From<BlockTag> for RpcValue {
    fn from(tag: BlockTag) -> Self {
        RpcValue::String(tag.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_quantity_u64() {
        assert_eq!(parse_quantity_u64("0x10").unwrap(), 16);
        assert_eq!(parse_quantity_u64("0x0").unwrap(), 0);
        assert_eq!(parse_quantity_u64("0X1f").unwrap(), 31);
        assert!(parse_quantity_u64("10").is_err());
        assert!(parse_quantity_u64("0x").is_err());
        assert!(parse_quantity_u64("0xzz").is_err());
        assert!(parse_quantity_u64("0x10000000000000000").is_err());
    }

    #[test]
    fn test_quantity_rejects_sign() {
        assert!(parse_quantity_u64("0x+10").is_err());
        assert!(parse_quantity_u128("0x+de0b6b3a7640000").is_err());
        assert!(parse_quantity_u64("0x-1").is_err());
    }

    #[test]
    fn test_parse_quantity_u128() {
        // 1 ether in wei
        assert_eq!(
            parse_quantity_u128("0xde0b6b3a7640000").unwrap(),
            1_000_000_000_000_000_000u128
        );
        assert_eq!(parse_quantity_u128("0x10000000000000000").unwrap(), 1u128 << 64);
    }

    #[test]
    fn test_to_quantity() {
        assert_eq!(to_quantity(0), "0x0");
        assert_eq!(to_quantity(255), "0xff");
    }

    #[test]
    fn test_validate_address() {
        let checksummed = "0x6671f7552df0fbAF762Bd40aEd1cA3ec670d6161";
        assert_eq!(
            validate_address(checksummed).unwrap(),
            "0x6671f7552df0fbaf762bd40aed1ca3ec670d6161"
        );
        assert!(validate_address("6671f7552df0fbAF762Bd40aEd1cA3ec670d6161").is_ok());
        assert!(validate_address("0x1234").is_err());
        assert!(validate_address("0xg671f7552df0fbAF762Bd40aEd1cA3ec670d6161").is_err());
    }

    #[test]
    fn test_validate_hash() {
        let hash = format!("0x{}", "AB".repeat(32));
        assert_eq!(validate_hash(&hash).unwrap(), format!("0x{}", "ab".repeat(32)));
        assert!(validate_hash("0x1234").is_err());
    }

    #[test]
    fn test_block_tag_parsing() {
        assert_eq!("latest".parse::<BlockTag>().unwrap(), BlockTag::Latest);
        assert_eq!("Finalized".parse::<BlockTag>().unwrap(), BlockTag::Finalized);
        assert_eq!("100".parse::<BlockTag>().unwrap(), BlockTag::Number(100));
        assert_eq!("0x64".parse::<BlockTag>().unwrap(), BlockTag::Number(100));
        assert!("newest".parse::<BlockTag>().is_err());
        assert!("0x".parse::<BlockTag>().is_err());
        assert!("+5".parse::<BlockTag>().is_err());
        assert!("0x+5".parse::<BlockTag>().is_err());
        assert!("".parse::<BlockTag>().is_err());
    }

    #[test]
    fn test_block_tag_wire_form() {
        assert_eq!(BlockTag::Number(100).to_string(), "0x64");
        assert_eq!(RpcValue::from(BlockTag::Pending), RpcValue::String("pending".to_string()));
    }
}
