//! Execution client access
//!
//! The monitored node and every reference endpoint are reached through the
//! [`ExecutionClient`] trait so that probes and the reference resolver can be
//! exercised against in-memory clients in tests.

mod client;
pub mod subscription;

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::{ParseError, TransportError};

pub use client::JsonRpcClient;
pub use subscription::{HeadEvent, HeadSubscription};

/// Block selector for `eth_getBlockByNumber`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockTag {
    Latest,
    Number(u64),
}

impl BlockTag {
    pub fn to_param(self) -> String {
        match self {
            BlockTag::Latest => "latest".to_string(),
            BlockTag::Number(number) => format!("0x{:x}", number),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockInfo {
    pub number: u64,
    pub hash: String,
    pub timestamp: u64,
}

#[async_trait]
pub trait ExecutionClient: Send + Sync {
    fn endpoint(&self) -> &str;

    async fn block_number(&self) -> Result<u64, TransportError>;

    async fn block(&self, tag: BlockTag) -> Result<BlockInfo, TransportError>;

    async fn network_id(&self) -> Result<u64, TransportError>;

    async fn raw_call(&self, method: &str, params: Value) -> Result<Value, TransportError>;

    async fn peer_count(&self) -> Result<u64, TransportError> {
        let value = self.raw_call("net_peerCount", Value::Array(vec![])).await?;
        let raw = value
            .as_str()
            .ok_or_else(|| TransportError::invalid(self.endpoint(), "net_peerCount is not a string"))?;
        parse_hex_u64(raw).map_err(|e| TransportError::invalid(self.endpoint(), e.to_string()))
    }

    async fn client_version(&self) -> Result<String, TransportError> {
        let value = self
            .raw_call("web3_clientVersion", Value::Array(vec![]))
            .await?;
        value.as_str().map(str::to_string).ok_or_else(|| {
            TransportError::invalid(self.endpoint(), "web3_clientVersion is not a string")
        })
    }
}

/// Parse a JSON-RPC hex quantity such as `0x1b4`
pub fn parse_hex_u64(raw: &str) -> Result<u64, ParseError> {
    let digits = raw
        .strip_prefix("0x")
        .or_else(|| raw.strip_prefix("0X"))
        .ok_or_else(|| ParseError::InvalidHex(raw.to_string()))?;
    if digits.is_empty() {
        return Err(ParseError::InvalidHex(raw.to_string()));
    }
    u64::from_str_radix(digits, 16).map_err(|_| ParseError::InvalidHex(raw.to_string()))
}

/// `net_version` answers in decimal, some clients answer in hex
pub fn parse_network_id(raw: &str) -> Result<u64, ParseError> {
    if raw.starts_with("0x") || raw.starts_with("0X") {
        return parse_hex_u64(raw);
    }
    raw.trim()
        .parse::<u64>()
        .map_err(|_| ParseError::InvalidNumber(raw.to_string()))
}

/// Extract number, hash and timestamp from a block or header object
pub fn parse_block(endpoint: &str, value: &Value) -> Result<BlockInfo, TransportError> {
    if value.is_null() {
        return Err(TransportError::invalid(endpoint, "block not found"));
    }

    let number = parse_hex_u64(block_field(endpoint, value, "number")?)
        .map_err(|e| TransportError::invalid(endpoint, e.to_string()))?;
    let timestamp = parse_hex_u64(block_field(endpoint, value, "timestamp")?)
        .map_err(|e| TransportError::invalid(endpoint, e.to_string()))?;
    let hash = block_field(endpoint, value, "hash")?.to_string();

    Ok(BlockInfo {
        number,
        hash,
        timestamp,
    })
}

fn block_field<'a>(endpoint: &str, value: &'a Value, name: &str) -> Result<&'a str, TransportError> {
    value
        .get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| TransportError::invalid(endpoint, format!("block is missing '{}'", name)))
}
