use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

use super::{parse_block, parse_hex_u64, parse_network_id, BlockInfo, BlockTag, ExecutionClient};
use crate::errors::TransportError;

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

/// JSON-RPC over HTTP. Every request is bounded by the client timeout.
#[derive(Debug, Clone)]
pub struct JsonRpcClient {
    client: HttpClient,
    rpc_url: String,
}

impl JsonRpcClient {
    pub fn new(rpc_url: impl Into<String>, timeout: Duration) -> Result<Self, TransportError> {
        let rpc_url = rpc_url.into();
        let client = HttpClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::ConnectionFailed {
                endpoint: rpc_url.clone(),
                reason: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self { client, rpc_url })
    }

    async fn call(&self, method: &str, params: Value) -> Result<Value, TransportError> {
        let request_body = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": Uuid::new_v4().to_string()
        });

        let response = self
            .client
            .post(&self.rpc_url)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(&self.rpc_url, e))?;

        if !response.status().is_success() {
            return Err(TransportError::Status {
                endpoint: self.rpc_url.clone(),
                status: response.status().as_u16(),
            });
        }

        let rpc_response: RpcResponse = response
            .json()
            .await
            .map_err(|e| TransportError::invalid(&self.rpc_url, format!("Failed to parse JSON response: {}", e)))?;

        if let Some(error) = rpc_response.error {
            return Err(TransportError::Rpc {
                endpoint: self.rpc_url.clone(),
                code: error.code,
                message: error.message,
            });
        }

        debug!("{} {} ok", self.rpc_url, method);
        Ok(rpc_response.result.unwrap_or(Value::Null))
    }
}

#[async_trait]
impl ExecutionClient for JsonRpcClient {
    fn endpoint(&self) -> &str {
        &self.rpc_url
    }

    async fn block_number(&self) -> Result<u64, TransportError> {
        let value = self.call("eth_blockNumber", json!([])).await?;
        let raw = value
            .as_str()
            .ok_or_else(|| TransportError::invalid(&self.rpc_url, "eth_blockNumber is not a string"))?;
        parse_hex_u64(raw).map_err(|e| TransportError::invalid(&self.rpc_url, e.to_string()))
    }

    async fn block(&self, tag: BlockTag) -> Result<BlockInfo, TransportError> {
        let value = self
            .call("eth_getBlockByNumber", json!([tag.to_param(), false]))
            .await?;
        parse_block(&self.rpc_url, &value)
    }

    async fn network_id(&self) -> Result<u64, TransportError> {
        let value = self.call("net_version", json!([])).await?;
        let raw = value
            .as_str()
            .ok_or_else(|| TransportError::invalid(&self.rpc_url, "net_version is not a string"))?;
        parse_network_id(raw).map_err(|e| TransportError::invalid(&self.rpc_url, e.to_string()))
    }

    async fn raw_call(&self, method: &str, params: Value) -> Result<Value, TransportError> {
        self.call(method, params).await
    }
}
