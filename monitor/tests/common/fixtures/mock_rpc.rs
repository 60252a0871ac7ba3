//! Mock execution client for testing JSON-RPC interactions
//!
//! Requests are matched on the JSON-RPC `method` (and `params` where the
//! method is parameterized), so one server can answer a whole probe battery.

use serde_json::{json, Value};
use std::time::Duration;
use wiremock::{
    matchers::{body_partial_json, method},
    Mock, MockServer, ResponseTemplate,
};

pub fn hex(value: u64) -> String {
    format!("0x{:x}", value)
}

/// Deterministic 32-byte hash; `prefix` (4 hex chars) tells chains apart
pub fn block_hash(prefix: &str, number: u64) -> String {
    format!("0x{}{:060x}", prefix, number)
}

pub fn block_json(number: u64, hash: &str, timestamp: u64) -> Value {
    json!({
        "number": hex(number),
        "hash": hash,
        "parentHash": "0x0000000000000000000000000000000000000000000000000000000000000000",
        "timestamp": hex(timestamp),
        "transactions": []
    })
}

fn rpc_result(result: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "jsonrpc": "2.0",
        "id": 1,
        "result": result
    }))
}

/// Mock JSON-RPC server that simulates an execution client
pub struct MockRpcServer {
    pub server: MockServer,
    pub base_url: String,
}

impl MockRpcServer {
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        let base_url = server.uri();
        Self { server, base_url }
    }

    /// Answer `rpc_method` with `result`
    pub async fn mock_result(&self, rpc_method: &str, result: Value) {
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "method": rpc_method })))
            .respond_with(rpc_result(result))
            .mount(&self.server)
            .await;
    }

    /// Answer `rpc_method` after `delay`
    pub async fn mock_slow_result(&self, rpc_method: &str, result: Value, delay: Duration) {
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "method": rpc_method })))
            .respond_with(rpc_result(result).set_delay(delay))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_rpc_error(&self, rpc_method: &str, code: i64, message: &str) {
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "method": rpc_method })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "error": { "code": code, "message": message }
            })))
            .mount(&self.server)
            .await;
    }

    /// `eth_getBlockByNumber` for one tag (`"latest"` or a hex number)
    pub async fn mock_block(&self, tag: &str, block: Value) {
        Mock::given(method("POST"))
            .and(body_partial_json(json!({
                "method": "eth_getBlockByNumber",
                "params": [tag]
            })))
            .respond_with(rpc_result(block))
            .mount(&self.server)
            .await;
    }

    /// A chain whose tip is `tip` stamped `tip_timestamp`, with the ten blocks
    /// below it spaced `block_time` seconds apart
    pub async fn mock_chain(&self, tip: u64, tip_timestamp: u64, block_time: u64, hash_prefix: &str) {
        self.mock_result("eth_blockNumber", json!(hex(tip))).await;
        self.mock_block(
            "latest",
            block_json(tip, &block_hash(hash_prefix, tip), tip_timestamp),
        )
        .await;

        for depth in 0..=10u64.min(tip) {
            let number = tip - depth;
            let timestamp = tip_timestamp.saturating_sub(depth * block_time);
            self.mock_block(
                &hex(number),
                block_json(number, &block_hash(hash_prefix, number), timestamp),
            )
            .await;
        }
    }

    /// A healthy node at `tip` on `network_id` with `peers` peers
    pub async fn mock_healthy_node(&self, tip: u64, tip_timestamp: u64, network_id: u64, peers: u64) {
        self.mock_chain(tip, tip_timestamp, 12, "aaaa").await;
        self.mock_result("net_version", json!(network_id.to_string())).await;
        self.mock_result("net_peerCount", json!(hex(peers))).await;
        self.mock_result(
            "web3_clientVersion",
            json!("reth/v1.2.3-4f5c9a1/x86_64-unknown-linux-gnu"),
        )
        .await;
    }

    /// Every request fails with HTTP 503
    pub async fn mock_unavailable(&self) {
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&self.server)
            .await;
    }

    pub async fn reset(&self) {
        self.server.reset().await;
    }
}
