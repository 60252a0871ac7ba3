//! Reusable test utilities:
//! - Mock HTTP servers (execution JSON-RPC, beacon node, webhook)
//! - A notifier that records what it was asked to send
//! - Test configuration builders

// Not every test binary uses every fixture
#![allow(dead_code)]
#![allow(unused_imports)]

pub mod mock_beacon;
pub mod mock_rpc;
pub mod mock_webhook;
pub mod recording_notifier;
pub mod test_config;

pub use mock_beacon::MockBeaconServer;
pub use mock_rpc::{block_hash, block_json, hex, MockRpcServer};
pub use mock_webhook::MockWebhookServer;
pub use recording_notifier::RecordingNotifier;
pub use test_config::{target_config, test_config, TestConfigDir};
