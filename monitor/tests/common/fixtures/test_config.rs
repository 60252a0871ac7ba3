//! Test configuration builders

use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

use monitor::config::{Config, TargetConfig};

/// A bare target: execution RPC only, network id 1
pub fn target_config(name: &str, rpc_url: &str) -> TargetConfig {
    TargetConfig {
        name: name.to_string(),
        rpc_url: rpc_url.to_string(),
        ws_url: None,
        expected_network_id: 1,
        metrics_url: None,
        consensus_url: None,
        client: "reth".to_string(),
        release_api_url: None,
        consensus_client: None,
        consensus_release_api_url: None,
    }
}

/// Defaults everywhere except targets and references, short timeouts
pub fn test_config(targets: Vec<TargetConfig>, reference_rpc_urls: Vec<String>) -> Config {
    let mut config: Config = toml::from_str(
        r#"
reference_rpc_urls = ["http://unused"]
targets = []
"#,
    )
    .expect("minimal config parses");

    config.targets = targets;
    config.reference_rpc_urls = reference_rpc_urls;
    config.rpc_timeout_seconds = 2;
    config.reference_timeout_seconds = 2;
    config
}

/// Config directory on disk holding `main.toml` and optionally `secrets.toml`
pub struct TestConfigDir {
    pub dir: TempDir,
}

impl TestConfigDir {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    pub fn write_main(&self, contents: &str) -> PathBuf {
        let path = self.dir.path().join("main.toml");
        fs::write(&path, contents).expect("Failed to write main.toml");
        path
    }

    pub fn write_secrets(&self, contents: &str) -> PathBuf {
        let path = self.dir.path().join("secrets.toml");
        fs::write(&path, contents).expect("Failed to write secrets.toml");
        path
    }
}
