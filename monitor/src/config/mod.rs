pub mod manager;
pub mod secrets;

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::constants::{defaults, http, reconnect, thresholds};
use crate::errors::ConfigError;

pub use manager::ConfigManager;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Run the full probe battery on a fixed interval
    #[default]
    Poll,
    /// Run block probes on every new head received over WebSocket
    Push,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub mode: Mode,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_seconds: u64,
    #[serde(default = "default_rpc_timeout")]
    pub rpc_timeout_seconds: u64,
    #[serde(default = "default_reference_timeout")]
    pub reference_timeout_seconds: u64,
    pub reference_rpc_urls: Vec<String>,
    #[serde(default = "default_true")]
    pub recovery_notices: bool,
    pub targets: Vec<TargetConfig>,
    #[serde(default)]
    pub thresholds: Thresholds,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub reconnect: ReconnectConfig,
    #[serde(default)]
    pub notifications: NotificationConfig,
}

/// One monitored endpoint. A node pair sets `consensus_url` and
/// `metrics_url`; a standalone RPC endpoint leaves them out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    pub name: String,
    pub rpc_url: String,
    pub ws_url: Option<String>,
    pub expected_network_id: u64,
    pub metrics_url: Option<String>,
    pub consensus_url: Option<String>,
    /// Execution client name used in alert keys, e.g. "reth"
    #[serde(default = "default_client")]
    pub client: String,
    pub release_api_url: Option<String>,
    /// Consensus client name used in alert keys, e.g. "lighthouse"
    pub consensus_client: Option<String>,
    pub consensus_release_api_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub max_block_delay: u64,
    pub ahead_threshold: u64,
    pub fork_check_depth: u64,
    pub max_block_age_seconds: u64,
    pub heartbeat_seconds: u64,
    pub stall_seconds: u64,
    pub min_peers: u64,
    pub max_memory_bytes: u64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            max_block_delay: thresholds::MAX_BLOCK_DELAY,
            ahead_threshold: thresholds::AHEAD_THRESHOLD,
            fork_check_depth: thresholds::FORK_CHECK_DEPTH,
            max_block_age_seconds: thresholds::MAX_BLOCK_AGE_SECONDS,
            heartbeat_seconds: thresholds::HEARTBEAT_SECONDS,
            stall_seconds: thresholds::STALL_SECONDS,
            min_peers: thresholds::MIN_PEERS,
            max_memory_bytes: thresholds::MAX_MEMORY_BYTES,
        }
    }
}

/// Timers for the slower probes in push mode
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub metrics_interval_seconds: u64,
    pub consensus_interval_seconds: u64,
    pub heartbeat_interval_seconds: u64,
    pub version_interval_seconds: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            metrics_interval_seconds: defaults::METRICS_INTERVAL_SECONDS,
            consensus_interval_seconds: defaults::CONSENSUS_INTERVAL_SECONDS,
            heartbeat_interval_seconds: defaults::HEARTBEAT_INTERVAL_SECONDS,
            version_interval_seconds: defaults::VERSION_INTERVAL_SECONDS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconnectConfig {
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub max_attempts: u32,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: reconnect::BASE_DELAY_MS,
            max_delay_ms: reconnect::MAX_DELAY_MS,
            max_attempts: reconnect::MAX_ATTEMPTS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    #[default]
    Webhook,
    Telegram,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub enabled: bool,
    pub channel: Channel,
    pub webhook_url: Option<String>,
    pub telegram_bot_token: Option<String>,
    pub telegram_chat_id: Option<i64>,
    pub telegram_api_base: Option<String>,
}

fn default_poll_interval() -> u64 {
    defaults::POLL_INTERVAL_SECONDS
}

fn default_rpc_timeout() -> u64 {
    http::RPC_TIMEOUT.as_secs()
}

fn default_reference_timeout() -> u64 {
    http::REFERENCE_TIMEOUT.as_secs()
}

fn default_true() -> bool {
    true
}

fn default_client() -> String {
    "reth".to_string()
}

impl Config {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_seconds)
    }

    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_secs(self.rpc_timeout_seconds)
    }

    pub fn reference_timeout(&self) -> Duration {
        Duration::from_secs(self.reference_timeout_seconds)
    }

    /// Reject configurations the monitor cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.targets.is_empty() {
            return Err(ConfigError::MissingRequired {
                field: "targets".to_string(),
            });
        }
        if self.reference_rpc_urls.is_empty() {
            return Err(ConfigError::MissingRequired {
                field: "reference_rpc_urls".to_string(),
            });
        }
        if self.reference_rpc_urls.iter().any(|url| url.trim().is_empty()) {
            return Err(ConfigError::InvalidValue {
                field: "reference_rpc_urls".to_string(),
                reason: "empty URL".to_string(),
            });
        }

        for (field, value) in [
            ("poll_interval_seconds", self.poll_interval_seconds),
            ("rpc_timeout_seconds", self.rpc_timeout_seconds),
            ("reference_timeout_seconds", self.reference_timeout_seconds),
            ("schedule.metrics_interval_seconds", self.schedule.metrics_interval_seconds),
            ("schedule.consensus_interval_seconds", self.schedule.consensus_interval_seconds),
            ("schedule.heartbeat_interval_seconds", self.schedule.heartbeat_interval_seconds),
            ("schedule.version_interval_seconds", self.schedule.version_interval_seconds),
        ] {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    reason: "must be greater than zero".to_string(),
                });
            }
        }

        let mut names = std::collections::HashSet::new();
        for target in &self.targets {
            if target.name.trim().is_empty() {
                return Err(ConfigError::MissingRequired {
                    field: "targets.name".to_string(),
                });
            }
            if !names.insert(target.name.as_str()) {
                return Err(ConfigError::InvalidValue {
                    field: "targets.name".to_string(),
                    reason: format!("duplicate target '{}'", target.name),
                });
            }
            if target.rpc_url.trim().is_empty() {
                return Err(ConfigError::MissingRequired {
                    field: format!("targets.{}.rpc_url", target.name),
                });
            }
            if self.mode == Mode::Push && target.ws_url.is_none() {
                tracing::warn!(
                    "Target {} has no ws_url, its block probes will be polled",
                    target.name
                );
            }
        }

        if self.notifications.enabled {
            match self.notifications.channel {
                Channel::Webhook if self.notifications.webhook_url.is_none() => {
                    return Err(ConfigError::MissingRequired {
                        field: "notifications.webhook_url".to_string(),
                    });
                }
                Channel::Telegram
                    if self.notifications.telegram_bot_token.is_none()
                        || self.notifications.telegram_chat_id.is_none() =>
                {
                    return Err(ConfigError::MissingRequired {
                        field: "notifications.telegram_bot_token / telegram_chat_id".to_string(),
                    });
                }
                _ => {}
            }
        }

        Ok(())
    }
}
