//! Central repository for timeouts, thresholds and intervals
//!
//! This module organizes constants by category so that configuration
//! defaults, probe thresholds and the alert policy share a single source
//! of truth.

use std::time::Duration;

/// HTTP client timeout constants
pub mod http {
    use super::Duration;

    /// Default timeout for JSON-RPC requests to the monitored node
    pub const RPC_TIMEOUT: Duration = Duration::from_secs(10);

    /// Per-call timeout for reference endpoint queries
    pub const REFERENCE_TIMEOUT: Duration = Duration::from_secs(10);

    /// Timeout for beacon node, metrics and release API requests
    pub const AUXILIARY_TIMEOUT: Duration = Duration::from_secs(10);

    /// User agent sent to release APIs (GitHub rejects requests without one)
    pub const USER_AGENT: &str = concat!("eth-node-monitor/", env!("CARGO_PKG_VERSION"));
}

/// Alert system constants
pub mod alerts {
    /// Webhook / bot API request timeout
    pub const WEBHOOK_TIMEOUT_SECONDS: u64 = 10;

    /// Cooldown of the CRITICAL tier
    pub const CRITICAL_COOLDOWN_MINUTES: u64 = 10;

    /// Cooldown of the CRITICAL_URGENT tier
    pub const CRITICAL_URGENT_COOLDOWN_MINUTES: u64 = 30;

    /// Cooldown of the HIGH tier
    pub const HIGH_COOLDOWN_MINUTES: u64 = 30;

    /// Cooldown of the MEDIUM tier
    pub const MEDIUM_COOLDOWN_MINUTES: u64 = 120;

    /// Cooldown of the LOW tier
    pub const LOW_COOLDOWN_MINUTES: u64 = 360;

    /// Default Telegram bot API base
    pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org";
}

/// Default probe thresholds
pub mod thresholds {
    /// Maximum blocks the node may trail the canonical height
    pub const MAX_BLOCK_DELAY: u64 = 10;

    /// Blocks the node may lead the canonical height before it is suspicious
    pub const AHEAD_THRESHOLD: u64 = 5;

    /// Depth behind the tip at which block hashes are compared
    pub const FORK_CHECK_DEPTH: u64 = 5;

    /// Maximum age of the latest block
    pub const MAX_BLOCK_AGE_SECONDS: u64 = 30;

    /// Maximum time without observing a new block
    pub const HEARTBEAT_SECONDS: u64 = 60;

    /// Maximum timestamp gap between two consecutive blocks
    pub const STALL_SECONDS: u64 = 30;

    /// Minimum connected peers
    pub const MIN_PEERS: u64 = 10;

    /// Maximum resident memory (16 GB)
    pub const MAX_MEMORY_BYTES: u64 = 16 * 1024 * 1024 * 1024;
}

/// Default configuration values
pub mod defaults {
    /// Poll mode interval in seconds
    pub const POLL_INTERVAL_SECONDS: u64 = 12;

    /// Metrics probe interval in push mode
    pub const METRICS_INTERVAL_SECONDS: u64 = 30;

    /// Consensus health probe interval in push mode
    pub const CONSENSUS_INTERVAL_SECONDS: u64 = 30;

    /// Heartbeat probe interval in push mode
    pub const HEARTBEAT_INTERVAL_SECONDS: u64 = 10;

    /// Version freshness probe interval (6 hours)
    pub const VERSION_INTERVAL_SECONDS: u64 = 6 * 60 * 60;

    /// Log a cycle summary every N cycles
    pub const SUMMARY_EVERY_CYCLES: u64 = 10;
}

/// Push-mode reconnection backoff
pub mod reconnect {
    /// First retry delay
    pub const BASE_DELAY_MS: u64 = 1_000;

    /// Delay ceiling
    pub const MAX_DELAY_MS: u64 = 60_000;

    /// Growth factor between attempts
    pub const FACTOR: u32 = 2;

    /// Attempts before the process gives up
    pub const MAX_ATTEMPTS: u32 = 10;
}

/// Prometheus metric names read from the execution client
pub mod metric_names {
    /// Resident set size of the node process
    pub const RESIDENT_MEMORY: &str = "process_resident_memory_bytes";
}
