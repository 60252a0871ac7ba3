//! Alert deduplication
//!
//! The gate maps an [`AlertKey`] to the instant it last fired. A key that stays
//! bad fires at most once per cooldown; a key that recovers is cleared, so the
//! next bad observation fires immediately.

use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Condition monitored by a probe
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Condition {
    RpcUnreachable,
    ChainIdMismatch,
    OutOfSync,
    AheadOfCanonical,
    BlockStale,
    BlockHashMismatch,
    NoNewBlocks,
    BlockProductionStall,
    LowPeers,
    HighMemory,
    MetricsUnreachable,
    ConsensusNotSynced,
    /// Client named by the payload is behind its latest release
    Outdated(String),
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Condition::RpcUnreachable => "rpc_unreachable",
            Condition::ChainIdMismatch => "chain_id_mismatch",
            Condition::OutOfSync => "out_of_sync",
            Condition::AheadOfCanonical => "ahead_of_canonical",
            Condition::BlockStale => "block_stale",
            Condition::BlockHashMismatch => "block_hash_mismatch",
            Condition::NoNewBlocks => "no_new_blocks",
            Condition::BlockProductionStall => "block_production_stall",
            Condition::LowPeers => "low_peers",
            Condition::HighMemory => "high_memory",
            Condition::MetricsUnreachable => "metrics_unreachable",
            Condition::ConsensusNotSynced => "consensus_not_synced",
            Condition::Outdated(client) => return write!(f, "{}_outdated", client.to_lowercase()),
        };
        f.write_str(name)
    }
}

/// One recurring condition on one target. Never carries the observed value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AlertKey {
    pub target: String,
    pub condition: Condition,
}

impl AlertKey {
    pub fn new(target: impl Into<String>, condition: Condition) -> Self {
        Self {
            target: target.into(),
            condition,
        }
    }
}

impl Serialize for AlertKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl fmt::Display for AlertKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.target, self.condition)
    }
}

#[derive(Debug, Default)]
pub struct AlertGate {
    last_fired: HashMap<AlertKey, Instant>,
}

impl AlertGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn should_fire(&mut self, key: &AlertKey, cooldown: Option<Duration>) -> bool {
        self.should_fire_at(key, cooldown, Instant::now())
    }

    /// Fire if `key` is absent or its cooldown has elapsed at `now`.
    /// A `None` cooldown fires once and then stays suppressed until cleared.
    pub fn should_fire_at(&mut self, key: &AlertKey, cooldown: Option<Duration>, now: Instant) -> bool {
        match self.last_fired.get_mut(key) {
            None => {
                self.last_fired.insert(key.clone(), now);
                true
            }
            Some(last) => match cooldown {
                Some(cooldown) if now.saturating_duration_since(*last) >= cooldown => {
                    *last = now;
                    true
                }
                _ => {
                    debug!(
                        "Suppressing {} ({}s since last alert)",
                        key,
                        now.saturating_duration_since(*last).as_secs()
                    );
                    false
                }
            },
        }
    }

    /// Forget `key`. Returns whether it had fired.
    pub fn clear(&mut self, key: &AlertKey) -> bool {
        self.last_fired.remove(key).is_some()
    }

    pub fn active_count(&self) -> usize {
        self.last_fired.len()
    }
}
