use std::time::Duration;
use tokio::time::Instant;

use super::types::{ProbeDetails, ProbeResult};
use crate::alerts::{AlertKey, Condition, SeverityTier};

/// Last block height seen for one target and when it changed
#[derive(Debug, Clone)]
pub struct BlockTracker {
    last_number: Option<u64>,
    last_seen: Instant,
}

impl BlockTracker {
    /// Starts the heartbeat clock at `now`, before any block is observed
    pub fn new(now: Instant) -> Self {
        Self {
            last_number: None,
            last_seen: now,
        }
    }

    /// Record a height. Returns true when it is a new block.
    pub fn observe(&mut self, number: u64, now: Instant) -> bool {
        match self.last_number {
            Some(last) if number <= last => false,
            _ => {
                self.last_number = Some(number);
                self.last_seen = now;
                true
            }
        }
    }

    pub fn last_number(&self) -> Option<u64> {
        self.last_number
    }

    pub fn elapsed(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_seen)
    }
}

pub fn evaluate_heartbeat(target: &str, elapsed: Duration, heartbeat_seconds: u64) -> ProbeResult {
    let key = AlertKey::new(target, Condition::NoNewBlocks);
    let seconds = elapsed.as_secs();
    let details = ProbeDetails::Elapsed { seconds };

    if seconds > heartbeat_seconds {
        ProbeResult::error(
            key,
            SeverityTier::Critical,
            format!("No new block for {}s (max {}s)", seconds, heartbeat_seconds),
        )
        .with_details(details)
    } else {
        ProbeResult::ok(key, format!("last new block {}s ago", seconds)).with_details(details)
    }
}
