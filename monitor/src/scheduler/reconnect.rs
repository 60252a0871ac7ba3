//! Subscription reconnection as a plain state machine
//!
//! Nothing here sleeps. The caller asks [`Reconnector::on_failure`] how long to
//! wait and does the waiting itself.

use std::time::Duration;

use crate::config::ReconnectConfig;
use crate::constants::reconnect;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connected,
    /// Waiting before attempt number `attempt` (1-based)
    Reconnecting { attempt: u32 },
    /// Retry budget spent
    Failed,
}

/// Capped exponential backoff: `base * factor^(attempt-1)`, never above `max_delay`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub base: Duration,
    pub factor: u32,
    pub max_delay: Duration,
    pub max_attempts: u32,
}

impl BackoffPolicy {
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1);
        let multiplier = self.factor.checked_pow(exponent).unwrap_or(u32::MAX);
        self.base
            .checked_mul(multiplier)
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::from(&ReconnectConfig::default())
    }
}

impl From<&ReconnectConfig> for BackoffPolicy {
    fn from(config: &ReconnectConfig) -> Self {
        Self {
            base: Duration::from_millis(config.base_delay_ms),
            factor: reconnect::FACTOR,
            max_delay: Duration::from_millis(config.max_delay_ms),
            max_attempts: config.max_attempts,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Reconnector {
    policy: BackoffPolicy,
    state: ConnectionState,
}

impl Reconnector {
    /// Starts disconnected, as if about to make the first attempt
    pub fn new(policy: BackoffPolicy) -> Self {
        Self {
            policy,
            state: ConnectionState::Reconnecting { attempt: 0 },
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// A successful connect resets the retry budget
    pub fn on_connected(&mut self) {
        self.state = ConnectionState::Connected;
    }

    /// Record a dropped or refused connection. Returns the delay before the
    /// next attempt, or `None` once the budget is exhausted.
    pub fn on_failure(&mut self) -> Option<Duration> {
        let attempt = match self.state {
            ConnectionState::Connected => 1,
            ConnectionState::Reconnecting { attempt } => attempt + 1,
            ConnectionState::Failed => return None,
        };

        if attempt > self.policy.max_attempts {
            self.state = ConnectionState::Failed;
            return None;
        }

        self.state = ConnectionState::Reconnecting { attempt };
        Some(self.policy.delay_for(attempt))
    }

    /// Attempts made since the last successful connection
    pub fn attempts(&self) -> u32 {
        match self.state {
            ConnectionState::Connected => 0,
            ConnectionState::Reconnecting { attempt } => attempt,
            ConnectionState::Failed => self.policy.max_attempts,
        }
    }
}
