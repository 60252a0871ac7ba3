//! Severity tiers and their cooldowns

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::constants::alerts;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeverityTier {
    Critical,
    CriticalUrgent,
    High,
    Medium,
    Low,
    Info,
}

const fn minutes(count: u64) -> Duration {
    Duration::from_secs(count * 60)
}

impl SeverityTier {
    /// Minimum time between two notifications for the same key.
    /// `None` means the key never re-fires until it is cleared.
    pub fn cooldown(self) -> Option<Duration> {
        match self {
            SeverityTier::Critical => Some(minutes(alerts::CRITICAL_COOLDOWN_MINUTES)),
            SeverityTier::CriticalUrgent => Some(minutes(alerts::CRITICAL_URGENT_COOLDOWN_MINUTES)),
            SeverityTier::High => Some(minutes(alerts::HIGH_COOLDOWN_MINUTES)),
            SeverityTier::Medium => Some(minutes(alerts::MEDIUM_COOLDOWN_MINUTES)),
            SeverityTier::Low => Some(minutes(alerts::LOW_COOLDOWN_MINUTES)),
            SeverityTier::Info => None,
        }
    }

    /// Upper bound on how long the condition may exist before it is noticed
    pub fn detection_delay(self) -> Duration {
        match self {
            SeverityTier::Critical | SeverityTier::CriticalUrgent => Duration::from_secs(1),
            SeverityTier::High => Duration::from_secs(30),
            SeverityTier::Medium => minutes(2),
            SeverityTier::Low => minutes(6 * 60),
            SeverityTier::Info => Duration::ZERO,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SeverityTier::Critical => "CRITICAL",
            SeverityTier::CriticalUrgent => "CRITICAL_URGENT",
            SeverityTier::High => "HIGH",
            SeverityTier::Medium => "MEDIUM",
            SeverityTier::Low => "LOW",
            SeverityTier::Info => "INFO",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            SeverityTier::Critical | SeverityTier::CriticalUrgent => "🚨",
            SeverityTier::High => "⚠️",
            SeverityTier::Medium => "🔶",
            SeverityTier::Low => "🔷",
            SeverityTier::Info => "ℹ️",
        }
    }
}

impl fmt::Display for SeverityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
