use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::gate::{AlertGate, AlertKey};
use super::notifier::Notifier;
use super::policy::SeverityTier;
use crate::errors::DeliveryError;
use crate::health::types::{ProbeResult, ProbeStatus};

/// What the service did with one probe result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertOutcome {
    /// Notification sent (or attempted)
    Fired,
    /// Triggering, but inside the cooldown window
    Suppressed,
    /// Healthy; key had not fired
    Cleared,
    /// Healthy; key had fired and was cleared
    Recovered,
    /// Skipped or unknown result, gate untouched
    Ignored,
}

/// Routes probe results through the alert gate to the notification channel.
///
/// The gate sits behind one mutex shared by block-triggered probes and
/// timers, which serializes every AlertState mutation.
pub struct AlertService {
    notifier: Arc<dyn Notifier>,
    gate: Mutex<AlertGate>,
    recovery_notices: bool,
}

impl AlertService {
    pub fn new(notifier: Arc<dyn Notifier>, recovery_notices: bool) -> Self {
        Self {
            notifier,
            gate: Mutex::new(AlertGate::new()),
            recovery_notices,
        }
    }

    pub fn channel_name(&self) -> &'static str {
        self.notifier.name()
    }

    pub async fn process(&self, result: &ProbeResult) -> AlertOutcome {
        match result.status {
            ProbeStatus::Ok => {
                let had_fired = self.gate.lock().await.clear(&result.key);
                if !had_fired {
                    return AlertOutcome::Cleared;
                }

                info!("{} recovered: {}", result.key, result.message);
                if self.recovery_notices {
                    let message = format!("✅ [RECOVERED] {}\n{}", result.key, result.message);
                    self.deliver(&result.key, &message, SeverityTier::Info).await;
                }
                AlertOutcome::Recovered
            }
            ProbeStatus::Warning | ProbeStatus::Error => {
                let Some(tier) = result.tier else {
                    debug!("{} is {} without a tier, not alerting", result.key, result.status);
                    return AlertOutcome::Ignored;
                };

                let should_send = self.gate.lock().await.should_fire(&result.key, tier.cooldown());
                if !should_send {
                    return AlertOutcome::Suppressed;
                }

                self.deliver(&result.key, &format_alert(result, tier), tier).await;
                AlertOutcome::Fired
            }
            ProbeStatus::Skipped | ProbeStatus::Unknown => {
                debug!("{} is {}: {}", result.key, result.status, result.message);
                AlertOutcome::Ignored
            }
        }
    }

    /// Bypass the gate, for fatal and lifecycle notices
    pub async fn send_immediate(&self, message: &str, tier: SeverityTier) -> Result<(), DeliveryError> {
        self.notifier.send(message, tier).await
    }

    /// Startup connectivity check
    pub async fn test_channel(&self) -> Result<(), DeliveryError> {
        self.notifier
            .send("ℹ️ Node monitor started", SeverityTier::Info)
            .await
    }

    pub async fn active_alerts(&self) -> usize {
        self.gate.lock().await.active_count()
    }

    // Delivery failures are logged and dropped: no retry, no alert about alerting
    async fn deliver(&self, key: &AlertKey, message: &str, tier: SeverityTier) {
        match self.notifier.send(message, tier).await {
            Ok(()) => info!("Alert sent via {} for {} [{}]", self.notifier.name(), key, tier),
            Err(e) => warn!("Failed to send alert for {}: {}", key, e),
        }
    }
}

pub fn format_alert(result: &ProbeResult, tier: SeverityTier) -> String {
    format!(
        "{} [{}] {} ({})\n{}",
        tier.icon(),
        tier,
        result.key.target,
        result.key.condition,
        result.message
    )
}
