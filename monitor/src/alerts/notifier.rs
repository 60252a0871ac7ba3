//! Notification channels
//!
//! A channel is chosen once from configuration. Disabled notifications use
//! [`LogNotifier`], so call sites never branch on the toggle.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use super::policy::SeverityTier;
use crate::config::{Channel, NotificationConfig};
use crate::constants::alerts;
use crate::errors::{ConfigError, DeliveryError};

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Channel name for logs
    fn name(&self) -> &'static str;

    async fn send(&self, message: &str, severity: SeverityTier) -> Result<(), DeliveryError>;
}

#[derive(Debug, Clone, Serialize)]
pub struct AlertPayload {
    pub timestamp: DateTime<Utc>,
    pub severity: SeverityTier,
    pub message: String,
}

fn http_client() -> Result<Client, ConfigError> {
    Client::builder()
        .timeout(Duration::from_secs(alerts::WEBHOOK_TIMEOUT_SECONDS))
        .build()
        .map_err(|e| ConfigError::InvalidValue {
            field: "notifications".to_string(),
            reason: format!("Failed to create HTTP client: {}", e),
        })
}

fn delivery_error(err: reqwest::Error) -> DeliveryError {
    if err.is_timeout() {
        DeliveryError::Timeout
    } else {
        DeliveryError::Request(err.to_string())
    }
}

/// POSTs an [`AlertPayload`] as JSON
pub struct WebhookNotifier {
    webhook_url: String,
    client: Client,
}

impl WebhookNotifier {
    pub fn new(webhook_url: String) -> Result<Self, ConfigError> {
        Ok(Self {
            webhook_url,
            client: http_client()?,
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    fn name(&self) -> &'static str {
        "webhook"
    }

    async fn send(&self, message: &str, severity: SeverityTier) -> Result<(), DeliveryError> {
        let payload = AlertPayload {
            timestamp: Utc::now(),
            severity,
            message: message.to_string(),
        };

        let response = self
            .client
            .post(&self.webhook_url)
            .json(&payload)
            .send()
            .await
            .map_err(delivery_error)?;

        if !response.status().is_success() {
            return Err(DeliveryError::Status(response.status().as_u16()));
        }
        Ok(())
    }
}

/// Telegram bot API `sendMessage`
pub struct TelegramNotifier {
    api_base: String,
    bot_token: String,
    chat_id: i64,
    client: Client,
}

impl TelegramNotifier {
    pub fn new(api_base: String, bot_token: String, chat_id: i64) -> Result<Self, ConfigError> {
        Ok(Self {
            api_base: api_base.trim_end_matches('/').to_string(),
            bot_token,
            chat_id,
            client: http_client()?,
        })
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    fn name(&self) -> &'static str {
        "telegram"
    }

    async fn send(&self, message: &str, _severity: SeverityTier) -> Result<(), DeliveryError> {
        let url = format!("{}/bot{}/sendMessage", self.api_base, self.bot_token);
        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({
                "chat_id": self.chat_id,
                "text": message,
                "disable_web_page_preview": true
            }))
            .send()
            .await
            .map_err(delivery_error)?;

        if !response.status().is_success() {
            return Err(DeliveryError::Status(response.status().as_u16()));
        }
        Ok(())
    }
}

/// Disabled mode: alerts go to the local log only
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn send(&self, message: &str, severity: SeverityTier) -> Result<(), DeliveryError> {
        info!("[notifications disabled] [{}] {}", severity, message);
        Ok(())
    }
}

/// Pick the channel once, from configuration
pub fn build_notifier(config: &NotificationConfig) -> Result<Arc<dyn Notifier>, ConfigError> {
    if !config.enabled {
        warn!("Notifications disabled, alerts will only be logged");
        return Ok(Arc::new(LogNotifier));
    }

    match config.channel {
        Channel::Webhook => {
            let url = config
                .webhook_url
                .clone()
                .ok_or_else(|| ConfigError::MissingRequired {
                    field: "notifications.webhook_url".to_string(),
                })?;
            Ok(Arc::new(WebhookNotifier::new(url)?))
        }
        Channel::Telegram => {
            let token = config
                .telegram_bot_token
                .clone()
                .ok_or_else(|| ConfigError::MissingRequired {
                    field: "notifications.telegram_bot_token".to_string(),
                })?;
            let chat_id = config
                .telegram_chat_id
                .ok_or_else(|| ConfigError::MissingRequired {
                    field: "notifications.telegram_chat_id".to_string(),
                })?;
            let api_base = config
                .telegram_api_base
                .clone()
                .unwrap_or_else(|| alerts::TELEGRAM_API_BASE.to_string());
            Ok(Arc::new(TelegramNotifier::new(api_base, token, chat_id)?))
        }
    }
}
