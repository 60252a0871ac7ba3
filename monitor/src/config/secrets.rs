//! Secrets loader for notification credentials.
//!
//! Credentials live in a separate TOML file (config/secrets.toml) that should
//! be excluded from version control. Environment variables override both the
//! main configuration and the secrets file.
//!
//! Example secrets.toml:
//! ```toml
//! webhook_url = "https://hooks.example.com/nodes"
//! telegram_bot_token = "123456:ABC"
//! telegram_chat_id = -1001234567890
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::path::Path;
use tracing::{debug, info, warn};

use super::NotificationConfig;

pub const ENV_WEBHOOK_URL: &str = "MONITOR_WEBHOOK_URL";
pub const ENV_TELEGRAM_BOT_TOKEN: &str = "MONITOR_TELEGRAM_BOT_TOKEN";
pub const ENV_TELEGRAM_CHAT_ID: &str = "MONITOR_TELEGRAM_CHAT_ID";
pub const ENV_NOTIFICATIONS_ENABLED: &str = "MONITOR_NOTIFICATIONS_ENABLED";

/// Structure matching the secrets.toml file format
#[derive(Debug, Deserialize, Default)]
pub struct SecretsFile {
    pub webhook_url: Option<String>,
    pub telegram_bot_token: Option<String>,
    pub telegram_chat_id: Option<i64>,
}

/// Loader for secrets from the secrets.toml file
pub struct SecretsLoader {
    secrets: SecretsFile,
}

impl SecretsLoader {
    /// Load secrets from the specified file path.
    /// Returns an empty loader if the file doesn't exist.
    pub fn load(secrets_path: &Path) -> Result<Self> {
        if !secrets_path.exists() {
            debug!("No secrets file at {:?}", secrets_path);
            return Ok(Self {
                secrets: SecretsFile::default(),
            });
        }

        let content = std::fs::read_to_string(secrets_path)
            .with_context(|| format!("Failed to read secrets file: {:?}", secrets_path))?;

        let secrets: SecretsFile = toml::from_str(&content)
            .with_context(|| format!("Failed to parse secrets file: {:?}", secrets_path))?;

        info!("Loaded notification secrets from {:?}", secrets_path);

        Ok(Self { secrets })
    }

    /// Fill credentials the main config left empty
    pub fn apply(&self, notifications: &mut NotificationConfig) {
        if let Some(url) = &self.secrets.webhook_url {
            notifications.webhook_url.get_or_insert_with(|| url.clone());
        }
        if let Some(token) = &self.secrets.telegram_bot_token {
            notifications
                .telegram_bot_token
                .get_or_insert_with(|| token.clone());
        }
        if let Some(chat_id) = self.secrets.telegram_chat_id {
            notifications.telegram_chat_id.get_or_insert(chat_id);
        }
    }
}

/// Environment variables take precedence over every file
pub fn apply_env_overrides(notifications: &mut NotificationConfig) {
    if let Ok(url) = env::var(ENV_WEBHOOK_URL) {
        notifications.webhook_url = Some(url);
    }
    if let Ok(token) = env::var(ENV_TELEGRAM_BOT_TOKEN) {
        notifications.telegram_bot_token = Some(token);
    }
    if let Ok(raw) = env::var(ENV_TELEGRAM_CHAT_ID) {
        match raw.parse::<i64>() {
            Ok(chat_id) => notifications.telegram_chat_id = Some(chat_id),
            Err(e) => warn!("Ignoring {}='{}': {}", ENV_TELEGRAM_CHAT_ID, raw, e),
        }
    }
    if let Ok(raw) = env::var(ENV_NOTIFICATIONS_ENABLED) {
        match raw.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => notifications.enabled = true,
            "0" | "false" | "no" | "off" => notifications.enabled = false,
            _ => warn!("Ignoring {}='{}'", ENV_NOTIFICATIONS_ENABLED, raw),
        }
    }
}
