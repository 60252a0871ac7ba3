use super::secrets::{apply_env_overrides, SecretsLoader};
use super::Config;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::info;

pub struct ConfigManager {
    current_config: Arc<Config>,
}

impl ConfigManager {
    pub async fn new(config_path: impl AsRef<Path>) -> Result<Self> {
        let config = Self::load_configuration(config_path.as_ref()).await?;
        Ok(Self {
            current_config: Arc::new(config),
        })
    }

    pub fn get_current_config(&self) -> Arc<Config> {
        self.current_config.clone()
    }

    async fn load_configuration(config_path: &Path) -> Result<Config> {
        let content = fs::read_to_string(config_path)
            .await
            .with_context(|| format!("Failed to read config {}", config_path.display()))?;

        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config {}", config_path.display()))?;

        // secrets.toml sits next to the main config file
        let secrets_path = config_path
            .parent()
            .map(|dir| dir.join("secrets.toml"))
            .unwrap_or_else(|| PathBuf::from("secrets.toml"));
        SecretsLoader::load(&secrets_path)?.apply(&mut config.notifications);
        apply_env_overrides(&mut config.notifications);

        config.validate()?;

        info!(
            "Loaded {} targets, {} reference endpoints, mode {:?}",
            config.targets.len(),
            config.reference_rpc_urls.len(),
            config.mode
        );

        Ok(config)
    }
}
