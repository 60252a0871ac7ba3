//! Consensus client (beacon node) HTTP API

use reqwest::Client as HttpClient;
use serde::Deserialize;
use std::time::Duration;

use crate::errors::TransportError;

/// Result of `GET /eth/v1/node/health`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeaconHealth {
    /// 200
    Synced,
    /// 206
    Syncing,
    /// Any other status code
    NotSynced(u16),
}

impl BeaconHealth {
    pub fn from_status(status: u16) -> Self {
        match status {
            200 => BeaconHealth::Synced,
            206 => BeaconHealth::Syncing,
            other => BeaconHealth::NotSynced(other),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncingStatus {
    pub head_slot: u64,
    pub sync_distance: u64,
    pub is_syncing: bool,
}

#[derive(Debug, Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

// Beacon API encodes integers as decimal strings
#[derive(Debug, Deserialize)]
struct RawSyncing {
    head_slot: String,
    sync_distance: String,
    #[serde(default)]
    is_syncing: bool,
}

#[derive(Debug, Deserialize)]
struct RawVersion {
    version: String,
}

#[derive(Debug, Clone)]
pub struct BeaconClient {
    client: HttpClient,
    base_url: String,
}

impl BeaconClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, TransportError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let client = HttpClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::ConnectionFailed {
                endpoint: base_url.clone(),
                reason: format!("Failed to create HTTP client: {}", e),
            })?;
        Ok(Self { client, base_url })
    }

    pub fn endpoint(&self) -> &str {
        &self.base_url
    }

    pub async fn health(&self) -> Result<BeaconHealth, TransportError> {
        let url = format!("{}/eth/v1/node/health", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(&url, e))?;
        Ok(BeaconHealth::from_status(response.status().as_u16()))
    }

    pub async fn syncing(&self) -> Result<SyncingStatus, TransportError> {
        let url = format!("{}/eth/v1/node/syncing", self.base_url);
        let raw: DataEnvelope<RawSyncing> = self.get_json(&url).await?;

        let parse = |field: &str, value: &str| {
            value
                .parse::<u64>()
                .map_err(|_| TransportError::invalid(&url, format!("{} '{}' is not a number", field, value)))
        };

        Ok(SyncingStatus {
            head_slot: parse("head_slot", &raw.data.head_slot)?,
            sync_distance: parse("sync_distance", &raw.data.sync_distance)?,
            is_syncing: raw.data.is_syncing,
        })
    }

    pub async fn version(&self) -> Result<String, TransportError> {
        let url = format!("{}/eth/v1/node/version", self.base_url);
        let raw: DataEnvelope<RawVersion> = self.get_json(&url).await?;
        Ok(raw.data.version)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, TransportError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(url, e))?;

        if !response.status().is_success() {
            return Err(TransportError::Status {
                endpoint: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        response
            .json()
            .await
            .map_err(|e| TransportError::invalid(url, format!("Failed to parse JSON response: {}", e)))
    }
}
