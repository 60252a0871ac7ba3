//! Client versions and published releases
//!
//! Versions are compared as `(major, minor, patch)` integer triples. Anything
//! that does not parse into a full triple is reported as unknown rather than
//! guessed at.

use reqwest::Client as HttpClient;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::constants::http::USER_AGENT;
use crate::errors::{ParseError, TransportError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl Version {
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self { major, minor, patch }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for Version {
    type Err = ParseError;

    /// Accepts `1.2.3`, `v1.2.3` and `v1.2.3-rc.1+build`; the pre-release and
    /// build suffixes are ignored.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseError::InvalidVersion(raw.to_string());
        let trimmed = raw.trim();
        let trimmed = trimmed
            .strip_prefix('v')
            .or_else(|| trimmed.strip_prefix('V'))
            .unwrap_or(trimmed);
        let core = trimmed
            .split(['-', '+'])
            .next()
            .ok_or_else(invalid)?;

        let mut parts = core.split('.');
        let mut next = || -> Result<u64, ParseError> {
            parts
                .next()
                .filter(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()))
                .ok_or_else(invalid)?
                .parse::<u64>()
                .map_err(|_| invalid())
        };

        let version = Version::new(next()?, next()?, next()?);
        if parts.next().is_some() {
            return Err(invalid());
        }
        Ok(version)
    }
}

/// Pull the version out of a client banner such as
/// `reth/v1.2.3-abcdef/x86_64-unknown-linux-gnu` or
/// `Lighthouse/v5.1.3-3058b96/x86_64-linux`.
pub fn parse_client_version(banner: &str) -> Option<Version> {
    // Prysm appends the platform after a space: `Prysm/v5.0.3 (linux amd64)`
    let leading_word = |segment: &str| -> Option<Version> { segment.split_whitespace().next()?.parse().ok() };
    banner
        .split('/')
        .skip(1)
        .find_map(leading_word)
        .or_else(|| leading_word(banner))
}

/// How far the running version trails the latest release
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionLag {
    UpToDate,
    Patch,
    Minor,
    Major,
}

pub fn compare_versions(current: &Version, latest: &Version) -> VersionLag {
    if current >= latest {
        VersionLag::UpToDate
    } else if current.major < latest.major {
        VersionLag::Major
    } else if current.minor < latest.minor {
        VersionLag::Minor
    } else {
        VersionLag::Patch
    }
}

/// Subset of the GitHub "latest release" payload
#[derive(Debug, Clone, Deserialize)]
pub struct Release {
    pub tag_name: String,
    pub published_at: Option<String>,
    pub html_url: Option<String>,
}

impl Release {
    pub fn version(&self) -> Option<Version> {
        self.tag_name.parse().ok()
    }
}

#[derive(Debug, Clone)]
pub struct ReleaseClient {
    client: HttpClient,
}

impl ReleaseClient {
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = HttpClient::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| TransportError::ConnectionFailed {
                endpoint: "release api".to_string(),
                reason: format!("Failed to create HTTP client: {}", e),
            })?;
        Ok(Self { client })
    }

    pub async fn latest(&self, api_url: &str) -> Result<Release, TransportError> {
        let response = self
            .client
            .get(api_url)
            .header("Accept", "application/vnd.github+json")
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(api_url, e))?;

        if !response.status().is_success() {
            return Err(TransportError::Status {
                endpoint: api_url.to_string(),
                status: response.status().as_u16(),
            });
        }

        response
            .json()
            .await
            .map_err(|e| TransportError::invalid(api_url, format!("Failed to parse release: {}", e)))
    }
}
