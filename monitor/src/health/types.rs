//! Probe results

use serde::Serialize;
use std::fmt;

use crate::alerts::{AlertKey, SeverityTier};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProbeStatus {
    Ok,
    Warning,
    Error,
    /// Probe not applicable to this target or not due
    Skipped,
    /// Could not be determined (references down, unparsable data)
    Unknown,
}

impl ProbeStatus {
    /// Weight used when aggregating; skipped and unknown never raise it
    fn weight(self) -> u8 {
        match self {
            ProbeStatus::Error => 2,
            ProbeStatus::Warning => 1,
            ProbeStatus::Ok | ProbeStatus::Skipped | ProbeStatus::Unknown => 0,
        }
    }
}

impl fmt::Display for ProbeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ProbeStatus::Ok => "OK",
            ProbeStatus::Warning => "WARNING",
            ProbeStatus::Error => "ERROR",
            ProbeStatus::Skipped => "SKIPPED",
            ProbeStatus::Unknown => "UNKNOWN",
        };
        f.pad(label)
    }
}

/// Structured data attached to a result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProbeDetails {
    NetworkId { expected: u64, actual: u64 },
    Heights { local: u64, canonical: u64 },
    BlockAge { number: u64, age_seconds: u64 },
    HashMismatch { number: u64, local_hash: String, reference_hash: String },
    Elapsed { seconds: u64 },
    BlockGap { number: u64, gap_seconds: u64 },
    Peers { count: u64 },
    Memory { used_mb: u64 },
    Consensus { status_code: Option<u16>, sync_distance: Option<u64> },
    Version { current: String, latest: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct ProbeResult {
    pub key: AlertKey,
    pub status: ProbeStatus,
    pub message: String,
    /// Tier to alert with while triggering
    pub tier: Option<SeverityTier>,
    pub details: Option<ProbeDetails>,
}

impl ProbeResult {
    fn build(key: AlertKey, status: ProbeStatus, tier: Option<SeverityTier>, message: impl Into<String>) -> Self {
        Self {
            key,
            status,
            message: message.into(),
            tier,
            details: None,
        }
    }

    pub fn ok(key: AlertKey, message: impl Into<String>) -> Self {
        Self::build(key, ProbeStatus::Ok, None, message)
    }

    pub fn warning(key: AlertKey, tier: SeverityTier, message: impl Into<String>) -> Self {
        Self::build(key, ProbeStatus::Warning, Some(tier), message)
    }

    pub fn error(key: AlertKey, tier: SeverityTier, message: impl Into<String>) -> Self {
        Self::build(key, ProbeStatus::Error, Some(tier), message)
    }

    pub fn skipped(key: AlertKey, message: impl Into<String>) -> Self {
        Self::build(key, ProbeStatus::Skipped, None, message)
    }

    pub fn unknown(key: AlertKey, message: impl Into<String>) -> Self {
        Self::build(key, ProbeStatus::Unknown, None, message)
    }

    pub fn with_details(mut self, details: ProbeDetails) -> Self {
        self.details = Some(details);
        self
    }
}

/// Worst status across results: ERROR > WARNING > OK
pub fn overall_status<'a>(results: impl IntoIterator<Item = &'a ProbeResult>) -> ProbeStatus {
    results
        .into_iter()
        .map(|result| result.status)
        .max_by_key(|status| status.weight())
        .filter(|status| status.weight() > 0)
        .unwrap_or(ProbeStatus::Ok)
}

/// Results of one monitoring cycle
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub results: Vec<ProbeResult>,
    pub overall: ProbeStatus,
}

impl CycleReport {
    pub fn new(results: Vec<ProbeResult>) -> Self {
        let overall = overall_status(&results);
        Self { results, overall }
    }

    /// 0 when healthy or warnings only, 1 when any probe errored
    pub fn exit_code(&self) -> u8 {
        match self.overall {
            ProbeStatus::Error => 1,
            _ => 0,
        }
    }

    pub fn count(&self, status: ProbeStatus) -> usize {
        self.results.iter().filter(|r| r.status == status).count()
    }
}
