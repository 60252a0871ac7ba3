use std::collections::HashMap;

use super::types::{ProbeDetails, ProbeResult};
use crate::alerts::{AlertKey, Condition, SeverityTier};
use crate::constants::metric_names;
use crate::errors::TransportError;

const BYTES_PER_MB: u64 = 1024 * 1024;

pub fn evaluate_peers(target: &str, count: u64, min_peers: u64) -> ProbeResult {
    let key = AlertKey::new(target, Condition::LowPeers);
    let details = ProbeDetails::Peers { count };

    if count < min_peers {
        ProbeResult::warning(
            key,
            SeverityTier::High,
            format!("Only {} peers connected (min {})", count, min_peers),
        )
        .with_details(details)
    } else {
        ProbeResult::ok(key, format!("{} peers", count)).with_details(details)
    }
}

/// Reachability of the metrics endpoint itself
pub fn evaluate_metrics_fetch(target: &str, fetched: &Result<HashMap<String, f64>, TransportError>) -> ProbeResult {
    let key = AlertKey::new(target, Condition::MetricsUnreachable);
    match fetched {
        Ok(metrics) => ProbeResult::ok(key, format!("{} metrics scraped", metrics.len())),
        Err(e) => ProbeResult::warning(key, SeverityTier::High, format!("Metrics unavailable: {}", e)),
    }
}

/// A missing gauge is indeterminate; clients name it differently
pub fn evaluate_memory(target: &str, metrics: &HashMap<String, f64>, max_memory_bytes: u64) -> ProbeResult {
    let key = AlertKey::new(target, Condition::HighMemory);

    let Some(&value) = metrics.get(metric_names::RESIDENT_MEMORY) else {
        return ProbeResult::unknown(key, format!("{} not exported", metric_names::RESIDENT_MEMORY));
    };
    if !value.is_finite() || value < 0.0 {
        return ProbeResult::unknown(key, format!("Unusable memory reading {}", value));
    }

    let bytes = value as u64;
    let details = ProbeDetails::Memory {
        used_mb: bytes / BYTES_PER_MB,
    };

    if bytes > max_memory_bytes {
        ProbeResult::warning(
            key,
            SeverityTier::High,
            format!(
                "Resident memory {} MB exceeds {} MB",
                bytes / BYTES_PER_MB,
                max_memory_bytes / BYTES_PER_MB
            ),
        )
        .with_details(details)
    } else {
        ProbeResult::ok(key, format!("{} MB resident", bytes / BYTES_PER_MB)).with_details(details)
    }
}
