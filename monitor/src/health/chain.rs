//! Chain position probes: identity, sync lag, staleness, fork and stall
//!
//! Evaluators here are pure. The caller fetches the data and passes the
//! clock in, so every threshold edge can be tested without a node.

use tracing::debug;

use super::types::{ProbeDetails, ProbeResult};
use crate::alerts::{AlertKey, Condition, SeverityTier};
use crate::config::Thresholds;
use crate::errors::ResolveError;
use crate::reference::ReferenceHash;
use crate::rpc::BlockInfo;

pub fn evaluate_network_id(target: &str, expected: u64, actual: u64) -> ProbeResult {
    let key = AlertKey::new(target, Condition::ChainIdMismatch);
    let details = ProbeDetails::NetworkId { expected, actual };

    if expected == actual {
        ProbeResult::ok(key, format!("network id {}", actual)).with_details(details)
    } else {
        ProbeResult::error(
            key,
            SeverityTier::Critical,
            format!("Wrong network: expected id {}, node reports {}", expected, actual),
        )
        .with_details(details)
    }
}

/// Sync lag reports on two keys, trailing and leading the canonical height
#[derive(Debug, Clone)]
pub struct SyncEvaluation {
    pub behind: ProbeResult,
    pub ahead: ProbeResult,
}

impl SyncEvaluation {
    pub fn into_results(self) -> [ProbeResult; 2] {
        [self.behind, self.ahead]
    }
}

pub fn evaluate_sync_lag(
    target: &str,
    local: u64,
    canonical: Result<u64, ResolveError>,
    thresholds: &Thresholds,
) -> SyncEvaluation {
    let behind_key = AlertKey::new(target, Condition::OutOfSync);
    let ahead_key = AlertKey::new(target, Condition::AheadOfCanonical);

    let canonical = match canonical {
        Ok(height) => height,
        Err(e) => {
            debug!("{}: sync lag indeterminate: {}", target, e);
            return SyncEvaluation {
                behind: ProbeResult::unknown(behind_key, e.to_string()),
                ahead: ProbeResult::unknown(ahead_key, e.to_string()),
            };
        }
    };

    let details = ProbeDetails::Heights { local, canonical };
    let lag = canonical.saturating_sub(local);
    let lead = local.saturating_sub(canonical);

    let behind = if lag > thresholds.max_block_delay {
        ProbeResult::warning(
            behind_key,
            SeverityTier::Critical,
            format!(
                "Node is {} blocks behind (local {}, canonical {}, max {})",
                lag, local, canonical, thresholds.max_block_delay
            ),
        )
    } else {
        ProbeResult::ok(behind_key, format!("{} blocks behind canonical {}", lag, canonical))
    };

    let ahead = if lead > thresholds.ahead_threshold {
        ProbeResult::warning(
            ahead_key,
            SeverityTier::Medium,
            format!(
                "Node is {} blocks ahead of references (local {}, canonical {})",
                lead, local, canonical
            ),
        )
    } else {
        ProbeResult::ok(ahead_key, format!("{} blocks ahead of canonical {}", lead, canonical))
    };

    SyncEvaluation {
        behind: behind.with_details(details.clone()),
        ahead: ahead.with_details(details),
    }
}

/// `now_unix` is wall-clock seconds. A block stamped in the future counts as fresh.
pub fn evaluate_block_age(target: &str, block: &BlockInfo, now_unix: u64, max_age_seconds: u64) -> ProbeResult {
    let key = AlertKey::new(target, Condition::BlockStale);
    let age_seconds = now_unix.saturating_sub(block.timestamp);
    let details = ProbeDetails::BlockAge {
        number: block.number,
        age_seconds,
    };

    if age_seconds > max_age_seconds {
        ProbeResult::warning(
            key,
            SeverityTier::Critical,
            format!(
                "Latest block {} is {}s old (max {}s)",
                block.number, age_seconds, max_age_seconds
            ),
        )
        .with_details(details)
    } else {
        ProbeResult::ok(key, format!("block {} is {}s old", block.number, age_seconds)).with_details(details)
    }
}

/// Compare the local hash at `number` with whatever references answered.
/// A single matching reference is enough; no answers means indeterminate.
pub fn evaluate_fork(target: &str, number: u64, local_hash: &str, references: &[ReferenceHash]) -> ProbeResult {
    let key = AlertKey::new(target, Condition::BlockHashMismatch);

    let Some(first) = references.first() else {
        return ProbeResult::unknown(key, format!("No reference hash for block {}", number));
    };

    if references.iter().any(|r| r.hash.eq_ignore_ascii_case(local_hash)) {
        return ProbeResult::ok(key, format!("block {} hash matches references", number));
    }

    ProbeResult::error(
        key,
        SeverityTier::CriticalUrgent,
        format!(
            "Possible fork at block {}: local {} but {} reference(s) report {}",
            number,
            local_hash,
            references.len(),
            first.hash
        ),
    )
    .with_details(ProbeDetails::HashMismatch {
        number,
        local_hash: local_hash.to_string(),
        reference_hash: first.hash.clone(),
    })
}

pub fn evaluate_production_stall(target: &str, tip: &BlockInfo, parent: &BlockInfo, stall_seconds: u64) -> ProbeResult {
    let key = AlertKey::new(target, Condition::BlockProductionStall);
    let gap_seconds = tip.timestamp.saturating_sub(parent.timestamp);
    let details = ProbeDetails::BlockGap {
        number: tip.number,
        gap_seconds,
    };

    if gap_seconds > stall_seconds {
        ProbeResult::error(
            key,
            SeverityTier::Critical,
            format!(
                "Block {} came {}s after its parent (max {}s)",
                tip.number, gap_seconds, stall_seconds
            ),
        )
        .with_details(details)
    } else {
        ProbeResult::ok(key, format!("block gap {}s", gap_seconds)).with_details(details)
    }
}
