use super::types::{ProbeDetails, ProbeResult};
use crate::alerts::{AlertKey, Condition, SeverityTier};
use crate::beacon::{BeaconHealth, SyncingStatus};
use crate::errors::TransportError;

/// Synced (200) and syncing (206) are both healthy. The sync distance, when
/// the node reported it, is carried for context only.
pub fn evaluate_consensus(
    target: &str,
    health: Result<BeaconHealth, TransportError>,
    syncing: Option<&SyncingStatus>,
) -> ProbeResult {
    let key = AlertKey::new(target, Condition::ConsensusNotSynced);
    let sync_distance = syncing.map(|s| s.sync_distance);

    match health {
        Ok(BeaconHealth::Synced) => ProbeResult::ok(key, "consensus client synced").with_details(
            ProbeDetails::Consensus {
                status_code: Some(200),
                sync_distance,
            },
        ),
        Ok(BeaconHealth::Syncing) => ProbeResult::ok(
            key,
            format!("consensus client syncing, distance {}", sync_distance.unwrap_or_default()),
        )
        .with_details(ProbeDetails::Consensus {
            status_code: Some(206),
            sync_distance,
        }),
        Ok(BeaconHealth::NotSynced(status)) => ProbeResult::error(
            key,
            SeverityTier::Critical,
            format!("Consensus client unhealthy (HTTP {})", status),
        )
        .with_details(ProbeDetails::Consensus {
            status_code: Some(status),
            sync_distance,
        }),
        Err(e) => ProbeResult::error(key, SeverityTier::Critical, format!("Consensus client unreachable: {}", e))
            .with_details(ProbeDetails::Consensus {
                status_code: None,
                sync_distance: None,
            }),
    }
}
