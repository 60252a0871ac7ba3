use super::types::{ProbeDetails, ProbeResult};
use crate::alerts::{AlertKey, Condition, SeverityTier};
use crate::releases::{compare_versions, Version, VersionLag};

/// Either side missing or unparsable is UNKNOWN. Being behind is a WARNING
/// whose tier grows with the component that changed.
pub fn evaluate_version(target: &str, client: &str, current: Option<Version>, latest: Option<Version>) -> ProbeResult {
    let key = AlertKey::new(target, Condition::Outdated(client.to_string()));

    let (Some(current), Some(latest)) = (current, latest) else {
        return ProbeResult::unknown(key, format!("Could not determine {} version", client));
    };

    let details = ProbeDetails::Version {
        current: current.to_string(),
        latest: latest.to_string(),
    };

    let (tier, kind) = match compare_versions(&current, &latest) {
        VersionLag::UpToDate => {
            return ProbeResult::ok(key, format!("{} {} is current", client, current)).with_details(details);
        }
        VersionLag::Patch => (SeverityTier::Low, "patch"),
        VersionLag::Minor => (SeverityTier::High, "minor"),
        VersionLag::Major => (SeverityTier::CriticalUrgent, "major"),
    };

    ProbeResult::warning(
        key,
        tier,
        format!("{} {} is outdated, latest {} ({} release)", client, current, latest, kind),
    )
    .with_details(details)
}
