//! Probe battery against mocked execution, consensus, metrics and release APIs

mod common;

use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

use common::{target_config, test_config, MockBeaconServer, MockRpcServer, RecordingNotifier};
use monitor::alerts::{AlertService, SeverityTier};
use monitor::config::{Config, TargetConfig};
use monitor::health::{HealthMonitor, ProbeResult, ProbeStatus, TargetMonitor};
use monitor::reference::ReferenceResolver;
use monitor::scheduler::Orchestrator;

fn now() -> u64 {
    Utc::now().timestamp() as u64
}

fn find<'a>(results: &'a [ProbeResult], condition: &str) -> &'a ProbeResult {
    results
        .iter()
        .find(|result| result.key.condition.to_string() == condition)
        .unwrap_or_else(|| panic!("no {} result in {:?}", condition, results))
}

fn target_monitor(target: TargetConfig, config: &Config) -> TargetMonitor {
    let references = Arc::new(
        ReferenceResolver::from_urls(&config.reference_rpc_urls, config.reference_timeout()).unwrap(),
    );
    TargetMonitor::from_config(target, config, references).unwrap()
}

async fn chain(tip: u64, prefix: &str) -> MockRpcServer {
    let server = MockRpcServer::start().await;
    server.mock_chain(tip, now(), 12, prefix).await;
    server
}

#[tokio::test]
async fn test_healthy_node_block_probes_are_ok() {
    let node = MockRpcServer::start().await;
    node.mock_healthy_node(500, now(), 1, 50).await;
    let reference = chain(502, "aaaa").await;

    let config = test_config(vec![target_config("node", &node.base_url)], vec![reference.base_url.clone()]);
    let results = target_monitor(config.targets[0].clone(), &config).check_block(None).await;

    for condition in [
        "rpc_unreachable",
        "chain_id_mismatch",
        "out_of_sync",
        "ahead_of_canonical",
        "block_stale",
        "block_production_stall",
        "block_hash_mismatch",
    ] {
        assert_eq!(find(&results, condition).status, ProbeStatus::Ok, "{}", condition);
    }
}

#[tokio::test]
async fn test_lagging_node_is_out_of_sync() {
    let node = MockRpcServer::start().await;
    node.mock_healthy_node(100, now(), 1, 50).await;
    let reference = chain(111, "aaaa").await;

    let config = test_config(vec![target_config("node", &node.base_url)], vec![reference.base_url.clone()]);
    let results = target_monitor(config.targets[0].clone(), &config).check_block(None).await;

    let out_of_sync = find(&results, "out_of_sync");
    assert_eq!(out_of_sync.status, ProbeStatus::Warning);
    assert_eq!(out_of_sync.tier, Some(SeverityTier::Critical));
    assert_eq!(find(&results, "ahead_of_canonical").status, ProbeStatus::Ok);
}

#[tokio::test]
async fn test_node_far_ahead_of_references() {
    let node = MockRpcServer::start().await;
    node.mock_healthy_node(116, now(), 1, 50).await;
    let reference = chain(110, "aaaa").await;

    let config = test_config(vec![target_config("node", &node.base_url)], vec![reference.base_url.clone()]);
    let results = target_monitor(config.targets[0].clone(), &config).check_block(None).await;

    assert_eq!(find(&results, "out_of_sync").status, ProbeStatus::Ok);
    let ahead = find(&results, "ahead_of_canonical");
    assert_eq!(ahead.status, ProbeStatus::Warning);
    assert_eq!(ahead.tier, Some(SeverityTier::Medium));
}

#[tokio::test]
async fn test_diverging_hash_is_a_fork() {
    let node = MockRpcServer::start().await;
    node.mock_healthy_node(300, now(), 1, 50).await;
    let reference = chain(300, "bbbb").await;

    let config = test_config(vec![target_config("node", &node.base_url)], vec![reference.base_url.clone()]);
    let results = target_monitor(config.targets[0].clone(), &config).check_block(None).await;

    let fork = find(&results, "block_hash_mismatch");
    assert_eq!(fork.status, ProbeStatus::Error);
    assert_eq!(fork.tier, Some(SeverityTier::CriticalUrgent));
}

#[tokio::test]
async fn test_references_down_leaves_chain_probes_unknown() {
    let node = MockRpcServer::start().await;
    node.mock_healthy_node(300, now(), 1, 50).await;
    let reference = MockRpcServer::start().await;
    reference.mock_unavailable().await;

    let config = test_config(vec![target_config("node", &node.base_url)], vec![reference.base_url.clone()]);
    let notifier = Arc::new(RecordingNotifier::new());
    let monitor = HealthMonitor::from_config(&config, Arc::new(AlertService::new(notifier.clone(), true))).unwrap();

    let report = monitor.run_cycle().await;

    assert_eq!(find(&report.results, "out_of_sync").status, ProbeStatus::Unknown);
    assert_eq!(find(&report.results, "block_hash_mismatch").status, ProbeStatus::Unknown);
    assert_eq!(report.overall, ProbeStatus::Ok);
    assert_eq!(notifier.count(), 0);
}

#[tokio::test]
async fn test_unreachable_node_errors_and_fails_check() {
    let node = MockRpcServer::start().await;
    node.mock_unavailable().await;
    let reference = chain(300, "aaaa").await;

    let config = test_config(vec![target_config("node", &node.base_url)], vec![reference.base_url.clone()]);
    let notifier = Arc::new(RecordingNotifier::new());
    let monitor = Arc::new(
        HealthMonitor::from_config(&config, Arc::new(AlertService::new(notifier.clone(), true))).unwrap(),
    );

    let report = Orchestrator::new(monitor, &config).run_once().await;

    let unreachable = find(&report.results, "rpc_unreachable");
    assert_eq!(unreachable.status, ProbeStatus::Error);
    assert_eq!(report.overall, ProbeStatus::Error);
    assert_eq!(report.exit_code(), 1);
    assert_eq!(notifier.matching("rpc_unreachable").len(), 1);
}

#[tokio::test]
async fn test_wrong_network_id() {
    let node = MockRpcServer::start().await;
    node.mock_healthy_node(300, now(), 11155111, 50).await;
    let reference = chain(300, "aaaa").await;

    let config = test_config(vec![target_config("node", &node.base_url)], vec![reference.base_url.clone()]);
    let results = target_monitor(config.targets[0].clone(), &config).check_block(None).await;

    let chain_id = find(&results, "chain_id_mismatch");
    assert_eq!(chain_id.status, ProbeStatus::Error);
    assert_eq!(chain_id.tier, Some(SeverityTier::Critical));
}

#[tokio::test]
async fn test_slow_block_production_is_a_stall() {
    let node = MockRpcServer::start().await;
    node.mock_chain(300, now(), 45, "aaaa").await;
    node.mock_result("net_version", json!("1")).await;
    let reference = chain(300, "aaaa").await;

    let config = test_config(vec![target_config("node", &node.base_url)], vec![reference.base_url.clone()]);
    let results = target_monitor(config.targets[0].clone(), &config).check_block(None).await;

    assert_eq!(find(&results, "block_production_stall").status, ProbeStatus::Error);
}

#[tokio::test]
async fn test_old_tip_is_stale() {
    let node = MockRpcServer::start().await;
    node.mock_healthy_node(300, now() - 120, 1, 50).await;
    let reference = chain(300, "aaaa").await;

    let config = test_config(vec![target_config("node", &node.base_url)], vec![reference.base_url.clone()]);
    let results = target_monitor(config.targets[0].clone(), &config).check_block(None).await;

    let stale = find(&results, "block_stale");
    assert_eq!(stale.status, ProbeStatus::Warning);
    assert_eq!(stale.tier, Some(SeverityTier::Critical));
}

#[tokio::test]
async fn test_consensus_client_health() {
    let node = MockRpcServer::start().await;
    node.mock_healthy_node(300, now(), 1, 50).await;
    let syncing = MockBeaconServer::start().await;
    syncing.mock_health(206).await;
    syncing.mock_syncing(9_000, 64, true).await;
    let broken = MockBeaconServer::start().await;
    broken.mock_health(503).await;

    let config = test_config(vec![], vec![node.base_url.clone()]);

    let mut target = target_config("node", &node.base_url);
    target.consensus_url = Some(syncing.base_url.clone());
    let result = target_monitor(target.clone(), &config).check_consensus().await;
    assert_eq!(result.status, ProbeStatus::Ok);

    target.consensus_url = Some(broken.base_url.clone());
    let result = target_monitor(target.clone(), &config).check_consensus().await;
    assert_eq!(result.status, ProbeStatus::Error);
    assert_eq!(result.key.to_string(), "node:consensus_not_synced");

    target.consensus_url = None;
    let result = target_monitor(target, &config).check_consensus().await;
    assert_eq!(result.status, ProbeStatus::Skipped);
}

#[tokio::test]
async fn test_memory_and_peers_from_node_resources() {
    let node = MockRpcServer::start().await;
    node.mock_healthy_node(300, now(), 1, 4).await;
    let metrics = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/metrics"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "# TYPE process_resident_memory_bytes gauge\nprocess_resident_memory_bytes 2.147483648e10\n",
        ))
        .mount(&metrics)
        .await;

    let config = test_config(vec![], vec![node.base_url.clone()]);
    let mut target = target_config("node", &node.base_url);
    target.metrics_url = Some(format!("{}/metrics", metrics.uri()));

    let results = target_monitor(target, &config).check_node_resources().await;

    assert_eq!(find(&results, "low_peers").status, ProbeStatus::Warning);
    assert_eq!(find(&results, "metrics_unreachable").status, ProbeStatus::Ok);
    let memory = find(&results, "high_memory");
    assert_eq!(memory.status, ProbeStatus::Warning);
    assert_eq!(memory.tier, Some(SeverityTier::High));
}

#[tokio::test]
async fn test_unreachable_metrics_endpoint() {
    let node = MockRpcServer::start().await;
    node.mock_healthy_node(300, now(), 1, 50).await;
    let metrics = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&metrics)
        .await;

    let config = test_config(vec![], vec![node.base_url.clone()]);
    let mut target = target_config("node", &node.base_url);
    target.metrics_url = Some(format!("{}/metrics", metrics.uri()));

    let results = target_monitor(target, &config).check_node_resources().await;

    assert_eq!(find(&results, "metrics_unreachable").status, ProbeStatus::Warning);
    assert_eq!(find(&results, "high_memory").status, ProbeStatus::Unknown);
}

#[tokio::test]
async fn test_outdated_clients() {
    let node = MockRpcServer::start().await;
    node.mock_healthy_node(300, now(), 1, 50).await;
    let beacon = MockBeaconServer::start().await;
    beacon.mock_health(200).await;
    beacon.mock_version("Lighthouse/v5.1.3-3058b96/x86_64-linux").await;

    let releases = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/paradigmxyz/reth/releases/latest"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tag_name": "v1.3.0",
            "published_at": "2025-03-01T00:00:00Z",
            "html_url": "https://github.com/paradigmxyz/reth/releases/tag/v1.3.0"
        })))
        .mount(&releases)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/sigp/lighthouse/releases/latest"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tag_name": "v6.0.0",
            "published_at": "2025-03-01T00:00:00Z",
            "html_url": "https://github.com/sigp/lighthouse/releases/tag/v6.0.0"
        })))
        .mount(&releases)
        .await;

    let config = test_config(vec![], vec![node.base_url.clone()]);
    let mut target = target_config("node", &node.base_url);
    target.consensus_url = Some(beacon.base_url.clone());
    target.release_api_url = Some(format!("{}/repos/paradigmxyz/reth/releases/latest", releases.uri()));
    target.consensus_client = Some("lighthouse".to_string());
    target.consensus_release_api_url = Some(format!("{}/repos/sigp/lighthouse/releases/latest", releases.uri()));

    let monitor = target_monitor(target, &config);
    assert!(monitor.versions_due().await);
    let results = monitor.check_versions().await;
    assert!(!monitor.versions_due().await);

    let reth = find(&results, "reth_outdated");
    assert_eq!(reth.status, ProbeStatus::Warning);
    assert_eq!(reth.tier, Some(SeverityTier::High));

    let lighthouse = find(&results, "lighthouse_outdated");
    assert_eq!(lighthouse.status, ProbeStatus::Warning);
    assert_eq!(lighthouse.tier, Some(SeverityTier::CriticalUrgent));
}

#[tokio::test]
async fn test_release_lookup_failure_is_unknown() {
    let node = MockRpcServer::start().await;
    node.mock_healthy_node(300, now(), 1, 50).await;
    let releases = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&releases)
        .await;

    let config = test_config(vec![], vec![node.base_url.clone()]);
    let mut target = target_config("node", &node.base_url);
    target.release_api_url = Some(format!("{}/latest", releases.uri()));

    let results = target_monitor(target, &config).check_versions().await;
    assert_eq!(find(&results, "reth_outdated").status, ProbeStatus::Unknown);
}
