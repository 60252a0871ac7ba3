use chrono::Utc;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::blocks::{evaluate_heartbeat, BlockTracker};
use super::chain::{
    evaluate_block_age, evaluate_fork, evaluate_network_id, evaluate_production_stall, evaluate_sync_lag,
};
use super::consensus::evaluate_consensus;
use super::node::{evaluate_memory, evaluate_metrics_fetch, evaluate_peers};
use super::types::{CycleReport, ProbeResult, ProbeStatus};
use super::version::evaluate_version;
use crate::alerts::{AlertKey, AlertService, Condition, SeverityTier};
use crate::beacon::{BeaconClient, BeaconHealth};
use crate::config::{Config, TargetConfig, Thresholds};
use crate::constants::http;
use crate::errors::TransportError;
use crate::metrics::MetricsClient;
use crate::reference::ReferenceResolver;
use crate::releases::{parse_client_version, ReleaseClient};
use crate::rpc::{BlockInfo, BlockTag, ExecutionClient, HeadEvent, JsonRpcClient};

/// Probes for one monitored endpoint (a node pair or a standalone RPC)
pub struct TargetMonitor {
    target: TargetConfig,
    thresholds: Thresholds,
    execution: Arc<dyn ExecutionClient>,
    beacon: Option<BeaconClient>,
    metrics: Option<MetricsClient>,
    releases: ReleaseClient,
    references: Arc<ReferenceResolver>,
    tracker: Mutex<BlockTracker>,
    version_interval: Duration,
    last_version_check: Mutex<Option<Instant>>,
}

impl TargetMonitor {
    pub fn new(
        target: TargetConfig,
        config: &Config,
        execution: Arc<dyn ExecutionClient>,
        references: Arc<ReferenceResolver>,
    ) -> Result<Self, TransportError> {
        let beacon = target
            .consensus_url
            .as_deref()
            .map(|url| BeaconClient::new(url, http::AUXILIARY_TIMEOUT))
            .transpose()?;
        let metrics = target
            .metrics_url
            .as_deref()
            .map(|url| MetricsClient::new(url, http::AUXILIARY_TIMEOUT))
            .transpose()?;

        Ok(Self {
            target,
            thresholds: config.thresholds.clone(),
            execution,
            beacon,
            metrics,
            releases: ReleaseClient::new(http::AUXILIARY_TIMEOUT)?,
            references,
            tracker: Mutex::new(BlockTracker::new(Instant::now())),
            version_interval: Duration::from_secs(config.schedule.version_interval_seconds),
            last_version_check: Mutex::new(None),
        })
    }

    /// Build with a JSON-RPC client for the target's `rpc_url`
    pub fn from_config(
        target: TargetConfig,
        config: &Config,
        references: Arc<ReferenceResolver>,
    ) -> Result<Self, TransportError> {
        let execution = Arc::new(JsonRpcClient::new(target.rpc_url.clone(), config.rpc_timeout())?);
        Self::new(target, config, execution, references)
    }

    pub fn name(&self) -> &str {
        &self.target.name
    }

    pub fn ws_url(&self) -> Option<&str> {
        self.target.ws_url.as_deref()
    }

    /// Block-dependent probes. `head` comes from a subscription in push mode;
    /// without it the latest block is fetched over HTTP.
    pub async fn check_block(&self, head: Option<HeadEvent>) -> Vec<ProbeResult> {
        let name = self.name();
        let unreachable = AlertKey::new(name, Condition::RpcUnreachable);

        // A pushed head proves the websocket is alive, not the HTTP endpoint
        let tip = match head {
            Some(head) => {
                if self.tracker.lock().await.observe(head.number, Instant::now()) {
                    debug!("{}: new block {}", name, head.number);
                }
                if let Err(e) = self.execution.block_number().await {
                    warn!("{}: HTTP RPC unavailable: {}", name, e);
                    return vec![ProbeResult::error(
                        unreachable,
                        SeverityTier::Critical,
                        format!("RPC endpoint unreachable: {}", e),
                    )];
                }
                head
            }
            None => match self.execution.block(BlockTag::Latest).await {
                Ok(block) => {
                    if self.tracker.lock().await.observe(block.number, Instant::now()) {
                        debug!("{}: new block {}", name, block.number);
                    }
                    block
                }
                Err(e) => {
                    warn!("{}: latest block unavailable: {}", name, e);
                    return vec![ProbeResult::error(
                        unreachable,
                        SeverityTier::Critical,
                        format!("RPC endpoint unreachable: {}", e),
                    )];
                }
            },
        };

        let (network, canonical, stall, fork) = tokio::join!(
            self.check_network_id(),
            self.references.canonical_height(),
            self.check_production_stall(&tip),
            self.check_fork(tip.number),
        );

        let mut results = vec![
            ProbeResult::ok(unreachable, format!("latest block {}", tip.number)),
            network,
        ];
        results.extend(evaluate_sync_lag(name, tip.number, canonical, &self.thresholds).into_results());
        results.push(evaluate_block_age(
            name,
            &tip,
            unix_now(),
            self.thresholds.max_block_age_seconds,
        ));
        results.push(stall);
        results.push(fork);
        results
    }

    async fn check_network_id(&self) -> ProbeResult {
        match self.execution.network_id().await {
            Ok(actual) => evaluate_network_id(self.name(), self.target.expected_network_id, actual),
            Err(e) => ProbeResult::unknown(
                AlertKey::new(self.name(), Condition::ChainIdMismatch),
                format!("net_version failed: {}", e),
            ),
        }
    }

    async fn check_production_stall(&self, tip: &BlockInfo) -> ProbeResult {
        let key = AlertKey::new(self.name(), Condition::BlockProductionStall);
        if tip.number == 0 {
            return ProbeResult::skipped(key, "genesis has no parent");
        }

        match self.execution.block(BlockTag::Number(tip.number - 1)).await {
            Ok(parent) => evaluate_production_stall(self.name(), tip, &parent, self.thresholds.stall_seconds),
            Err(e) => ProbeResult::unknown(key, format!("parent block unavailable: {}", e)),
        }
    }

    // Compare a few blocks below the tip so references have caught up
    async fn check_fork(&self, tip_number: u64) -> ProbeResult {
        let number = tip_number.saturating_sub(self.thresholds.fork_check_depth);

        let (local, references) = tokio::join!(
            self.execution.block(BlockTag::Number(number)),
            self.references.block_hashes(number),
        );

        match local {
            Ok(block) => evaluate_fork(self.name(), number, &block.hash, &references),
            Err(e) => ProbeResult::unknown(
                AlertKey::new(self.name(), Condition::BlockHashMismatch),
                format!("block {} unavailable: {}", number, e),
            ),
        }
    }

    pub async fn check_heartbeat(&self) -> ProbeResult {
        let elapsed = self.tracker.lock().await.elapsed(Instant::now());
        evaluate_heartbeat(self.name(), elapsed, self.thresholds.heartbeat_seconds)
    }

    /// Peers, metrics reachability and memory
    pub async fn check_node_resources(&self) -> Vec<ProbeResult> {
        let name = self.name();

        let peers = match self.execution.peer_count().await {
            Ok(count) => evaluate_peers(name, count, self.thresholds.min_peers),
            Err(e) => ProbeResult::unknown(
                AlertKey::new(name, Condition::LowPeers),
                format!("net_peerCount failed: {}", e),
            ),
        };

        let Some(metrics) = &self.metrics else {
            return vec![
                peers,
                ProbeResult::skipped(AlertKey::new(name, Condition::MetricsUnreachable), "no metrics_url"),
                ProbeResult::skipped(AlertKey::new(name, Condition::HighMemory), "no metrics_url"),
            ];
        };

        let fetched = metrics.fetch().await;
        let memory = match &fetched {
            Ok(values) => evaluate_memory(name, values, self.thresholds.max_memory_bytes),
            Err(_) => ProbeResult::unknown(AlertKey::new(name, Condition::HighMemory), "metrics unavailable"),
        };

        vec![peers, evaluate_metrics_fetch(name, &fetched), memory]
    }

    pub async fn check_consensus(&self) -> ProbeResult {
        let key = AlertKey::new(self.name(), Condition::ConsensusNotSynced);
        let Some(beacon) = &self.beacon else {
            return ProbeResult::skipped(key, "no consensus_url");
        };

        let health = beacon.health().await;
        let syncing = match health {
            Ok(BeaconHealth::Syncing) => beacon.syncing().await.ok(),
            _ => None,
        };
        evaluate_consensus(self.name(), health, syncing.as_ref())
    }

    /// Execution client and, when configured, consensus client freshness
    pub async fn check_versions(&self) -> Vec<ProbeResult> {
        *self.last_version_check.lock().await = Some(Instant::now());

        let name = self.name();
        let mut results = Vec::new();

        let client = &self.target.client;
        match &self.target.release_api_url {
            None => results.push(ProbeResult::skipped(
                AlertKey::new(name, Condition::Outdated(client.clone())),
                "no release_api_url",
            )),
            Some(api_url) => {
                let (banner, release) = tokio::join!(self.execution.client_version(), self.releases.latest(api_url));
                let current = banner
                    .map_err(|e| debug!("{}: web3_clientVersion failed: {}", name, e))
                    .ok()
                    .and_then(|banner| parse_client_version(&banner));
                let latest = release
                    .map_err(|e| debug!("{}: release lookup failed: {}", name, e))
                    .ok()
                    .and_then(|release| release.version());
                results.push(evaluate_version(name, client, current, latest));
            }
        }

        if let (Some(beacon), Some(api_url), Some(client)) = (
            &self.beacon,
            &self.target.consensus_release_api_url,
            &self.target.consensus_client,
        ) {
            let (banner, release) = tokio::join!(beacon.version(), self.releases.latest(api_url));
            let current = banner.ok().and_then(|banner| parse_client_version(&banner));
            let latest = release.ok().and_then(|release| release.version());
            results.push(evaluate_version(name, client, current, latest));
        }

        results
    }

    pub async fn versions_due(&self) -> bool {
        match *self.last_version_check.lock().await {
            None => true,
            Some(last) => last.elapsed() >= self.version_interval,
        }
    }

    /// Full battery. Version checks only run when their interval has passed.
    pub async fn run_all(&self) -> Vec<ProbeResult> {
        let mut results = self.check_block(None).await;
        results.push(self.check_heartbeat().await);
        results.extend(self.check_node_resources().await);
        results.push(self.check_consensus().await);
        if self.versions_due().await {
            results.extend(self.check_versions().await);
        }
        results
    }
}

fn unix_now() -> u64 {
    Utc::now().timestamp().max(0) as u64
}

/// All targets plus the alert dispatcher they report to
pub struct HealthMonitor {
    targets: Vec<Arc<TargetMonitor>>,
    alerts: Arc<AlertService>,
}

impl HealthMonitor {
    pub fn new(targets: Vec<Arc<TargetMonitor>>, alerts: Arc<AlertService>) -> Self {
        Self { targets, alerts }
    }

    pub fn from_config(config: &Config, alerts: Arc<AlertService>) -> Result<Self, TransportError> {
        let references = Arc::new(ReferenceResolver::from_urls(
            &config.reference_rpc_urls,
            config.reference_timeout(),
        )?);

        let targets = config
            .targets
            .iter()
            .cloned()
            .map(|target| TargetMonitor::from_config(target, config, references.clone()).map(Arc::new))
            .collect::<Result<Vec<_>, _>>()?;

        info!(
            "Monitoring {} target(s) against {} reference endpoint(s)",
            targets.len(),
            references.len()
        );
        Ok(Self::new(targets, alerts))
    }

    pub fn targets(&self) -> &[Arc<TargetMonitor>] {
        &self.targets
    }

    pub fn alerts(&self) -> &Arc<AlertService> {
        &self.alerts
    }

    /// One pass of every probe on every target, dispatched to the alert gate
    pub async fn run_cycle(&self) -> CycleReport {
        let batches = join_all(self.targets.iter().map(|target| target.run_all())).await;
        let results: Vec<ProbeResult> = batches.into_iter().flatten().collect();

        self.dispatch(&results).await;
        CycleReport::new(results)
    }

    pub async fn dispatch(&self, results: &[ProbeResult]) {
        for result in results {
            match result.status {
                ProbeStatus::Ok | ProbeStatus::Skipped => {
                    debug!("{} {}: {}", result.key, result.status, result.message)
                }
                ProbeStatus::Unknown => info!("{} {}: {}", result.key, result.status, result.message),
                ProbeStatus::Warning | ProbeStatus::Error => {
                    warn!("{} {}: {}", result.key, result.status, result.message)
                }
            }
            self.alerts.process(result).await;
        }
    }
}
