//! Probe scheduling
//!
//! Two continuous modes drive the same probes:
//!
//! - **Poll**: the full battery on every target every `poll_interval_seconds`.
//! - **Push**: block probes run on each `newHeads` notification received over
//!   WebSocket, while resource, heartbeat, consensus and version probes keep
//!   their own timers. Targets without a `ws_url` have their block probes
//!   polled instead.
//!
//! Every loop watches a shutdown channel and only stops between cycles, so a
//! battery in flight always completes and dispatches its alerts.

pub mod reconnect;

pub use reconnect::{BackoffPolicy, ConnectionState, Reconnector};

use futures::future::{join_all, try_join_all, BoxFuture, FutureExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::alerts::SeverityTier;
use crate::config::{Config, Mode, ScheduleConfig};
use crate::constants::defaults;
use crate::errors::MonitorError;
use crate::health::{CycleReport, HealthMonitor, ProbeResult, ProbeStatus, TargetMonitor};
use crate::rpc::HeadSubscription;

/// Probe groups that run on their own timer in push mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PeriodicProbe {
    /// Block probes for targets without a WebSocket endpoint
    PolledBlocks,
    Resources,
    Heartbeat,
    Consensus,
    Versions,
}

pub struct Orchestrator {
    monitor: Arc<HealthMonitor>,
    poll_interval: Duration,
    schedule: ScheduleConfig,
    backoff: BackoffPolicy,
    connect_timeout: Duration,
    idle_timeout: Duration,
}

impl Orchestrator {
    pub fn new(monitor: Arc<HealthMonitor>, config: &Config) -> Self {
        Self {
            monitor,
            poll_interval: config.poll_interval(),
            schedule: config.schedule.clone(),
            backoff: BackoffPolicy::from(&config.reconnect),
            connect_timeout: config.rpc_timeout(),
            // Silence for twice the heartbeat window means the socket is dead
            idle_timeout: Duration::from_secs(config.thresholds.heartbeat_seconds.max(1) * 2),
        }
    }

    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    /// One full battery, alerts dispatched
    pub async fn run_once(&self) -> CycleReport {
        self.monitor.run_cycle().await
    }

    pub async fn run(&self, mode: Mode, shutdown: watch::Receiver<bool>) -> Result<(), MonitorError> {
        match mode {
            Mode::Poll => self.run_poll(shutdown).await,
            Mode::Push => self.run_push(shutdown).await,
        }
    }

    pub async fn run_poll(&self, mut shutdown: watch::Receiver<bool>) -> Result<(), MonitorError> {
        info!("Poll mode: full battery every {}s", self.poll_interval.as_secs());

        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut cycle = 0u64;

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    info!("Poll loop stopping after {} cycles", cycle);
                    return Ok(());
                }
                _ = interval.tick() => {
                    cycle += 1;
                    let report = self.run_once().await;
                    debug!("Cycle #{} finished: {}", cycle, report.overall);

                    if cycle.is_multiple_of(defaults::SUMMARY_EVERY_CYCLES) {
                        self.log_summary(cycle, &report).await;
                    }
                }
            }
        }
    }

    /// Runs until shutdown, or fails once a subscription exhausts its retries
    pub async fn run_push(&self, shutdown: watch::Receiver<bool>) -> Result<(), MonitorError> {
        let mut loops: Vec<BoxFuture<'_, Result<(), MonitorError>>> = Vec::new();

        for target in self.monitor.targets() {
            if let Some(ws_url) = target.ws_url() {
                loops.push(self.follow_heads(target.clone(), ws_url.to_string(), shutdown.clone()).boxed());
            }
        }

        let subscribed = loops.len();
        if subscribed < self.monitor.targets().len() {
            loops.push(
                self.every(PeriodicProbe::PolledBlocks, self.poll_interval, shutdown.clone())
                    .boxed(),
            );
        }

        let secs = Duration::from_secs;
        for (probe, period) in [
            (PeriodicProbe::Resources, secs(self.schedule.metrics_interval_seconds)),
            (PeriodicProbe::Heartbeat, secs(self.schedule.heartbeat_interval_seconds)),
            (PeriodicProbe::Consensus, secs(self.schedule.consensus_interval_seconds)),
            (PeriodicProbe::Versions, secs(self.schedule.version_interval_seconds)),
        ] {
            loops.push(self.every(probe, period, shutdown.clone()).boxed());
        }

        info!(
            "Push mode: {} subscription(s), {} polled target(s)",
            subscribed,
            self.monitor.targets().len() - subscribed
        );

        try_join_all(loops).await.map(|_| ())
    }

    async fn follow_heads(
        &self,
        target: Arc<TargetMonitor>,
        ws_url: String,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<(), MonitorError> {
        let mut reconnector = Reconnector::new(self.backoff);
        let mut heads = 0u64;

        loop {
            match HeadSubscription::connect(&ws_url, self.connect_timeout).await {
                Ok(mut subscription) => {
                    reconnector.on_connected();
                    info!("{}: subscribed to newHeads at {}", target.name(), subscription.endpoint());

                    loop {
                        tokio::select! {
                            _ = shutdown.changed() => return Ok(()),
                            next = subscription.next_head(self.idle_timeout) => match next {
                                Ok(Some(head)) => {
                                    heads += 1;
                                    let results = target.check_block(Some(head)).await;
                                    self.monitor.dispatch(&results).await;
                                    if heads.is_multiple_of(defaults::SUMMARY_EVERY_CYCLES) {
                                        info!("{}: {} heads processed", target.name(), heads);
                                    }
                                }
                                Ok(None) => {
                                    warn!("{}: subscription closed by {}", target.name(), ws_url);
                                    break;
                                }
                                Err(e) => {
                                    warn!("{}: subscription lost: {}", target.name(), e);
                                    break;
                                }
                            }
                        }
                    }
                }
                Err(e) => warn!("{}: connect to {} failed: {}", target.name(), ws_url, e),
            }

            let Some(delay) = reconnector.on_failure() else {
                let attempts = self.backoff.max_attempts;
                error!(
                    "{}: giving up on {} after {} reconnection attempts",
                    target.name(),
                    ws_url,
                    attempts
                );

                let message = format!(
                    "🛑 [FATAL] {}: newHeads subscription to {} failed after {} reconnection attempts, monitor is exiting",
                    target.name(),
                    ws_url,
                    attempts
                );
                if let Err(e) = self.monitor.alerts().send_immediate(&message, SeverityTier::Critical).await {
                    warn!("Failed to send shutdown notification: {}", e);
                }

                return Err(MonitorError::ReconnectExhausted {
                    endpoint: ws_url,
                    attempts,
                });
            };

            info!(
                "{}: reconnecting in {}ms (attempt {}/{})",
                target.name(),
                delay.as_millis(),
                reconnector.attempts(),
                self.backoff.max_attempts
            );
            tokio::select! {
                _ = shutdown.changed() => return Ok(()),
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    async fn every(
        &self,
        probe: PeriodicProbe,
        period: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<(), MonitorError> {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.changed() => return Ok(()),
                _ = interval.tick() => {
                    let results = self.collect(probe).await;
                    debug!("{:?} probes produced {} result(s)", probe, results.len());
                    self.monitor.dispatch(&results).await;
                }
            }
        }
    }

    async fn collect(&self, probe: PeriodicProbe) -> Vec<ProbeResult> {
        let targets = self.monitor.targets();
        let batches: Vec<Vec<ProbeResult>> = match probe {
            PeriodicProbe::PolledBlocks => {
                join_all(
                    targets
                        .iter()
                        .filter(|target| target.ws_url().is_none())
                        .map(|target| target.check_block(None)),
                )
                .await
            }
            PeriodicProbe::Resources => join_all(targets.iter().map(|target| target.check_node_resources())).await,
            PeriodicProbe::Heartbeat => {
                join_all(targets.iter().map(|target| async move { vec![target.check_heartbeat().await] })).await
            }
            PeriodicProbe::Consensus => {
                join_all(targets.iter().map(|target| async move { vec![target.check_consensus().await] })).await
            }
            PeriodicProbe::Versions => join_all(targets.iter().map(|target| target.check_versions())).await,
        };
        batches.into_iter().flatten().collect()
    }

    async fn log_summary(&self, cycle: u64, report: &CycleReport) {
        info!(
            "Monitoring cycle #{}: overall {}, {} error(s), {} warning(s), {} unknown, {} active alert(s) via {}",
            cycle,
            report.overall,
            report.count(ProbeStatus::Error),
            report.count(ProbeStatus::Warning),
            report.count(ProbeStatus::Unknown),
            self.monitor.alerts().active_alerts().await,
            self.monitor.alerts().channel_name()
        );
    }
}
