use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use monitor::alerts::build_notifier;
use monitor::{AlertService, ConfigManager, HealthMonitor, Mode, Orchestrator};

#[derive(Parser)]
#[command(name = "monitor", version, about = "Ethereum execution/consensus node health monitor")]
struct Cli {
    /// Path to the main configuration file
    #[arg(long, global = true, env = "MONITOR_CONFIG", default_value = "config/main.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run every probe once and exit (1 if any probe errored)
    Check {
        /// Print the cycle report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Monitor continuously
    Run {
        /// Override the configured scheduling mode
        #[arg(long, value_enum)]
        mode: Option<Mode>,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let env_filter = EnvFilter::from_default_env()
        .add_directive("monitor=info".parse()?)
        .add_directive("hyper=warn".parse()?)
        .add_directive("reqwest=warn".parse()?)
        .add_directive("tungstenite=warn".parse()?)
        .add_directive("tokio_tungstenite=warn".parse()?);

    fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();

    let config_manager = ConfigManager::new(&cli.config)
        .await
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    let config = config_manager.get_current_config();

    let notifier = build_notifier(&config.notifications).context("Failed to set up notifications")?;
    let alerts = Arc::new(AlertService::new(notifier, config.recovery_notices));
    let monitor = Arc::new(HealthMonitor::from_config(&config, alerts.clone()).context("Failed to build probes")?);
    let orchestrator = Orchestrator::new(monitor, &config);

    match cli.command {
        Command::Check { json } => {
            let report = orchestrator.run_once().await;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                for result in &report.results {
                    println!("{:<8} {:<40} {}", result.status, result.key.to_string(), result.message);
                }
                println!("overall: {}", report.overall);
            }

            Ok(ExitCode::from(report.exit_code()))
        }
        Command::Run { mode } => {
            let mode = mode.unwrap_or(config.mode);
            info!("Starting node monitor in {:?} mode", mode);

            match alerts.test_channel().await {
                Ok(()) => info!("Notification channel '{}' test successful", alerts.channel_name()),
                Err(e) => {
                    error!("Notification channel '{}' test failed: {}", alerts.channel_name(), e);
                    warn!("Alerts may not be delivered. Check the channel configuration and network connectivity.");
                }
            }

            let (shutdown_tx, shutdown_rx) = watch::channel(false);
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    info!("Shutdown requested, finishing current cycle");
                    let _ = shutdown_tx.send(true);
                }
            });

            match orchestrator.run(mode, shutdown_rx).await {
                Ok(()) => {
                    info!("Node monitor stopped");
                    Ok(ExitCode::SUCCESS)
                }
                Err(e) => {
                    error!("Node monitor terminating: {}", e);
                    Ok(ExitCode::FAILURE)
                }
            }
        }
    }
}
