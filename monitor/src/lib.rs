pub mod alerts;
pub mod beacon;
pub mod config;
pub mod constants;
pub mod errors;
pub mod health;
pub mod metrics;
pub mod reference;
pub mod releases;
pub mod rpc;
pub mod scheduler;

// Re-export commonly used types
pub use alerts::{AlertGate, AlertKey, AlertService, Condition, Notifier, SeverityTier};
pub use config::{Config, ConfigManager, Mode, TargetConfig, Thresholds};
pub use errors::MonitorError;
pub use health::{CycleReport, HealthMonitor, ProbeResult, ProbeStatus, TargetMonitor};
pub use reference::ReferenceResolver;
pub use scheduler::Orchestrator;
