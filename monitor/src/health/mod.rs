//! Health probes for execution and consensus clients
//!
//! Each probe produces a [`ProbeResult`] under a stable alert key. Evaluators
//! are pure functions; [`TargetMonitor`] fetches the data they need.

pub mod blocks;
pub mod chain;
pub mod consensus;
pub mod monitor;
pub mod node;
pub mod types;
pub mod version;

pub use monitor::{HealthMonitor, TargetMonitor};
pub use types::{CycleReport, ProbeDetails, ProbeResult, ProbeStatus};
