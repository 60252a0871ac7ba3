//! Alert deduplication, severity policy and notification delivery

pub mod gate;
pub mod notifier;
pub mod policy;
pub mod service;

pub use gate::{AlertGate, AlertKey, Condition};
pub use notifier::{build_notifier, LogNotifier, Notifier, TelegramNotifier, WebhookNotifier};
pub use policy::SeverityTier;
pub use service::{AlertOutcome, AlertService};
