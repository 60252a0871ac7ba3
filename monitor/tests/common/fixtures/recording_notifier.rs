use async_trait::async_trait;
use std::sync::Mutex;

use monitor::alerts::{Notifier, SeverityTier};
use monitor::errors::DeliveryError;

/// Notifier that keeps every message instead of delivering it
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(String, SeverityTier)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<(String, SeverityTier)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    /// Messages mentioning `needle`
    pub fn matching(&self, needle: &str) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(message, _)| message.contains(needle))
            .map(|(message, _)| message.clone())
            .collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn send(&self, message: &str, severity: SeverityTier) -> Result<(), DeliveryError> {
        self.sent.lock().unwrap().push((message.to_string(), severity));
        Ok(())
    }
}
