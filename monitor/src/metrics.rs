//! Prometheus exposition text from the execution client

use reqwest::Client as HttpClient;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

use crate::errors::TransportError;

/// Flatten exposition text into `name -> value`.
///
/// Label sets are stripped, so the last sample of a metric family wins.
/// Comments, blank lines and lines that do not parse are skipped.
pub fn parse_metrics(text: &str) -> HashMap<String, f64> {
    let mut metrics = HashMap::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let (name, rest) = match line.find('{') {
            Some(open) => match line[open..].find('}') {
                Some(close) => (&line[..open], &line[open + close + 1..]),
                None => continue,
            },
            None => match line.split_once(char::is_whitespace) {
                Some((name, rest)) => (name, rest),
                None => continue,
            },
        };

        let name = name.trim();
        let Some(raw_value) = rest.split_whitespace().next() else {
            continue;
        };
        if name.is_empty() {
            continue;
        }

        match raw_value.parse::<f64>() {
            Ok(value) => {
                metrics.insert(name.to_string(), value);
            }
            Err(_) => debug!("Skipping unparsable metrics line: {}", line),
        }
    }

    metrics
}

#[derive(Debug, Clone)]
pub struct MetricsClient {
    client: HttpClient,
    url: String,
}

impl MetricsClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, TransportError> {
        let url = url.into();
        let client = HttpClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::ConnectionFailed {
                endpoint: url.clone(),
                reason: format!("Failed to create HTTP client: {}", e),
            })?;
        Ok(Self { client, url })
    }

    pub fn endpoint(&self) -> &str {
        &self.url
    }

    pub async fn fetch(&self) -> Result<HashMap<String, f64>, TransportError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(&self.url, e))?;

        if !response.status().is_success() {
            return Err(TransportError::Status {
                endpoint: self.url.clone(),
                status: response.status().as_u16(),
            });
        }

        let text = response
            .text()
            .await
            .map_err(|e| TransportError::from_reqwest(&self.url, e))?;
        let metrics = parse_metrics(&text);

        if metrics.is_empty() {
            return Err(TransportError::invalid(&self.url, "no parsable metrics"));
        }
        Ok(metrics)
    }
}
