//! Error types for the node monitor
//!
//! Probe-level failures are never fatal on their own: the orchestrator
//! downgrades the affected probe and carries on with the next cycle. Only
//! [`MonitorError`] ends a run.

use thiserror::Error;

/// Failures that stop the orchestrator
#[derive(Debug, Error)]
pub enum MonitorError {
    /// Push mode ran out of reconnection attempts
    #[error("Subscription to {endpoint} failed after {attempts} attempts")]
    ReconnectExhausted { endpoint: String, attempts: u32 },
}

/// RPC or HTTP endpoint unreachable, timed out or answered with garbage
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Connection to {endpoint} failed: {reason}")]
    ConnectionFailed { endpoint: String, reason: String },

    #[error("Request to {endpoint} timed out")]
    Timeout { endpoint: String },

    #[error("{endpoint} returned HTTP {status}")]
    Status { endpoint: String, status: u16 },

    #[error("RPC error from {endpoint}: {code} {message}")]
    Rpc {
        endpoint: String,
        code: i64,
        message: String,
    },

    #[error("Invalid response from {endpoint}: {reason}")]
    InvalidResponse { endpoint: String, reason: String },
}

impl TransportError {
    /// Classify a reqwest failure against the endpoint it was sent to
    pub fn from_reqwest(endpoint: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout {
                endpoint: endpoint.to_string(),
            }
        } else if let Some(status) = err.status() {
            TransportError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            }
        } else {
            TransportError::ConnectionFailed {
                endpoint: endpoint.to_string(),
                reason: err.to_string(),
            }
        }
    }

    pub fn invalid(endpoint: &str, reason: impl Into<String>) -> Self {
        TransportError::InvalidResponse {
            endpoint: endpoint.to_string(),
            reason: reason.into(),
        }
    }
}

/// Canonical chain state could not be established
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("No reference endpoint answered")]
    NoReferenceAvailable,
}

/// Malformed data from a collaborator
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Invalid hex quantity '{0}'")]
    InvalidHex(String),

    #[error("Invalid version string '{0}'")]
    InvalidVersion(String),

    #[error("Invalid number '{0}'")]
    InvalidNumber(String),
}

/// Notification channel failure. Logged, never retried.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("Notification request failed: {0}")]
    Request(String),

    #[error("Notification channel returned HTTP {0}")]
    Status(u16),

    #[error("Notification channel timed out")]
    Timeout,
}

/// Configuration error variants
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Missing required field: {field}")]
    MissingRequired { field: String },
}
