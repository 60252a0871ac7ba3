//! Canonical chain state from independent reference endpoints
//!
//! Every reference is queried concurrently with its own timeout and the
//! successful answers are kept. The canonical height is the maximum of those
//! answers: a lagging reference is never preferred, and one advanced
//! reference is not outvoted by laggards.

use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::errors::{ResolveError, TransportError};
use crate::rpc::{BlockTag, ExecutionClient, JsonRpcClient};

/// A block hash reported by one reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceHash {
    pub endpoint: String,
    pub hash: String,
}

pub struct ReferenceResolver {
    references: Vec<Arc<dyn ExecutionClient>>,
    call_timeout: Duration,
}

impl ReferenceResolver {
    pub fn new(references: Vec<Arc<dyn ExecutionClient>>, call_timeout: Duration) -> Self {
        Self {
            references,
            call_timeout,
        }
    }

    pub fn from_urls(urls: &[String], call_timeout: Duration) -> Result<Self, TransportError> {
        let references = urls
            .iter()
            .map(|url| {
                JsonRpcClient::new(url.clone(), call_timeout)
                    .map(|client| Arc::new(client) as Arc<dyn ExecutionClient>)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(references, call_timeout))
    }

    pub fn len(&self) -> usize {
        self.references.len()
    }

    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }

    /// Maximum height among the references that answered in time
    pub async fn canonical_height(&self) -> Result<u64, ResolveError> {
        let queries = self.references.iter().map(|reference| {
            let reference = reference.clone();
            let call_timeout = self.call_timeout;
            async move {
                let outcome = timeout(call_timeout, reference.block_number()).await;
                (reference.endpoint().to_string(), outcome)
            }
        });

        let heights = join_all(queries)
            .await
            .into_iter()
            .filter_map(|(endpoint, outcome)| match outcome {
                Ok(Ok(height)) => {
                    debug!("Reference {} at height {}", endpoint, height);
                    Some(height)
                }
                Ok(Err(e)) => {
                    warn!("Reference {} failed: {}", endpoint, e);
                    None
                }
                Err(_) => {
                    warn!("Reference {} timed out", endpoint);
                    None
                }
            });

        max_height(heights).ok_or(ResolveError::NoReferenceAvailable)
    }

    /// Hash of block `number` from every reference that has it
    pub async fn block_hashes(&self, number: u64) -> Vec<ReferenceHash> {
        let queries = self.references.iter().map(|reference| {
            let reference = reference.clone();
            let call_timeout = self.call_timeout;
            async move {
                let outcome = timeout(call_timeout, reference.block(BlockTag::Number(number))).await;
                (reference.endpoint().to_string(), outcome)
            }
        });

        join_all(queries)
            .await
            .into_iter()
            .filter_map(|(endpoint, outcome)| match outcome {
                Ok(Ok(block)) => Some(ReferenceHash {
                    endpoint,
                    hash: block.hash,
                }),
                Ok(Err(e)) => {
                    warn!("Reference {} could not serve block {}: {}", endpoint, number, e);
                    None
                }
                Err(_) => {
                    warn!("Reference {} timed out fetching block {}", endpoint, number);
                    None
                }
            })
            .collect()
    }
}

/// Canonical height rule over the successful samples
pub fn max_height(samples: impl IntoIterator<Item = u64>) -> Option<u64> {
    samples.into_iter().max()
}
