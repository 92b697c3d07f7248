//! Sink set - delivers a processed batch to a pipeline's sinks
//!
//! Two policies, fixed per pipeline:
//!
//! - **Fan-out**: every sink receives the identical batch, concurrently
//! - **Partition**: each record goes to exactly one sink, picked by hashing
//!   its routing key; records without a key are spread round-robin by their
//!   position in the batch
//!
//! The batch counts as delivered only when every targeted sink succeeds.
//! A failed delivery is not retried here; sinks that did succeed keep what
//! they wrote, so a redelivered batch may reach them twice.

use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::Arc;

use futures_util::future::join_all;
use sluice_config::SinkPolicy;
use sluice_protocol::Record;
use sluice_sinks::{Sink, SinkError, SinkResult};

use crate::{PipelineError, Result};

#[cfg(test)]
#[path = "sink_set_test.rs"]
mod tests;

/// Sinks of one pipeline plus the policy spreading batches over them
pub struct SinkSet<T: Send + Sync + 'static> {
    sinks: Vec<Arc<dyn Sink<T>>>,
    policy: SinkPolicy,
}

impl<T: Send + Sync + 'static> SinkSet<T> {
    /// Create a sink set
    ///
    /// # Errors
    /// `PipelineError::InvalidArgument` when `sinks` is empty
    pub fn new(sinks: Vec<Arc<dyn Sink<T>>>, policy: SinkPolicy) -> Result<Self> {
        if sinks.is_empty() {
            return Err(PipelineError::invalid_argument(
                "a pipeline needs at least one sink",
            ));
        }
        Ok(Self { sinks, policy })
    }

    /// Number of sinks
    #[inline]
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    /// Always false; construction rejects an empty set
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    /// Delivery policy
    #[inline]
    pub fn policy(&self) -> SinkPolicy {
        self.policy
    }

    /// Names of all sinks, in declared order
    pub fn names(&self) -> Vec<&str> {
        self.sinks.iter().map(|s| s.name()).collect()
    }

    /// Index of the sink that records with this routing key go to
    pub fn partition_for(&self, routing_key: &str) -> usize {
        let mut hasher = DefaultHasher::new();
        routing_key.hash(&mut hasher);
        (hasher.finish() % self.sinks.len() as u64) as usize
    }

    /// Deliver a batch according to the policy
    ///
    /// On failure returns a fatal error if any sink reported one, otherwise
    /// the first error seen.
    pub async fn deliver(&self, records: Vec<Record<T>>) -> SinkResult<()> {
        match self.policy {
            SinkPolicy::FanOut => self.fan_out(&records).await,
            SinkPolicy::Partition => self.partition(records).await,
        }
    }

    async fn fan_out(&self, records: &[Record<T>]) -> SinkResult<()> {
        if let [sink] = self.sinks.as_slice() {
            return sink.output(records).await;
        }

        let results = join_all(
            self.sinks
                .iter()
                .map(|sink| async move { (sink.name(), sink.output(records).await) }),
        )
        .await;

        most_severe(results)
    }

    async fn partition(&self, records: Vec<Record<T>>) -> SinkResult<()> {
        let buckets = self.split(records);

        let results = join_all(
            self.sinks
                .iter()
                .zip(&buckets)
                .filter(|(_, bucket)| !bucket.is_empty())
                .map(|(sink, bucket)| async move { (sink.name(), sink.output(bucket).await) }),
        )
        .await;

        most_severe(results)
    }

    /// Split a batch into one bucket per sink
    fn split(&self, records: Vec<Record<T>>) -> Vec<Vec<Record<T>>> {
        let n = self.sinks.len();
        let mut buckets: Vec<Vec<Record<T>>> = (0..n).map(|_| Vec::new()).collect();

        for (position, record) in records.into_iter().enumerate() {
            let index = match record.metadata().routing_key() {
                Some(key) => self.partition_for(key),
                None => position % n,
            };
            buckets[index].push(record);
        }

        buckets
    }

    /// Shut down every sink, logging failures
    pub async fn shutdown(&self) {
        for sink in &self.sinks {
            if let Err(e) = sink.shutdown().await {
                tracing::warn!(sink = sink.name(), error = %e, "sink shutdown failed");
            }
        }
    }
}

/// Pick the error to report from a set of sink results
fn most_severe(results: Vec<(&str, SinkResult<()>)>) -> SinkResult<()> {
    let mut failure: Option<SinkError> = None;

    for (name, result) in results {
        if let Err(e) = result {
            tracing::debug!(sink = name, error = %e, "sink output failed");
            let replace = match &failure {
                None => true,
                Some(current) => !current.is_fatal() && e.is_fatal(),
            };
            if replace {
                failure = Some(e);
            }
        }
    }

    failure.map_or(Ok(()), Err)
}

impl<T: Send + Sync + 'static> std::fmt::Debug for SinkSet<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SinkSet")
            .field("sinks", &self.names())
            .field("policy", &self.policy)
            .finish()
    }
}
