//! Null sink - discards all data
//!
//! Receives batches, updates metrics, and drops them. Useful for measuring
//! pipeline throughput without I/O and for asserting delivery in tests.
//!
//! # Configuration
//!
//! ```toml
//! [[pipelines.entry.sinks]]
//! type = "null"
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use sluice_protocol::{PluginSetting, Record};

use crate::registry::SinkFactory;
use crate::{Sink, SinkMetrics, SinkResult};

#[cfg(test)]
#[path = "null_test.rs"]
mod tests;

/// Registered type name
pub const NULL: &str = "null";

/// Null sink that discards every batch it receives
#[derive(Debug, Default)]
pub struct NullSink {
    name: String,
    metrics: Arc<SinkMetrics>,
}

impl NullSink {
    /// Create a null sink named `null`
    pub fn new() -> Self {
        Self::with_name(NULL)
    }

    /// Create a null sink with a custom name
    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            metrics: Arc::new(SinkMetrics::new()),
        }
    }

    /// Get sink metrics
    pub fn metrics(&self) -> &SinkMetrics {
        &self.metrics
    }

    /// Shared handle to the metrics, valid after the sink is moved
    pub fn metrics_handle(&self) -> Arc<SinkMetrics> {
        Arc::clone(&self.metrics)
    }
}

#[async_trait]
impl<T: Send + Sync + 'static> Sink<T> for NullSink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn output(&self, records: &[Record<T>]) -> SinkResult<()> {
        self.metrics.delivered(records.len(), 0);
        Ok(())
    }

    async fn shutdown(&self) -> SinkResult<()> {
        let snapshot = self.metrics.snapshot();
        tracing::debug!(
            sink = %self.name,
            batches = snapshot.batches,
            records = snapshot.records,
            "null sink shut down"
        );
        Ok(())
    }
}

/// Factory for NullSink
///
/// Available for any record type.
#[derive(Debug, Clone, Copy)]
pub struct NullFactory;

impl<T: Send + Sync + 'static> SinkFactory<T> for NullFactory {
    fn create(&self, _setting: &PluginSetting) -> SinkResult<Arc<dyn Sink<T>>> {
        Ok(Arc::new(NullSink::new()))
    }

    fn name(&self) -> &'static str {
        NULL
    }
}
