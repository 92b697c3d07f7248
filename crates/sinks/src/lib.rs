//! Sluice - Sinks
//!
//! Sinks are the last stage of a pipeline. A process worker hands every
//! processed batch to the pipeline's sinks and only checkpoints the batch
//! once all of them report success.
//!
//! # Architecture
//!
//! ```text
//! [Buffer] --read--> [Worker] --> [Chain] --&[Record]--> [Sink] --> [Destination]
//! ```
//!
//! # Available Sinks
//!
//! | Sink | Purpose |
//! |------|---------|
//! | `null` | Benchmarking and tests (discard all, count) |
//! | `stdout` | JSON lines on stdout or stderr |
//!
//! The `pipeline` sink that feeds another pipeline's buffer lives in
//! `sluice-pipeline`, next to the connector it wraps.
//!
//! # Example
//!
//! ```ignore
//! use sluice_sinks::{NullSink, Sink};
//!
//! let sink = NullSink::new();
//! sink.output(&records).await?;
//! assert_eq!(sink.metrics().snapshot().records, records.len() as u64);
//! ```

/// Null sink - discards all data (for benchmarking)
pub mod null;

/// Stdout sink - JSON lines output
pub mod stdout;

/// Sink registry - config-driven sink creation
pub mod registry;

/// Common types shared by all sinks
mod common;

pub use common::{SinkError, SinkMetrics, SinkStats};
pub use null::{NullFactory, NullSink};
pub use registry::{SinkFactory, SinkRegistry};
pub use stdout::{StdoutConfig, StdoutFactory, StdoutSink, StdoutTarget};

use async_trait::async_trait;
use sluice_protocol::{Event, Record};

/// Result type for sink operations
pub type SinkResult<T> = Result<T, SinkError>;

/// Destination for processed batches
///
/// One sink instance is shared by every worker of a pipeline, so `output`
/// may be called concurrently.
#[async_trait]
pub trait Sink<T: Send + Sync + 'static>: Send + Sync {
    /// Sink name used in logs and metrics
    fn name(&self) -> &str;

    /// Write a batch
    ///
    /// An `Ok` means the batch is safe to checkpoint. Errors leave the batch
    /// unacknowledged; `SinkError::is_fatal` ones also stop the pipeline.
    async fn output(&self, records: &[Record<T>]) -> SinkResult<()>;

    /// Flush and release resources
    ///
    /// Called once, after every worker of the pipeline has finished.
    async fn shutdown(&self) -> SinkResult<()> {
        Ok(())
    }
}

/// Registry with every built-in sink for `Event` pipelines
pub fn default_registry() -> SinkRegistry<Event> {
    let mut registry = SinkRegistry::new();
    registry.register(null::NULL, NullFactory);
    registry.register(stdout::STDOUT, StdoutFactory);
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry() {
        let registry = default_registry();
        assert_eq!(registry.available_types(), vec!["null", "stdout"]);
    }
}
