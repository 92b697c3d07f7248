//! Sluice - Sources
//!
//! Sources produce records and write them into their pipeline's buffer.
//! They only ever call `write` / `write_all`, so the buffer's capacity is
//! what pushes back on them.
//!
//! # Available Sources
//!
//! - **random** - Emits one UUID message event per interval (development)
//!
//! The `pipeline` source that receives from an upstream pipeline lives in
//! `sluice-pipeline`, next to the connector it wraps.
//!
//! # Contract
//!
//! - `start` returns once the source is producing; the work runs on its own task
//! - A `BufferError::Closed` from the buffer means the pipeline is shutting
//!   down; the source stops writing
//! - `stop` returns once no further writes will be issued
//!
//! # Example
//!
//! ```ignore
//! use sluice_sources::{RandomSource, RandomSourceConfig, Source};
//!
//! let source = RandomSource::new(RandomSourceConfig::default());
//! source.start(buffer.clone()).await?;
//! // ...
//! source.stop().await;
//! ```

pub mod random;
pub mod registry;

mod common;

pub use common::{SourceError, SourceMetrics, SourceStats};
pub use random::{RandomFactory, RandomSource, RandomSourceConfig};
pub use registry::{SourceFactory, SourceRegistry};

use std::sync::Arc;

use async_trait::async_trait;
use sluice_buffer::Buffer;
use sluice_protocol::Event;

/// Result type for source operations
pub type SourceResult<T> = Result<T, SourceError>;

/// Producer of records for a pipeline
#[async_trait]
pub trait Source<T: Send + 'static>: Send + Sync {
    /// Source name used in logs
    fn name(&self) -> &str;

    /// Start writing into `buffer`
    ///
    /// # Errors
    /// `SourceError::AlreadyStarted` when called twice.
    async fn start(&self, buffer: Arc<dyn Buffer<T>>) -> SourceResult<()>;

    /// Stop producing
    ///
    /// Idempotent; a source that was never started returns immediately.
    async fn stop(&self);
}

/// Registry with every built-in source for `Event` pipelines
pub fn default_registry() -> SourceRegistry<Event> {
    let mut registry = SourceRegistry::new();
    registry.register(random::RANDOM, RandomFactory);
    registry
}
