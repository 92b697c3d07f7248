//! Pipeline connector - links two pipelines in one process
//!
//! A `PipelineConnector` is the upstream pipeline's `pipeline` sink and the
//! downstream pipeline's `pipeline` source at the same time. Starting the
//! downstream source attaches the downstream buffer; from then on every batch
//! the upstream delivers is written into that buffer.
//!
//! # Delivery
//!
//! - Before the downstream has started: `SinkError::Unavailable` (retryable)
//! - Downstream buffer full: retry until the batch fits or the buffer closes
//! - Batch larger than the downstream buffer: fall back to one write per record
//! - Downstream stopped or its buffer closed: `SinkError::Fatal`

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use sluice_buffer::{Buffer, BufferError};
use sluice_config::PIPELINE_CONNECTOR;
use sluice_protocol::Record;
use sluice_sinks::{Sink, SinkError, SinkResult};
use sluice_sources::{Source, SourceError, SourceResult};

#[cfg(test)]
#[path = "connector_test.rs"]
mod tests;

/// Default timeout of a single write attempt into the downstream buffer
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_millis(100);

/// Sink of one pipeline and source of another
pub struct PipelineConnector<T: Send + Sync + 'static> {
    upstream: String,
    downstream: String,
    sink_name: String,
    source_name: String,
    buffer: RwLock<Option<Arc<dyn Buffer<T>>>>,
    detached: AtomicBool,
    write_timeout: Duration,
}

impl<T: Clone + Send + Sync + 'static> PipelineConnector<T> {
    /// Connector from `upstream` into `downstream`
    pub fn new(upstream: impl Into<String>, downstream: impl Into<String>) -> Self {
        let upstream = upstream.into();
        let downstream = downstream.into();
        Self {
            sink_name: format!("{}:{}", PIPELINE_CONNECTOR, downstream),
            source_name: format!("{}:{}", PIPELINE_CONNECTOR, upstream),
            upstream,
            downstream,
            buffer: RwLock::new(None),
            detached: AtomicBool::new(false),
            write_timeout: DEFAULT_WRITE_TIMEOUT,
        }
    }

    /// Set the timeout of a single write attempt
    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    /// Name of the writing pipeline
    pub fn upstream(&self) -> &str {
        &self.upstream
    }

    /// Name of the receiving pipeline
    pub fn downstream(&self) -> &str {
        &self.downstream
    }

    /// Whether the downstream buffer is attached
    pub fn is_attached(&self) -> bool {
        self.buffer.read().is_some()
    }

    fn attached(&self) -> SinkResult<Arc<dyn Buffer<T>>> {
        if self.detached.load(Ordering::Acquire) {
            return Err(self.downstream_gone());
        }
        self.buffer.read().clone().ok_or_else(|| {
            SinkError::unavailable(format!("pipeline '{}' has not started yet", self.downstream))
        })
    }

    fn downstream_gone(&self) -> SinkError {
        SinkError::fatal(format!("pipeline '{}' is no longer accepting records", self.downstream))
    }

    /// Map a refused write to a sink error; `None` means try again
    fn refused(&self, error: BufferError) -> Option<SinkError> {
        match error {
            BufferError::Timeout { .. } if !self.detached.load(Ordering::Acquire) => {
                tracing::trace!(
                    upstream = %self.upstream,
                    downstream = %self.downstream,
                    "downstream buffer full, retrying"
                );
                None
            }
            BufferError::Timeout { .. } | BufferError::Closed { .. } => Some(self.downstream_gone()),
            other => Some(SinkError::write(other.to_string())),
        }
    }

    async fn write_each(&self, buffer: &Arc<dyn Buffer<T>>, records: Vec<Record<T>>) -> SinkResult<()> {
        for record in records {
            let mut pending = record;
            loop {
                match buffer.write(pending, self.write_timeout).await {
                    Ok(()) => break,
                    Err(rejected) => {
                        let (error, record) = rejected.into_parts();
                        if let Some(e) = self.refused(error) {
                            return Err(e);
                        }
                        pending = record;
                    }
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl<T: Clone + Send + Sync + 'static> Sink<T> for PipelineConnector<T> {
    fn name(&self) -> &str {
        &self.sink_name
    }

    async fn output(&self, records: &[Record<T>]) -> SinkResult<()> {
        if records.is_empty() {
            return Ok(());
        }
        let buffer = self.attached()?;

        let mut pending = records.to_vec();
        loop {
            match buffer.write_all(pending, self.write_timeout).await {
                Ok(()) => return Ok(()),
                Err(rejected) => {
                    let (error, records) = rejected.into_parts();
                    if let BufferError::SizeOverflow { requested, capacity } = error {
                        tracing::debug!(
                            downstream = %self.downstream,
                            requested,
                            capacity,
                            "batch larger than downstream buffer, writing records one by one"
                        );
                        return self.write_each(&buffer, records).await;
                    }
                    if let Some(e) = self.refused(error) {
                        return Err(e);
                    }
                    pending = records;
                }
            }
        }
    }
}

#[async_trait]
impl<T: Clone + Send + Sync + 'static> Source<T> for PipelineConnector<T> {
    fn name(&self) -> &str {
        &self.source_name
    }

    async fn start(&self, buffer: Arc<dyn Buffer<T>>) -> SourceResult<()> {
        let mut slot = self.buffer.write();
        if slot.is_some() {
            return Err(SourceError::AlreadyStarted(self.source_name.clone()));
        }
        *slot = Some(buffer);
        self.detached.store(false, Ordering::Release);

        tracing::info!(
            upstream = %self.upstream,
            downstream = %self.downstream,
            "pipeline connector attached"
        );
        Ok(())
    }

    async fn stop(&self) {
        self.detached.store(true, Ordering::Release);
        if self.buffer.write().take().is_some() {
            tracing::debug!(
                upstream = %self.upstream,
                downstream = %self.downstream,
                "pipeline connector detached"
            );
        }
    }
}

impl<T: Send + Sync + 'static> std::fmt::Debug for PipelineConnector<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineConnector")
            .field("upstream", &self.upstream)
            .field("downstream", &self.downstream)
            .field("attached", &self.buffer.read().is_some())
            .field("write_timeout", &self.write_timeout)
            .finish()
    }
}
