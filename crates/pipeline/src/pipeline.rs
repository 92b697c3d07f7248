//! Pipeline - one source, one buffer, a processor chain and a sink set
//!
//! A `Pipeline` owns its plugins and drives them through a small lifecycle:
//!
//! ```text
//! Created ──start──► Running ──stop──► Stopping ──► Stopped
//!    └────────────────stop─────────────────────────────┘
//! ```
//!
//! # Stopping
//!
//! `stop` stops the source, closes the buffer to writers and signals the
//! workers. Every batch a worker already read is finished and checkpointed.
//! Workers still busy after `drain_timeout` are aborted. Processors and sinks
//! are then shut down once, with records flushed by processors delivered to
//! the sinks first. Records still queued are reported, not processed.
//!
//! # Fatal errors
//!
//! A worker that hits a fatal error closes the buffer to writers and ends
//! every worker after its current batch. The pipeline stays `Running` until
//! its owner reacts to `stop_requested` and calls `stop`.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use parking_lot::Mutex;
use sluice_buffer::Buffer;
use sluice_config::{PipelineConfig, SinkPolicy};
use sluice_processor::Chain;
use sluice_protocol::{PipelineDescription, PipelineInfo};
use sluice_sinks::Sink;
use sluice_sources::Source;
use tokio::task::{AbortHandle, JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::metrics::PipelineMetrics;
use crate::sink_set::SinkSet;
use crate::worker::WorkerContext;
use crate::{PipelineError, PipelineState, Result};

#[cfg(test)]
#[path = "pipeline_test.rs"]
mod tests;

/// Default wait for a batch on each read
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(3000);

/// Default pause after an empty read
pub const DEFAULT_IDLE_BACKOFF: Duration = Duration::from_millis(10);

/// Default grace period for workers on stop
pub const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Runtime settings of a pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSettings {
    /// Pipeline name
    pub name: String,
    /// Number of process workers
    pub workers: usize,
    /// Timeout handed to each buffer read
    pub read_timeout: Duration,
    /// Pause after an empty read
    pub idle_backoff: Duration,
    /// Grace period for workers on stop
    pub drain_timeout: Duration,
    /// How batches are spread over sinks
    pub sink_policy: SinkPolicy,
}

impl PipelineSettings {
    /// Settings with defaults and one worker
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            workers: 1,
            read_timeout: DEFAULT_READ_TIMEOUT,
            idle_backoff: DEFAULT_IDLE_BACKOFF,
            drain_timeout: DEFAULT_DRAIN_TIMEOUT,
            sink_policy: SinkPolicy::FanOut,
        }
    }

    /// Settings of a configured pipeline
    pub fn from_config(name: impl Into<String>, config: &PipelineConfig) -> Self {
        Self {
            name: name.into(),
            workers: config.workers,
            read_timeout: config.delay,
            idle_backoff: config.idle_backoff,
            drain_timeout: config.drain_timeout,
            sink_policy: config.sink_policy,
        }
    }

    /// Set the number of workers
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Set the read timeout
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Set the idle backoff
    pub fn with_idle_backoff(mut self, backoff: Duration) -> Self {
        self.idle_backoff = backoff;
        self
    }

    /// Set the drain timeout
    pub fn with_drain_timeout(mut self, timeout: Duration) -> Self {
        self.drain_timeout = timeout;
        self
    }

    /// Set the sink policy
    pub fn with_sink_policy(mut self, policy: SinkPolicy) -> Self {
        self.sink_policy = policy;
        self
    }

    /// Validate settings
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(PipelineError::invalid_argument("pipeline name must not be empty"));
        }
        if self.workers == 0 {
            return Err(PipelineError::invalid_argument(format!(
                "pipeline '{}': workers must be at least 1",
                self.name
            )));
        }
        if self.read_timeout.is_zero() {
            return Err(PipelineError::invalid_argument(format!(
                "pipeline '{}': read timeout must be greater than zero",
                self.name
            )));
        }
        Ok(())
    }

    /// Description handed to plugin factories
    pub fn info(&self) -> PipelineInfo {
        PipelineInfo::new(&self.name, self.workers)
    }
}

/// A running unit of source, buffer, processors and sinks
pub struct Pipeline<T: Send + Sync + 'static> {
    settings: PipelineSettings,
    source: Arc<dyn Source<T>>,
    buffer: Arc<dyn Buffer<T>>,
    chain: Arc<Chain<T>>,
    sinks: Arc<SinkSet<T>>,
    metrics: Arc<PipelineMetrics>,
    state: Mutex<PipelineState>,
    /// Serializes `start` and `stop`
    lifecycle: tokio::sync::Mutex<()>,
    stop: CancellationToken,
    stop_requested: CancellationToken,
    workers: Mutex<Vec<JoinHandle<()>>>,
    abort_handles: Mutex<Vec<AbortHandle>>,
}

impl<T: Send + Sync + 'static> Pipeline<T> {
    /// Assemble a pipeline from resolved plugins
    ///
    /// # Errors
    /// `PipelineError::InvalidArgument` for invalid settings or no sinks
    pub fn new(
        settings: PipelineSettings,
        source: Arc<dyn Source<T>>,
        buffer: Arc<dyn Buffer<T>>,
        chain: Chain<T>,
        sinks: Vec<Arc<dyn Sink<T>>>,
    ) -> Result<Self> {
        settings.validate()?;
        let sinks = SinkSet::new(sinks, settings.sink_policy)?;

        Ok(Self {
            settings,
            source,
            buffer,
            chain: Arc::new(chain),
            sinks: Arc::new(sinks),
            metrics: Arc::new(PipelineMetrics::new()),
            state: Mutex::new(PipelineState::Created),
            lifecycle: tokio::sync::Mutex::new(()),
            stop: CancellationToken::new(),
            stop_requested: CancellationToken::new(),
            workers: Mutex::new(Vec::new()),
            abort_handles: Mutex::new(Vec::new()),
        })
    }

    /// Pipeline name
    #[inline]
    pub fn name(&self) -> &str {
        &self.settings.name
    }

    /// Runtime settings
    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Current lifecycle state
    pub fn state(&self) -> PipelineState {
        *self.state.lock()
    }

    /// Whether the pipeline is running
    pub fn is_running(&self) -> bool {
        self.state() == PipelineState::Running
    }

    /// Pipeline counters
    pub fn metrics(&self) -> &PipelineMetrics {
        &self.metrics
    }

    /// Shared handle to the pipeline counters
    pub fn metrics_handle(&self) -> Arc<PipelineMetrics> {
        Arc::clone(&self.metrics)
    }

    /// The pipeline's buffer
    pub fn buffer(&self) -> &Arc<dyn Buffer<T>> {
        &self.buffer
    }

    /// Names of active processors, in order
    pub fn processor_names(&self) -> Vec<&'static str> {
        self.chain.names()
    }

    /// Names of sinks, in declared order
    pub fn sink_names(&self) -> Vec<&str> {
        self.sinks.names()
    }

    fn set_state(&self, state: PipelineState) {
        let previous = std::mem::replace(&mut *self.state.lock(), state);
        tracing::debug!(pipeline = %self.settings.name, from = %previous, to = %state, "pipeline state changed");
    }

    /// Start the workers and then the source
    ///
    /// # Errors
    /// `PipelineError::InvalidState` unless the pipeline is `Created`. If the
    /// source fails to start the workers are stopped again, the pipeline
    /// ends up `Stopped` and the source error is returned.
    pub async fn start(&self) -> Result<()> {
        let _lifecycle = self.lifecycle.lock().await;

        let state = self.state();
        if state != PipelineState::Created {
            return Err(PipelineError::invalid_state(&self.settings.name, state, "start"));
        }

        tracing::info!(
            pipeline = %self.settings.name,
            workers = self.settings.workers,
            source = self.source.name(),
            processors = ?self.chain.names(),
            sinks = ?self.sinks.names(),
            sink_policy = ?self.settings.sink_policy,
            buffer_capacity = self.buffer.capacity(),
            batch_size = self.buffer.batch_size(),
            "pipeline starting"
        );

        self.spawn_workers();
        self.set_state(PipelineState::Running);

        if let Err(e) = self.source.start(Arc::clone(&self.buffer)).await {
            tracing::error!(pipeline = %self.settings.name, error = %e, "source failed to start");
            self.buffer.close();
            self.stop.cancel();
            self.join_workers().await;
            self.set_state(PipelineState::Stopped);
            return Err(e.into());
        }

        Ok(())
    }

    fn spawn_workers(&self) {
        let context = Arc::new(WorkerContext {
            pipeline: self.settings.name.clone(),
            buffer: Arc::clone(&self.buffer),
            chain: Arc::clone(&self.chain),
            sinks: Arc::clone(&self.sinks),
            metrics: Arc::clone(&self.metrics),
            read_timeout: self.settings.read_timeout,
            idle_backoff: self.settings.idle_backoff,
            stop: self.stop.clone(),
            stop_requested: self.stop_requested.clone(),
        });

        let mut workers = self.workers.lock();
        let mut abort_handles = self.abort_handles.lock();
        for worker_id in 0..self.settings.workers {
            let handle = tokio::spawn(Arc::clone(&context).run(worker_id));
            abort_handles.push(handle.abort_handle());
            workers.push(handle);
        }
    }

    /// Stop the pipeline, draining in-flight batches
    ///
    /// `Created` pipelines go straight to `Stopped`; calling `stop` while
    /// `Stopping` or `Stopped` does nothing.
    pub async fn stop(&self) -> Result<()> {
        if matches!(self.state(), PipelineState::Stopping | PipelineState::Stopped) {
            return Ok(());
        }
        let _lifecycle = self.lifecycle.lock().await;

        match self.state() {
            PipelineState::Created => {
                self.buffer.close();
                self.stop.cancel();
                self.set_state(PipelineState::Stopped);
                tracing::info!(pipeline = %self.settings.name, "pipeline stopped before start");
                return Ok(());
            }
            PipelineState::Stopping | PipelineState::Stopped => return Ok(()),
            PipelineState::Running => {}
        }

        self.set_state(PipelineState::Stopping);
        tracing::info!(pipeline = %self.settings.name, "pipeline stopping");

        self.source.stop().await;
        self.buffer.close();
        self.stop.cancel();

        self.join_workers().await;
        self.shutdown_plugins().await;

        let occupied = self.buffer.occupied_slots();
        if occupied > 0 {
            let in_flight = self.buffer.in_flight_records();
            tracing::warn!(
                pipeline = %self.settings.name,
                queued = occupied.saturating_sub(in_flight),
                unacknowledged = in_flight,
                "records left in buffer at stop"
            );
        }

        self.set_state(PipelineState::Stopped);
        self.log_summary();
        Ok(())
    }

    /// Wait for workers up to the drain timeout, aborting the rest
    async fn join_workers(&self) {
        let handles = std::mem::take(&mut *self.workers.lock());
        if handles.is_empty() {
            return;
        }

        match tokio::time::timeout(self.settings.drain_timeout, join_all(handles)).await {
            Ok(results) => {
                for result in results {
                    if let Err(e) = result
                        && e.is_panic()
                    {
                        tracing::error!(pipeline = %self.settings.name, "process worker panicked");
                    }
                }
            }
            Err(_) => {
                tracing::warn!(
                    pipeline = %self.settings.name,
                    drain_timeout = ?self.settings.drain_timeout,
                    "workers did not finish in time, aborting"
                );
                self.abort_workers();
            }
        }
    }

    fn abort_workers(&self) {
        for handle in self.abort_handles.lock().drain(..) {
            handle.abort();
        }
    }

    /// Shut down processors, deliver what they flush, then shut down sinks
    async fn shutdown_plugins(&self) {
        match self.chain.shutdown().await {
            Ok(flushed) if !flushed.is_empty() => {
                let count = flushed.len() as u64;
                match self.sinks.deliver(flushed).await {
                    Ok(()) => self.metrics.record_written(count),
                    Err(e) => {
                        self.metrics.record_sink_error();
                        tracing::warn!(
                            pipeline = %self.settings.name,
                            records = count,
                            error = %e,
                            "failed to deliver records flushed on shutdown"
                        );
                    }
                }
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(pipeline = %self.settings.name, error = %e, "processor shutdown failed");
            }
        }

        self.sinks.shutdown().await;
    }

    /// Force the pipeline to `Stopped` without draining
    ///
    /// Workers are aborted mid-batch and plugins are not shut down. The
    /// source is not stopped either; its writes fail on the closed buffer.
    pub fn abort(&self) {
        self.buffer.close();
        self.stop.cancel();
        self.abort_workers();
        self.workers.lock().clear();
        self.set_state(PipelineState::Stopped);
        tracing::warn!(pipeline = %self.settings.name, "pipeline aborted");
    }

    /// Ask whoever owns the pipeline to stop it
    pub fn request_stop(&self) {
        self.stop_requested.cancel();
    }

    /// Resolves once a worker hit a fatal error or `request_stop` was called
    ///
    /// After a fatal error the buffer is already closed and no worker is
    /// reading.
    pub async fn stop_requested(&self) {
        self.stop_requested.cancelled().await;
    }

    /// Whether a stop has been requested
    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.is_cancelled()
    }

    fn log_summary(&self) {
        let snapshot = self.metrics.snapshot();
        tracing::info!(
            pipeline = %self.settings.name,
            batches_read = snapshot.batches_read,
            records_read = snapshot.records_read,
            records_written = snapshot.records_written,
            checkpoints = snapshot.checkpoints,
            processor_errors = snapshot.processor_errors,
            sink_errors = snapshot.sink_errors,
            "pipeline stopped"
        );
    }
}

impl<T: Send + Sync + 'static> PipelineDescription for Pipeline<T> {
    fn pipeline_name(&self) -> &str {
        &self.settings.name
    }

    fn number_of_process_workers(&self) -> usize {
        self.settings.workers
    }
}

impl<T: Send + Sync + 'static> std::fmt::Debug for Pipeline<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("name", &self.settings.name)
            .field("state", &self.state())
            .field("workers", &self.settings.workers)
            .field("processors", &self.chain)
            .field("sinks", &self.sinks)
            .finish()
    }
}
