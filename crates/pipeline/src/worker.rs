//! Process worker - the read, process, deliver, checkpoint loop
//!
//! Every worker of a pipeline runs the same loop against one shared
//! `WorkerContext`. A worker owns the batch it read and its checkpoint token
//! until it either checkpoints the batch or gives up on it.
//!
//! # Design
//!
//! - **Cooperative stop**: the stop token is checked between batches only;
//!   a batch that was read is always carried through to the end
//! - **Idle backoff**: an empty read parks the worker for
//!   `min(idle_backoff, read_timeout)` or until stop, whichever comes first
//! - **Failure isolation**: a failed batch is logged, counted and left
//!   unacknowledged; the worker moves on to the next one
//! - **Fatal errors**: the buffer is closed to writers, every worker exits
//!   after its current batch and the pipeline's owner is asked to stop it

use std::sync::Arc;
use std::time::{Duration, Instant};

use sluice_buffer::Buffer;
use sluice_processor::Chain;
use tokio_util::sync::CancellationToken;

use crate::metrics::PipelineMetrics;
use crate::sink_set::SinkSet;

/// What one turn of the loop amounted to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outcome {
    /// Batch delivered and checkpointed
    Processed,
    /// Batch failed and was left unacknowledged
    Failed,
    /// Nothing to read
    Idle,
    /// Batch failed with an error the pipeline cannot continue after
    Fatal,
}

/// Everything a worker needs, shared by all workers of a pipeline
pub(crate) struct WorkerContext<T: Send + Sync + 'static> {
    pub(crate) pipeline: String,
    pub(crate) buffer: Arc<dyn Buffer<T>>,
    pub(crate) chain: Arc<Chain<T>>,
    pub(crate) sinks: Arc<SinkSet<T>>,
    pub(crate) metrics: Arc<PipelineMetrics>,
    pub(crate) read_timeout: Duration,
    pub(crate) idle_backoff: Duration,
    /// Set by the pipeline, or by a worker after a fatal error, when
    /// workers must finish
    pub(crate) stop: CancellationToken,
    /// Set by a worker that hit a fatal error
    pub(crate) stop_requested: CancellationToken,
}

impl<T: Send + Sync + 'static> WorkerContext<T> {
    /// Run the worker loop until stopped or a fatal error
    pub(crate) async fn run(self: Arc<Self>, worker_id: usize) {
        tracing::debug!(pipeline = %self.pipeline, worker_id, "process worker starting");

        while !self.stop.is_cancelled() {
            match self.run_once(worker_id).await {
                Outcome::Processed | Outcome::Failed => {}
                Outcome::Idle => {
                    tokio::select! {
                        _ = self.stop.cancelled() => break,
                        _ = tokio::time::sleep(self.idle_wait()) => {}
                    }
                }
                Outcome::Fatal => {
                    self.halt(worker_id);
                    break;
                }
            }
        }

        tracing::debug!(pipeline = %self.pipeline, worker_id, "process worker stopping");
    }

    /// Stop taking work after a fatal error
    ///
    /// Sources see `Closed` on their next write instead of having records
    /// admitted that no worker would ever read.
    fn halt(&self, worker_id: usize) {
        tracing::error!(
            pipeline = %self.pipeline,
            worker_id,
            queued = self.buffer.occupied_slots().saturating_sub(self.buffer.in_flight_records()),
            "fatal error, closing buffer and requesting pipeline stop"
        );
        self.buffer.close();
        self.stop.cancel();
        self.stop_requested.cancel();
    }

    fn idle_wait(&self) -> Duration {
        self.idle_backoff.min(self.read_timeout)
    }

    /// Read one batch and carry it through the chain and sinks
    pub(crate) async fn run_once(&self, worker_id: usize) -> Outcome {
        let (records, checkpoint) = match self.buffer.read(self.read_timeout).await {
            Ok(read) => read,
            Err(e) => {
                tracing::warn!(pipeline = %self.pipeline, worker_id, error = %e, "buffer read failed");
                return Outcome::Idle;
            }
        };

        if records.is_empty() {
            self.metrics.record_empty_read();
            return Outcome::Idle;
        }
        self.metrics.record_read(records.len() as u64);

        let started = Instant::now();
        let processed = match self.chain.execute(records).await {
            Ok(processed) => processed,
            Err(e) => {
                self.metrics.record_processor_error();
                tracing::warn!(
                    pipeline = %self.pipeline,
                    worker_id,
                    error = %e,
                    unacknowledged = checkpoint.num_records(),
                    "processor chain failed, batch left unacknowledged"
                );
                return if e.is_fatal() { Outcome::Fatal } else { Outcome::Failed };
            }
        };
        self.metrics.record_processed(started.elapsed());

        // A batch the chain filtered away completely still needs its checkpoint
        if !processed.is_empty() {
            let count = processed.len() as u64;
            if let Err(e) = self.sinks.deliver(processed).await {
                self.metrics.record_sink_error();
                tracing::warn!(
                    pipeline = %self.pipeline,
                    worker_id,
                    error = %e,
                    unacknowledged = checkpoint.num_records(),
                    "sink delivery failed, batch left unacknowledged"
                );
                return if e.is_fatal() { Outcome::Fatal } else { Outcome::Failed };
            }
            self.metrics.record_written(count);
        }

        let released = checkpoint.num_records();
        match self.buffer.checkpoint(checkpoint) {
            Ok(()) => {
                self.metrics.record_checkpoint();
                tracing::trace!(pipeline = %self.pipeline, worker_id, released, "batch checkpointed");
                Outcome::Processed
            }
            Err(e) => {
                self.metrics.record_checkpoint_error();
                tracing::error!(pipeline = %self.pipeline, worker_id, error = %e, "checkpoint rejected");
                Outcome::Failed
            }
        }
    }
}
