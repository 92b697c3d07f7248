//! Pipeline metrics
//!
//! Atomic counters shared by every worker of a pipeline.
//! All operations use relaxed ordering; values are eventually consistent.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Metrics for one pipeline
///
/// # Thread Safety
///
/// All methods are safe to call from multiple workers concurrently.
#[derive(Debug, Default)]
pub struct PipelineMetrics {
    /// Non-empty batches read from the buffer
    batches_read: AtomicU64,

    /// Reads that returned no records
    empty_reads: AtomicU64,

    /// Records read from the buffer
    records_read: AtomicU64,

    /// Records delivered to the sink set
    records_written: AtomicU64,

    /// Batches the processor chain failed on
    processor_errors: AtomicU64,

    /// Batches the sink set failed on
    sink_errors: AtomicU64,

    /// Batches checkpointed
    checkpoints: AtomicU64,

    /// Checkpoints the buffer rejected
    checkpoint_errors: AtomicU64,

    /// Total processor chain duration in nanoseconds
    process_duration_ns: AtomicU64,
}

impl PipelineMetrics {
    /// Create new metrics instance with all counters at zero
    #[inline]
    pub const fn new() -> Self {
        Self {
            batches_read: AtomicU64::new(0),
            empty_reads: AtomicU64::new(0),
            records_read: AtomicU64::new(0),
            records_written: AtomicU64::new(0),
            processor_errors: AtomicU64::new(0),
            sink_errors: AtomicU64::new(0),
            checkpoints: AtomicU64::new(0),
            checkpoint_errors: AtomicU64::new(0),
            process_duration_ns: AtomicU64::new(0),
        }
    }

    /// Record a non-empty batch read from the buffer
    #[inline]
    pub fn record_read(&self, record_count: u64) {
        self.batches_read.fetch_add(1, Ordering::Relaxed);
        self.records_read.fetch_add(record_count, Ordering::Relaxed);
    }

    /// Record a read that returned nothing
    #[inline]
    pub fn record_empty_read(&self) {
        self.empty_reads.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a successful pass through the processor chain
    #[inline]
    pub fn record_processed(&self, duration: Duration) {
        self.process_duration_ns
            .fetch_add(duration.as_nanos() as u64, Ordering::Relaxed);
    }

    /// Record a processor chain failure
    #[inline]
    pub fn record_processor_error(&self) {
        self.processor_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Record records delivered to every targeted sink
    #[inline]
    pub fn record_written(&self, record_count: u64) {
        self.records_written.fetch_add(record_count, Ordering::Relaxed);
    }

    /// Record a sink failure
    #[inline]
    pub fn record_sink_error(&self) {
        self.sink_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a checkpointed batch
    #[inline]
    pub fn record_checkpoint(&self) {
        self.checkpoints.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a rejected checkpoint
    #[inline]
    pub fn record_checkpoint_error(&self) {
        self.checkpoint_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of all metrics
    #[inline]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            batches_read: self.batches_read.load(Ordering::Relaxed),
            empty_reads: self.empty_reads.load(Ordering::Relaxed),
            records_read: self.records_read.load(Ordering::Relaxed),
            records_written: self.records_written.load(Ordering::Relaxed),
            processor_errors: self.processor_errors.load(Ordering::Relaxed),
            sink_errors: self.sink_errors.load(Ordering::Relaxed),
            checkpoints: self.checkpoints.load(Ordering::Relaxed),
            checkpoint_errors: self.checkpoint_errors.load(Ordering::Relaxed),
            process_duration_ns: self.process_duration_ns.load(Ordering::Relaxed),
        }
    }

    /// Reset all metrics to zero
    pub fn reset(&self) {
        self.batches_read.store(0, Ordering::Relaxed);
        self.empty_reads.store(0, Ordering::Relaxed);
        self.records_read.store(0, Ordering::Relaxed);
        self.records_written.store(0, Ordering::Relaxed);
        self.processor_errors.store(0, Ordering::Relaxed);
        self.sink_errors.store(0, Ordering::Relaxed);
        self.checkpoints.store(0, Ordering::Relaxed);
        self.checkpoint_errors.store(0, Ordering::Relaxed);
        self.process_duration_ns.store(0, Ordering::Relaxed);
    }

    /// Get checkpointed batch count
    #[inline]
    pub fn checkpoints(&self) -> u64 {
        self.checkpoints.load(Ordering::Relaxed)
    }

    /// Get records read count
    #[inline]
    pub fn records_read(&self) -> u64 {
        self.records_read.load(Ordering::Relaxed)
    }
}

/// Point-in-time snapshot of pipeline metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    /// Non-empty batches read
    pub batches_read: u64,
    /// Empty reads
    pub empty_reads: u64,
    /// Records read
    pub records_read: u64,
    /// Records delivered to sinks
    pub records_written: u64,
    /// Processor chain failures
    pub processor_errors: u64,
    /// Sink set failures
    pub sink_errors: u64,
    /// Checkpointed batches
    pub checkpoints: u64,
    /// Rejected checkpoints
    pub checkpoint_errors: u64,
    /// Total processor chain duration in nanoseconds
    pub process_duration_ns: u64,
}

impl MetricsSnapshot {
    /// Batches read but never checkpointed
    #[inline]
    pub fn unacknowledged_batches(&self) -> u64 {
        self.batches_read.saturating_sub(self.checkpoints)
    }

    /// Share of read batches that were checkpointed (0.0 - 1.0)
    ///
    /// Returns None if no batches have been read.
    #[inline]
    pub fn checkpoint_rate(&self) -> Option<f64> {
        if self.batches_read == 0 {
            None
        } else {
            Some(self.checkpoints as f64 / self.batches_read as f64)
        }
    }

    /// Calculate the difference from another snapshot
    #[inline]
    pub fn diff(&self, previous: &MetricsSnapshot) -> MetricsSnapshot {
        MetricsSnapshot {
            batches_read: self.batches_read.saturating_sub(previous.batches_read),
            empty_reads: self.empty_reads.saturating_sub(previous.empty_reads),
            records_read: self.records_read.saturating_sub(previous.records_read),
            records_written: self.records_written.saturating_sub(previous.records_written),
            processor_errors: self
                .processor_errors
                .saturating_sub(previous.processor_errors),
            sink_errors: self.sink_errors.saturating_sub(previous.sink_errors),
            checkpoints: self.checkpoints.saturating_sub(previous.checkpoints),
            checkpoint_errors: self
                .checkpoint_errors
                .saturating_sub(previous.checkpoint_errors),
            process_duration_ns: self
                .process_duration_ns
                .saturating_sub(previous.process_duration_ns),
        }
    }
}
