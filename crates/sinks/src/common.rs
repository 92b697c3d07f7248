//! Sink errors and per-sink counters

use std::sync::atomic::{AtomicU64, Ordering};

use sluice_protocol::ProtocolError;
use thiserror::Error;

#[cfg(test)]
#[path = "common_test.rs"]
mod common_test;

/// Why a sink could not take a batch
///
/// Workers use [`is_fatal`](Self::is_fatal) to decide whether the pipeline
/// keeps running. A failed batch is never checkpointed either way.
#[derive(Debug, Error)]
pub enum SinkError {
    /// Destination is temporarily not accepting data
    #[error("sink unavailable: {0}")]
    Unavailable(String),

    /// Destination is gone for good; the pipeline should stop
    #[error("fatal sink error: {0}")]
    Fatal(String),

    /// Batch could not be written
    #[error("write failed: {0}")]
    Write(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Record could not be rendered
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Rejected at construction
    #[error("configuration error: {0}")]
    Config(String),

    /// Plugin option has the wrong type
    #[error(transparent)]
    Setting(#[from] ProtocolError),
}

impl SinkError {
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    pub fn fatal(msg: impl Into<String>) -> Self {
        Self::Fatal(msg.into())
    }

    pub fn write(msg: impl Into<String>) -> Self {
        Self::Write(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether the pipeline should stop after this error
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal(_))
    }

    /// Whether the same batch may succeed if written again later
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Write(_) | Self::Io(_))
    }
}

/// Counters kept by a sink instance
///
/// Shared through `Arc` so callers can read them after the sink has been
/// handed to a pipeline.
#[derive(Debug, Default)]
pub struct SinkMetrics {
    batches: AtomicU64,
    records: AtomicU64,
    bytes: AtomicU64,
    failures: AtomicU64,
    flushes: AtomicU64,
}

impl SinkMetrics {
    pub const fn new() -> Self {
        Self {
            batches: AtomicU64::new(0),
            records: AtomicU64::new(0),
            bytes: AtomicU64::new(0),
            failures: AtomicU64::new(0),
            flushes: AtomicU64::new(0),
        }
    }

    /// A batch reached the destination
    #[inline]
    pub fn delivered(&self, records: usize, bytes: usize) {
        self.batches.fetch_add(1, Ordering::Relaxed);
        self.records.fetch_add(records as u64, Ordering::Relaxed);
        self.bytes.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    /// A batch was rejected
    #[inline]
    pub fn failed(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn flushed(&self) {
        self.flushes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> SinkStats {
        SinkStats {
            batches: self.batches.load(Ordering::Relaxed),
            records: self.records.load(Ordering::Relaxed),
            bytes: self.bytes.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            flushes: self.flushes.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`SinkMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SinkStats {
    /// Batches delivered
    pub batches: u64,
    /// Records delivered
    pub records: u64,
    /// Bytes written, for sinks that serialize
    pub bytes: u64,
    /// Batches rejected
    pub failures: u64,
    pub flushes: u64,
}

impl SinkStats {
    /// Share of attempted batches that failed, `None` before the first one
    pub fn failure_rate(&self) -> Option<f64> {
        let attempts = self.batches + self.failures;
        (attempts > 0).then(|| self.failures as f64 / attempts as f64)
    }
}
