//! Source errors and per-source counters

use std::sync::atomic::{AtomicU64, Ordering};

use sluice_buffer::BufferError;
use sluice_protocol::ProtocolError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    /// `start` called on a running source
    #[error("source '{0}' already started")]
    AlreadyStarted(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("buffer error: {0}")]
    Buffer(#[from] BufferError),

    /// Plugin option has the wrong type, or the type is unknown
    #[error(transparent)]
    Setting(#[from] ProtocolError),
}

impl SourceError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

/// Counters kept by a running source
#[derive(Debug, Default)]
pub struct SourceMetrics {
    produced: AtomicU64,
    dropped: AtomicU64,
    errors: AtomicU64,
}

impl SourceMetrics {
    pub const fn new() -> Self {
        Self {
            produced: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
            errors: AtomicU64::new(0),
        }
    }

    /// Records the buffer accepted
    #[inline]
    pub fn produced(&self, records: usize) {
        self.produced.fetch_add(records as u64, Ordering::Relaxed);
    }

    /// A record given up after the buffer stayed full past the write timeout
    #[inline]
    pub fn dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> SourceStats {
        SourceStats {
            produced: self.produced.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`SourceMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SourceStats {
    pub produced: u64,
    pub dropped: u64,
    pub errors: u64,
}
