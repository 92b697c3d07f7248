//! Processor error types
//!
//! Errors that can occur while processing a batch.

use sluice_protocol::ProtocolError;
use thiserror::Error;

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;

/// Errors that can occur during processing
#[derive(Debug, Error)]
pub enum ProcessError {
    /// Processing logic failed for this batch
    #[error("processing failed: {0}")]
    Failed(String),

    /// Processor cannot continue; the pipeline should stop
    #[error("fatal processing error: {0}")]
    Fatal(String),

    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Plugin setting has the wrong type
    #[error(transparent)]
    Setting(#[from] ProtocolError),
}

impl ProcessError {
    /// Create a processing failed error
    pub fn failed(msg: impl Into<String>) -> Self {
        Self::Failed(msg.into())
    }

    /// Create a fatal error
    pub fn fatal(msg: impl Into<String>) -> Self {
        Self::Fatal(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether the pipeline should stop instead of moving on to the next batch
    #[inline]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal(_))
    }
}
