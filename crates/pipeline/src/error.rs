//! Pipeline error types
//!
//! Errors for pipeline construction and lifecycle. Per-batch failures stay
//! inside the worker that hit them; these are what callers see.

use sluice_buffer::BufferError;
use sluice_config::ConfigError;
use sluice_processor::ProcessError;
use sluice_sinks::SinkError;
use sluice_sources::SourceError;
use thiserror::Error;

use crate::PipelineState;

/// Pipeline errors
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Invalid pipeline settings
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Lifecycle operation not allowed in the current state
    #[error("pipeline '{pipeline}' cannot {operation} while {state}")]
    InvalidState {
        pipeline: String,
        state: PipelineState,
        operation: &'static str,
    },

    /// Pipeline or topology could not be built
    #[error("failed to build pipeline: {0}")]
    Build(String),

    /// Pipelines that had to be aborted during shutdown
    #[error("shutdown timed out, aborted pipelines: {pipelines}")]
    ShutdownTimeout { pipelines: String },

    /// Tracing subscriber could not be installed
    #[error("failed to initialize logging: {0}")]
    Logging(String),

    /// Buffer error
    #[error(transparent)]
    Buffer(#[from] BufferError),

    /// Processor error
    #[error(transparent)]
    Process(#[from] ProcessError),

    /// Sink error
    #[error(transparent)]
    Sink(#[from] SinkError),

    /// Source error
    #[error(transparent)]
    Source(#[from] SourceError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl PipelineError {
    /// Create an invalid argument error
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Create an invalid state error
    pub fn invalid_state(
        pipeline: impl Into<String>,
        state: PipelineState,
        operation: &'static str,
    ) -> Self {
        Self::InvalidState {
            pipeline: pipeline.into(),
            state,
            operation,
        }
    }

    /// Create a build error
    pub fn build(msg: impl Into<String>) -> Self {
        Self::Build(msg.into())
    }
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;
