//! Buffer error types
//!
//! Every buffer operation reports failures through `BufferError`. Writes that
//! fail hand their records back to the caller wrapped in `Rejected`, so a
//! source can retry, drop or reject upstream without losing data.

use std::fmt;
use std::time::Duration;

use sluice_protocol::ProtocolError;
use thiserror::Error;

/// Buffer errors
#[derive(Debug, Error)]
pub enum BufferError {
    /// Invalid construction argument (capacity, batch size, plugin type)
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A `write_all` batch can never fit in this buffer
    #[error("batch of {requested} records exceeds buffer capacity {capacity}")]
    SizeOverflow {
        /// Records in the rejected batch
        requested: usize,
        /// Total buffer capacity
        capacity: usize,
    },

    /// No space freed up before the deadline
    #[error("timed out after {timeout:?} waiting for buffer space")]
    Timeout {
        /// The timeout that expired
        timeout: Duration,
    },

    /// The owning pipeline is stopping or stopped
    #[error("buffer of pipeline '{pipeline}' is closed")]
    Closed {
        /// Name of the owning pipeline
        pipeline: String,
    },

    /// Checkpoint token is unknown, foreign or already used
    #[error("invalid checkpoint: {0}")]
    InvalidState(String),

    /// Plugin setting could not be interpreted
    #[error("invalid buffer setting: {0}")]
    Setting(#[from] ProtocolError),
}

impl BufferError {
    /// Create an invalid argument error
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Create a closed error
    pub fn closed(pipeline: impl Into<String>) -> Self {
        Self::Closed {
            pipeline: pipeline.into(),
        }
    }

    /// Create an invalid state error
    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    /// Whether this error is a backpressure signal the caller may retry
    #[inline]
    pub fn is_backpressure(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Result type for buffer operations
pub type Result<T> = std::result::Result<T, BufferError>;

/// A write the buffer refused, with the payload handed back
///
/// Converts into `BufferError` with `?` when the caller does not need the
/// records back.
pub struct Rejected<P> {
    error: BufferError,
    payload: P,
}

impl<P> Rejected<P> {
    /// Wrap an error together with the refused payload
    #[inline]
    pub fn new(error: BufferError, payload: P) -> Self {
        Self { error, payload }
    }

    /// The reason the write was refused
    #[inline]
    pub fn error(&self) -> &BufferError {
        &self.error
    }

    /// Take the refused payload back
    #[inline]
    pub fn into_payload(self) -> P {
        self.payload
    }

    /// Split into error and payload
    #[inline]
    pub fn into_parts(self) -> (BufferError, P) {
        (self.error, self.payload)
    }
}

impl<P> From<Rejected<P>> for BufferError {
    fn from(rejected: Rejected<P>) -> Self {
        rejected.error
    }
}

impl<P> fmt::Debug for Rejected<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rejected")
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

impl<P> fmt::Display for Rejected<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.error, f)
    }
}

impl<P> std::error::Error for Rejected<P> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BufferError::SizeOverflow {
            requested: 14,
            capacity: 13,
        };
        assert!(err.to_string().contains("14"));
        assert!(err.to_string().contains("13"));

        let err = BufferError::closed("entry");
        assert!(err.to_string().contains("entry"));

        let err = BufferError::Timeout {
            timeout: Duration::from_millis(100),
        };
        assert!(err.to_string().contains("100ms"));
        assert!(err.is_backpressure());
        assert!(!BufferError::closed("x").is_backpressure());
    }

    #[test]
    fn test_rejected_returns_payload() {
        let rejected = Rejected::new(BufferError::closed("p"), vec![1, 2, 3]);
        assert!(matches!(rejected.error(), BufferError::Closed { .. }));
        assert!(rejected.to_string().contains("closed"));

        let (err, payload) = rejected.into_parts();
        assert_eq!(payload, vec![1, 2, 3]);
        assert!(matches!(err, BufferError::Closed { .. }));
    }

    #[test]
    fn test_rejected_into_buffer_error() {
        fn write() -> Result<()> {
            Err(Rejected::new(BufferError::invalid_state("x"), "payload"))?;
            Ok(())
        }
        assert!(matches!(write(), Err(BufferError::InvalidState(_))));
    }
}
