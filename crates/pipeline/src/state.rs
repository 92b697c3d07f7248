//! Pipeline lifecycle state

use std::fmt;

/// Lifecycle of a pipeline
///
/// ```text
/// Created ──start──> Running ──stop──> Stopping ──> Stopped
///    └──────────────stop───────────────────────────────┘
/// ```
///
/// A stopped pipeline cannot be restarted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineState {
    /// Built, workers not spawned
    Created,
    /// Source and workers running
    Running,
    /// Draining in-flight batches
    Stopping,
    /// Terminal
    Stopped,
}

impl PipelineState {
    /// Lowercase name for logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Running => "running",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
        }
    }

    /// Whether no further transitions are possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Stopped)
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
