//! Pipeline runner - starts and stops a set of connected pipelines
//!
//! Pipelines are kept in start order: every pipeline comes after the
//! pipelines it writes into. `run` starts them in that order and `shutdown`
//! stops them in reverse, so an upstream is always drained before the
//! pipeline it feeds closes its buffer.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::select_all;
use tokio::time::Instant;

use crate::{Pipeline, PipelineError, Result};

#[cfg(test)]
#[path = "runner_test.rs"]
mod tests;

/// Default bound on a whole runner shutdown
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Owns every pipeline of a process
pub struct PipelineRunner<T: Send + Sync + 'static> {
    /// In start order
    pipelines: Vec<Arc<Pipeline<T>>>,
    shutdown_timeout: Duration,
}

impl<T: Send + Sync + 'static> PipelineRunner<T> {
    /// Create a runner over pipelines given in start order
    ///
    /// # Errors
    /// `PipelineError::InvalidArgument` when no pipelines are given or two
    /// share a name
    pub fn new(pipelines: Vec<Arc<Pipeline<T>>>, shutdown_timeout: Duration) -> Result<Self> {
        if pipelines.is_empty() {
            return Err(PipelineError::invalid_argument("runner needs at least one pipeline"));
        }

        let mut seen = HashSet::with_capacity(pipelines.len());
        for pipeline in &pipelines {
            if !seen.insert(pipeline.name()) {
                return Err(PipelineError::invalid_argument(format!(
                    "duplicate pipeline name '{}'",
                    pipeline.name()
                )));
            }
        }

        Ok(Self {
            pipelines,
            shutdown_timeout,
        })
    }

    /// Pipelines in start order
    pub fn pipelines(&self) -> &[Arc<Pipeline<T>>] {
        &self.pipelines
    }

    /// Pipeline names in start order
    pub fn names(&self) -> Vec<&str> {
        self.pipelines.iter().map(|p| p.name()).collect()
    }

    /// Look up a pipeline by name
    pub fn get(&self, name: &str) -> Option<&Arc<Pipeline<T>>> {
        self.pipelines.iter().find(|p| p.name() == name)
    }

    /// Number of pipelines
    #[inline]
    pub fn len(&self) -> usize {
        self.pipelines.len()
    }

    /// Always false; construction rejects an empty runner
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pipelines.is_empty()
    }

    /// Bound on the whole shutdown
    pub fn shutdown_timeout(&self) -> Duration {
        self.shutdown_timeout
    }

    /// Start every pipeline in dependency order
    ///
    /// If one fails to start, the ones already started are stopped again in
    /// reverse order and the start error is returned.
    pub async fn run(&self) -> Result<()> {
        tracing::info!(pipelines = ?self.names(), "starting pipelines");

        for (index, pipeline) in self.pipelines.iter().enumerate() {
            if let Err(e) = pipeline.start().await {
                tracing::error!(
                    pipeline = pipeline.name(),
                    error = %e,
                    "pipeline failed to start, stopping started pipelines"
                );
                for started in self.pipelines[..index].iter().rev() {
                    if let Err(stop_err) = started.stop().await {
                        tracing::warn!(pipeline = started.name(), error = %stop_err, "failed to stop pipeline");
                    }
                }
                return Err(e);
            }
        }

        tracing::info!(count = self.pipelines.len(), "all pipelines running");
        Ok(())
    }

    /// Resolves with the name of the first pipeline that requests a stop
    pub async fn wait(&self) -> &str {
        let requests = self
            .pipelines
            .iter()
            .map(|pipeline| Box::pin(pipeline.stop_requested()));
        let ((), index, _) = select_all(requests).await;

        let name = self.pipelines[index].name();
        tracing::warn!(pipeline = name, "pipeline requested stop");
        name
    }

    /// Stop every pipeline, upstream first, within the shutdown timeout
    ///
    /// Pipelines still stopping when the timeout runs out are aborted.
    ///
    /// # Errors
    /// `PipelineError::ShutdownTimeout` naming the aborted pipelines
    pub async fn shutdown(&self) -> Result<()> {
        tracing::info!(
            shutdown_timeout = ?self.shutdown_timeout,
            "stopping pipelines"
        );

        let deadline = Instant::now() + self.shutdown_timeout;
        let mut aborted = Vec::new();

        for pipeline in self.pipelines.iter().rev() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match tokio::time::timeout(remaining, pipeline.stop()).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::warn!(pipeline = pipeline.name(), error = %e, "failed to stop pipeline");
                }
                Err(_) => {
                    tracing::warn!(pipeline = pipeline.name(), "pipeline did not stop in time, aborting");
                    pipeline.abort();
                    aborted.push(pipeline.name());
                }
            }
        }

        if aborted.is_empty() {
            tracing::info!("all pipelines stopped");
            Ok(())
        } else {
            Err(PipelineError::ShutdownTimeout {
                pipelines: aborted.join(", "),
            })
        }
    }
}

impl<T: Send + Sync + 'static> std::fmt::Debug for PipelineRunner<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineRunner")
            .field("pipelines", &self.names())
            .field("shutdown_timeout", &self.shutdown_timeout)
            .finish()
    }
}
