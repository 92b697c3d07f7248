//! Processor Chain - Sequential batch processing
//!
//! The `Chain` applies every processor of a pipeline in declared order. One
//! chain is shared by all workers of the pipeline.
//!
//! # Design
//!
//! - **Zero-cost when empty**: Empty chain returns the batch untouched
//! - **Sequential execution**: Each processor receives the previous output
//! - **Fail-fast**: First error stops the chain; the batch is not checkpointed
//! - **Single-thread lanes**: Processors flagged `is_single_thread()` are
//!   wrapped in an async mutex so only one worker runs them at a time

use tokio::sync::Mutex;

use sluice_protocol::Record;

use crate::{ProcessResult, Processor};

#[cfg(test)]
#[path = "chain_test.rs"]
mod tests;

struct Stage<T> {
    processor: Box<dyn Processor<T>>,
    /// Present only for single-thread processors
    lane: Option<Mutex<()>>,
}

impl<T> Stage<T> {
    async fn execute(&self, records: Vec<Record<T>>) -> ProcessResult<Vec<Record<T>>> {
        match &self.lane {
            Some(lane) => {
                let _guard = lane.lock().await;
                self.processor.execute(records).await
            }
            None => self.processor.execute(records).await,
        }
    }
}

/// Chain of processors applied sequentially
///
/// Processors are applied in the order they were given. If any processor
/// returns an error the chain stops and returns that error.
pub struct Chain<T> {
    stages: Vec<Stage<T>>,
}

impl<T: Send + 'static> Chain<T> {
    /// Create a new processor chain
    ///
    /// Only enabled processors are included in the chain.
    pub fn new(processors: Vec<Box<dyn Processor<T>>>) -> Self {
        let stages = processors
            .into_iter()
            .filter(|p| p.enabled())
            .map(|processor| {
                let lane = processor.is_single_thread().then(|| Mutex::new(()));
                Stage { processor, lane }
            })
            .collect();

        Self { stages }
    }

    /// Create an empty chain (no-op)
    pub fn empty() -> Self {
        Self { stages: Vec::new() }
    }

    /// Get the number of active processors
    #[inline]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Check if the chain is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Get the names of all active processors
    pub fn names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.processor.name()).collect()
    }

    /// Names of processors confined to a single-thread lane
    pub fn single_thread_names(&self) -> Vec<&'static str> {
        self.stages
            .iter()
            .filter(|s| s.lane.is_some())
            .map(|s| s.processor.name())
            .collect()
    }

    /// Run a batch through all processors in sequence
    pub async fn execute(&self, records: Vec<Record<T>>) -> ProcessResult<Vec<Record<T>>> {
        let mut current = records;

        for stage in &self.stages {
            current = stage.execute(current).await.inspect_err(|e| {
                tracing::debug!(processor = stage.processor.name(), error = %e, "processor failed");
            })?;
        }

        Ok(current)
    }

    /// Shut down every processor in order
    ///
    /// Records flushed by a processor run through the processors after it
    /// before those are shut down in turn. Returns what reaches the end of
    /// the chain.
    pub async fn shutdown(&self) -> ProcessResult<Vec<Record<T>>> {
        let mut carried = Vec::new();

        for stage in &self.stages {
            let mut output = if carried.is_empty() {
                Vec::new()
            } else {
                stage.execute(carried).await?
            };

            let flushed = match &stage.lane {
                Some(lane) => {
                    let _guard = lane.lock().await;
                    stage.processor.shutdown().await?
                }
                None => stage.processor.shutdown().await?,
            };
            if !flushed.is_empty() {
                tracing::debug!(
                    processor = stage.processor.name(),
                    records = flushed.len(),
                    "processor flushed records on shutdown"
                );
            }
            output.extend(flushed);
            carried = output;
        }

        Ok(carried)
    }

    /// Get a processor by name
    pub fn get(&self, name: &str) -> Option<&dyn Processor<T>> {
        self.stages
            .iter()
            .find(|s| s.processor.name() == name)
            .map(|s| s.processor.as_ref())
    }
}

impl<T: Send + 'static> Default for Chain<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T> std::fmt::Debug for Chain<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.stages.iter().map(|s| s.processor.name()))
            .finish()
    }
}
