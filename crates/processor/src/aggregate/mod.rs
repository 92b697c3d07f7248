//! Aggregate Processor - Count events per group
//!
//! Groups events by identification keys and emits one summary event per
//! group when the group closes. A group closes when its window elapses
//! (checked as batches arrive), when it reaches `max_events`, or when the
//! pipeline shuts down.
//!
//! Group state is shared across batches, so the processor is confined to a
//! single-thread lane.
//!
//! # Configuration
//!
//! ```toml
//! [[pipelines.entry.processors]]
//! type = "aggregate"
//! identification_keys = ["host", "status"]
//! group_duration = "30s"
//! max_events = 500
//! count_key = "aggregate_count"
//! pass_through = true
//! ```
//!
//! Summary event:
//!
//! ```json
//! {"host": "web-1", "status": 500, "aggregate_count": 42,
//!  "aggregate_start": "2024-05-01T10:00:00+00:00", "aggregate_end": "2024-05-01T10:00:29+00:00"}
//! ```

mod config;
mod state;

pub use config::AggregateConfig;
pub use state::{AggregateGroup, AggregateState};

use std::sync::atomic::{AtomicU64, Ordering};

use sluice_protocol::{Event, PluginSetting, Record};
use tokio::sync::Mutex;

use crate::registry::ProcessorFactory;
use crate::{ProcessError, ProcessFuture, ProcessResult, Processor};

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;

/// Metrics for the aggregate processor
#[derive(Debug, Default)]
pub struct AggregateMetrics {
    /// Batches processed
    pub batches_processed: AtomicU64,
    /// Events received
    pub events_received: AtomicU64,
    /// Groups opened
    pub groups_opened: AtomicU64,
    /// Summary events emitted
    pub summaries_emitted: AtomicU64,
}

/// Aggregate processor
pub struct AggregateProcessor {
    config: AggregateConfig,
    state: Mutex<AggregateState>,
    metrics: AggregateMetrics,
}

impl AggregateProcessor {
    /// Create a new aggregate processor
    pub fn new(config: AggregateConfig) -> ProcessResult<Self> {
        config.validate().map_err(ProcessError::config)?;

        Ok(Self {
            config,
            state: Mutex::new(AggregateState::new()),
            metrics: AggregateMetrics::default(),
        })
    }

    /// Get processor metrics
    pub fn metrics(&self) -> &AggregateMetrics {
        &self.metrics
    }

    /// Number of groups currently open
    pub async fn group_count(&self) -> usize {
        self.state.lock().await.group_count()
    }

    fn summarize(&self, group: &AggregateGroup) -> Record<Event> {
        self.metrics.summaries_emitted.fetch_add(1, Ordering::Relaxed);
        Record::new(group.summary(&self.config.identification_keys, &self.config.count_key))
    }

    async fn process_batch(&self, records: Vec<Record<Event>>) -> Vec<Record<Event>> {
        let mut state = self.state.lock().await;

        self.metrics.batches_processed.fetch_add(1, Ordering::Relaxed);
        self.metrics
            .events_received
            .fetch_add(records.len() as u64, Ordering::Relaxed);

        let mut output = Vec::with_capacity(records.len());

        for group in state.take_expired(self.config.group_duration) {
            output.push(self.summarize(&group));
        }

        for record in records {
            let (key, opened) = state.observe(
                record.data(),
                &self.config.identification_keys,
                record.metadata().arrival_time(),
            );
            if opened {
                self.metrics.groups_opened.fetch_add(1, Ordering::Relaxed);
            }

            if self.config.pass_through {
                output.push(record);
            }

            let full = state
                .get(&key)
                .is_some_and(|group| group.count >= self.config.max_events);
            if full && let Some(group) = state.remove(&key) {
                output.push(self.summarize(&group));
            }
        }

        output
    }
}

impl Processor<Event> for AggregateProcessor {
    fn execute<'a>(&'a self, records: Vec<Record<Event>>) -> ProcessFuture<'a, Vec<Record<Event>>> {
        Box::pin(async move { Ok(self.process_batch(records).await) })
    }

    fn name(&self) -> &'static str {
        "aggregate"
    }

    fn enabled(&self) -> bool {
        self.config.enabled
    }

    fn is_single_thread(&self) -> bool {
        true
    }

    fn shutdown<'a>(&'a self) -> ProcessFuture<'a, Vec<Record<Event>>> {
        Box::pin(async move {
            let groups = self.state.lock().await.take_all();
            Ok(groups.iter().map(|group| self.summarize(group)).collect())
        })
    }
}

impl std::fmt::Debug for AggregateProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AggregateProcessor")
            .field("config", &self.config)
            .field("metrics", &self.metrics)
            .finish()
    }
}

/// Factory for creating aggregate processors
#[derive(Debug, Clone, Copy)]
pub struct AggregateFactory;

impl ProcessorFactory<Event> for AggregateFactory {
    fn create(&self, setting: &PluginSetting) -> ProcessResult<Box<dyn Processor<Event>>> {
        let config = AggregateConfig::try_from(setting).map_err(ProcessError::config)?;
        Ok(Box::new(AggregateProcessor::new(config)?))
    }

    fn name(&self) -> &'static str {
        "aggregate"
    }
}
