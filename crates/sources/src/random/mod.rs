//! Random source - generates UUID message events
//!
//! Writes one `{"message": "<uuid>"}` event into the buffer per interval.
//! Meant for trying out pipelines without a real input.
//!
//! # Configuration
//!
//! | Option | Type | Default | Description |
//! |--------|------|---------|-------------|
//! | `interval` | duration | `"500ms"` | Delay between events |
//! | `write_timeout` | duration | `"500ms"` | How long one write may wait on a full buffer |
//! | `max_records` | integer | unlimited | Stop after this many accepted events |
//!
//! A write that times out drops that event and the source carries on. A
//! closed buffer ends the source.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use sluice_buffer::{Buffer, BufferError};
use sluice_protocol::{Event, PluginSetting, Record, RecordMetadata};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::registry::SourceFactory;
use crate::{Source, SourceError, SourceMetrics, SourceResult};

#[cfg(test)]
#[path = "random_test.rs"]
mod tests;

/// Registered type name
pub const RANDOM: &str = "random";

/// Configuration for the random source
#[derive(Debug, Clone)]
pub struct RandomSourceConfig {
    /// Delay between events
    pub interval: Duration,
    /// Timeout for a single buffer write
    pub write_timeout: Duration,
    /// Stop after this many accepted events
    pub max_records: Option<u64>,
}

impl Default for RandomSourceConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(500),
            write_timeout: Duration::from_millis(500),
            max_records: None,
        }
    }
}

impl RandomSourceConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.interval.is_zero() {
            return Err("interval must be greater than zero".to_string());
        }
        Ok(())
    }
}

impl TryFrom<&PluginSetting> for RandomSourceConfig {
    type Error = SourceError;

    fn try_from(setting: &PluginSetting) -> Result<Self, Self::Error> {
        let defaults = Self::default();
        let config = Self {
            interval: setting.get_duration("interval")?.unwrap_or(defaults.interval),
            write_timeout: setting
                .get_duration("write_timeout")?
                .unwrap_or(defaults.write_timeout),
            max_records: setting.get_usize("max_records")?.map(|n| n as u64),
        };
        config.validate().map_err(SourceError::config)?;
        Ok(config)
    }
}

struct Running {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Source emitting random UUID messages
pub struct RandomSource {
    config: RandomSourceConfig,
    metrics: Arc<SourceMetrics>,
    running: Mutex<Option<Running>>,
}

impl RandomSource {
    /// Create a new random source
    pub fn new(config: RandomSourceConfig) -> Self {
        Self {
            config,
            metrics: Arc::new(SourceMetrics::new()),
            running: Mutex::new(None),
        }
    }

    /// Get source metrics
    pub fn metrics(&self) -> &SourceMetrics {
        &self.metrics
    }

    /// Whether the generator task is still producing
    pub fn is_running(&self) -> bool {
        self.running
            .lock()
            .as_ref()
            .is_some_and(|r| !r.handle.is_finished())
    }
}

#[async_trait]
impl Source<Event> for RandomSource {
    fn name(&self) -> &str {
        RANDOM
    }

    async fn start(&self, buffer: Arc<dyn Buffer<Event>>) -> SourceResult<()> {
        let mut running = self.running.lock();
        if running.is_some() {
            return Err(SourceError::AlreadyStarted(RANDOM.to_string()));
        }

        let cancel = CancellationToken::new();
        let generator = Generator {
            config: self.config.clone(),
            metrics: Arc::clone(&self.metrics),
            buffer,
            cancel: cancel.clone(),
        };

        tracing::info!(
            source = RANDOM,
            pipeline = %generator.buffer.pipeline_name(),
            interval = ?self.config.interval,
            "random source starting"
        );

        *running = Some(Running {
            cancel,
            handle: tokio::spawn(generator.run()),
        });
        Ok(())
    }

    async fn stop(&self) {
        let Some(running) = self.running.lock().take() else {
            return;
        };

        running.cancel.cancel();
        if let Err(e) = running.handle.await {
            tracing::warn!(source = RANDOM, error = %e, "random source task failed");
        }

        let snapshot = self.metrics.snapshot();
        tracing::info!(
            source = RANDOM,
            records = snapshot.produced,
            dropped = snapshot.dropped,
            "random source stopped"
        );
    }
}

impl std::fmt::Debug for RandomSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RandomSource")
            .field("config", &self.config)
            .field("metrics", &self.metrics)
            .field("running", &self.is_running())
            .finish()
    }
}

/// State moved into the spawned generator task
struct Generator {
    config: RandomSourceConfig,
    metrics: Arc<SourceMetrics>,
    buffer: Arc<dyn Buffer<Event>>,
    cancel: CancellationToken,
}

impl Generator {
    async fn run(self) {
        let mut written = 0u64;

        loop {
            if self.config.max_records.is_some_and(|max| written >= max) {
                tracing::debug!(source = RANDOM, written, "random source reached max_records");
                break;
            }

            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = tokio::time::sleep(self.config.interval) => {}
            }

            let record = Record::with_metadata(
                Event::from_message(uuid::Uuid::new_v4().to_string()),
                RecordMetadata::new(),
            );

            match self.buffer.write(record, self.config.write_timeout).await {
                Ok(()) => {
                    written += 1;
                    self.metrics.produced(1);
                }
                Err(rejected) => match rejected.error() {
                    BufferError::Closed { .. } => {
                        tracing::debug!(source = RANDOM, "buffer closed, random source ending");
                        break;
                    }
                    BufferError::Timeout { .. } => {
                        self.metrics.dropped();
                        tracing::debug!(source = RANDOM, "buffer full, dropping random event");
                    }
                    other => {
                        self.metrics.error();
                        tracing::warn!(source = RANDOM, error = %other, "random source write failed");
                    }
                },
            }
        }
    }
}

/// Factory for RandomSource
#[derive(Debug, Clone, Copy)]
pub struct RandomFactory;

impl SourceFactory<Event> for RandomFactory {
    fn create(&self, setting: &PluginSetting) -> SourceResult<Arc<dyn Source<Event>>> {
        let config = RandomSourceConfig::try_from(setting)?;
        Ok(Arc::new(RandomSource::new(config)))
    }

    fn name(&self) -> &'static str {
        RANDOM
    }
}
