//! Stdout Sink - JSON lines output
//!
//! Writes every record as one line of JSON to stdout (or stderr). Intended
//! for development and debugging, not for high throughput.
//!
//! # Configuration
//!
//! | Option | Type | Default | Description |
//! |--------|------|---------|-------------|
//! | `output` | string | `"stdout"` | `stdout` or `stderr` |
//! | `include_metadata` | bool | `false` | Wrap each record with its metadata |
//! | `max_records` | integer | `0` | Records printed per batch (0 = all) |
//!
//! # Example Output
//!
//! ```text
//! {"message":"6f1c6a2e-0b7e-4d53-9f0e-0e1a9b9c2f4d"}
//! {"data":{"message":"started"},"@metadata":{"arrival_time":"2026-01-01T07:34:59.161Z"}}
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};
use sluice_protocol::{PluginSetting, Record, RecordMetadata};
use tokio::io::{AsyncWrite, AsyncWriteExt, Stderr, Stdout};
use tokio::sync::Mutex;

use crate::registry::SinkFactory;
use crate::{Sink, SinkError, SinkMetrics, SinkResult};

#[cfg(test)]
#[path = "stdout_test.rs"]
mod tests;

/// Registered type name
pub const STDOUT: &str = "stdout";

/// Stream the sink writes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StdoutTarget {
    #[default]
    Stdout,
    Stderr,
}

/// Configuration for stdout sink
#[derive(Debug, Clone, Default)]
pub struct StdoutConfig {
    /// Stream to write to
    pub target: StdoutTarget,

    /// Wrap each record as `{"data": .., "@metadata": ..}`
    pub include_metadata: bool,

    /// Maximum records to print per batch (0 = all)
    pub max_records: usize,
}

impl StdoutConfig {
    /// Create config that also prints record metadata
    pub fn with_metadata() -> Self {
        Self {
            include_metadata: true,
            ..Self::default()
        }
    }
}

impl TryFrom<&PluginSetting> for StdoutConfig {
    type Error = SinkError;

    fn try_from(setting: &PluginSetting) -> Result<Self, Self::Error> {
        let target = match setting.get_str("output") {
            None | Some("stdout") => StdoutTarget::Stdout,
            Some("stderr") => StdoutTarget::Stderr,
            Some(other) => {
                return Err(SinkError::config(format!(
                    "unknown output '{}', expected stdout or stderr",
                    other
                )));
            }
        };

        Ok(Self {
            target,
            include_metadata: setting.get_bool("include_metadata").unwrap_or(false),
            max_records: setting.get_usize("max_records")?.unwrap_or(0),
        })
    }
}

/// Stdout sink for debug output
///
/// Generic over the writer so tests can capture output in memory.
pub struct StdoutSink<W = Stdout> {
    /// Serializes whole batches so lines from concurrent workers never interleave
    writer: Mutex<W>,

    /// Configuration
    config: StdoutConfig,

    /// Sink name for logging
    name: String,

    /// Metrics (Arc for sharing with metrics handle)
    metrics: Arc<SinkMetrics>,
}

impl StdoutSink<Stdout> {
    /// Create a new stdout sink with default config
    pub fn new() -> Self {
        Self::with_writer(tokio::io::stdout(), StdoutConfig::default())
    }
}

impl Default for StdoutSink<Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl StdoutSink<Stderr> {
    /// Create a sink writing to stderr
    pub fn stderr(config: StdoutConfig) -> Self {
        Self::with_writer(tokio::io::stderr(), config)
    }
}

impl<W: AsyncWrite + Unpin + Send> StdoutSink<W> {
    /// Create a sink over any async writer
    pub fn with_writer(writer: W, config: StdoutConfig) -> Self {
        Self {
            writer: Mutex::new(writer),
            config,
            name: STDOUT.to_string(),
            metrics: Arc::new(SinkMetrics::new()),
        }
    }

    /// Get reference to metrics
    #[inline]
    pub fn metrics(&self) -> &SinkMetrics {
        &self.metrics
    }

    /// Get a metrics handle for reporting
    pub fn metrics_handle(&self) -> Arc<SinkMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Consume the sink and return its writer
    pub fn into_writer(self) -> W {
        self.writer.into_inner()
    }

    /// Render a batch as JSON lines
    fn render<T: Serialize>(&self, records: &[Record<T>]) -> SinkResult<Vec<u8>> {
        let limit = match self.config.max_records {
            0 => records.len(),
            max => max.min(records.len()),
        };

        let mut out = Vec::with_capacity(limit * 64);
        for record in &records[..limit] {
            if self.config.include_metadata {
                let mut line = Map::new();
                line.insert("data".into(), serde_json::to_value(record.data())?);
                line.insert("@metadata".into(), metadata_json(record.metadata()));
                serde_json::to_writer(&mut out, &Value::Object(line))?;
            } else {
                serde_json::to_writer(&mut out, record.data())?;
            }
            out.push(b'\n');
        }

        Ok(out)
    }
}

fn metadata_json(metadata: &RecordMetadata) -> Value {
    let mut map = Map::new();
    map.insert(
        "arrival_time".into(),
        Value::String(metadata.arrival_time().to_rfc3339()),
    );
    if let Some(id) = metadata.correlation_id() {
        map.insert("correlation_id".into(), Value::String(id.to_string()));
    }
    if let Some(key) = metadata.routing_key() {
        map.insert("routing_key".into(), Value::String(key.to_string()));
    }
    Value::Object(map)
}

#[async_trait]
impl<T, W> Sink<T> for StdoutSink<W>
where
    T: Serialize + Send + Sync + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn output(&self, records: &[Record<T>]) -> SinkResult<()> {
        let bytes = self.render(records).inspect_err(|_| self.metrics.failed())?;
        if bytes.is_empty() {
            self.metrics.delivered(0, 0);
            return Ok(());
        }

        let mut writer = self.writer.lock().await;
        let written = async {
            writer.write_all(&bytes).await?;
            writer.flush().await
        }
        .await;

        match written {
            Ok(()) => {
                self.metrics.delivered(records.len(), bytes.len());
                Ok(())
            }
            Err(e) => {
                self.metrics.failed();
                Err(e.into())
            }
        }
    }

    async fn shutdown(&self) -> SinkResult<()> {
        self.writer.lock().await.flush().await?;
        self.metrics.flushed();

        let snapshot = self.metrics.snapshot();
        tracing::info!(
            sink = %self.name,
            batches = snapshot.batches,
            records = snapshot.records,
            bytes = snapshot.bytes,
            "stdout sink shutting down"
        );
        Ok(())
    }
}

impl<W> std::fmt::Debug for StdoutSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StdoutSink")
            .field("name", &self.name)
            .field("config", &self.config)
            .field("metrics", &self.metrics)
            .finish()
    }
}

/// Factory for StdoutSink
///
/// Works for any serializable record type.
#[derive(Debug, Clone, Copy)]
pub struct StdoutFactory;

impl<T: Serialize + Send + Sync + 'static> SinkFactory<T> for StdoutFactory {
    fn create(&self, setting: &PluginSetting) -> SinkResult<Arc<dyn Sink<T>>> {
        let config = StdoutConfig::try_from(setting)?;
        Ok(match config.target {
            StdoutTarget::Stdout => Arc::new(StdoutSink::with_writer(tokio::io::stdout(), config)),
            StdoutTarget::Stderr => Arc::new(StdoutSink::stderr(config)),
        })
    }

    fn name(&self) -> &'static str {
        STDOUT
    }
}
