//! Pipeline configuration
//!
//! One `[pipelines.<name>]` table per pipeline. Plugins are given as
//! `PluginSetting`s: a `type` plus free-form options handed to the factory.
//!
//! # Example
//!
//! ```toml
//! [pipelines.entry]
//! workers = 2
//! delay = "3s"
//! sink_policy = "fan_out"
//!
//! [pipelines.entry.source]
//! type = "random"
//!
//! [[pipelines.entry.processors]]
//! type = "filter"
//! field = "level"
//! value = "debug"
//!
//! [[pipelines.entry.sinks]]
//! type = "stdout"
//! ```

use std::time::Duration;

use serde::Deserialize;
use sluice_protocol::PluginSetting;

use crate::plugins::connector_target;

/// How a batch is spread over a pipeline's sinks
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SinkPolicy {
    /// Every sink receives the whole batch (default)
    #[default]
    FanOut,
    /// Every record goes to exactly one sink, chosen by routing key
    Partition,
}

/// Configuration for one pipeline
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Number of process workers
    /// Default: 1
    pub workers: usize,

    /// Read timeout for each buffer read
    /// Default: 3s
    #[serde(with = "humantime_serde")]
    pub delay: Duration,

    /// Pause after an empty read before reading again
    /// Default: 10ms
    #[serde(with = "humantime_serde")]
    pub idle_backoff: Duration,

    /// How long `stop` waits for in-flight batches before aborting workers
    /// Default: 10s
    #[serde(with = "humantime_serde")]
    pub drain_timeout: Duration,

    /// Fan-out or partition across sinks
    pub sink_policy: SinkPolicy,

    /// Buffer plugin
    /// Default: `bounded_blocking` with its own defaults
    pub buffer: PluginSetting,

    /// Source plugin (required)
    pub source: Option<PluginSetting>,

    /// Processors, applied in order
    pub processors: Vec<PluginSetting>,

    /// Sinks (at least one)
    pub sinks: Vec<PluginSetting>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: 1,
            delay: Duration::from_millis(3000),
            idle_backoff: Duration::from_millis(10),
            drain_timeout: Duration::from_secs(10),
            sink_policy: SinkPolicy::FanOut,
            buffer: PluginSetting::new("bounded_blocking"),
            source: None,
            processors: Vec::new(),
            sinks: Vec::new(),
        }
    }
}

impl PipelineConfig {
    /// Pipeline this one receives from, when its source is a connector
    pub fn upstream(&self) -> Option<&str> {
        self.source.as_ref().and_then(connector_target)
    }

    /// Pipelines this one writes into through enabled connector sinks
    pub fn downstreams(&self) -> Vec<&str> {
        self.sinks
            .iter()
            .filter(|s| s.enabled)
            .filter_map(connector_target)
            .collect()
    }

    /// Enabled sinks
    pub fn enabled_sinks(&self) -> impl Iterator<Item = &PluginSetting> {
        self.sinks.iter().filter(|s| s.enabled)
    }
}
