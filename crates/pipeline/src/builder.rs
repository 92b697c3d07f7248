//! Pipeline builder - turns a `Config` into a runnable topology
//!
//! Resolves every plugin through its registry, creates one shared
//! `PipelineConnector` per connected pair of pipelines and orders the
//! pipelines so each starts after the pipelines it writes into.
//!
//! The builder does not call `Config::validate`: `Config::from_str` already
//! did, and skipping it lets callers register plugin types the built-in
//! validation does not know.
//!
//! # Example
//!
//! ```ignore
//! let config: Config = std::fs::read_to_string("sluice.toml")?.parse()?;
//! let runner = PipelineBuilder::new().build(&config)?;
//! runner.run().await?;
//! ```

use std::collections::HashMap;
use std::fmt::Display;
use std::sync::Arc;

use sluice_buffer::{Buffer, BufferRegistry};
use sluice_config::{Config, PipelineConfig, connector_target};
use sluice_processor::{Chain, ProcessResult, ProcessorRegistry};
use sluice_protocol::{Event, PipelineInfo, PluginSetting};
use sluice_sinks::{Sink, SinkRegistry};
use sluice_sources::{Source, SourceRegistry};

use crate::{Pipeline, PipelineConnector, PipelineError, PipelineRunner, PipelineSettings, Result};

#[cfg(test)]
#[path = "builder_test.rs"]
mod tests;

/// Connectors keyed by (upstream, downstream)
type Connectors = HashMap<(String, String), Arc<PipelineConnector<Event>>>;

/// Builds `Event` pipelines from configuration
pub struct PipelineBuilder {
    buffers: BufferRegistry<Event>,
    processors: ProcessorRegistry<Event>,
    sources: SourceRegistry<Event>,
    sinks: SinkRegistry<Event>,
}

impl PipelineBuilder {
    /// Builder with every built-in plugin registered
    pub fn new() -> Self {
        Self {
            buffers: BufferRegistry::with_defaults(),
            processors: sluice_processor::default_registry(),
            sources: sluice_sources::default_registry(),
            sinks: sluice_sinks::default_registry(),
        }
    }

    /// Replace the buffer registry
    pub fn with_buffer_registry(mut self, registry: BufferRegistry<Event>) -> Self {
        self.buffers = registry;
        self
    }

    /// Replace the processor registry
    pub fn with_processor_registry(mut self, registry: ProcessorRegistry<Event>) -> Self {
        self.processors = registry;
        self
    }

    /// Replace the source registry
    pub fn with_source_registry(mut self, registry: SourceRegistry<Event>) -> Self {
        self.sources = registry;
        self
    }

    /// Replace the sink registry
    pub fn with_sink_registry(mut self, registry: SinkRegistry<Event>) -> Self {
        self.sinks = registry;
        self
    }

    /// Build every configured pipeline, in start order
    ///
    /// # Errors
    /// `PipelineError::Build` naming the pipeline and plugin that failed, or
    /// the pipelines forming a connector cycle
    pub fn build(&self, config: &Config) -> Result<PipelineRunner<Event>> {
        let order = config
            .start_order()
            .map_err(|e| PipelineError::build(e.to_string()))?;
        let connectors = create_connectors(config);

        let mut pipelines = Vec::with_capacity(order.len());
        for name in order {
            let pipeline_config = config
                .pipelines
                .get(name)
                .ok_or_else(|| PipelineError::build(format!("unknown pipeline '{}'", name)))?;
            let pipeline = self.build_pipeline(name, pipeline_config, &connectors)?;
            pipelines.push(Arc::new(pipeline));
        }

        tracing::debug!(
            pipelines = pipelines.len(),
            connectors = connectors.len(),
            "pipeline topology built"
        );

        PipelineRunner::new(pipelines, config.runner.shutdown_timeout)
    }

    fn build_pipeline(&self, name: &str, config: &PipelineConfig, connectors: &Connectors) -> Result<Pipeline<Event>> {
        let settings = PipelineSettings::from_config(name, config);
        settings.validate()?;
        let info = settings.info();

        let buffer: Arc<dyn Buffer<Event>> = self
            .buffers
            .create(&bind(&config.buffer, &info))
            .map_err(|e| plugin_error(name, "buffer", &config.buffer, e))?;

        let source_setting = config
            .source
            .as_ref()
            .ok_or_else(|| PipelineError::build(format!("pipeline '{}' has no source", name)))?;
        let source: Arc<dyn Source<Event>> = match connector_target(source_setting) {
            Some(upstream) => lookup(connectors, upstream, name)? as Arc<dyn Source<Event>>,
            None => self
                .sources
                .create(&bind(source_setting, &info))
                .map_err(|e| plugin_error(name, "source", source_setting, e))?,
        };

        let processors = config
            .processors
            .iter()
            .filter(|s| s.enabled)
            .map(|s| self.processors.create(&bind(s, &info)))
            .collect::<ProcessResult<Vec<_>>>()
            .map_err(|e| PipelineError::build(format!("pipeline '{}': processor: {}", name, e)))?;

        let mut sinks: Vec<Arc<dyn Sink<Event>>> = Vec::with_capacity(config.sinks.len());
        for setting in config.enabled_sinks() {
            let sink: Arc<dyn Sink<Event>> = match connector_target(setting) {
                Some(downstream) => lookup(connectors, name, downstream)? as Arc<dyn Sink<Event>>,
                None => self
                    .sinks
                    .create(&bind(setting, &info))
                    .map_err(|e| plugin_error(name, "sink", setting, e))?,
            };
            sinks.push(sink);
        }

        Pipeline::new(settings, source, buffer, Chain::new(processors), sinks)
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// One connector per enabled `pipeline` sink
fn create_connectors(config: &Config) -> Connectors {
    let mut connectors = Connectors::new();
    for (name, pipeline) in &config.pipelines {
        for downstream in pipeline.downstreams() {
            connectors
                .entry((name.clone(), downstream.to_string()))
                .or_insert_with(|| Arc::new(PipelineConnector::new(name.as_str(), downstream)));
        }
    }
    connectors
}

fn lookup(connectors: &Connectors, upstream: &str, downstream: &str) -> Result<Arc<PipelineConnector<Event>>> {
    connectors
        .get(&(upstream.to_string(), downstream.to_string()))
        .cloned()
        .ok_or_else(|| {
            PipelineError::build(format!(
                "pipeline '{}' is not connected to pipeline '{}'",
                upstream, downstream
            ))
        })
}

/// Hand the pipeline description to a plugin setting
fn bind(setting: &PluginSetting, info: &PipelineInfo) -> PluginSetting {
    setting.clone().with_pipeline(info.clone())
}

fn plugin_error(pipeline: &str, role: &str, setting: &PluginSetting, error: impl Display) -> PipelineError {
    PipelineError::build(format!(
        "pipeline '{}': {} '{}': {}",
        pipeline, role, setting.plugin_type, error
    ))
}
