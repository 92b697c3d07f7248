//! Configuration validation
//!
//! Validates config consistency:
//! - At least one pipeline
//! - Every pipeline has a source and at least one enabled sink
//! - Worker count and buffer settings are in range
//! - Plugin types are known
//! - `pipeline` connectors name existing pipelines, are mirrored on both
//!   ends, and do not form a cycle

use std::collections::{BTreeMap, VecDeque};

use sluice_buffer::BlockingBufferConfig;
use sluice_protocol::PluginSetting;

use crate::Config;
use crate::error::{ConfigError, Result};
use crate::pipeline::PipelineConfig;
use crate::plugins::{
    KNOWN_BUFFER_TYPES, KNOWN_SINK_TYPES, KNOWN_SOURCE_TYPES, PIPELINE_CONNECTOR,
    connector_target, is_known_processor_type,
};

/// Validate the entire configuration
pub fn validate_config(config: &Config) -> Result<()> {
    if config.pipelines.is_empty() {
        return Err(ConfigError::NoPipelines);
    }

    for (name, pipeline) in &config.pipelines {
        validate_pipeline(name, pipeline)?;
    }

    validate_connectors(config)?;
    start_order(config)?;
    Ok(())
}

/// Validate a single pipeline in isolation
fn validate_pipeline(name: &str, pipeline: &PipelineConfig) -> Result<()> {
    if pipeline.workers == 0 {
        return Err(ConfigError::invalid_value(
            "pipeline",
            name,
            "workers",
            "must be at least 1",
        ));
    }

    validate_buffer(name, &pipeline.buffer)?;

    let source = pipeline
        .source
        .as_ref()
        .ok_or_else(|| ConfigError::missing_field("pipeline", name, "source"))?;
    if !KNOWN_SOURCE_TYPES.contains(&source.plugin_type.as_str()) {
        return Err(ConfigError::unknown_plugin_type(name, "source", &source.plugin_type));
    }

    for processor in pipeline.processors.iter().filter(|p| p.enabled) {
        if !is_known_processor_type(&processor.plugin_type) {
            return Err(ConfigError::unknown_plugin_type(
                name,
                "processor",
                &processor.plugin_type,
            ));
        }
    }

    if pipeline.enabled_sinks().next().is_none() {
        return Err(ConfigError::missing_field("pipeline", name, "sinks"));
    }
    for sink in pipeline.enabled_sinks() {
        if !KNOWN_SINK_TYPES.contains(&sink.plugin_type.as_str()) {
            return Err(ConfigError::unknown_plugin_type(name, "sink", &sink.plugin_type));
        }
    }

    Ok(())
}

/// Validate the buffer plugin and its sizes
fn validate_buffer(name: &str, buffer: &PluginSetting) -> Result<()> {
    if !KNOWN_BUFFER_TYPES.contains(&buffer.plugin_type.as_str()) {
        return Err(ConfigError::unknown_plugin_type(name, "buffer", &buffer.plugin_type));
    }

    BlockingBufferConfig::try_from(buffer)
        .map(|_| ())
        .map_err(|e| ConfigError::invalid_value("pipeline", name, "buffer", e.to_string()))
}

/// Validate `pipeline` connectors between pipelines
fn validate_connectors(config: &Config) -> Result<()> {
    for (name, pipeline) in &config.pipelines {
        let connector_settings = pipeline
            .source
            .iter()
            .chain(pipeline.enabled_sinks())
            .filter(|s| s.plugin_type == PIPELINE_CONNECTOR);

        for setting in connector_settings {
            let target = connector_target(setting)
                .ok_or_else(|| ConfigError::missing_field("pipeline connector", name, "name"))?;
            if target == name {
                return Err(ConfigError::invalid_value(
                    "pipeline connector",
                    name,
                    "name",
                    "a pipeline cannot connect to itself",
                ));
            }
            if !config.pipelines.contains_key(target) {
                return Err(ConfigError::unknown_pipeline(name, target));
            }
        }

        // Sink side: the downstream must read from us
        for target in pipeline.downstreams() {
            let downstream = &config.pipelines[target];
            if downstream.upstream() != Some(name.as_str()) {
                return Err(ConfigError::connector_mismatch(
                    name,
                    target,
                    format!("'{}' has no pipeline source naming '{}'", target, name),
                ));
            }
        }

        // Source side: the upstream must write to us
        if let Some(upstream) = pipeline.upstream() {
            let writes_here = config.pipelines[upstream]
                .downstreams()
                .contains(&name.as_str());
            if !writes_here {
                return Err(ConfigError::connector_mismatch(
                    upstream,
                    name,
                    format!("'{}' has no pipeline sink naming '{}'", upstream, name),
                ));
            }
        }
    }

    Ok(())
}

/// Order pipelines so each starts after every pipeline it writes into
///
/// Connector targets that don't exist are ignored here; `validate_connectors`
/// reports them.
pub fn start_order(config: &Config) -> Result<Vec<&str>> {
    // Outstanding downstreams per pipeline; a pipeline is ready at zero
    let mut pending: BTreeMap<&str, usize> = BTreeMap::new();
    // Reverse edges: downstream -> pipelines writing into it
    let mut writers: BTreeMap<&str, Vec<&str>> = BTreeMap::new();

    for (name, pipeline) in &config.pipelines {
        let targets: Vec<&str> = pipeline
            .downstreams()
            .into_iter()
            .filter(|t| config.pipelines.contains_key(*t))
            .collect();
        pending.insert(name.as_str(), targets.len());
        for target in targets {
            writers.entry(target).or_default().push(name.as_str());
        }
    }

    let mut ready: VecDeque<&str> = pending
        .iter()
        .filter(|(_, count)| **count == 0)
        .map(|(name, _)| *name)
        .collect();
    let mut order = Vec::with_capacity(pending.len());

    while let Some(name) = ready.pop_front() {
        order.push(name);
        for &writer in writers.get(name).into_iter().flatten() {
            if let Some(count) = pending.get_mut(writer) {
                *count -= 1;
                if *count == 0 {
                    ready.push_back(writer);
                }
            }
        }
    }

    if order.len() < pending.len() {
        let stuck: Vec<&str> = pending
            .iter()
            .filter(|(_, count)| **count > 0)
            .map(|(name, _)| *name)
            .collect();
        return Err(ConfigError::Cycle {
            pipelines: stuck.join(", "),
        });
    }

    Ok(order)
}
