//! Plugin settings
//!
//! A `PluginSetting` is what every plugin factory receives: the plugin type
//! name, an enabled flag, free-form options from the configuration file, and
//! a description of the pipeline the plugin is being built for.
//!
//! # Example
//!
//! ```toml
//! [pipelines.entry.buffer]
//! type = "bounded_blocking"
//! buffer_size = 512
//! batch_size = 8
//! ```

use std::collections::HashMap;
use std::time::Duration;

use serde::Deserialize;

use crate::{PipelineDescription, PipelineInfo, ProtocolError, Result};

/// Configuration for a single plugin instance
#[derive(Debug, Clone, Deserialize)]
pub struct PluginSetting {
    /// Plugin type (e.g., "bounded_blocking", "filter", "stdout")
    #[serde(rename = "type")]
    pub plugin_type: String,

    /// Whether this plugin is enabled (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Type-specific options, passed through to the plugin factory
    #[serde(flatten)]
    pub options: HashMap<String, toml::Value>,

    /// Pipeline this plugin is built for (filled in by the builder)
    #[serde(skip)]
    pipeline: PipelineInfo,
}

fn default_true() -> bool {
    true
}

impl PluginSetting {
    /// Create a setting for the given plugin type with no options
    pub fn new(plugin_type: impl Into<String>) -> Self {
        Self {
            plugin_type: plugin_type.into(),
            enabled: true,
            options: HashMap::new(),
            pipeline: PipelineInfo::default(),
        }
    }

    /// Add an option
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<toml::Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Attach the owning pipeline's description
    pub fn with_pipeline(mut self, pipeline: PipelineInfo) -> Self {
        self.pipeline = pipeline;
        self
    }

    /// Description of the pipeline this plugin belongs to
    #[inline]
    pub fn pipeline(&self) -> &PipelineInfo {
        &self.pipeline
    }

    /// Name of the pipeline this plugin belongs to
    #[inline]
    pub fn pipeline_name(&self) -> &str {
        self.pipeline.pipeline_name()
    }

    /// Get an option as string
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.options.get(key).and_then(|v| v.as_str())
    }

    /// Get an option as bool
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.options.get(key).and_then(|v| v.as_bool())
    }

    /// Get an option as i64
    pub fn get_int(&self, key: &str) -> Option<i64> {
        self.options.get(key).and_then(|v| v.as_integer())
    }

    /// Get an option as f64
    pub fn get_float(&self, key: &str) -> Option<f64> {
        self.options.get(key).and_then(|v| v.as_float())
    }

    /// Get an array option as Vec<String>
    pub fn get_string_array(&self, key: &str) -> Option<Vec<String>> {
        self.options.get(key).and_then(|v| {
            v.as_array().map(|arr| {
                arr.iter()
                    .filter_map(|v| v.as_str().map(|s| s.to_string()))
                    .collect()
            })
        })
    }

    /// Get a non-negative integer option
    ///
    /// Returns `Ok(None)` when the option is absent and an error when it is
    /// present with the wrong type or a negative value.
    pub fn get_usize(&self, key: &str) -> Result<Option<usize>> {
        match self.options.get(key) {
            None => Ok(None),
            Some(toml::Value::Integer(n)) if *n >= 0 => Ok(Some(*n as usize)),
            Some(_) => Err(ProtocolError::invalid_setting(
                &self.plugin_type,
                key,
                "a non-negative integer",
            )),
        }
    }

    /// Get a duration option
    ///
    /// Accepts humantime strings (`"500ms"`, `"3s"`) or integers (milliseconds).
    pub fn get_duration(&self, key: &str) -> Result<Option<Duration>> {
        match self.options.get(key) {
            None => Ok(None),
            Some(toml::Value::Integer(ms)) if *ms >= 0 => Ok(Some(Duration::from_millis(*ms as u64))),
            Some(value @ toml::Value::String(_)) => humantime_serde::deserialize(value.clone())
                .map(Some)
                .map_err(|_| {
                    ProtocolError::invalid_setting(&self.plugin_type, key, "a duration like \"3s\"")
                }),
            Some(_) => Err(ProtocolError::invalid_setting(
                &self.plugin_type,
                key,
                "a duration like \"3s\"",
            )),
        }
    }
}
