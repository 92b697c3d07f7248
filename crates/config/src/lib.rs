//! Sluice Configuration
//!
//! One TOML document describes every pipeline plus the `[log]` and
//! `[runner]` sections. Everything except a pipeline's source and sinks has
//! a default. Parsing validates; deserializing with `toml` directly does not.
//!
//! ```
//! use sluice_config::Config;
//!
//! let config: Config = r#"
//! [pipelines.entry.source]
//! type = "random"
//!
//! [[pipelines.entry.sinks]]
//! type = "stdout"
//! "#.parse().unwrap();
//! assert_eq!(config.pipelines["entry"].workers, 1);
//! ```
//!
//! # Example Config
//!
//! ```toml
//! [log]
//! level = "info"
//!
//! [runner]
//! shutdown_timeout = "30s"
//!
//! [pipelines.entry]
//! workers = 2
//!
//! [pipelines.entry.source]
//! type = "random"
//!
//! [[pipelines.entry.sinks]]
//! type = "pipeline"
//! name = "raw"
//!
//! [pipelines.raw.source]
//! type = "pipeline"
//! name = "entry"
//!
//! [[pipelines.raw.sinks]]
//! type = "stdout"
//! ```

mod error;
mod logging;
mod pipeline;
mod plugins;
mod runner;
mod validation;

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;

pub use error::{ConfigError, Result};
pub use logging::{LogConfig, LogFormat, LogLevel, LogOutput};
pub use pipeline::{PipelineConfig, SinkPolicy};
pub use plugins::{
    KNOWN_BUFFER_TYPES, KNOWN_PROCESSOR_TYPES, KNOWN_SINK_TYPES, KNOWN_SOURCE_TYPES,
    PIPELINE_CONNECTOR, connector_target, is_known_processor_type,
};
pub use runner::RunnerConfig;

use serde::Deserialize;

/// Whole configuration document
///
/// Validation requires at least one pipeline.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log: LogConfig,

    pub runner: RunnerConfig,

    /// Pipelines by name
    pub pipelines: BTreeMap<String, PipelineConfig>,
}

impl Config {
    /// Read, parse and validate a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::from_str(&contents)
    }

    fn parse(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    ///
    /// Checks for:
    /// - At least one pipeline, each with a source and an enabled sink
    /// - Worker count and buffer sizes in range
    /// - Known plugin types
    /// - Pipeline connectors that exist, are mirrored and form no cycle
    pub fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }

    /// Pipeline names in start order
    ///
    /// A pipeline comes after every pipeline it writes into, so connector
    /// sinks always find their downstream running. Stop in reverse.
    pub fn start_order(&self) -> Result<Vec<&str>> {
        validation::start_order(self)
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
