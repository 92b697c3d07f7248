//! Configuration error types

use std::io;
use thiserror::Error;

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur when loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file
    #[error("failed to read config file '{path}': {source}")]
    IoError {
        /// Path to the file
        path: String,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },

    /// Failed to parse TOML
    #[error("failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// No pipelines declared
    #[error("no pipelines are defined - at least one pipeline is required")]
    NoPipelines,

    /// Validation error - required field missing
    #[error("{component} '{name}' is missing required field '{field}'")]
    MissingField {
        /// Component type (e.g., "pipeline", "sink")
        component: &'static str,
        /// Name of the component
        name: String,
        /// Missing field name
        field: &'static str,
    },

    /// Validation error - invalid value
    #[error("{component} '{name}' has invalid {field}: {message}")]
    InvalidValue {
        /// Component type
        component: &'static str,
        /// Name of the component
        name: String,
        /// Field name
        field: &'static str,
        /// Error message
        message: String,
    },

    /// Validation error - plugin type not known
    #[error("pipeline '{pipeline}' uses unknown {role} type '{plugin_type}'")]
    UnknownPluginType {
        /// Pipeline declaring the plugin
        pipeline: String,
        /// Plugin role ("source", "buffer", "processor", "sink")
        role: &'static str,
        /// The unknown type name
        plugin_type: String,
    },

    /// Validation error - connector names a pipeline that doesn't exist
    #[error("pipeline '{pipeline}' references unknown pipeline '{target}'")]
    UnknownPipeline {
        /// Pipeline holding the reference
        pipeline: String,
        /// Name that was referenced
        target: String,
    },

    /// Validation error - connector has no counterpart on the other side
    #[error("pipeline connector '{from}' -> '{to}' is not mirrored: {message}")]
    ConnectorMismatch {
        /// Upstream pipeline
        from: String,
        /// Downstream pipeline
        to: String,
        /// What is missing
        message: String,
    },

    /// Validation error - connectors form a cycle
    #[error("pipeline connectors form a cycle through: {pipelines}")]
    Cycle {
        /// Pipelines on or behind the cycle, comma separated
        pipelines: String,
    },
}

impl ConfigError {
    /// Create a MissingField error
    pub fn missing_field(
        component: &'static str,
        name: impl Into<String>,
        field: &'static str,
    ) -> Self {
        Self::MissingField {
            component,
            name: name.into(),
            field,
        }
    }

    /// Create an InvalidValue error
    pub fn invalid_value(
        component: &'static str,
        name: impl Into<String>,
        field: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            component,
            name: name.into(),
            field,
            message: message.into(),
        }
    }

    /// Create an UnknownPluginType error
    pub fn unknown_plugin_type(
        pipeline: impl Into<String>,
        role: &'static str,
        plugin_type: impl Into<String>,
    ) -> Self {
        Self::UnknownPluginType {
            pipeline: pipeline.into(),
            role,
            plugin_type: plugin_type.into(),
        }
    }

    /// Create an UnknownPipeline error
    pub fn unknown_pipeline(pipeline: impl Into<String>, target: impl Into<String>) -> Self {
        Self::UnknownPipeline {
            pipeline: pipeline.into(),
            target: target.into(),
        }
    }

    /// Create a ConnectorMismatch error
    pub fn connector_mismatch(
        from: impl Into<String>,
        to: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::ConnectorMismatch {
            from: from.into(),
            to: to.into(),
            message: message.into(),
        }
    }
}
