//! Protocol error types
//!
//! Errors that can occur when building payloads or reading plugin settings.

use thiserror::Error;

/// Errors that can occur during protocol operations
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// JSON payload is not an object
    #[error("event payload must be a JSON object, got {0}")]
    NotAnObject(&'static str),

    /// JSON payload could not be parsed
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// Plugin setting has the wrong type
    #[error("setting '{key}' of plugin '{plugin}' must be {expected}")]
    InvalidSetting {
        plugin: String,
        key: String,
        expected: &'static str,
    },

    /// No factory registered for a plugin type
    #[error("unknown {kind} type '{name}', available: [{available}]")]
    UnknownPlugin {
        kind: &'static str,
        name: String,
        available: String,
    },
}

impl ProtocolError {
    /// Create an invalid setting error
    #[inline]
    pub fn invalid_setting(
        plugin: impl Into<String>,
        key: impl Into<String>,
        expected: &'static str,
    ) -> Self {
        Self::InvalidSetting {
            plugin: plugin.into(),
            key: key.into(),
            expected,
        }
    }
}
