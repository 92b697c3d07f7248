//! Runner configuration

use std::time::Duration;

use serde::Deserialize;

/// Settings for the process that hosts all pipelines
///
/// # Example
///
/// ```toml
/// [runner]
/// shutdown_timeout = "30s"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Upper bound for stopping every pipeline; stragglers are aborted
    /// Default: 30s
    #[serde(with = "humantime_serde")]
    pub shutdown_timeout: Duration,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            shutdown_timeout: Duration::from_secs(30),
        }
    }
}
