//! `[log]` section: level, per-target overrides, format and destination
//!
//! `RUST_LOG`, when set, replaces the filter built from this section.
//!
//! ```toml
//! [log]
//! level = "info"
//! format = "json"
//! output = "/var/log/sluice.log"
//!
//! [log.targets]
//! sluice_buffer = "debug"
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;

/// Severity threshold
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Directive name understood by tracing filters
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Line format
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Console,
    /// One JSON object per line
    Json,
}

/// Where log lines go
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    /// Any other string is a file path, opened for append
    #[serde(untagged)]
    File(String),
}

impl LogOutput {
    /// Whether lines go to a standard stream rather than a file
    pub fn is_stream(&self) -> bool {
        !matches!(self, Self::File(_))
    }
}

/// Logging configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default threshold for every target
    pub level: LogLevel,

    /// Thresholds for specific targets (crate or module paths)
    pub targets: BTreeMap<String, LogLevel>,

    pub format: LogFormat,

    pub output: LogOutput,
}

impl LogConfig {
    /// Defaults with a different threshold
    pub fn with_level(level: LogLevel) -> Self {
        Self {
            level,
            ..Self::default()
        }
    }

    /// Filter directives, e.g. `info,sluice_buffer=debug`
    pub fn directives(&self) -> String {
        let mut directives = self.level.as_str().to_string();
        for (target, level) in &self.targets {
            directives.push(',');
            directives.push_str(target);
            directives.push('=');
            directives.push_str(level.as_str());
        }
        directives
    }
}
