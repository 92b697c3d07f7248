//! Tracing subscriber setup from `[log]` configuration

use std::fs::OpenOptions;
use std::sync::Arc;

use sluice_config::{LogConfig, LogFormat, LogOutput};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::{PipelineError, Result};

/// Install the global tracing subscriber
///
/// `RUST_LOG` overrides the configured directives. Fails if a global
/// subscriber is already installed or the log file cannot be opened.
pub fn init_tracing(config: &LogConfig) -> Result<()> {
    let filter = env_filter(config)?;
    let (writer, ansi) = make_writer(&config.output)?;
    let registry = tracing_subscriber::registry().with(filter);

    let installed = match config.format {
        LogFormat::Console => registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_ansi(ansi)
                    .with_writer(writer),
            )
            .try_init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_target(true).with_writer(writer))
            .try_init(),
    };

    installed.map_err(|e| PipelineError::Logging(e.to_string()))
}

fn env_filter(config: &LogConfig) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    let directives = config.directives();
    EnvFilter::try_new(&directives)
        .map_err(|e| PipelineError::Logging(format!("invalid log filter '{}': {}", directives, e)))
}

/// Writer for the configured output; colors only on standard streams
fn make_writer(output: &LogOutput) -> Result<(BoxMakeWriter, bool)> {
    let writer = match output {
        LogOutput::Stdout => BoxMakeWriter::new(std::io::stdout),
        LogOutput::Stderr => BoxMakeWriter::new(std::io::stderr),
        LogOutput::File(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| PipelineError::Logging(format!("cannot open log file '{}': {}", path, e)))?;
            BoxMakeWriter::new(Arc::new(file))
        }
    };
    Ok((writer, output.is_stream()))
}
