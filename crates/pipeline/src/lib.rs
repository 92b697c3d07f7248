//! Sluice - Pipeline
//!
//! The runtime that moves records from a source, through a bounded buffer and
//! a processor chain, into sinks.
//!
//! # Architecture
//!
//! ```text
//!                         ┌─ worker ─┐
//! [Source] ──write──► [Buffer] ─read─► [Chain] ──► [SinkSet] ──► [Sinks]
//!                         ▲   └─ worker ─┘                  │
//!                         └────────── checkpoint ◄──────────┘
//! ```
//!
//! # Key Design
//!
//! - **Checkpointed reads**: a batch frees its buffer slots only after every
//!   sink accepted it; failed batches stay charged
//! - **N workers per pipeline**: all sharing one chain and one sink set
//! - **Fan-out or partition**: sink policy fixed per pipeline
//! - **Graceful stop**: source first, then buffer closed, then in-flight
//!   batches drained within a grace period
//! - **Connected pipelines**: a `pipeline` sink feeds another pipeline's
//!   buffer through a shared `PipelineConnector`
//!
//! # Example
//!
//! ```ignore
//! use sluice_config::Config;
//! use sluice_pipeline::{PipelineBuilder, init_tracing};
//!
//! let config = Config::from_file("sluice.toml")?;
//! init_tracing(&config.log)?;
//!
//! let runner = PipelineBuilder::new().build(&config)?;
//! runner.run().await?;
//!
//! tokio::select! {
//!     _ = tokio::signal::ctrl_c() => {}
//!     name = runner.wait() => tracing::warn!(pipeline = name, "stopping after fatal error"),
//! }
//! runner.shutdown().await?;
//! ```

mod builder;
mod connector;
mod error;
mod logging;
mod metrics;
mod pipeline;
mod runner;
mod sink_set;
mod state;
mod worker;

#[cfg(test)]
mod test_support;

pub use builder::PipelineBuilder;
pub use connector::{DEFAULT_WRITE_TIMEOUT, PipelineConnector};
pub use error::{PipelineError, Result};
pub use logging::init_tracing;
pub use metrics::{MetricsSnapshot, PipelineMetrics};
pub use pipeline::{
    DEFAULT_DRAIN_TIMEOUT, DEFAULT_IDLE_BACKOFF, DEFAULT_READ_TIMEOUT, Pipeline, PipelineSettings,
};
pub use runner::{DEFAULT_SHUTDOWN_TIMEOUT, PipelineRunner};
pub use sink_set::SinkSet;
pub use state::PipelineState;

// Re-export key types from dependencies for convenience
pub use sluice_config::SinkPolicy;
pub use sluice_protocol::{Event, Record};
