//! Sluice Protocol - Core types for the pipeline engine
//!
//! This crate provides the foundational types that flow through a pipeline:
//! - `Record<T>` - Payload envelope with pipeline-internal metadata
//! - `RecordMetadata` - Arrival time, correlation id, routing key
//! - `Event` - JSON-object payload used by the built-in plugins
//! - `PluginSetting` - Type name + options handed to plugin factories
//! - `PipelineDescription` - What a plugin may ask about its pipeline
//! - `PluginRegistry` - Factory lookup by plugin type name
//!
//! # Design Principles
//!
//! - **Immutable once enqueued**: `Record` exposes no `&mut` access; stages
//!   derive new records instead of editing old ones
//! - **Owned batches**: a batch read from a buffer is a plain `Vec<Record<T>>`
//!   owned by the worker that read it
//! - **Config-agnostic plugins**: factories see a `PluginSetting`, never the
//!   full configuration file

mod description;
mod error;
mod event;
mod record;
mod registry;
mod setting;

pub use description::{PipelineDescription, PipelineInfo};
pub use error::ProtocolError;
pub use event::Event;
pub use record::{Record, RecordMetadata};
pub use registry::PluginRegistry;
pub use setting::PluginSetting;

/// Result type for protocol operations
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Event field used for the primary text payload
pub const MESSAGE_FIELD: &str = "message";
