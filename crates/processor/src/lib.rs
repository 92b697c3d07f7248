//! Sluice Processor - Batch transformation stages
//!
//! Processors map a batch of records to a new batch as it flows from the
//! buffer to the sinks. They can:
//! - Drop records (filter)
//! - Enrich records (add fields)
//! - Derive new records (aggregate summaries)
//! - Split or merge batches
//!
//! # Architecture
//!
//! ```text
//! [Vec<Record>] → [Processor 1] → [Processor 2] → ... → [Vec<Record>']
//! ```
//!
//! Processors are chained together and applied in order by `Chain`, which is
//! shared by every worker of a pipeline. A processor that keeps state it
//! cannot share across workers reports `is_single_thread() == true`; the
//! chain then serializes calls into that one processor while the rest of the
//! chain stays parallel.
//!
//! # Adding a New Processor
//!
//! 1. Create a config struct implementing `TryFrom<&PluginSetting>` with
//!    validation.
//! 2. Implement `Processor<T>` on your processor struct.
//! 3. Implement `ProcessorFactory<T>` and register it in `default_registry()`.
//!
//! # Modules
//!
//! - `chain` - Sequential processor execution with single-thread lanes
//! - `registry` - Processor creation from config
//! - `noop` - Pass-through processor
//! - `filter` - Drop or keep events based on conditions
//! - `add_fields` - Add static fields to events
//! - `aggregate` - Count events per group and emit summary events
//!
//! # Example
//!
//! ```ignore
//! use sluice_processor::{Chain, FilterConfig, FilterProcessor, Condition};
//!
//! let filter = FilterProcessor::new(FilterConfig::new().with_condition(Condition::eq("level", "debug")))?;
//! let chain = Chain::new(vec![Box::new(filter)]);
//!
//! let records = chain.execute(records).await?;
//! ```

mod chain;
mod error;
pub mod add_fields;
pub mod aggregate;
pub mod filter;
pub mod noop;
pub mod registry;

pub use add_fields::{AddFieldsConfig, AddFieldsFactory, AddFieldsProcessor};
pub use aggregate::{AggregateConfig, AggregateFactory, AggregateMetrics, AggregateProcessor};
pub use chain::Chain;
pub use error::ProcessError;
pub use filter::{
    Comparison, Condition, FilterAction, FilterConfig, FilterFactory, FilterMetrics,
    FilterProcessor, MatchMode, Predicate,
};
pub use noop::NoopProcessor;
pub use registry::{NoopFactory, ProcessorFactory, ProcessorRegistry};

use std::future::Future;
use std::pin::Pin;

use sluice_protocol::{Event, Record};

/// Result type for processor operations
pub type ProcessResult<T> = Result<T, ProcessError>;

/// Boxed future returned by processor methods
pub type ProcessFuture<'a, T> = Pin<Box<dyn Future<Output = ProcessResult<T>> + Send + 'a>>;

/// Trait for batch processors
///
/// Implementors must be `Send + Sync`: one instance is shared by every
/// worker of a pipeline.
///
/// # Example
///
/// ```ignore
/// struct MyProcessor;
///
/// impl Processor<Event> for MyProcessor {
///     fn execute<'a>(&'a self, records: Vec<Record<Event>>) -> ProcessFuture<'a, Vec<Record<Event>>> {
///         Box::pin(async move { Ok(records) })
///     }
///
///     fn name(&self) -> &'static str {
///         "my_processor"
///     }
/// }
/// ```
pub trait Processor<T>: Send + Sync {
    /// Process a batch, returning the records to hand to the next stage
    ///
    /// Returning an error withholds the batch's checkpoint.
    fn execute<'a>(&'a self, records: Vec<Record<T>>) -> ProcessFuture<'a, Vec<Record<T>>>;

    /// Name of this processor for logging and metrics
    fn name(&self) -> &'static str;

    /// Whether this processor is currently enabled
    ///
    /// Disabled processors are filtered out of chains at construction time.
    fn enabled(&self) -> bool {
        true
    }

    /// Whether only one worker at a time may call into this instance
    fn is_single_thread(&self) -> bool {
        false
    }

    /// Flush state during pipeline shutdown
    ///
    /// Called once, after every worker has stopped. Records returned here
    /// continue through the rest of the chain and on to the sinks.
    fn shutdown<'a>(&'a self) -> ProcessFuture<'a, Vec<Record<T>>> {
        Box::pin(async { Ok(Vec::new()) })
    }
}

/// Create a registry with all built-in event processors
///
/// Includes:
/// - `noop` - Pass-through processor
/// - `filter` - Drop or keep events based on conditions
/// - `add_fields` - Add static fields to events
/// - `aggregate` - Count events per group and emit summaries
pub fn default_registry() -> ProcessorRegistry<Event> {
    let mut registry = ProcessorRegistry::new();
    registry.register("noop", NoopFactory);
    registry.register("filter", FilterFactory);
    registry.register("add_fields", AddFieldsFactory);
    registry.register("aggregate", AggregateFactory);
    registry
}
