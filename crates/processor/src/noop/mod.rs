//! Noop Processor - Pass-through processor
//!
//! The `NoopProcessor` passes batches through unchanged. It's useful for:
//! - Testing the processor chain infrastructure
//! - Benchmarking pipeline overhead
//! - Placeholder in development

use sluice_protocol::Record;

use crate::{ProcessFuture, Processor};

#[cfg(test)]
mod noop_test;

/// A processor that passes batches through unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProcessor;

impl NoopProcessor {
    /// Create a new noop processor
    #[inline]
    pub const fn new() -> Self {
        Self
    }
}

impl<T: Send + 'static> Processor<T> for NoopProcessor {
    fn execute<'a>(&'a self, records: Vec<Record<T>>) -> ProcessFuture<'a, Vec<Record<T>>> {
        Box::pin(async move { Ok(records) })
    }

    fn name(&self) -> &'static str {
        "noop"
    }
}
