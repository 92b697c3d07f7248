//! Filter Processor - Drop unwanted events
//!
//! Drops (or keeps only) events whose fields match a set of conditions.
//!
//! # Configuration
//!
//! | Option | Type | Default | Description |
//! |--------|------|---------|-------------|
//! | `action` | string | `"drop"` | Action when conditions match: `drop` or `keep` |
//! | `match` | string | `"all"` | How to combine conditions: `all` (AND) or `any` (OR) |
//! | `field` / `operator` / `value` | | | Single-condition shorthand |
//! | `conditions` | array | | List of conditions to evaluate |
//!
//! Operators: `eq`, `ne`, `contains`, `starts_with`, `ends_with`, `regex`,
//! `exists`, `gt`, `lt`, `gte`, `lte`.
//!
//! # TOML Examples
//!
//! ```toml
//! # Drop debug logs
//! [[pipelines.entry.processors]]
//! type = "filter"
//! field = "level"
//! value = "debug"
//! ```
//!
//! ```toml
//! # Keep only server errors
//! [[pipelines.entry.processors]]
//! type = "filter"
//! action = "keep"
//! conditions = [
//!     { field = "status", operator = "gte", value = 500 },
//! ]
//! ```

mod condition;
mod config;

pub use condition::{Comparison, Condition, Predicate};
pub use config::{FilterAction, FilterConfig, MatchMode};

use std::sync::atomic::{AtomicU64, Ordering};

use sluice_protocol::{Event, PluginSetting, Record};

use crate::registry::ProcessorFactory;
use crate::{ProcessError, ProcessFuture, ProcessResult, Processor};

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;

/// Event counts since the filter was built
#[derive(Debug, Default)]
pub struct FilterMetrics {
    batches: AtomicU64,
    received: AtomicU64,
    passed: AtomicU64,
}

impl FilterMetrics {
    fn record(&self, received: usize, passed: usize) {
        self.batches.fetch_add(1, Ordering::Relaxed);
        self.received.fetch_add(received as u64, Ordering::Relaxed);
        self.passed.fetch_add(passed as u64, Ordering::Relaxed);
    }

    pub fn batches(&self) -> u64 {
        self.batches.load(Ordering::Relaxed)
    }

    pub fn received(&self) -> u64 {
        self.received.load(Ordering::Relaxed)
    }

    pub fn passed(&self) -> u64 {
        self.passed.load(Ordering::Relaxed)
    }

    pub fn dropped(&self) -> u64 {
        self.received().saturating_sub(self.passed())
    }

    /// Share of events dropped, 0.0 before any arrive
    pub fn drop_rate(&self) -> f64 {
        match self.received() {
            0 => 0.0,
            received => self.dropped() as f64 / received as f64,
        }
    }
}

/// Drops, or keeps only, events matching its conditions
///
/// Stateless; every worker may run it at once.
#[derive(Debug)]
pub struct FilterProcessor {
    config: FilterConfig,
    metrics: FilterMetrics,
}

impl FilterProcessor {
    pub fn new(config: FilterConfig) -> ProcessResult<Self> {
        config.validate().map_err(ProcessError::config)?;
        Ok(Self {
            config,
            metrics: FilterMetrics::default(),
        })
    }

    pub fn metrics(&self) -> &FilterMetrics {
        &self.metrics
    }

    fn matches(&self, event: &Event) -> bool {
        let mut conditions = self.config.conditions.iter();
        match self.config.match_mode {
            MatchMode::All => conditions.all(|c| c.matches(event)),
            MatchMode::Any => conditions.any(|c| c.matches(event)),
        }
    }

    fn retain(&self, mut records: Vec<Record<Event>>) -> Vec<Record<Event>> {
        let received = records.len();
        let keep_matching = self.config.action == FilterAction::Keep;
        records.retain(|record| self.matches(record.data()) == keep_matching);

        self.metrics.record(received, records.len());
        records
    }
}

impl Processor<Event> for FilterProcessor {
    fn execute<'a>(&'a self, records: Vec<Record<Event>>) -> ProcessFuture<'a, Vec<Record<Event>>> {
        Box::pin(async move { Ok(self.retain(records)) })
    }

    fn name(&self) -> &'static str {
        "filter"
    }

    fn enabled(&self) -> bool {
        self.config.enabled
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FilterFactory;

impl ProcessorFactory<Event> for FilterFactory {
    fn create(&self, setting: &PluginSetting) -> ProcessResult<Box<dyn Processor<Event>>> {
        let config = FilterConfig::try_from(setting).map_err(ProcessError::config)?;
        Ok(Box::new(FilterProcessor::new(config)?))
    }

    fn name(&self) -> &'static str {
        "filter"
    }
}
