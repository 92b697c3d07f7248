//! Add Fields Processor - Enrich events with static values
//!
//! Adds a fixed set of fields to every event. Keys use dot notation, so
//! `"service.name"` writes into a nested object.
//!
//! # Configuration
//!
//! | Option | Type | Default | Description |
//! |--------|------|---------|-------------|
//! | `fields` | table | required | Field path → value to add |
//! | `overwrite` | bool | `false` | Replace values already present on the event |
//!
//! ```toml
//! [[pipelines.entry.processors]]
//! type = "add_fields"
//! overwrite = true
//! fields = { env = "production", "service.name" = "checkout" }
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::Value;
use sluice_protocol::{Event, PluginSetting, Record};

use crate::registry::ProcessorFactory;
use crate::{ProcessError, ProcessFuture, ProcessResult, Processor};

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;

/// Configuration for the add_fields processor
#[derive(Debug, Clone, Default)]
pub struct AddFieldsConfig {
    /// Whether the processor is enabled
    pub enabled: bool,
    /// Fields to add, in declaration order
    pub fields: Vec<(String, Value)>,
    /// Replace existing values
    pub overwrite: bool,
}

impl AddFieldsConfig {
    /// Create an empty, enabled config
    pub fn new() -> Self {
        Self {
            enabled: true,
            ..Self::default()
        }
    }

    /// Add a field
    pub fn with_field(mut self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.push((path.into(), value.into()));
        self
    }

    /// Replace values already present on events
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.fields.is_empty() {
            return Err("at least one field is required".to_string());
        }
        if self.fields.iter().any(|(path, _)| path.is_empty()) {
            return Err("field path must not be empty".to_string());
        }
        Ok(())
    }
}

impl TryFrom<&PluginSetting> for AddFieldsConfig {
    type Error = String;

    fn try_from(setting: &PluginSetting) -> Result<Self, Self::Error> {
        let mut config = AddFieldsConfig {
            enabled: setting.enabled,
            overwrite: setting.get_bool("overwrite").unwrap_or(false),
            fields: Vec::new(),
        };

        if let Some(fields) = setting.options.get("fields") {
            let table = fields.as_table().ok_or("'fields' must be a table")?;
            for (path, value) in table {
                let value = serde_json::to_value(value)
                    .map_err(|e| format!("field '{}' has an unsupported value: {}", path, e))?;
                config.fields.push((path.clone(), value));
            }
        }

        config.validate()?;
        Ok(config)
    }
}

/// Add fields processor
pub struct AddFieldsProcessor {
    config: AddFieldsConfig,
    fields_added: AtomicU64,
    fields_skipped: AtomicU64,
}

impl AddFieldsProcessor {
    /// Create a new add_fields processor
    pub fn new(config: AddFieldsConfig) -> ProcessResult<Self> {
        config.validate().map_err(ProcessError::config)?;
        Ok(Self {
            config,
            fields_added: AtomicU64::new(0),
            fields_skipped: AtomicU64::new(0),
        })
    }

    /// Number of field writes performed so far
    pub fn fields_added(&self) -> u64 {
        self.fields_added.load(Ordering::Relaxed)
    }

    /// Number of fields left alone because the event already had them
    pub fn fields_skipped(&self) -> u64 {
        self.fields_skipped.load(Ordering::Relaxed)
    }

    fn enrich(&self, mut event: Event) -> Event {
        let mut added = 0;
        for (path, value) in &self.config.fields {
            if !self.config.overwrite && event.contains(path) {
                self.fields_skipped.fetch_add(1, Ordering::Relaxed);
                continue;
            }
            event.put(path, value.clone());
            added += 1;
        }
        self.fields_added.fetch_add(added, Ordering::Relaxed);
        event
    }
}

impl Processor<Event> for AddFieldsProcessor {
    fn execute<'a>(&'a self, records: Vec<Record<Event>>) -> ProcessFuture<'a, Vec<Record<Event>>> {
        Box::pin(async move {
            Ok(records
                .into_iter()
                .map(|record| record.map(|event| self.enrich(event)))
                .collect())
        })
    }

    fn name(&self) -> &'static str {
        "add_fields"
    }

    fn enabled(&self) -> bool {
        self.config.enabled
    }
}

/// Factory for creating add_fields processors
#[derive(Debug, Clone, Copy)]
pub struct AddFieldsFactory;

impl ProcessorFactory<Event> for AddFieldsFactory {
    fn create(&self, setting: &PluginSetting) -> ProcessResult<Box<dyn Processor<Event>>> {
        let config = AddFieldsConfig::try_from(setting).map_err(ProcessError::config)?;
        Ok(Box::new(AddFieldsProcessor::new(config)?))
    }

    fn name(&self) -> &'static str {
        "add_fields"
    }
}
