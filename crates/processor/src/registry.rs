//! Resolves `[[processors]]` entries to processor instances
//!
//! # Example
//!
//! ```ignore
//! let registry = sluice_processor::default_registry();
//! let filter = registry.create(&PluginSetting::new("filter").with_option("field", "level"))?;
//! ```

use sluice_protocol::{PluginRegistry, PluginSetting};

use crate::noop::NoopProcessor;
use crate::{ProcessResult, Processor};

#[cfg(test)]
#[path = "registry_test.rs"]
mod tests;

/// Builds processors of one type
pub trait ProcessorFactory<T>: Send + Sync {
    /// Fails with `ProcessError::Config` when the options are invalid
    fn create(&self, setting: &PluginSetting) -> ProcessResult<Box<dyn Processor<T>>>;

    /// Type name the factory is normally registered under
    fn name(&self) -> &'static str;
}

/// Processor factories keyed by type name
pub struct ProcessorRegistry<T> {
    factories: PluginRegistry<dyn ProcessorFactory<T>>,
}

impl<T> ProcessorRegistry<T> {
    pub fn new() -> Self {
        Self {
            factories: PluginRegistry::new("processor"),
        }
    }

    /// Register `factory` under `type_name`, replacing any earlier one
    pub fn register<F: ProcessorFactory<T> + 'static>(&mut self, type_name: &str, factory: F) -> &mut Self {
        self.factories.insert(type_name, Box::new(factory));
        self
    }

    /// Register unless `type_name` is taken; returns whether it was added
    pub fn try_register<F: ProcessorFactory<T> + 'static>(&mut self, type_name: &str, factory: F) -> bool {
        if self.factories.contains(type_name) {
            return false;
        }
        self.factories.insert(type_name, Box::new(factory));
        true
    }

    /// Build the processor a plugin setting describes
    ///
    /// # Errors
    /// - `ProcessError::Setting` if the type is not registered
    /// - Whatever the factory reports for an invalid setting
    pub fn create(&self, setting: &PluginSetting) -> ProcessResult<Box<dyn Processor<T>>> {
        self.factories.get(&setting.plugin_type)?.create(setting)
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.factories.contains(type_name)
    }

    /// Registered type names, sorted
    pub fn available_types(&self) -> Vec<&str> {
        self.factories.types()
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl<T> Default for ProcessorRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for ProcessorRegistry<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(&self.factories, f)
    }
}

/// Factory for NoopProcessor
///
/// Built-in and available for any record type.
#[derive(Debug, Clone, Copy)]
pub struct NoopFactory;

impl<T: Send + 'static> ProcessorFactory<T> for NoopFactory {
    fn create(&self, _setting: &PluginSetting) -> ProcessResult<Box<dyn Processor<T>>> {
        Ok(Box::new(NoopProcessor::new()))
    }

    fn name(&self) -> &'static str {
        "noop"
    }
}
