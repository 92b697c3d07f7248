//! Resolves a pipeline's `[source]` entry to a source instance

use std::sync::Arc;

use sluice_protocol::{PluginRegistry, PluginSetting};

use crate::{Source, SourceResult};

/// Builds sources of one type
pub trait SourceFactory<T: Send + 'static>: Send + Sync {
    fn create(&self, setting: &PluginSetting) -> SourceResult<Arc<dyn Source<T>>>;

    /// Type name the factory is normally registered under
    fn name(&self) -> &'static str;
}

/// Source factories keyed by type name
pub struct SourceRegistry<T: Send + 'static> {
    factories: PluginRegistry<dyn SourceFactory<T>>,
}

impl<T: Send + 'static> SourceRegistry<T> {
    pub fn new() -> Self {
        Self {
            factories: PluginRegistry::new("source"),
        }
    }

    /// Register `factory` under `type_name`, replacing any earlier one
    pub fn register<F: SourceFactory<T> + 'static>(&mut self, type_name: &str, factory: F) -> &mut Self {
        self.factories.insert(type_name, Box::new(factory));
        self
    }

    /// Register unless `type_name` is taken; returns whether it was added
    pub fn try_register<F: SourceFactory<T> + 'static>(&mut self, type_name: &str, factory: F) -> bool {
        if self.factories.contains(type_name) {
            return false;
        }
        self.factories.insert(type_name, Box::new(factory));
        true
    }

    /// Build the source a plugin setting describes
    pub fn create(&self, setting: &PluginSetting) -> SourceResult<Arc<dyn Source<T>>> {
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

impl<T: Send + 'static> Default for SourceRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + 'static> std::fmt::Debug for SourceRegistry<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(&self.factories, f)
    }
}
