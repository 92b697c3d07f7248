//! Resolves `[[sinks]]` entries to sink instances
//!
//! Sinks are handed out as `Arc` because a connector sink is shared with
//! the downstream pipeline, which also holds it as its source.

use std::sync::Arc;

use sluice_protocol::{PluginRegistry, PluginSetting};

use crate::{Sink, SinkResult};

/// Builds sinks of one type
pub trait SinkFactory<T: Send + Sync + 'static>: Send + Sync {
    /// Fails with `SinkError::Config` when the options are invalid
    fn create(&self, setting: &PluginSetting) -> SinkResult<Arc<dyn Sink<T>>>;

    /// Type name the factory is normally registered under
    fn name(&self) -> &'static str;
}

/// Sink factories keyed by type name
pub struct SinkRegistry<T: Send + Sync + 'static> {
    factories: PluginRegistry<dyn SinkFactory<T>>,
}

impl<T: Send + Sync + 'static> SinkRegistry<T> {
    pub fn new() -> Self {
        Self {
            factories: PluginRegistry::new("sink"),
        }
    }

    /// Register `factory` under `type_name`, replacing any earlier one
    pub fn register<F: SinkFactory<T> + 'static>(&mut self, type_name: &str, factory: F) -> &mut Self {
        self.factories.insert(type_name, Box::new(factory));
        self
    }

    /// Register unless `type_name` is taken; returns whether it was added
    pub fn try_register<F: SinkFactory<T> + 'static>(&mut self, type_name: &str, factory: F) -> bool {
        if self.factories.contains(type_name) {
            return false;
        }
        self.factories.insert(type_name, Box::new(factory));
        true
    }

    /// Build the sink a plugin setting describes
    pub fn create(&self, setting: &PluginSetting) -> SinkResult<Arc<dyn Sink<T>>> {
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

impl<T: Send + Sync + 'static> Default for SinkRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + Sync + 'static> std::fmt::Debug for SinkRegistry<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(&self.factories, f)
    }
}
