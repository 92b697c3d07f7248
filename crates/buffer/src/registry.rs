//! Resolves a `[pipelines.<name>.buffer]` table to a buffer instance
//!
//! # Example
//!
//! ```ignore
//! let registry = BufferRegistry::<Event>::with_defaults();
//! let buffer = registry.create(&PluginSetting::new("bounded_blocking"))?;
//! ```

use std::sync::Arc;

use sluice_protocol::{PluginRegistry, PluginSetting};

use crate::{BOUNDED_BLOCKING, BlockingBuffer, Buffer, BufferError, Result};

/// Builds buffers of one type
pub trait BufferFactory<T>: Send + Sync {
    fn create(&self, setting: &PluginSetting) -> Result<Arc<dyn Buffer<T>>>;
}

/// Factory for the built-in `bounded_blocking` buffer
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockingBufferFactory;

impl<T: Send + 'static> BufferFactory<T> for BlockingBufferFactory {
    fn create(&self, setting: &PluginSetting) -> Result<Arc<dyn Buffer<T>>> {
        Ok(Arc::new(BlockingBuffer::<T>::from_setting(setting)?))
    }
}

/// Buffer factories keyed by type name
pub struct BufferRegistry<T> {
    factories: PluginRegistry<dyn BufferFactory<T>>,
}

impl<T: Send + 'static> BufferRegistry<T> {
    pub fn new() -> Self {
        Self {
            factories: PluginRegistry::new("buffer"),
        }
    }

    /// Registry with `bounded_blocking` already registered
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(BOUNDED_BLOCKING, BlockingBufferFactory);
        registry
    }

    /// Register `factory` under `type_name`, replacing any earlier one
    pub fn register<F: BufferFactory<T> + 'static>(&mut self, type_name: &str, factory: F) -> &mut Self {
        self.factories.insert(type_name, Box::new(factory));
        self
    }

    /// Register unless `type_name` is taken; returns whether it was added
    pub fn try_register<F: BufferFactory<T> + 'static>(&mut self, type_name: &str, factory: F) -> bool {
        if self.factories.contains(type_name) {
            return false;
        }
        self.factories.insert(type_name, Box::new(factory));
        true
    }

    /// Build the buffer a plugin setting describes
    ///
    /// An unregistered type is an `InvalidArgument`, like a bad size.
    pub fn create(&self, setting: &PluginSetting) -> Result<Arc<dyn Buffer<T>>> {
        self.factories
            .get(&setting.plugin_type)
            .map_err(|e| BufferError::invalid_argument(e.to_string()))?
            .create(setting)
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.factories.contains(type_name)
    }

    /// Registered type names, sorted
    pub fn available_types(&self) -> Vec<&str> {
        self.factories.types()
    }
}

impl<T: Send + 'static> Default for BufferRegistry<T> {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl<T> std::fmt::Debug for BufferRegistry<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(&self.factories, f)
    }
}

#[cfg(test)]
mod tests {
    use sluice_protocol::PipelineInfo;

    use super::*;

    #[test]
    fn test_with_defaults() {
        let registry = BufferRegistry::<String>::with_defaults();
        assert!(registry.contains("bounded_blocking"));
        assert_eq!(registry.available_types(), vec!["bounded_blocking"]);
    }

    #[test]
    fn test_create_from_setting() {
        let registry = BufferRegistry::<String>::default();
        let setting = PluginSetting::new("bounded_blocking")
            .with_option("buffer_size", 13)
            .with_option("batch_size", 3)
            .with_pipeline(PipelineInfo::new("entry", 1));
        let buffer = registry.create(&setting).unwrap();
        assert_eq!(buffer.capacity(), 13);
        assert_eq!(buffer.batch_size(), 3);
        assert_eq!(buffer.pipeline_name(), "entry");
    }

    #[test]
    fn test_unknown_type() {
        let registry = BufferRegistry::<String>::with_defaults();
        let err = match registry.create(&PluginSetting::new("kafka")) {
            Err(err) => err,
            Ok(_) => panic!("expected unknown type error"),
        };
        assert!(matches!(err, BufferError::InvalidArgument(_)));
        assert_eq!(
            err.to_string(),
            "invalid argument: unknown buffer type 'kafka', available: [bounded_blocking]"
        );
    }

    #[test]
    fn test_try_register_duplicate() {
        let mut registry = BufferRegistry::<String>::with_defaults();
        assert!(!registry.try_register("bounded_blocking", BlockingBufferFactory));
        assert!(registry.try_register("other", BlockingBufferFactory));
        assert!(registry.contains("other"));
    }

    #[test]
    fn test_register_replaces() {
        let mut registry = BufferRegistry::<String>::new();
        registry
            .register("bounded_blocking", BlockingBufferFactory)
            .register("bounded_blocking", BlockingBufferFactory);
        assert_eq!(registry.available_types(), vec!["bounded_blocking"]);
    }
}
