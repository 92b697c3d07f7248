//! Type-name lookup behind the processor, source and sink registries
//!
//! Each plugin crate wraps a [`PluginRegistry`] over its own factory trait
//! object. Lookups that miss report every registered type so a typo in a
//! `type = "..."` line is easy to spot.

use std::collections::BTreeMap;
use std::fmt;

use crate::ProtocolError;

/// Factories keyed by the `type` a plugin setting names
pub struct PluginRegistry<F: ?Sized> {
    kind: &'static str,
    factories: BTreeMap<String, Box<F>>,
}

impl<F: ?Sized> PluginRegistry<F> {
    /// Empty registry; `kind` names the plugin family in errors
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            factories: BTreeMap::new(),
        }
    }

    /// Plugin family, e.g. `sink`
    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// Add a factory, returning the one it replaced
    pub fn insert(&mut self, type_name: impl Into<String>, factory: Box<F>) -> Option<Box<F>> {
        self.factories.insert(type_name.into(), factory)
    }

    /// Factory registered for `type_name`
    pub fn get(&self, type_name: &str) -> Result<&F, ProtocolError> {
        self.factories
            .get(type_name)
            .map(Box::as_ref)
            .ok_or_else(|| ProtocolError::UnknownPlugin {
                kind: self.kind,
                name: type_name.to_string(),
                available: self.types().join(", "),
            })
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.factories.contains_key(type_name)
    }

    /// Registered type names in sorted order
    pub fn types(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl<F: ?Sized> fmt::Debug for PluginRegistry<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("kind", &self.kind)
            .field("types", &self.types())
            .finish()
    }
}
