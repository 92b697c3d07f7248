//! Event payload
//!
//! `Event` is the JSON-object payload used by the built-in sources,
//! processors and sinks. Field access uses dot notation (`user.email`).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{MESSAGE_FIELD, ProtocolError, Result};

/// A structured telemetry event backed by a JSON object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Event(Map<String, Value>);

impl Event {
    /// Create an empty event
    #[inline]
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Create an event holding a single `message` field
    pub fn from_message(message: impl Into<String>) -> Self {
        let mut map = Map::new();
        map.insert(MESSAGE_FIELD.to_string(), Value::String(message.into()));
        Self(map)
    }

    /// Parse an event from a JSON object string
    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::try_from(value)
    }

    /// Get a field using dot notation
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut parts = path.split('.');
        let mut current = self.0.get(parts.next()?)?;

        for part in parts {
            match current {
                Value::Object(map) => current = map.get(part)?,
                _ => return None,
            }
        }

        Some(current)
    }

    /// Get a string field using dot notation
    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(Value::as_str)
    }

    /// Check whether a field exists
    #[inline]
    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// Set a field using dot notation, creating intermediate objects
    ///
    /// Intermediate values that are not objects are replaced.
    pub fn put(&mut self, path: &str, value: impl Into<Value>) {
        let mut parts: Vec<&str> = path.split('.').collect();
        let Some(last) = parts.pop() else {
            return;
        };

        let mut current = &mut self.0;
        for part in parts {
            let entry = current
                .entry(part.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            let Value::Object(map) = entry else {
                return;
            };
            current = map;
        }

        current.insert(last.to_string(), value.into());
    }

    /// Remove a top-level field
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    /// Number of top-level fields
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the event has no fields
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrow the underlying JSON object
    #[inline]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Serialize to a compact JSON string
    pub fn to_json(&self) -> String {
        Value::Object(self.0.clone()).to_string()
    }
}

impl TryFrom<Value> for Event {
    type Error = ProtocolError;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            Value::Null => Err(ProtocolError::NotAnObject("null")),
            Value::Bool(_) => Err(ProtocolError::NotAnObject("bool")),
            Value::Number(_) => Err(ProtocolError::NotAnObject("number")),
            Value::String(_) => Err(ProtocolError::NotAnObject("string")),
            Value::Array(_) => Err(ProtocolError::NotAnObject("array")),
        }
    }
}

impl From<Map<String, Value>> for Event {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}
