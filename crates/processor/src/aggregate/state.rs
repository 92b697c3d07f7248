//! Aggregate state management
//!
//! Open groups keyed by the JSON rendering of their identification values.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::Value;
use sluice_protocol::Event;
use tokio::time::Instant;

/// One open group
#[derive(Debug, Clone)]
pub struct AggregateGroup {
    /// Identification values, in `identification_keys` order
    pub values: Vec<Value>,
    /// Events seen so far
    pub count: u64,
    /// When the group was opened (monotonic)
    pub opened_at: Instant,
    /// Earliest arrival time among its events
    pub first_seen: DateTime<Utc>,
    /// Arrival time of the latest event
    pub last_seen: DateTime<Utc>,
}

impl AggregateGroup {
    fn new(values: Vec<Value>, seen: DateTime<Utc>) -> Self {
        Self {
            values,
            count: 0,
            opened_at: Instant::now(),
            first_seen: seen,
            last_seen: seen,
        }
    }

    /// Whether the group's window has elapsed
    #[inline]
    pub fn is_expired(&self, window: Duration) -> bool {
        self.opened_at.elapsed() >= window
    }

    /// Build the summary event for this group
    pub fn summary(&self, keys: &[String], count_key: &str) -> Event {
        let mut event = Event::new();
        for (key, value) in keys.iter().zip(&self.values) {
            event.put(key, value.clone());
        }
        event.put(count_key, self.count);
        event.put("aggregate_start", self.first_seen.to_rfc3339());
        event.put("aggregate_end", self.last_seen.to_rfc3339());
        event
    }
}

/// All open groups
#[derive(Debug, Default)]
pub struct AggregateState {
    groups: HashMap<String, AggregateGroup>,
}

impl AggregateState {
    /// Create new empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Count an event into its group, returning the group key and whether
    /// the group was newly opened
    pub fn observe(&mut self, event: &Event, keys: &[String], seen: DateTime<Utc>) -> (String, bool) {
        let values: Vec<Value> = keys
            .iter()
            .map(|k| event.get(k).cloned().unwrap_or(Value::Null))
            .collect();
        let key = Value::Array(values.clone()).to_string();

        let mut opened = false;
        let group = self.groups.entry(key.clone()).or_insert_with(|| {
            opened = true;
            AggregateGroup::new(values, seen)
        });
        group.count += 1;
        group.first_seen = group.first_seen.min(seen);
        group.last_seen = group.last_seen.max(seen);

        (key, opened)
    }

    /// Get a group by key
    pub fn get(&self, key: &str) -> Option<&AggregateGroup> {
        self.groups.get(key)
    }

    /// Remove and return a group
    pub fn remove(&mut self, key: &str) -> Option<AggregateGroup> {
        self.groups.remove(key)
    }

    /// Remove and return every group whose window has elapsed
    pub fn take_expired(&mut self, window: Duration) -> Vec<AggregateGroup> {
        let expired: Vec<String> = self
            .groups
            .iter()
            .filter(|(_, group)| group.is_expired(window))
            .map(|(key, _)| key.clone())
            .collect();
        expired
            .iter()
            .filter_map(|key| self.groups.remove(key))
            .collect()
    }

    /// Remove and return all groups
    pub fn take_all(&mut self) -> Vec<AggregateGroup> {
        self.groups.drain().map(|(_, group)| group).collect()
    }

    /// Number of open groups
    #[inline]
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }
}
