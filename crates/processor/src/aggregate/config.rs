//! Aggregate processor configuration

use std::time::Duration;

use sluice_protocol::PluginSetting;

/// Configuration for the aggregate processor
#[derive(Debug, Clone)]
pub struct AggregateConfig {
    /// Whether the processor is enabled
    pub enabled: bool,

    /// Fields identifying a group (dot notation)
    ///
    /// Events with equal values for these fields share a group. Missing
    /// fields count as `null`. Empty means a single group for everything.
    pub identification_keys: Vec<String>,

    /// Time a group stays open after its first event
    ///
    /// Default: 180s
    pub group_duration: Duration,

    /// Close a group as soon as it has seen this many events
    ///
    /// Default: 1000
    pub max_events: u64,

    /// Field of the summary event holding the count
    ///
    /// Default: "aggregate_count"
    pub count_key: String,

    /// Forward the original events alongside summaries
    ///
    /// Default: true
    pub pass_through: bool,
}

impl Default for AggregateConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            identification_keys: Vec::new(),
            group_duration: Duration::from_secs(180),
            max_events: 1000,
            count_key: "aggregate_count".to_string(),
            pass_through: true,
        }
    }
}

impl AggregateConfig {
    /// Create a new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the identification keys
    pub fn with_identification_keys(mut self, keys: Vec<String>) -> Self {
        self.identification_keys = keys;
        self
    }

    /// Set the group duration
    pub fn with_group_duration(mut self, duration: Duration) -> Self {
        self.group_duration = duration;
        self
    }

    /// Set maximum events per group
    pub fn with_max_events(mut self, max: u64) -> Self {
        self.max_events = max;
        self
    }

    /// Drop originals and emit only summaries
    pub fn without_pass_through(mut self) -> Self {
        self.pass_through = false;
        self
    }

    /// Disable the processor
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.group_duration.is_zero() {
            return Err("group_duration must be greater than 0".to_string());
        }
        if self.max_events == 0 {
            return Err("max_events must be at least 1".to_string());
        }
        if self.count_key.is_empty() {
            return Err("count_key must not be empty".to_string());
        }
        if self.identification_keys.iter().any(|k| k == &self.count_key) {
            return Err(format!(
                "count_key '{}' collides with an identification key",
                self.count_key
            ));
        }
        Ok(())
    }
}

impl TryFrom<&PluginSetting> for AggregateConfig {
    type Error = String;

    fn try_from(setting: &PluginSetting) -> Result<Self, Self::Error> {
        let mut config = AggregateConfig {
            enabled: setting.enabled,
            ..AggregateConfig::default()
        };

        if let Some(keys) = setting.get_string_array("identification_keys") {
            config.identification_keys = keys;
        }
        if let Some(duration) = setting.get_duration("group_duration").map_err(|e| e.to_string())? {
            config.group_duration = duration;
        }
        if let Some(max) = setting.get_usize("max_events").map_err(|e| e.to_string())? {
            config.max_events = max as u64;
        }
        if let Some(key) = setting.get_str("count_key") {
            config.count_key = key.to_string();
        }
        if let Some(pass_through) = setting.get_bool("pass_through") {
            config.pass_through = pass_through;
        }

        config.validate()?;
        Ok(config)
    }
}
