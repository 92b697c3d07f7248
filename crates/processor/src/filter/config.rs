//! Filter options: action, match mode and conditions

use std::str::FromStr;

use sluice_protocol::PluginSetting;

use super::Condition;

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

/// What happens to events that match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterAction {
    #[default]
    Drop,
    /// Keep matching events, drop the rest
    Keep,
}

impl FromStr for FilterAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "drop" => Ok(Self::Drop),
            "keep" => Ok(Self::Keep),
            other => Err(format!("unknown action '{}', expected drop or keep", other)),
        }
    }
}

/// How conditions combine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    #[default]
    All,
    Any,
}

impl FromStr for MatchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Self::All),
            "any" => Ok(Self::Any),
            other => Err(format!("unknown match mode '{}', expected all or any", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FilterConfig {
    pub enabled: bool,
    pub action: FilterAction,
    pub match_mode: MatchMode,
    pub conditions: Vec<Condition>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            action: FilterAction::default(),
            match_mode: MatchMode::default(),
            conditions: Vec::new(),
        }
    }
}

impl FilterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_action(mut self, action: FilterAction) -> Self {
        self.action = action;
        self
    }

    pub fn with_match_mode(mut self, mode: MatchMode) -> Self {
        self.match_mode = mode;
        self
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.conditions.is_empty() {
            return Err("at least one condition is required".to_string());
        }
        match self.conditions.iter().position(|c| c.field.is_empty()) {
            Some(i) => Err(format!("condition {} has an empty field", i)),
            None => Ok(()),
        }
    }
}

/// Accepts a single top-level condition, a `conditions` array, or both
impl TryFrom<&PluginSetting> for FilterConfig {
    type Error = String;

    fn try_from(setting: &PluginSetting) -> Result<Self, Self::Error> {
        let mut config = FilterConfig {
            enabled: setting.enabled,
            ..FilterConfig::default()
        };

        if let Some(action) = setting.get_str("action") {
            config.action = action.parse()?;
        }
        if let Some(mode) = setting.get_str("match") {
            config.match_mode = mode.parse()?;
        }

        if let Some(condition) = read_condition(|key| setting.options.get(key))? {
            config.conditions.push(condition);
        }

        if let Some(entries) = setting.options.get("conditions") {
            let entries = entries
                .as_array()
                .ok_or("'conditions' must be an array of tables")?;
            for entry in entries {
                let table = entry.as_table().ok_or("each condition must be a table")?;
                let condition =
                    read_condition(|key| table.get(key))?.ok_or("condition requires 'field'")?;
                config.conditions.push(condition);
            }
        }

        config.validate()?;
        Ok(config)
    }
}

/// `None` when there is no `field` key
fn read_condition<'a>(
    get: impl Fn(&str) -> Option<&'a toml::Value>,
) -> Result<Option<Condition>, String> {
    let Some(field) = get("field") else {
        return Ok(None);
    };
    let field = field.as_str().ok_or("condition 'field' must be a string")?;
    let operator = match get("operator") {
        Some(op) => op.as_str().ok_or("condition 'operator' must be a string")?,
        None => "eq",
    };
    let operand = get("value").map(operand_text).transpose()?;

    Condition::parse(field, operator, operand.as_deref()).map(Some)
}

fn operand_text(value: &toml::Value) -> Result<String, String> {
    match value {
        toml::Value::String(s) => Ok(s.clone()),
        toml::Value::Integer(n) => Ok(n.to_string()),
        toml::Value::Float(f) => Ok(f.to_string()),
        toml::Value::Boolean(b) => Ok(b.to_string()),
        _ => Err("condition 'value' must be a string, number or boolean".to_string()),
    }
}
