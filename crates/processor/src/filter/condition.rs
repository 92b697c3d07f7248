//! Field tests a filter applies to each event
//!
//! Operands are parsed once when the filter is built, so a bad regex or a
//! non-numeric threshold fails at startup instead of silently never
//! matching.

use regex::Regex;
use serde_json::Value;
use sluice_protocol::Event;

#[cfg(test)]
#[path = "condition_test.rs"]
mod tests;

/// Numeric comparison against a fixed threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Gt,
    Gte,
    Lt,
    Lte,
}

impl Comparison {
    fn holds(self, actual: f64, threshold: f64) -> bool {
        match self {
            Self::Gt => actual > threshold,
            Self::Gte => actual >= threshold,
            Self::Lt => actual < threshold,
            Self::Lte => actual <= threshold,
        }
    }
}

/// What a condition checks about its field
#[derive(Debug, Clone)]
pub enum Predicate {
    /// Field is present, whatever its value
    Exists,
    /// Scalar renders as the operand; a missing field never matches
    Equals(String),
    /// Opposite of `Equals`; a missing field always matches
    NotEquals(String),
    Contains(String),
    StartsWith(String),
    EndsWith(String),
    Matches(Regex),
    /// Number, or numeric string, compared with a threshold
    Compare(Comparison, f64),
}

impl Predicate {
    /// Build from an operator name (`eq`, `gte`, `regex`, ...) and its operand
    pub fn parse(operator: &str, operand: Option<&str>) -> Result<Self, String> {
        if operator == "exists" {
            return Ok(Self::Exists);
        }
        let operand = operand.ok_or_else(|| format!("operator '{}' requires a value", operator))?;

        let predicate = match operator {
            "eq" => Self::Equals(operand.to_string()),
            "ne" => Self::NotEquals(operand.to_string()),
            "contains" => Self::Contains(operand.to_string()),
            "starts_with" => Self::StartsWith(operand.to_string()),
            "ends_with" => Self::EndsWith(operand.to_string()),
            "regex" => Self::Matches(
                Regex::new(operand).map_err(|e| format!("invalid regex '{}': {}", operand, e))?,
            ),
            "gt" | "gte" | "lt" | "lte" => {
                let threshold = operand.trim().parse::<f64>().map_err(|_| {
                    format!("operator '{}' requires a number, got '{}'", operator, operand)
                })?;
                let comparison = match operator {
                    "gt" => Comparison::Gt,
                    "gte" => Comparison::Gte,
                    "lt" => Comparison::Lt,
                    _ => Comparison::Lte,
                };
                Self::Compare(comparison, threshold)
            }
            other => return Err(format!("unknown operator '{}'", other)),
        };
        Ok(predicate)
    }

    /// Apply to a field value, `None` when the field is absent
    pub fn test(&self, value: Option<&Value>) -> bool {
        match self {
            Self::Exists => value.is_some(),
            Self::Equals(expected) => value.is_some_and(|v| renders_as(v, expected)),
            Self::NotEquals(expected) => !value.is_some_and(|v| renders_as(v, expected)),
            Self::Contains(needle) => with_text(value, |text| text.contains(needle.as_str())),
            Self::StartsWith(prefix) => with_text(value, |text| text.starts_with(prefix.as_str())),
            Self::EndsWith(suffix) => with_text(value, |text| text.ends_with(suffix.as_str())),
            Self::Matches(re) => with_text(value, |text| re.is_match(text)),
            Self::Compare(comparison, threshold) => value
                .and_then(as_number)
                .is_some_and(|n| comparison.holds(n, *threshold)),
        }
    }
}

/// A predicate bound to an event field
#[derive(Debug, Clone)]
pub struct Condition {
    /// Dot-separated path, e.g. `user.email`
    pub field: String,
    pub predicate: Predicate,
}

impl Condition {
    pub fn new(field: impl Into<String>, predicate: Predicate) -> Self {
        Self {
            field: field.into(),
            predicate,
        }
    }

    /// Parse the `field` / `operator` / `value` triple of a config entry
    pub fn parse(field: &str, operator: &str, operand: Option<&str>) -> Result<Self, String> {
        Ok(Self::new(field, Predicate::parse(operator, operand)?))
    }

    pub fn eq(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(field, Predicate::Equals(value.into()))
    }

    pub fn ne(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(field, Predicate::NotEquals(value.into()))
    }

    pub fn contains(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(field, Predicate::Contains(value.into()))
    }

    pub fn starts_with(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(field, Predicate::StartsWith(value.into()))
    }

    pub fn exists(field: impl Into<String>) -> Self {
        Self::new(field, Predicate::Exists)
    }

    pub fn compare(field: impl Into<String>, comparison: Comparison, threshold: f64) -> Self {
        Self::new(field, Predicate::Compare(comparison, threshold))
    }

    pub fn regex(field: impl Into<String>, pattern: &str) -> Result<Self, String> {
        Ok(Self::new(field, Predicate::parse("regex", Some(pattern))?))
    }

    /// Whether `event` satisfies the condition
    pub fn matches(&self, event: &Event) -> bool {
        self.predicate.test(event.get(&self.field))
    }
}

/// Scalars compare by their rendered form, so `404` equals `"404"`
fn renders_as(value: &Value, expected: &str) -> bool {
    match value {
        Value::String(s) => s == expected,
        Value::Number(n) => n.to_string() == expected,
        Value::Bool(b) => expected == if *b { "true" } else { "false" },
        Value::Null => expected == "null",
        Value::Array(_) | Value::Object(_) => false,
    }
}

fn with_text(value: Option<&Value>, test: impl FnOnce(&str) -> bool) -> bool {
    match value {
        Some(Value::String(s)) => test(s),
        Some(Value::Number(n)) => test(&n.to_string()),
        Some(Value::Bool(b)) => test(if *b { "true" } else { "false" }),
        _ => false,
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
