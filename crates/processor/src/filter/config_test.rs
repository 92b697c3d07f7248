use super::*;
use crate::filter::{Comparison, Predicate};

#[test]
fn test_defaults_need_a_condition() {
    let config = FilterConfig::default();
    assert!(config.enabled);
    assert_eq!(config.action, FilterAction::Drop);
    assert_eq!(config.match_mode, MatchMode::All);
    assert_eq!(config.validate().unwrap_err(), "at least one condition is required");
}

#[test]
fn test_empty_field_is_rejected() {
    let err = FilterConfig::new()
        .with_condition(Condition::exists("level"))
        .with_condition(Condition::eq("", "x"))
        .validate()
        .unwrap_err();
    assert_eq!(err, "condition 1 has an empty field");
}

#[test]
fn test_action_and_mode_parse() {
    assert_eq!("keep".parse::<FilterAction>(), Ok(FilterAction::Keep));
    assert_eq!("any".parse::<MatchMode>(), Ok(MatchMode::Any));
    assert!("most".parse::<MatchMode>().unwrap_err().contains("match mode"));
}

#[test]
fn test_single_condition_shorthand() {
    let setting = PluginSetting::new("filter")
        .with_option("action", "keep")
        .with_option("match", "any")
        .with_option("field", "status")
        .with_option("operator", "gte")
        .with_option("value", 500);

    let config = FilterConfig::try_from(&setting).unwrap();
    assert_eq!(config.action, FilterAction::Keep);
    assert_eq!(config.match_mode, MatchMode::Any);
    assert_eq!(config.conditions.len(), 1);
    assert_eq!(config.conditions[0].field, "status");
    assert!(matches!(
        config.conditions[0].predicate,
        Predicate::Compare(Comparison::Gte, t) if t == 500.0
    ));
}

#[test]
fn test_conditions_array() {
    let setting: PluginSetting = toml::from_str(
        r#"
type = "filter"
enabled = false
conditions = [
    { field = "level", value = "debug" },
    { field = "path", operator = "regex", value = "^/health" },
    { field = "trace_id", operator = "exists" },
]
"#,
    )
    .unwrap();
    let config = FilterConfig::try_from(&setting).unwrap();

    assert!(!config.enabled);
    let predicates: Vec<_> = config.conditions.iter().map(|c| &c.predicate).collect();
    assert!(matches!(predicates[0], Predicate::Equals(v) if v == "debug"));
    assert!(matches!(predicates[1], Predicate::Matches(_)));
    assert!(matches!(predicates[2], Predicate::Exists));
}

#[test]
fn test_setting_errors() {
    let cases = [
        (
            PluginSetting::new("filter").with_option("action", "explode"),
            "unknown action",
        ),
        (
            PluginSetting::new("filter").with_option("field", "level"),
            "requires a value",
        ),
        (
            PluginSetting::new("filter")
                .with_option("field", "status")
                .with_option("operator", "gt")
                .with_option("value", "high"),
            "requires a number",
        ),
        (
            PluginSetting::new("filter").with_option("conditions", "level"),
            "must be an array",
        ),
    ];

    for (setting, expected) in cases {
        let err = FilterConfig::try_from(&setting).unwrap_err();
        assert!(err.contains(expected), "{err:?} should mention {expected:?}");
    }
}

#[test]
fn test_condition_table_requires_field() {
    let setting: PluginSetting = toml::from_str(
        r#"
type = "filter"
conditions = [{ operator = "exists" }]
"#,
    )
    .unwrap();
    assert_eq!(
        FilterConfig::try_from(&setting).unwrap_err(),
        "condition requires 'field'"
    );
}
