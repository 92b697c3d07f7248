//! Built-in plugin type names
//!
//! Config validation rejects plugin types outside these lists. The builder
//! resolves the same names through its registries.

use sluice_protocol::PluginSetting;

/// Type name of the connector plugin, valid as both source and sink
pub const PIPELINE_CONNECTOR: &str = "pipeline";

/// Known buffer types
pub const KNOWN_BUFFER_TYPES: &[&str] = &["bounded_blocking"];

/// Known source types
pub const KNOWN_SOURCE_TYPES: &[&str] = &["random", PIPELINE_CONNECTOR];

/// Known processor types
pub const KNOWN_PROCESSOR_TYPES: &[&str] = &["noop", "filter", "add_fields", "aggregate"];

/// Known sink types
pub const KNOWN_SINK_TYPES: &[&str] = &["stdout", "null", PIPELINE_CONNECTOR];

/// Check if a processor type is known
pub fn is_known_processor_type(type_name: &str) -> bool {
    KNOWN_PROCESSOR_TYPES.contains(&type_name)
}

/// Pipeline named by a `pipeline` connector setting
///
/// Returns `None` for any other plugin type, or when `name` is missing.
pub fn connector_target(setting: &PluginSetting) -> Option<&str> {
    if setting.plugin_type == PIPELINE_CONNECTOR {
        setting.get_str("name")
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_processor_types() {
        assert!(is_known_processor_type("filter"));
        assert!(is_known_processor_type("aggregate"));
        assert!(!is_known_processor_type("grok"));
    }

    #[test]
    fn test_connector_target() {
        let setting = PluginSetting::new("pipeline").with_option("name", "raw");
        assert_eq!(connector_target(&setting), Some("raw"));

        let setting = PluginSetting::new("pipeline");
        assert_eq!(connector_target(&setting), None);

        let setting = PluginSetting::new("stdout").with_option("name", "raw");
        assert_eq!(connector_target(&setting), None);
    }
}
