//! Stdout sink tests

use sluice_protocol::Event;

use super::*;

fn events(messages: &[&str]) -> Vec<Record<Event>> {
    messages.iter().map(|m| Record::new(Event::from_message(*m))).collect()
}

fn capture(config: StdoutConfig) -> StdoutSink<Vec<u8>> {
    StdoutSink::with_writer(Vec::new(), config)
}

fn lines(sink: StdoutSink<Vec<u8>>) -> Vec<String> {
    String::from_utf8(sink.into_writer())
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

// ============================================================================
// StdoutConfig Tests
// ============================================================================

#[test]
fn test_config_default() {
    let config = StdoutConfig::default();

    assert_eq!(config.target, StdoutTarget::Stdout);
    assert!(!config.include_metadata);
    assert_eq!(config.max_records, 0);
}

#[test]
fn test_config_from_setting() {
    let setting = PluginSetting::new("stdout")
        .with_option("output", "stderr")
        .with_option("include_metadata", true)
        .with_option("max_records", 10);
    let config = StdoutConfig::try_from(&setting).unwrap();

    assert_eq!(config.target, StdoutTarget::Stderr);
    assert!(config.include_metadata);
    assert_eq!(config.max_records, 10);
}

#[test]
fn test_config_rejects_unknown_output() {
    let setting = PluginSetting::new("stdout").with_option("output", "file");
    let err = StdoutConfig::try_from(&setting).unwrap_err();
    assert!(matches!(err, SinkError::Config(_)));
}

#[test]
fn test_config_rejects_negative_max_records() {
    let setting = PluginSetting::new("stdout").with_option("max_records", -1);
    let err = StdoutConfig::try_from(&setting).unwrap_err();
    assert!(matches!(err, SinkError::Setting(_)));
}

// ============================================================================
// Output Tests
// ============================================================================

#[tokio::test]
async fn test_writes_one_json_line_per_record() {
    let sink = capture(StdoutConfig::default());
    sink.output(&events(&["a", "b"])).await.unwrap();

    let snapshot = sink.metrics().snapshot();
    assert_eq!(snapshot.batches, 1);
    assert_eq!(snapshot.records, 2);
    assert!(snapshot.bytes > 0);

    assert_eq!(lines(sink), vec![r#"{"message":"a"}"#, r#"{"message":"b"}"#]);
}

#[tokio::test]
async fn test_include_metadata_wraps_records() {
    let sink = capture(StdoutConfig::with_metadata());
    let record = Record::with_metadata(
        Event::from_message("hi"),
        RecordMetadata::new().with_routing_key("tenant-1"),
    );
    sink.output(&[record]).await.unwrap();

    let out = lines(sink);
    assert_eq!(out.len(), 1);
    let value: Value = serde_json::from_str(&out[0]).unwrap();
    assert_eq!(value["data"]["message"], "hi");
    assert_eq!(value["@metadata"]["routing_key"], "tenant-1");
    assert!(value["@metadata"]["arrival_time"].is_string());
    assert!(value["@metadata"].get("correlation_id").is_none());
}

#[tokio::test]
async fn test_max_records_truncates_batch() {
    let config = StdoutConfig {
        max_records: 2,
        ..StdoutConfig::default()
    };
    let sink = capture(config);
    sink.output(&events(&["a", "b", "c"])).await.unwrap();

    assert_eq!(lines(sink).len(), 2);
}

#[tokio::test]
async fn test_empty_batch_writes_nothing() {
    let sink = capture(StdoutConfig::default());
    sink.output(&events(&[])).await.unwrap();

    assert_eq!(sink.metrics().snapshot().batches, 1);
    assert!(lines(sink).is_empty());
}

#[tokio::test]
async fn test_plain_strings_are_serialized() {
    let sink = capture(StdoutConfig::default());
    sink.output(&[Record::new("plain".to_string())]).await.unwrap();

    assert_eq!(lines(sink), vec![r#""plain""#]);
}

#[tokio::test]
async fn test_shutdown_flushes() {
    let sink = capture(StdoutConfig::default());
    Sink::<Event>::shutdown(&sink).await.unwrap();
    assert_eq!(sink.metrics().snapshot().flushes, 1);
}

#[tokio::test]
async fn test_factory_creates_stdout_sink() {
    let sink: Arc<dyn Sink<Event>> = StdoutFactory
        .create(&PluginSetting::new("stdout"))
        .unwrap();
    assert_eq!(sink.name(), "stdout");
}
