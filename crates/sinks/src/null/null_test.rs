//! Tests for the null sink

use super::*;
use crate::SinkStats;

fn batch(count: usize) -> Vec<Record<String>> {
    (0..count).map(|i| Record::new(format!("record {i}"))).collect()
}

#[test]
fn test_new_sink_has_no_traffic() {
    let sink = NullSink::new();
    assert_eq!(<NullSink as Sink<String>>::name(&sink), "null");
    assert_eq!(sink.metrics().snapshot(), SinkStats::default());
}

#[test]
fn test_custom_name() {
    let sink = NullSink::with_name("discard");
    assert_eq!(<NullSink as Sink<String>>::name(&sink), "discard");
}

#[tokio::test]
async fn test_output_counts_batches_and_records() {
    let sink = NullSink::new();

    sink.output(&batch(3)).await.unwrap();
    sink.output(&batch(5)).await.unwrap();

    let snapshot = sink.metrics().snapshot();
    assert_eq!(snapshot.batches, 2);
    assert_eq!(snapshot.records, 8);
    assert_eq!(snapshot.failures, 0);
}

#[tokio::test]
async fn test_empty_batch_is_accepted() {
    let sink = NullSink::new();
    sink.output(&batch(0)).await.unwrap();
    assert_eq!(sink.metrics().snapshot().records, 0);
}

#[tokio::test]
async fn test_metrics_handle_outlives_sink() {
    let sink = NullSink::new();
    let handle = sink.metrics_handle();

    let shared: Arc<dyn Sink<String>> = Arc::new(sink);
    shared.output(&batch(4)).await.unwrap();
    shared.shutdown().await.unwrap();
    drop(shared);

    assert_eq!(handle.snapshot().records, 4);
}

#[tokio::test]
async fn test_factory_creates_null_sink() {
    let sink: Arc<dyn Sink<String>> = NullFactory.create(&PluginSetting::new("null")).unwrap();
    assert_eq!(sink.name(), "null");
    sink.output(&batch(1)).await.unwrap();
}
