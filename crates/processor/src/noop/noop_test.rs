//! Tests for NoopProcessor

use super::*;
use sluice_protocol::Event;

fn create_test_batch() -> Vec<Record<Event>> {
    vec![
        Record::new(Event::from_message("test message 1")),
        Record::new(Event::from_message("test message 2")),
    ]
}

#[tokio::test]
async fn test_noop_passes_through() {
    let processor = NoopProcessor::new();
    let batch = create_test_batch();
    let expected = batch.clone();

    let result = processor.execute(batch).await.unwrap();
    assert_eq!(result, expected);
}

#[test]
fn test_noop_name() {
    let processor = NoopProcessor::new();
    assert_eq!(Processor::<Event>::name(&processor), "noop");
    assert!(Processor::<Event>::enabled(&processor));
    assert!(!Processor::<Event>::is_single_thread(&processor));
}

#[tokio::test]
async fn test_noop_shutdown_flushes_nothing() {
    let processor = NoopProcessor::new();
    let flushed = Processor::<Event>::shutdown(&processor).await.unwrap();
    assert!(flushed.is_empty());
}

#[test]
fn test_noop_is_copy() {
    let p1 = NoopProcessor::new();
    let p2 = p1;
    assert_eq!(Processor::<String>::name(&p1), Processor::<String>::name(&p2));
}
