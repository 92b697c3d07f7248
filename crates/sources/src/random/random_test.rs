//! Tests for the random source

use sluice_buffer::BlockingBuffer;

use super::*;

fn fast(max_records: Option<u64>) -> RandomSource {
    RandomSource::new(RandomSourceConfig {
        interval: Duration::from_millis(1),
        write_timeout: Duration::from_millis(5),
        max_records,
    })
}

fn buffer(capacity: usize) -> Arc<BlockingBuffer<Event>> {
    Arc::new(BlockingBuffer::new(capacity, capacity, "test").unwrap())
}

async fn wait_until_finished(source: &RandomSource) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while source.is_running() {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    })
    .await
    .unwrap();
}

#[test]
fn test_config_defaults() {
    let config = RandomSourceConfig::default();
    assert_eq!(config.interval, Duration::from_millis(500));
    assert_eq!(config.write_timeout, Duration::from_millis(500));
    assert!(config.max_records.is_none());
}

#[test]
fn test_config_from_setting() {
    let setting = PluginSetting::new("random")
        .with_option("interval", "10ms")
        .with_option("write_timeout", 50)
        .with_option("max_records", 3);
    let config = RandomSourceConfig::try_from(&setting).unwrap();

    assert_eq!(config.interval, Duration::from_millis(10));
    assert_eq!(config.write_timeout, Duration::from_millis(50));
    assert_eq!(config.max_records, Some(3));
}

#[test]
fn test_config_rejects_zero_interval() {
    let setting = PluginSetting::new("random").with_option("interval", 0);
    let err = RandomSourceConfig::try_from(&setting).unwrap_err();
    assert!(matches!(err, SourceError::Config(_)));
}

#[tokio::test(start_paused = true)]
async fn test_emits_uuid_messages() {
    let source = RandomSource::new(RandomSourceConfig {
        max_records: Some(3),
        ..RandomSourceConfig::default()
    });
    let buffer = buffer(8);

    source.start(buffer.clone()).await.unwrap();
    wait_until_finished(&source).await;
    source.stop().await;

    let (records, _checkpoint) = buffer.read(Duration::from_millis(10)).await.unwrap();
    assert_eq!(records.len(), 3);
    for record in &records {
        let message = record.data().get_str("message").unwrap();
        assert!(uuid::Uuid::parse_str(message).is_ok());
    }
    assert_eq!(source.metrics().snapshot().produced, 3);
}

#[tokio::test]
async fn test_start_twice_is_rejected() {
    let source = fast(None);
    let buffer = buffer(8);

    source.start(buffer.clone()).await.unwrap();
    let err = source.start(buffer).await.unwrap_err();
    assert!(matches!(err, SourceError::AlreadyStarted(_)));

    source.stop().await;
    assert!(!source.is_running());
}

#[tokio::test]
async fn test_stop_without_start_is_noop() {
    let source = fast(None);
    source.stop().await;
    source.stop().await;
    assert!(!source.is_running());
}

#[tokio::test(start_paused = true)]
async fn test_full_buffer_counts_timeouts() {
    let source = fast(None);
    let buffer = buffer(1);

    source.start(buffer.clone()).await.unwrap();
    tokio::time::timeout(Duration::from_secs(5), async {
        while source.metrics().snapshot().dropped == 0 {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    })
    .await
    .unwrap();
    source.stop().await;

    assert_eq!(source.metrics().snapshot().produced, 1);
    assert_eq!(buffer.occupied_slots(), 1);
}

#[tokio::test]
async fn test_closed_buffer_ends_source() {
    let source = fast(None);
    let buffer = buffer(8);
    buffer.close();

    source.start(buffer.clone()).await.unwrap();
    wait_until_finished(&source).await;

    assert_eq!(source.metrics().snapshot().produced, 0);
    assert!(buffer.is_empty());
    source.stop().await;
}
