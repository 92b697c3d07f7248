//! Tests for pipeline lifecycle and the worker loop

use std::sync::Arc;
use std::time::Duration;

use sluice_buffer::{BlockingBuffer, Buffer, BufferError};
use sluice_config::PipelineConfig;
use sluice_processor::{Chain, ProcessError, ProcessFuture, Processor};
use sluice_protocol::{PipelineDescription, Record};
use sluice_sinks::Sink;

use super::*;
use crate::test_support::{CaptureSink, FailingSink, IdleSource, StuckSink, batch};

const WRITE_TIMEOUT: Duration = Duration::from_millis(100);

fn settings(name: &str) -> PipelineSettings {
    PipelineSettings::new(name)
        .with_read_timeout(Duration::from_millis(50))
        .with_idle_backoff(Duration::from_millis(5))
        .with_drain_timeout(Duration::from_secs(2))
}

fn buffer(name: &str) -> Arc<dyn Buffer<String>> {
    Arc::new(BlockingBuffer::new(16, 4, name).unwrap())
}

fn pipeline_with(
    source: Arc<dyn Source<String>>,
    chain: Chain<String>,
    sinks: Vec<Arc<dyn Sink<String>>>,
) -> Pipeline<String> {
    Pipeline::new(settings("entry"), source, buffer("entry"), chain, sinks).unwrap()
}

async fn write(pipeline: &Pipeline<String>, items: &[&str]) {
    pipeline
        .buffer()
        .write_all(batch(items), WRITE_TIMEOUT)
        .await
        .unwrap();
}

async fn eventually(condition: impl Fn() -> bool) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

/// Fails every batch
struct Rejecting;

impl Processor<String> for Rejecting {
    fn execute<'a>(&'a self, _records: Vec<Record<String>>) -> ProcessFuture<'a, Vec<Record<String>>> {
        Box::pin(async { Err(ProcessError::failed("malformed")) })
    }

    fn name(&self) -> &'static str {
        "rejecting"
    }
}

/// Drops every record
struct DropAll;

impl Processor<String> for DropAll {
    fn execute<'a>(&'a self, _records: Vec<Record<String>>) -> ProcessFuture<'a, Vec<Record<String>>> {
        Box::pin(async { Ok(Vec::new()) })
    }

    fn name(&self) -> &'static str {
        "drop_all"
    }
}

/// Emits a summary record on shutdown
struct Summarizing;

impl Processor<String> for Summarizing {
    fn execute<'a>(&'a self, records: Vec<Record<String>>) -> ProcessFuture<'a, Vec<Record<String>>> {
        Box::pin(async move { Ok(records) })
    }

    fn name(&self) -> &'static str {
        "summarizing"
    }

    fn shutdown<'a>(&'a self) -> ProcessFuture<'a, Vec<Record<String>>> {
        Box::pin(async { Ok(batch(&["summary"])) })
    }
}

#[test]
fn test_settings_defaults() {
    let settings = PipelineSettings::new("entry");
    assert_eq!(settings.workers, 1);
    assert_eq!(settings.read_timeout, Duration::from_millis(3000));
    assert_eq!(settings.idle_backoff, Duration::from_millis(10));
    assert_eq!(settings.drain_timeout, Duration::from_secs(10));
    assert_eq!(settings.sink_policy, SinkPolicy::FanOut);
    assert!(settings.validate().is_ok());
}

#[test]
fn test_settings_validation() {
    assert!(PipelineSettings::new("").validate().is_err());
    assert!(PipelineSettings::new("entry").with_workers(0).validate().is_err());
    assert!(
        PipelineSettings::new("entry")
            .with_read_timeout(Duration::ZERO)
            .validate()
            .is_err()
    );
}

#[test]
fn test_settings_from_config() {
    let config = PipelineConfig {
        workers: 3,
        delay: Duration::from_millis(250),
        sink_policy: SinkPolicy::Partition,
        ..PipelineConfig::default()
    };
    let settings = PipelineSettings::from_config("raw", &config);
    assert_eq!(settings.name, "raw");
    assert_eq!(settings.workers, 3);
    assert_eq!(settings.read_timeout, Duration::from_millis(250));
    assert_eq!(settings.sink_policy, SinkPolicy::Partition);
    assert_eq!(settings.info().number_of_process_workers(), 3);
}

#[test]
fn test_new_requires_a_sink() {
    let err = Pipeline::<String>::new(
        settings("entry"),
        IdleSource::new(),
        buffer("entry"),
        Chain::empty(),
        Vec::new(),
    )
    .unwrap_err();
    assert!(matches!(err, PipelineError::InvalidArgument(_)));
}

#[test]
fn test_pipeline_description() {
    let pipeline = Pipeline::new(
        settings("entry").with_workers(4),
        IdleSource::new(),
        buffer("entry"),
        Chain::empty(),
        vec![CaptureSink::new("out")],
    )
    .unwrap();
    assert_eq!(pipeline.pipeline_name(), "entry");
    assert_eq!(pipeline.number_of_process_workers(), 4);
    assert_eq!(pipeline.state(), PipelineState::Created);
}

#[tokio::test]
async fn test_start_then_stop() {
    let source = IdleSource::new();
    let sink = CaptureSink::new("out");
    let pipeline = pipeline_with(source.clone(), Chain::empty(), vec![sink.clone()]);

    pipeline.start().await.unwrap();
    assert_eq!(pipeline.state(), PipelineState::Running);
    assert!(source.started());

    pipeline.stop().await.unwrap();
    assert_eq!(pipeline.state(), PipelineState::Stopped);
    assert!(source.stopped());
    assert!(pipeline.buffer().is_closed());
    assert_eq!(sink.shutdowns(), 1);
}

#[tokio::test]
async fn test_start_twice_is_rejected() {
    let pipeline = pipeline_with(IdleSource::new(), Chain::empty(), vec![CaptureSink::new("out")]);
    pipeline.start().await.unwrap();

    let err = pipeline.start().await.unwrap_err();
    assert!(matches!(
        err,
        PipelineError::InvalidState {
            state: PipelineState::Running,
            ..
        }
    ));

    pipeline.stop().await.unwrap();
}

#[tokio::test]
async fn test_stop_before_start() {
    let source = IdleSource::new();
    let pipeline = pipeline_with(source.clone(), Chain::empty(), vec![CaptureSink::new("out")]);

    pipeline.stop().await.unwrap();
    assert_eq!(pipeline.state(), PipelineState::Stopped);
    assert!(!source.stopped());

    let err = pipeline.start().await.unwrap_err();
    assert_eq!(err.to_string(), "pipeline 'entry' cannot start while stopped");
}

#[tokio::test]
async fn test_stop_is_idempotent() {
    let sink = CaptureSink::new("out");
    let pipeline = pipeline_with(IdleSource::new(), Chain::empty(), vec![sink.clone()]);
    pipeline.start().await.unwrap();

    pipeline.stop().await.unwrap();
    pipeline.stop().await.unwrap();

    assert_eq!(pipeline.state(), PipelineState::Stopped);
    assert_eq!(sink.shutdowns(), 1);
}

#[tokio::test]
async fn test_source_start_failure_stops_pipeline() {
    let pipeline = pipeline_with(IdleSource::failing(), Chain::empty(), vec![CaptureSink::new("out")]);

    let err = pipeline.start().await.unwrap_err();
    assert!(matches!(err, PipelineError::Source(_)));
    assert_eq!(pipeline.state(), PipelineState::Stopped);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_records_are_delivered_and_checkpointed() {
    let sink = CaptureSink::new("out");
    let pipeline = pipeline_with(IdleSource::new(), Chain::empty(), vec![sink.clone()]);
    pipeline.start().await.unwrap();

    write(&pipeline, &["a", "b", "c", "d", "e"]).await;
    eventually(|| sink.received().len() == 5).await;
    eventually(|| pipeline.buffer().occupied_slots() == 0).await;

    pipeline.stop().await.unwrap();

    assert_eq!(sink.received(), vec!["a", "b", "c", "d", "e"]);
    let snapshot = pipeline.metrics().snapshot();
    assert_eq!(snapshot.records_read, 5);
    assert_eq!(snapshot.records_written, 5);
    // Batch size 4: one full batch and one of a single record
    assert_eq!(snapshot.checkpoints, 2);
    assert_eq!(snapshot.unacknowledged_batches(), 0);
}

#[tokio::test]
async fn test_processor_failure_leaves_slots_charged() {
    let sink = CaptureSink::new("out");
    let pipeline = pipeline_with(
        IdleSource::new(),
        Chain::new(vec![Box::new(Rejecting)]),
        vec![sink.clone()],
    );
    pipeline.start().await.unwrap();

    write(&pipeline, &["a", "b"]).await;
    eventually(|| pipeline.metrics().snapshot().processor_errors == 1).await;

    assert_eq!(pipeline.buffer().occupied_slots(), 2);
    assert_eq!(pipeline.buffer().in_flight_records(), 2);
    assert_eq!(sink.calls(), 0);
    // A non-fatal failure keeps the pipeline running
    assert!(!pipeline.is_stop_requested());
    assert!(pipeline.is_running());

    pipeline.stop().await.unwrap();
    assert_eq!(pipeline.metrics().snapshot().checkpoints, 0);
}

#[tokio::test]
async fn test_fully_filtered_batch_is_checkpointed() {
    let sink = CaptureSink::new("out");
    let pipeline = pipeline_with(
        IdleSource::new(),
        Chain::new(vec![Box::new(DropAll)]),
        vec![sink.clone()],
    );
    pipeline.start().await.unwrap();

    write(&pipeline, &["a", "b"]).await;
    eventually(|| pipeline.metrics().checkpoints() == 1).await;

    assert_eq!(pipeline.buffer().occupied_slots(), 0);
    assert_eq!(sink.calls(), 0);
    pipeline.stop().await.unwrap();
}

#[tokio::test]
async fn test_fatal_sink_error_requests_stop() {
    let sink = FailingSink::fatal();
    let pipeline = pipeline_with(IdleSource::new(), Chain::empty(), vec![sink.clone()]);
    pipeline.start().await.unwrap();

    write(&pipeline, &["a"]).await;
    tokio::time::timeout(Duration::from_secs(2), pipeline.stop_requested())
        .await
        .expect("stop was not requested");

    assert_eq!(pipeline.metrics().snapshot().sink_errors, 1);
    assert_eq!(pipeline.buffer().in_flight_records(), 1);
    // The request does not stop the pipeline by itself
    assert!(pipeline.is_running());

    pipeline.stop().await.unwrap();
    assert_eq!(pipeline.state(), PipelineState::Stopped);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_fatal_error_closes_buffer_and_ends_every_worker() {
    let sink = FailingSink::fatal();
    let pipeline = Pipeline::new(
        settings("entry").with_workers(4),
        IdleSource::new(),
        buffer("entry"),
        Chain::empty(),
        vec![sink.clone()],
    )
    .unwrap();
    pipeline.start().await.unwrap();

    write(&pipeline, &["a"]).await;
    tokio::time::timeout(Duration::from_secs(2), pipeline.stop_requested())
        .await
        .expect("stop was not requested");
    eventually(|| pipeline.workers.lock().iter().all(|worker| worker.is_finished())).await;

    // Writers are turned away instead of filling a buffer nobody reads
    assert!(pipeline.buffer().is_closed());
    let rejected = pipeline
        .buffer()
        .write_all(batch(&["b", "c", "d"]), WRITE_TIMEOUT)
        .await
        .unwrap_err();
    assert!(matches!(rejected.error(), BufferError::Closed { .. }));
    assert_eq!(rejected.into_payload().len(), 3);

    assert_eq!(sink.calls(), 1);
    assert_eq!(pipeline.metrics().snapshot().batches_read, 1);
    assert_eq!(pipeline.buffer().occupied_slots(), 1);
    assert_eq!(pipeline.buffer().in_flight_records(), 1);

    pipeline.stop().await.unwrap();
    assert_eq!(pipeline.state(), PipelineState::Stopped);
    assert_eq!(sink.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_drain_timeout_aborts_stuck_workers() {
    let sink = StuckSink::new();
    let pipeline = Pipeline::new(
        settings("entry")
            .with_workers(2)
            .with_drain_timeout(Duration::from_millis(100)),
        IdleSource::new(),
        buffer("entry"),
        Chain::empty(),
        vec![sink.clone()],
    )
    .unwrap();
    pipeline.start().await.unwrap();

    // Batch size 4: both workers end up stuck inside the sink
    write(&pipeline, &["a", "b", "c", "d", "e"]).await;
    eventually(|| sink.calls() == 2).await;

    let started = tokio::time::Instant::now();
    pipeline.stop().await.unwrap();
    let elapsed = started.elapsed();

    assert!(elapsed >= Duration::from_millis(100));
    assert!(elapsed < Duration::from_secs(1));
    assert_eq!(pipeline.state(), PipelineState::Stopped);
    assert_eq!(pipeline.buffer().in_flight_records(), 5);
    assert_eq!(pipeline.metrics().snapshot().checkpoints, 0);
    assert_eq!(sink.shutdowns(), 1);
}

#[tokio::test]
async fn test_retryable_sink_error_keeps_running() {
    let sink = FailingSink::retryable();
    let pipeline = pipeline_with(IdleSource::new(), Chain::empty(), vec![sink.clone()]);
    pipeline.start().await.unwrap();

    write(&pipeline, &["a"]).await;
    eventually(|| sink.calls() == 1).await;
    write(&pipeline, &["b"]).await;
    eventually(|| sink.calls() == 2).await;

    assert!(!pipeline.is_stop_requested());
    assert_eq!(pipeline.buffer().occupied_slots(), 2);
    pipeline.stop().await.unwrap();
}

#[tokio::test]
async fn test_flushed_records_reach_sinks_on_stop() {
    let sink = CaptureSink::new("out");
    let pipeline = pipeline_with(
        IdleSource::new(),
        Chain::new(vec![Box::new(Summarizing)]),
        vec![sink.clone()],
    );
    pipeline.start().await.unwrap();
    pipeline.stop().await.unwrap();

    assert_eq!(sink.received(), vec!["summary"]);
    assert_eq!(pipeline.metrics().snapshot().records_written, 1);
}

#[tokio::test]
async fn test_abort_forces_stopped() {
    let pipeline = pipeline_with(IdleSource::new(), Chain::empty(), vec![CaptureSink::new("out")]);
    pipeline.start().await.unwrap();

    pipeline.abort();

    assert_eq!(pipeline.state(), PipelineState::Stopped);
    assert!(pipeline.buffer().is_closed());
    // Nothing left to drain
    pipeline.stop().await.unwrap();
}

#[tokio::test]
async fn test_request_stop_resolves_waiters() {
    let pipeline = pipeline_with(IdleSource::new(), Chain::empty(), vec![CaptureSink::new("out")]);
    assert!(!pipeline.is_stop_requested());

    pipeline.request_stop();

    tokio::time::timeout(Duration::from_millis(100), pipeline.stop_requested())
        .await
        .unwrap();
}
