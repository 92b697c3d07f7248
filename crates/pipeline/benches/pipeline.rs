//! Pipeline benchmark suite
//!
//! Benchmarks for sink delivery and end-to-end record flow.
//!
//! Run with: `cargo bench -p sluice-pipeline`

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use sluice_buffer::{BlockingBuffer, Buffer};
use sluice_pipeline::{Pipeline, PipelineSettings, SinkPolicy, SinkSet};
use sluice_processor::Chain;
use sluice_protocol::{Event, Record, RecordMetadata};
use sluice_sinks::{NullSink, Sink};
use sluice_sources::{Source, SourceResult};
use tokio::runtime::Runtime;

const TIMEOUT: Duration = Duration::from_secs(1);

fn create_records(count: usize) -> Vec<Record<Event>> {
    (0..count)
        .map(|i| {
            let metadata = RecordMetadata::new().with_routing_key(format!("key-{}", i % 16));
            Record::with_metadata(
                Event::from_message(format!("test message {} with some additional data", i)),
                metadata,
            )
        })
        .collect()
}

fn null_sinks(count: usize) -> Vec<Arc<dyn Sink<Event>>> {
    (0..count)
        .map(|i| Arc::new(NullSink::with_name(format!("null-{}", i))) as Arc<dyn Sink<Event>>)
        .collect()
}

/// Source that leaves the buffer to the benchmark
struct ExternalSource;

#[async_trait]
impl Source<Event> for ExternalSource {
    fn name(&self) -> &str {
        "external"
    }

    async fn start(&self, _buffer: Arc<dyn Buffer<Event>>) -> SourceResult<()> {
        Ok(())
    }

    async fn stop(&self) {}
}

/// Benchmark one batch delivered to 4 sinks under each policy
fn bench_sink_set(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();

    let mut group = c.benchmark_group("sink_set");

    for (label, policy) in [("fan_out", SinkPolicy::FanOut), ("partition", SinkPolicy::Partition)] {
        for batch_size in [8, 64, 256] {
            group.throughput(Throughput::Elements(batch_size as u64));
            group.bench_with_input(BenchmarkId::new(label, batch_size), &batch_size, |b, &size| {
                let sinks = SinkSet::new(null_sinks(4), policy).unwrap();

                b.to_async(&rt).iter(|| async {
                    sinks.deliver(black_box(create_records(size))).await.unwrap();
                });
            });
        }
    }

    group.finish();
}

/// Benchmark records flowing from buffer to sink through running workers
fn bench_end_to_end(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();

    let mut group = c.benchmark_group("end_to_end");
    group.sample_size(20);

    for workers in [1, 4] {
        group.throughput(Throughput::Elements(256));
        group.bench_with_input(BenchmarkId::from_parameter(workers), &workers, |b, &workers| {
            let pipeline = rt.block_on(async {
                let settings = PipelineSettings::new("bench")
                    .with_workers(workers)
                    .with_idle_backoff(Duration::from_micros(50));
                let buffer: Arc<dyn Buffer<Event>> = Arc::new(BlockingBuffer::new(512, 32, "bench").unwrap());
                let pipeline = Pipeline::new(
                    settings,
                    Arc::new(ExternalSource),
                    buffer,
                    Chain::empty(),
                    null_sinks(1),
                )
                .unwrap();
                pipeline.start().await.unwrap();
                pipeline
            });

            b.to_async(&rt).iter(|| async {
                let target = pipeline.metrics().snapshot().records_written + 256;
                pipeline.buffer().write_all(create_records(256), TIMEOUT).await.unwrap();
                while pipeline.metrics().snapshot().records_written < target {
                    tokio::task::yield_now().await;
                }
            });

            rt.block_on(pipeline.stop()).unwrap();
        });
    }

    group.finish();
}

criterion_group!(benches, bench_sink_set, bench_end_to_end);
criterion_main!(benches);
