//! Helpers shared by the integration tests

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use sluice_buffer::{Buffer, CheckpointState, Rejected};
use sluice_protocol::{Event, PluginSetting, Record};
use sluice_sinks::{Sink, SinkFactory, SinkResult};
use sluice_sources::{Source, SourceResult};
use tokio::sync::Semaphore;

/// Poll `condition` until it holds, failing the test after two seconds
pub async fn eventually(condition: impl Fn() -> bool) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

pub fn messages(records: &[Record<Event>]) -> Vec<String> {
    records
        .iter()
        .filter_map(|r| r.data().get_str("message").map(str::to_string))
        .collect()
}

pub fn events(prefix: &str, count: usize) -> Vec<Record<Event>> {
    (0..count)
        .map(|i| Record::new(Event::from_message(format!("{}{}", prefix, i))))
        .collect()
}

/// Source that leaves writing to the test
pub struct ManualSource;

#[async_trait]
impl<T: Send + 'static> Source<T> for ManualSource {
    fn name(&self) -> &str {
        "manual"
    }

    async fn start(&self, _buffer: Arc<dyn Buffer<T>>) -> SourceResult<()> {
        Ok(())
    }

    async fn stop(&self) {}
}

/// Keeps every record it receives
#[derive(Default)]
pub struct CaptureSink {
    records: Mutex<Vec<Record<Event>>>,
}

impl CaptureSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn records(&self) -> Vec<Record<Event>> {
        self.records.lock().clone()
    }
}

#[async_trait]
impl Sink<Event> for CaptureSink {
    fn name(&self) -> &str {
        "capture"
    }

    async fn output(&self, records: &[Record<Event>]) -> SinkResult<()> {
        self.records.lock().extend(records.iter().cloned());
        Ok(())
    }
}

/// Factory handing out one shared `CaptureSink`
pub struct CaptureFactory(pub Arc<CaptureSink>);

impl SinkFactory<Event> for CaptureFactory {
    fn create(&self, _setting: &PluginSetting) -> SinkResult<Arc<dyn Sink<Event>>> {
        Ok(Arc::clone(&self.0) as Arc<dyn Sink<Event>>)
    }

    fn name(&self) -> &'static str {
        "capture"
    }
}

/// Sink that blocks every batch until the test opens the gate
pub struct GateSink {
    gate: Semaphore,
    entered: AtomicUsize,
    inner: Arc<CaptureSink>,
}

impl GateSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            gate: Semaphore::new(0),
            entered: AtomicUsize::new(0),
            inner: CaptureSink::new(),
        })
    }

    /// Batches currently held or already let through
    pub fn entered(&self) -> usize {
        self.entered.load(Ordering::SeqCst)
    }

    /// Let `batches` more batches through
    pub fn open(&self, batches: usize) {
        self.gate.add_permits(batches);
    }

    pub fn received(&self) -> usize {
        self.inner.len()
    }
}

#[async_trait]
impl Sink<Event> for GateSink {
    fn name(&self) -> &str {
        "gate"
    }

    async fn output(&self, records: &[Record<Event>]) -> SinkResult<()> {
        self.entered.fetch_add(1, Ordering::SeqCst);
        if let Ok(permit) = self.gate.acquire().await {
            permit.forget();
        }
        self.inner.output(records).await
    }
}

/// Buffer wrapper counting reads
pub struct ObservedBuffer<T: Send + 'static> {
    inner: Arc<dyn Buffer<T>>,
    reads: AtomicUsize,
}

impl<T: Send + 'static> ObservedBuffer<T> {
    pub fn new(inner: Arc<dyn Buffer<T>>) -> Arc<Self> {
        Arc::new(Self {
            inner,
            reads: AtomicUsize::new(0),
        })
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<T: Send + 'static> Buffer<T> for ObservedBuffer<T> {
    async fn write(&self, record: Record<T>, timeout: Duration) -> Result<(), Rejected<Record<T>>> {
        self.inner.write(record, timeout).await
    }

    async fn write_all(&self, records: Vec<Record<T>>, timeout: Duration) -> Result<(), Rejected<Vec<Record<T>>>> {
        self.inner.write_all(records, timeout).await
    }

    async fn read(&self, timeout: Duration) -> sluice_buffer::Result<(Vec<Record<T>>, CheckpointState)> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.read(timeout).await
    }

    fn checkpoint(&self, state: CheckpointState) -> sluice_buffer::Result<()> {
        self.inner.checkpoint(state)
    }

    fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    fn close(&self) {
        self.inner.close()
    }

    fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }

    fn occupied_slots(&self) -> usize {
        self.inner.occupied_slots()
    }

    fn in_flight_records(&self) -> usize {
        self.inner.in_flight_records()
    }

    fn capacity(&self) -> usize {
        self.inner.capacity()
    }

    fn batch_size(&self) -> usize {
        self.inner.batch_size()
    }

    fn pipeline_name(&self) -> &str {
        self.inner.pipeline_name()
    }
}
