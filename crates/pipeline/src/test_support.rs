//! Shared fakes for unit tests

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use sluice_buffer::Buffer;
use sluice_protocol::Record;
use sluice_sinks::{Sink, SinkError, SinkResult};
use sluice_sources::{Source, SourceResult};

pub fn batch(items: &[&str]) -> Vec<Record<String>> {
    items.iter().map(|s| Record::new(s.to_string())).collect()
}

pub fn data(records: &[Record<String>]) -> Vec<String> {
    records.iter().map(|r| r.data().clone()).collect()
}

/// Keeps every record it receives
pub struct CaptureSink {
    name: String,
    records: Mutex<Vec<Record<String>>>,
    calls: AtomicUsize,
    shutdowns: AtomicUsize,
}

impl CaptureSink {
    pub fn new(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            records: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            shutdowns: AtomicUsize::new(0),
        })
    }

    pub fn received(&self) -> Vec<String> {
        data(&self.records.lock())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn shutdowns(&self) -> usize {
        self.shutdowns.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Sink<String> for CaptureSink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn output(&self, records: &[Record<String>]) -> SinkResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.records.lock().extend(records.iter().cloned());
        Ok(())
    }

    async fn shutdown(&self) -> SinkResult<()> {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Fails every write
pub struct FailingSink {
    fatal: bool,
    calls: AtomicUsize,
}

impl FailingSink {
    pub fn retryable() -> Arc<Self> {
        Arc::new(Self {
            fatal: false,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn fatal() -> Arc<Self> {
        Arc::new(Self {
            fatal: true,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Sink<String> for FailingSink {
    fn name(&self) -> &str {
        if self.fatal { "fatal" } else { "failing" }
    }

    async fn output(&self, _records: &[Record<String>]) -> SinkResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fatal {
            Err(SinkError::fatal("destination gone"))
        } else {
            Err(SinkError::unavailable("destination busy"))
        }
    }
}

/// Accepts a batch and never returns from `output`
#[derive(Default)]
pub struct StuckSink {
    calls: AtomicUsize,
    shutdowns: AtomicUsize,
}

impl StuckSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn shutdowns(&self) -> usize {
        self.shutdowns.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Sink<String> for StuckSink {
    fn name(&self) -> &str {
        "stuck"
    }

    async fn output(&self, _records: &[Record<String>]) -> SinkResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        std::future::pending().await
    }

    async fn shutdown(&self) -> SinkResult<()> {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Source that writes nothing and tracks its lifecycle
#[derive(Default)]
pub struct IdleSource {
    started: AtomicBool,
    stopped: AtomicBool,
    fail_start: bool,
}

impl IdleSource {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail_start: true,
            ..Self::default()
        })
    }

    pub fn started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    pub fn stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Source<String> for IdleSource {
    fn name(&self) -> &str {
        "idle"
    }

    async fn start(&self, _buffer: Arc<dyn Buffer<String>>) -> SourceResult<()> {
        if self.fail_start {
            return Err(sluice_sources::SourceError::config("port in use"));
        }
        self.started.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }
}
