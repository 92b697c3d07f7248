//! Sluice Buffer - Bounded, checkpointed queues
//!
//! A buffer sits between a pipeline's source and its process workers. Sources
//! write records (blocking with a timeout when the buffer is full), workers
//! read batches and later acknowledge them with the `CheckpointState` the read
//! returned.
//!
//! # Capacity accounting
//!
//! A record occupies one slot from the moment it is written until the batch
//! containing it is checkpointed. Reading does not free space, so a crash
//! between read and checkpoint can never lose records the source believes
//! were accepted.
//!
//! ```text
//! write ──► [ queued ]──read──► [ in flight ]──checkpoint──► slot freed
//! ```
//!
//! # Example
//!
//! ```ignore
//! let buffer = BlockingBuffer::new(512, 8, "entry")?;
//! buffer.write(Record::new(event), Duration::from_millis(100)).await?;
//!
//! let (batch, token) = buffer.read(Duration::from_secs(3)).await?;
//! // ... process and publish the batch ...
//! buffer.checkpoint(token)?;
//! ```

mod blocking;
mod checkpoint;
mod config;
mod error;
mod registry;

pub use blocking::BlockingBuffer;
pub use checkpoint::{BufferId, CheckpointState};
pub use config::BlockingBufferConfig;
pub use error::{BufferError, Rejected, Result};
pub use registry::{BlockingBufferFactory, BufferFactory, BufferRegistry};

use std::time::Duration;

use async_trait::async_trait;
use sluice_protocol::Record;

/// Default total capacity of a bounded blocking buffer
pub const DEFAULT_BUFFER_SIZE: usize = 512;

/// Default maximum number of records returned by one read
pub const DEFAULT_BATCH_SIZE: usize = 8;

/// Plugin type name of the built-in bounded blocking buffer
pub const BOUNDED_BLOCKING: &str = "bounded_blocking";

/// A bounded queue of records with checkpointed reads
///
/// Implementations must be safe to share between one or more writers and
/// any number of concurrent readers.
#[async_trait]
pub trait Buffer<T: Send + 'static>: Send + Sync {
    /// Write a single record, waiting up to `timeout` for a free slot
    ///
    /// On failure the record is handed back inside `Rejected`.
    async fn write(
        &self,
        record: Record<T>,
        timeout: Duration,
    ) -> std::result::Result<(), Rejected<Record<T>>>;

    /// Write all records atomically, waiting up to `timeout` for enough space
    ///
    /// Either every record is enqueued, in order, or none is. A batch larger
    /// than the buffer's capacity fails immediately with `SizeOverflow`.
    async fn write_all(
        &self,
        records: Vec<Record<T>>,
        timeout: Duration,
    ) -> std::result::Result<(), Rejected<Vec<Record<T>>>>;

    /// Take up to one batch of queued records
    ///
    /// Never waits for records to arrive: `timeout` only bounds contention
    /// with other callers. An empty batch is a normal outcome.
    async fn read(&self, timeout: Duration) -> Result<(Vec<Record<T>>, CheckpointState)>;

    /// Acknowledge a batch previously returned by `read`, freeing its slots
    fn checkpoint(&self, state: CheckpointState) -> Result<()>;

    /// True when no records are waiting to be read (in-flight records ignored)
    fn is_empty(&self) -> bool;

    /// Refuse further writes; reads and checkpoints keep working
    fn close(&self);

    /// Whether `close` has been called
    fn is_closed(&self) -> bool;

    /// Number of records currently queued or in flight
    fn occupied_slots(&self) -> usize;

    /// Records read but not yet checkpointed
    fn in_flight_records(&self) -> usize;

    /// Total number of slots
    fn capacity(&self) -> usize;

    /// Slots available to writers
    fn free_slots(&self) -> usize {
        self.capacity().saturating_sub(self.occupied_slots())
    }

    /// Maximum records returned by one read
    fn batch_size(&self) -> usize;

    /// Name of the pipeline owning this buffer
    fn pipeline_name(&self) -> &str;
}
