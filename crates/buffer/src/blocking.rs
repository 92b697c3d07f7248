//! Bounded blocking buffer
//!
//! A FIFO queue with a fixed number of slots. All accounting (queued records,
//! in-flight batches, the closed flag) lives behind one mutex, so no two
//! callers can ever claim the same slot. Writers that find the buffer full
//! park on a `Notify` that checkpoints and `close` signal.
//!
//! The lock is never held across an await point, and async callers never
//! block on it: reads poll it and yield while it is contended.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use sluice_protocol::{PluginSetting, Record};
use tokio::sync::Notify;
use tokio::time::Instant;

use crate::{
    BlockingBufferConfig, Buffer, BufferError, BufferId, CheckpointState, Rejected, Result,
};

/// In-memory bounded buffer with checkpointed reads
pub struct BlockingBuffer<T> {
    config: BlockingBufferConfig,
    pipeline: String,
    id: BufferId,
    state: Mutex<State<T>>,
    space_freed: Notify,
}

struct State<T> {
    queue: VecDeque<Record<T>>,
    /// Read sequence -> records still charged against capacity
    in_flight: HashMap<u64, usize>,
    in_flight_records: usize,
    last_sequence: u64,
    closed: bool,
}

impl<T> State<T> {
    #[inline]
    fn occupied(&self) -> usize {
        self.queue.len() + self.in_flight_records
    }
}

impl<T: Send + 'static> BlockingBuffer<T> {
    /// Create a buffer with `buffer_size` slots handing out batches of at most
    /// `batch_size` records
    pub fn new(buffer_size: usize, batch_size: usize, pipeline: impl Into<String>) -> Result<Self> {
        Self::with_config(BlockingBufferConfig::new(buffer_size, batch_size)?, pipeline)
    }

    /// Create a buffer from a validated config
    pub fn with_config(config: BlockingBufferConfig, pipeline: impl Into<String>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            pipeline: pipeline.into(),
            id: BufferId::next(),
            state: Mutex::new(State {
                queue: VecDeque::new(),
                in_flight: HashMap::new(),
                in_flight_records: 0,
                last_sequence: 0,
                closed: false,
            }),
            space_freed: Notify::new(),
        })
    }

    /// Create a buffer from a plugin setting (`buffer_size`, `batch_size`)
    pub fn from_setting(setting: &PluginSetting) -> Result<Self> {
        Self::with_config(
            BlockingBufferConfig::try_from(setting)?,
            setting.pipeline_name(),
        )
    }

    /// Identity stamped into every checkpoint token this buffer issues
    #[inline]
    pub fn id(&self) -> BufferId {
        self.id
    }

    /// Wait until `needed` slots are free, then hand the queue to `push`
    async fn enqueue<P, F>(
        &self,
        payload: P,
        needed: usize,
        timeout: Duration,
        push: F,
    ) -> std::result::Result<(), Rejected<P>>
    where
        P: Send,
        F: FnOnce(&mut VecDeque<Record<T>>, P) + Send,
    {
        let deadline = Instant::now() + timeout;
        loop {
            // Enabled before the capacity check so no wakeup slips in between
            let notified = self.space_freed.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut state = self.state.lock();
                if state.closed {
                    return Err(Rejected::new(BufferError::closed(&self.pipeline), payload));
                }
                if state.occupied() + needed <= self.config.buffer_size {
                    push(&mut state.queue, payload);
                    return Ok(());
                }
            }

            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                tracing::trace!(
                    pipeline = %self.pipeline,
                    needed,
                    ?timeout,
                    "buffer write timed out"
                );
                return Err(Rejected::new(BufferError::Timeout { timeout }, payload));
            }
        }
    }

    fn empty_read(&self) -> (Vec<Record<T>>, CheckpointState) {
        (Vec::new(), CheckpointState::empty(self.id))
    }
}

#[async_trait]
impl<T: Send + 'static> Buffer<T> for BlockingBuffer<T> {
    async fn write(
        &self,
        record: Record<T>,
        timeout: Duration,
    ) -> std::result::Result<(), Rejected<Record<T>>> {
        self.enqueue(record, 1, timeout, |queue, record| queue.push_back(record))
            .await
    }

    async fn write_all(
        &self,
        records: Vec<Record<T>>,
        timeout: Duration,
    ) -> std::result::Result<(), Rejected<Vec<Record<T>>>> {
        let requested = records.len();
        if requested > self.config.buffer_size {
            return Err(Rejected::new(
                BufferError::SizeOverflow {
                    requested,
                    capacity: self.config.buffer_size,
                },
                records,
            ));
        }
        self.enqueue(records, requested, timeout, |queue, records| {
            queue.extend(records)
        })
        .await
    }

    async fn read(&self, timeout: Duration) -> Result<(Vec<Record<T>>, CheckpointState)> {
        let deadline = Instant::now() + timeout;
        let mut state = loop {
            if let Some(state) = self.state.try_lock() {
                break state;
            }
            if Instant::now() >= deadline {
                tracing::trace!(pipeline = %self.pipeline, "buffer lock contended, empty read");
                return Ok(self.empty_read());
            }
            tokio::task::yield_now().await;
        };

        let count = state.queue.len().min(self.config.batch_size);
        if count == 0 {
            return Ok(self.empty_read());
        }

        let records: Vec<_> = state.queue.drain(..count).collect();
        state.last_sequence += 1;
        let sequence = state.last_sequence;
        state.in_flight.insert(sequence, count);
        state.in_flight_records += count;

        Ok((records, CheckpointState::new(self.id, sequence, count)))
    }

    fn checkpoint(&self, token: CheckpointState) -> Result<()> {
        if token.owner() != self.id {
            return Err(BufferError::invalid_state(format!(
                "token issued by buffer {} presented to buffer {} of pipeline '{}'",
                token.owner().as_u64(),
                self.id.as_u64(),
                self.pipeline
            )));
        }
        if token.is_empty() {
            return Ok(());
        }

        {
            let mut state = self.state.lock();
            match state.in_flight.get(&token.sequence()).copied() {
                Some(held) if held == token.num_records() => {
                    state.in_flight.remove(&token.sequence());
                    state.in_flight_records -= held;
                }
                Some(held) => {
                    return Err(BufferError::invalid_state(format!(
                        "read {} holds {} records, token claims {}",
                        token.sequence(),
                        held,
                        token.num_records()
                    )));
                }
                None => {
                    return Err(BufferError::invalid_state(format!(
                        "read {} is unknown or already checkpointed",
                        token.sequence()
                    )));
                }
            }
        }

        self.space_freed.notify_waiters();
        Ok(())
    }

    fn is_empty(&self) -> bool {
        self.state.lock().queue.is_empty()
    }

    fn close(&self) {
        {
            let mut state = self.state.lock();
            if state.closed {
                return;
            }
            state.closed = true;
            tracing::debug!(
                pipeline = %self.pipeline,
                queued = state.queue.len(),
                in_flight = state.in_flight_records,
                "buffer closed to writers"
            );
        }
        self.space_freed.notify_waiters();
    }

    fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    fn occupied_slots(&self) -> usize {
        self.state.lock().occupied()
    }

    fn in_flight_records(&self) -> usize {
        self.state.lock().in_flight_records
    }

    fn capacity(&self) -> usize {
        self.config.buffer_size
    }

    fn batch_size(&self) -> usize {
        self.config.batch_size
    }

    fn pipeline_name(&self) -> &str {
        &self.pipeline
    }
}

impl<T> std::fmt::Debug for BlockingBuffer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockingBuffer")
            .field("pipeline", &self.pipeline)
            .field("id", &self.id)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "blocking_test.rs"]
mod tests;
