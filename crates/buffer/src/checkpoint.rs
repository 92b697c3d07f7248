//! Checkpoint tokens
//!
//! Every `read` hands out a `CheckpointState` describing the batch it
//! returned. Passing the token back to `checkpoint` releases the batch's
//! capacity. Tokens are move-only so a worker cannot acknowledge the same
//! batch twice without forging one, and they remember which buffer issued
//! them.

use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_BUFFER_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a buffer instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId(u64);

impl BufferId {
    /// Allocate a fresh id
    pub fn next() -> Self {
        Self(NEXT_BUFFER_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value
    #[inline]
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// Acknowledgement token for one batch returned by `read`
#[derive(Debug, PartialEq, Eq)]
pub struct CheckpointState {
    owner: BufferId,
    sequence: u64,
    num_records: usize,
}

impl CheckpointState {
    /// Create a token for a batch of `num_records` issued by `owner`
    pub fn new(owner: BufferId, sequence: u64, num_records: usize) -> Self {
        Self {
            owner,
            sequence,
            num_records,
        }
    }

    /// Token for an empty read; checkpointing it is always accepted
    pub fn empty(owner: BufferId) -> Self {
        Self::new(owner, 0, 0)
    }

    /// Buffer that issued this token
    #[inline]
    pub fn owner(&self) -> BufferId {
        self.owner
    }

    /// Per-buffer sequence number of the read
    #[inline]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Number of records the read returned
    #[inline]
    pub fn num_records(&self) -> usize {
        self.num_records
    }

    /// Whether the read returned nothing
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.num_records == 0
    }
}
