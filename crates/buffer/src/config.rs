//! Bounded blocking buffer configuration
//!
//! # Example
//!
//! ```toml
//! [pipelines.entry.buffer]
//! type = "bounded_blocking"
//! buffer_size = 512
//! batch_size = 8
//! ```

use sluice_protocol::PluginSetting;

use crate::{BufferError, DEFAULT_BATCH_SIZE, DEFAULT_BUFFER_SIZE, Result};

/// Capacity and batch size of a `BlockingBuffer`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockingBufferConfig {
    /// Total slots, counting queued and in-flight records
    pub buffer_size: usize,

    /// Maximum records returned by one read
    pub batch_size: usize,
}

impl Default for BlockingBufferConfig {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl BlockingBufferConfig {
    /// Create a config, validating both sizes
    pub fn new(buffer_size: usize, batch_size: usize) -> Result<Self> {
        let config = Self {
            buffer_size,
            batch_size,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check that both sizes are positive and a batch fits in the buffer
    pub fn validate(&self) -> Result<()> {
        if self.buffer_size == 0 {
            return Err(BufferError::invalid_argument(
                "buffer_size must be greater than 0",
            ));
        }
        if self.batch_size == 0 {
            return Err(BufferError::invalid_argument(
                "batch_size must be greater than 0",
            ));
        }
        if self.batch_size > self.buffer_size {
            return Err(BufferError::invalid_argument(format!(
                "batch_size ({}) must not exceed buffer_size ({})",
                self.batch_size, self.buffer_size
            )));
        }
        Ok(())
    }
}

impl TryFrom<&PluginSetting> for BlockingBufferConfig {
    type Error = BufferError;

    fn try_from(setting: &PluginSetting) -> Result<Self> {
        let defaults = Self::default();
        let buffer_size = setting
            .get_usize("buffer_size")?
            .unwrap_or(defaults.buffer_size);
        let batch_size = setting
            .get_usize("batch_size")?
            .unwrap_or(defaults.batch_size);
        Self::new(buffer_size, batch_size)
    }
}
