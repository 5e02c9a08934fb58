//! Stream configuration.

use crate::error::{StreamError, StreamResult};

/// Default capacity of a single pooled segment (4KB).
pub const DEFAULT_SEGMENT_SIZE: usize = 4096;

/// Configuration for a segmented stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamConfig {
    /// Capacity of each segment rented from the pool.
    ///
    /// Changing it on a live stream only affects segments rented afterwards;
    /// segments already held keep their capacity.
    pub segment_size: usize,

    /// Whether to zero a segment's memory before returning it to the pool.
    pub clear_on_return: bool,

    /// Whether to copy the contents into `saved_data` when the stream closes.
    pub save_on_close: bool,

    /// Upper bound on the logical length (`None` = the pool's own limit).
    pub max_length: Option<u64>,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            segment_size: DEFAULT_SEGMENT_SIZE,
            clear_on_return: false,
            save_on_close: false,
            max_length: None,
        }
    }
}

impl StreamConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the segment capacity.
    #[must_use]
    pub const fn segment_size(mut self, size: usize) -> Self {
        self.segment_size = size;
        self
    }

    /// Sets whether segments are zeroed before returning to the pool.
    #[must_use]
    pub const fn clear_on_return(mut self, value: bool) -> Self {
        self.clear_on_return = value;
        self
    }

    /// Sets whether the contents are saved when the stream closes.
    #[must_use]
    pub const fn save_on_close(mut self, value: bool) -> Self {
        self.save_on_close = value;
        self
    }

    /// Caps the logical length below the pool's own limit.
    #[must_use]
    pub const fn max_length(mut self, max: u64) -> Self {
        self.max_length = Some(max);
        self
    }

    /// Checks that the configuration can back a stream.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::InvalidSegmentSize`] if `segment_size` is zero.
    pub fn validate(&self) -> StreamResult<()> {
        if self.segment_size == 0 {
            return Err(StreamError::InvalidSegmentSize {
                size: self.segment_size,
            });
        }
        Ok(())
    }
}
