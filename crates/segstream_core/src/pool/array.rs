//! Pool of raw `Vec<u8>` segments.

use super::{FreeList, PoolConfig, PoolStats, SegmentPool};

/// A pool of `Vec<u8>` segments.
///
/// Streams over this pool are capped at `i32::MAX` bytes, matching the
/// 32-bit length limit of array-backed buffers.
///
/// # Thread Safety
///
/// This pool is thread-safe and can be shared across streams and threads.
///
/// # Example
///
/// ```rust
/// use segstream_core::{ArrayPool, SegmentPool};
///
/// let pool = ArrayPool::new();
/// let seg = pool.rent(16);
/// assert_eq!(seg.len(), 16);
/// pool.give_back(seg);
/// assert_eq!(pool.stats().returns, 1);
/// ```
#[derive(Debug)]
pub struct ArrayPool {
    free: FreeList<Vec<u8>>,
}

impl ArrayPool {
    /// Creates a pool with default retention limits.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(PoolConfig::default())
    }

    /// Creates a pool with the given configuration.
    #[must_use]
    pub fn with_config(config: PoolConfig) -> Self {
        Self {
            free: FreeList::new(config),
        }
    }
}

impl Default for ArrayPool {
    fn default() -> Self {
        Self::new()
    }
}

impl SegmentPool for ArrayPool {
    type Segment = Vec<u8>;

    const MAX_STREAM_LENGTH: u64 = i32::MAX as u64;

    fn rent(&self, capacity: usize) -> Vec<u8> {
        self.free.take_or_else(capacity, || vec![0u8; capacity])
    }

    fn give_back(&self, segment: Vec<u8>) {
        self.free.put(segment.len(), segment);
    }

    fn stats(&self) -> PoolStats {
        self.free.stats()
    }
}
