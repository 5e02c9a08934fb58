//! Pool of `BytesMut` segments.

use super::{FreeList, PoolConfig, PoolStats, SegmentPool};
use bytes::BytesMut;

/// A pool of [`BytesMut`] segments.
///
/// Each rented segment is a `BytesMut` whose length equals the requested
/// capacity, so the whole buffer is addressable as initialized memory.
#[derive(Debug)]
pub struct BytesPool {
    free: FreeList<BytesMut>,
}

impl BytesPool {
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

impl Default for BytesPool {
    fn default() -> Self {
        Self::new()
    }
}

impl SegmentPool for BytesPool {
    type Segment = BytesMut;

    const MAX_STREAM_LENGTH: u64 = isize::MAX as u64;

    fn rent(&self, capacity: usize) -> BytesMut {
        self.free.take_or_else(capacity, || BytesMut::zeroed(capacity))
    }

    fn give_back(&self, segment: BytesMut) {
        self.free.put(segment.len(), segment);
    }

    fn stats(&self) -> PoolStats {
        self.free.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rent_returns_initialized_buffer() {
        let pool = BytesPool::new();
        let seg = pool.rent(32);
        assert_eq!(seg.len(), 32);
        assert!(seg.iter().all(|&b| b == 0));
    }

    #[test]
    fn give_back_then_rent_hits() {
        let pool = BytesPool::new();
        let seg = pool.rent(8);
        pool.give_back(seg);
        let _seg = pool.rent(8);

        let stats = pool.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.returns, 1);
    }
}
