//! Segment pools.
//!
//! A pool hands out fixed-capacity segments and takes them back for reuse.
//! Pools are shared between streams (`Send + Sync`) and are the only part of
//! the crate that is internally synchronized; a stream calls into its pool
//! once per segment it rents or returns and never holds a lock across calls.
//!
//! ## Available Pools
//!
//! - [`ArrayPool`] - `Vec<u8>` segments, 32-bit stream length cap
//! - [`BytesPool`] - `BytesMut` segments

mod array;
mod owned;

pub use self::array::ArrayPool;
pub use self::owned::BytesPool;

use crate::segment;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Default number of idle buffers kept per segment capacity.
pub const DEFAULT_MAX_RETAINED: usize = 64;

/// A shared source of reusable segments.
///
/// # Invariants
///
/// - `rent(n)` returns a segment whose `capacity()` is exactly `n`
/// - The contents of a rented segment are unspecified; callers that need
///   zeroed memory clear it themselves
/// - `give_back` accepts any segment previously rented from the same pool
pub trait SegmentPool: Send + Sync {
    /// The segment type this pool rents out.
    type Segment: segment::Segment;

    /// The largest logical length a stream over this pool may reach.
    const MAX_STREAM_LENGTH: u64;

    /// Rents a segment of exactly `capacity` bytes.
    fn rent(&self, capacity: usize) -> Self::Segment;

    /// Returns a segment to the pool.
    fn give_back(&self, segment: Self::Segment);

    /// Returns a snapshot of the pool statistics.
    fn stats(&self) -> PoolStats;
}

/// Configuration shared by the bundled pools.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    /// Maximum idle buffers kept for each distinct capacity.
    pub max_retained_per_size: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_retained_per_size: DEFAULT_MAX_RETAINED,
        }
    }
}

/// Pool statistics for monitoring.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Idle buffers currently held by the pool.
    pub size: usize,
    /// Total `rent` calls.
    pub rents: u64,
    /// Rents served from an idle buffer.
    pub hits: u64,
    /// Rents that allocated a new buffer.
    pub misses: u64,
    /// Total `give_back` calls.
    pub returns: u64,
    /// Returned buffers dropped because the bucket was full.
    pub drops: u64,
}

impl PoolStats {
    /// Calculate hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        if self.rents == 0 {
            0.0
        } else {
            self.hits as f64 / self.rents as f64
        }
    }

    /// Buffers rented and not yet returned.
    pub fn outstanding(&self) -> u64 {
        self.rents.saturating_sub(self.returns)
    }
}

/// Idle buffers bucketed by capacity, plus the counters behind [`PoolStats`].
#[derive(Debug)]
pub(crate) struct FreeList<B> {
    buckets: Mutex<HashMap<usize, Vec<B>>>,
    max_retained: usize,
    rents: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
    returns: AtomicU64,
    drops: AtomicU64,
}

impl<B> FreeList<B> {
    pub(crate) fn new(config: PoolConfig) -> Self {
        Self {
            buckets: Mutex::new(HashMap::new()),
            max_retained: config.max_retained_per_size,
            rents: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            returns: AtomicU64::new(0),
            drops: AtomicU64::new(0),
        }
    }

    /// Takes an idle buffer of `capacity`, or builds one with `alloc`.
    pub(crate) fn take_or_else(&self, capacity: usize, alloc: impl FnOnce() -> B) -> B {
        self.rents.fetch_add(1, Ordering::Relaxed);
        let reused = self
            .buckets
            .lock()
            .get_mut(&capacity)
            .and_then(Vec::pop);

        match reused {
            Some(buf) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                buf
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                alloc()
            }
        }
    }

    /// Keeps `buf` for reuse unless its bucket is already full.
    pub(crate) fn put(&self, capacity: usize, buf: B) {
        self.returns.fetch_add(1, Ordering::Relaxed);
        let mut buckets = self.buckets.lock();
        let bucket = buckets.entry(capacity).or_default();
        if bucket.len() < self.max_retained {
            bucket.push(buf);
        } else {
            self.drops.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn stats(&self) -> PoolStats {
        PoolStats {
            size: self.buckets.lock().values().map(Vec::len).sum(),
            rents: self.rents.load(Ordering::Relaxed),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            returns: self.returns.load(Ordering::Relaxed),
            drops: self.drops.load(Ordering::Relaxed),
        }
    }
}
