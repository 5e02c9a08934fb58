//! Stress tests for segmented streams.
//!
//! Many streams on many threads share one pool; the pool counters must
//! balance once every stream is gone.

use crate::fixtures::patterned_data;
use segstream_core::{SegmentPool, SegmentedStream, StreamConfig};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Result of a stress test run.
#[derive(Debug, Clone)]
pub struct StressTestResult {
    /// Total operations performed.
    pub total_ops: usize,
    /// Operations whose outcome matched expectations.
    pub successful_ops: usize,
    /// Operations that failed or returned wrong data.
    pub failed_ops: usize,
    /// Total duration.
    pub duration: Duration,
    /// Operations per second.
    pub ops_per_second: f64,
}

impl StressTestResult {
    /// Creates a new result.
    pub fn new(successful: usize, failed: usize, duration: Duration) -> Self {
        let total = successful + failed;
        let ops_per_second = if duration.as_secs_f64() > 0.0 {
            total as f64 / duration.as_secs_f64()
        } else {
            0.0
        };

        Self {
            total_ops: total,
            successful_ops: successful,
            failed_ops: failed,
            duration,
            ops_per_second,
        }
    }

    /// Prints a summary of the test.
    pub fn print_summary(&self, name: &str) {
        println!("\n=== {} ===", name);
        println!("Total operations: {}", self.total_ops);
        println!("Successful: {}", self.successful_ops);
        println!("Failed: {}", self.failed_ops);
        println!("Duration: {:?}", self.duration);
        println!("Throughput: {:.2} ops/sec", self.ops_per_second);
    }
}

/// Configuration for stress tests.
#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Streams created per thread.
    pub operations: usize,
    /// Number of concurrent threads.
    pub threads: usize,
    /// Bytes written into each stream.
    pub payload_size: usize,
    /// Segment capacity.
    pub segment_size: usize,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            operations: 200,
            threads: 4,
            payload_size: 4096,
            segment_size: 256,
        }
    }
}

/// Runs one stream life cycle: write, freeze, compare, unfreeze, truncate.
fn stream_cycle<P: SegmentPool>(pool: &Arc<P>, config: &StressConfig, data: &[u8]) -> bool {
    let stream_config = StreamConfig::new().segment_size(config.segment_size);
    let Ok(mut stream) = SegmentedStream::with_pool(Arc::clone(pool), stream_config) else {
        return false;
    };
    if stream.write(data).is_err() || stream.freeze().is_err() {
        return false;
    }
    let matches = stream.export_view().map_or(false, |view| view == *data);
    if !matches || stream.unfreeze().is_err() {
        return false;
    }
    let half = data.len() as u64 / 2;
    stream.set_length(half).is_ok() && stream.len() == half
}

/// Run streams sequentially on one thread over a shared pool.
pub fn stress_sequential_streams<P: SegmentPool>(
    pool: &Arc<P>,
    config: &StressConfig,
) -> StressTestResult {
    let data = patterned_data(config.payload_size);
    let start = Instant::now();
    let mut successful = 0usize;
    let mut failed = 0usize;

    for _ in 0..config.operations {
        if stream_cycle(pool, config, &data) {
            successful += 1;
        } else {
            failed += 1;
        }
    }

    StressTestResult::new(successful, failed, start.elapsed())
}

/// Run streams on several threads that all rent from the same pool.
pub fn stress_concurrent_streams<P: SegmentPool + 'static>(
    pool: &Arc<P>,
    config: &StressConfig,
) -> StressTestResult {
    let successful = Arc::new(AtomicUsize::new(0));
    let failed = Arc::new(AtomicUsize::new(0));
    let start = Instant::now();

    let handles: Vec<_> = (0..config.threads)
        .map(|thread_id| {
            let pool = Arc::clone(pool);
            let config = config.clone();
            let successful = Arc::clone(&successful);
            let failed = Arc::clone(&failed);
            thread::spawn(move || {
                // Each thread writes a different payload length.
                let data = patterned_data(config.payload_size + thread_id * 7);
                for _ in 0..config.operations {
                    if stream_cycle(&pool, &config, &data) {
                        successful.fetch_add(1, Ordering::Relaxed);
                    } else {
                        failed.fetch_add(1, Ordering::Relaxed);
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        if handle.join().is_err() {
            failed.fetch_add(config.operations, Ordering::Relaxed);
        }
    }

    StressTestResult::new(
        successful.load(Ordering::Relaxed),
        failed.load(Ordering::Relaxed),
        start.elapsed(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use segstream_core::{ArrayPool, BytesPool};

    fn small_config() -> StressConfig {
        StressConfig {
            operations: 25,
            threads: 4,
            payload_size: 1000,
            segment_size: 64,
        }
    }

    #[test]
    fn sequential_streams_reuse_segments() {
        let pool = Arc::new(ArrayPool::new());
        let result = stress_sequential_streams(&pool, &small_config());
        assert_eq!(result.failed_ops, 0);
        assert_eq!(result.successful_ops, 25);

        let stats = pool.stats();
        assert_eq!(stats.outstanding(), 0);
        // 16 segments per stream; only the first stream allocates.
        assert_eq!(stats.misses, 16);
    }

    #[test]
    fn concurrent_streams_balance_pool() {
        let pool = Arc::new(BytesPool::new());
        let config = small_config();
        let result = stress_concurrent_streams(&pool, &config);
        assert_eq!(result.failed_ops, 0);
        assert_eq!(result.total_ops, config.threads * config.operations);

        let stats = pool.stats();
        assert_eq!(stats.outstanding(), 0);
        assert_eq!(stats.rents, stats.hits + stats.misses);
    }
}
