//! Bench command implementation.

use super::{format_size, PoolKind};
use segstream_core::{ArrayPool, BytesPool, SegmentPool, SegmentedStream, StreamConfig};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Timings for one bench run.
#[derive(Debug)]
pub struct BenchResult {
    /// Total time spent writing.
    pub write: Duration,
    /// Total time spent reading back.
    pub read: Duration,
    /// Bytes moved in each direction.
    pub bytes: u64,
    /// Pool hit rate over the run.
    pub hit_rate: f64,
}

/// Runs the bench command.
pub fn run(
    pool: PoolKind,
    segment_size: usize,
    bytes: usize,
    iterations: usize,
    chunk: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    if chunk == 0 {
        return Err("Chunk size must be at least 1".into());
    }

    println!(
        "Writing {} bytes x {} iterations in {}-byte chunks ({} pool, {}-byte segments)",
        format_size(bytes as u64),
        iterations,
        chunk,
        pool.name(),
        segment_size
    );

    let result = match pool {
        PoolKind::Array => bench::<ArrayPool>(segment_size, bytes, iterations, chunk)?,
        PoolKind::Bytes => bench::<BytesPool>(segment_size, bytes, iterations, chunk)?,
    };

    println!();
    println!("  Write: {:?} ({})", result.write, throughput(result.bytes, result.write));
    println!("  Read:  {:?} ({})", result.read, throughput(result.bytes, result.read));
    println!("  Pool hit rate: {:.1}%", result.hit_rate * 100.0);
    Ok(())
}

fn bench<P: SegmentPool + Default>(
    segment_size: usize,
    bytes: usize,
    iterations: usize,
    chunk: usize,
) -> Result<BenchResult, Box<dyn std::error::Error>> {
    let pool = Arc::new(P::default());
    let config = StreamConfig::new().segment_size(segment_size);
    let data: Vec<u8> = (0..chunk).map(|i| (i % 256) as u8).collect();
    let mut sink = vec![0u8; chunk];

    let mut result = BenchResult {
        write: Duration::ZERO,
        read: Duration::ZERO,
        bytes: 0,
        hit_rate: 0.0,
    };

    for iteration in 0..iterations {
        let mut stream = SegmentedStream::with_pool(Arc::clone(&pool), config.clone())?;

        let start = Instant::now();
        let mut written = 0;
        while written < bytes {
            let n = chunk.min(bytes - written);
            stream.write(&data[..n])?;
            written += n;
        }
        result.write += start.elapsed();

        stream.set_position(0)?;
        let start = Instant::now();
        while stream.read(&mut sink)? > 0 {}
        result.read += start.elapsed();

        result.bytes += written as u64;
        debug!(iteration, segments = stream.segment_count(), "bench iteration done");
    }

    result.hit_rate = pool.stats().hit_rate();
    info!(bytes = result.bytes, "bench finished");
    Ok(result)
}

fn throughput(bytes: u64, elapsed: Duration) -> String {
    let secs = elapsed.as_secs_f64();
    if secs == 0.0 {
        return "n/a".to_string();
    }
    format!("{}/s", format_size((bytes as f64 / secs) as u64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bench_reuses_segments_after_first_iteration() {
        let result = bench::<ArrayPool>(64, 4096, 3, 100).unwrap();
        assert_eq!(result.bytes, 3 * 4096);
        // 64 segments per iteration, only the first iteration misses.
        assert!((result.hit_rate - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn zero_chunk_is_rejected() {
        assert!(run(PoolKind::Bytes, 64, 10, 1, 0).is_err());
    }
}
