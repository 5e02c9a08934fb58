//! Benchmark utilities.

use rand::Rng;
use segstream_core::{ArrayPool, ArrayStream, StreamConfig};
use std::sync::Arc;

/// Segment capacities every stream benchmark runs with.
pub const SEGMENT_SIZES: [usize; 4] = [64, 512, 4096, 65536];

/// Generate random data of the specified size.
pub fn random_data(size: usize) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    (0..size).map(|_| rng.gen()).collect()
}

/// Build a stream over `pool` already holding `data`, positioned at 0.
pub fn filled_stream(pool: &Arc<ArrayPool>, segment_size: usize, data: &[u8]) -> ArrayStream {
    let config = StreamConfig::new().segment_size(segment_size);
    ArrayStream::from_slice(Arc::clone(pool), config, data).expect("Failed to fill stream")
}
