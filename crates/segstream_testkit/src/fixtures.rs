//! Test fixtures and stream helpers.
//!
//! Provides convenience functions for setting up streams over a pool the
//! test can inspect afterwards.

use segstream_core::{ArrayPool, BytesPool, SegmentPool, SegmentedStream, StreamConfig};
use std::sync::Arc;

/// A stream together with the pool it rents from.
pub struct TestStream<P: SegmentPool> {
    /// The stream instance.
    pub stream: SegmentedStream<P>,
    /// The pool, kept so counters can be checked after the stream is gone.
    pub pool: Arc<P>,
}

impl<P: SegmentPool + Default> TestStream<P> {
    /// Creates an empty stream over a fresh pool.
    pub fn new(segment_size: usize) -> Self {
        Self::with_config(StreamConfig::new().segment_size(segment_size))
    }

    /// Creates an empty stream with a custom configuration.
    pub fn with_config(config: StreamConfig) -> Self {
        let pool = Arc::new(P::default());
        let stream =
            SegmentedStream::with_pool(Arc::clone(&pool), config).expect("Failed to open stream");
        Self { stream, pool }
    }

    /// Creates a stream holding `data`, with the position at the end.
    pub fn from_data(segment_size: usize, data: &[u8]) -> Self {
        let mut fixture = Self::new(segment_size);
        fixture.stream.write(data).expect("Failed to write fixture data");
        fixture
    }
}

impl TestStream<ArrayPool> {
    /// Creates an array-backed stream.
    pub fn array(segment_size: usize) -> Self {
        Self::new(segment_size)
    }
}

impl TestStream<BytesPool> {
    /// Creates a `BytesMut`-backed stream.
    pub fn bytes(segment_size: usize) -> Self {
        Self::new(segment_size)
    }
}

impl<P: SegmentPool> TestStream<P> {
    /// Closes the stream and returns the number of segments still rented.
    pub fn close_and_count_outstanding(mut self) -> u64 {
        self.stream.close();
        self.pool.stats().outstanding()
    }
}

impl<P: SegmentPool> std::ops::Deref for TestStream<P> {
    type Target = SegmentedStream<P>;

    fn deref(&self) -> &Self::Target {
        &self.stream
    }
}

impl<P: SegmentPool> std::ops::DerefMut for TestStream<P> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.stream
    }
}

/// Runs a test with an array-backed stream and checks that every segment
/// went back to the pool afterwards.
pub fn with_test_stream<F, R>(segment_size: usize, f: F) -> R
where
    F: FnOnce(&mut SegmentedStream<ArrayPool>) -> R,
{
    let mut fixture = TestStream::<ArrayPool>::new(segment_size);
    let result = f(&mut fixture.stream);
    assert_eq!(
        fixture.close_and_count_outstanding(),
        0,
        "segments still rented after close"
    );
    result
}

/// Returns `len` bytes of a repeating, position-dependent pattern.
pub fn patterned_data(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i.wrapping_mul(31) ^ (i >> 8)) as u8).collect()
}

/// The small walkthrough: capacity 4, bytes `1..=6`, two segments.
pub fn six_byte_stream() -> TestStream<ArrayPool> {
    TestStream::from_data(4, &[1, 2, 3, 4, 5, 6])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixture_tracks_pool() {
        let fixture = six_byte_stream();
        assert_eq!(fixture.len(), 6);
        assert_eq!(fixture.segment_count(), 2);
        assert_eq!(fixture.pool.stats().rents, 2);
        assert_eq!(fixture.close_and_count_outstanding(), 0);
    }

    #[test]
    fn with_test_stream_returns_closure_result() {
        let contents = with_test_stream(3, |stream| {
            stream.write(&patterned_data(10)).unwrap();
            stream.to_array().unwrap()
        });
        assert_eq!(contents, patterned_data(10));
    }

    #[test]
    fn bytes_fixture_derefs_mutably() {
        let mut fixture = TestStream::bytes(8);
        fixture.write(b"deref").unwrap();
        fixture.set_length(2).unwrap();
        assert_eq!(fixture.to_array().unwrap(), b"de");
    }
}
