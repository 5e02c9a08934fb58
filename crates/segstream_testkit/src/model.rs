//! Reference-model harness.
//!
//! Runs every operation against a real stream and a plain `Vec<u8>` model
//! side by side, then checks that the two agree and that the stream's
//! segment and pool bookkeeping is consistent.

use crate::generators::StreamOp;
use segstream_core::{SegmentPool, SegmentedStream, StreamConfig, StreamError};
use std::sync::Arc;

/// A stream paired with the data it should hold.
pub struct ModelHarness<P: SegmentPool> {
    /// The stream under test.
    pub stream: SegmentedStream<P>,
    /// The pool backing the stream.
    pub pool: Arc<P>,
    model: Vec<u8>,
    position: usize,
    frozen: bool,
    steps: usize,
}

impl<P: SegmentPool + Default> ModelHarness<P> {
    /// Creates a harness over a fresh pool.
    pub fn new(segment_size: usize) -> Self {
        Self::with_pool(Arc::new(P::default()), segment_size)
    }
}

impl<P: SegmentPool> ModelHarness<P> {
    /// Creates a harness over an existing pool.
    pub fn with_pool(pool: Arc<P>, segment_size: usize) -> Self {
        let stream = SegmentedStream::with_pool(
            Arc::clone(&pool),
            StreamConfig::new().segment_size(segment_size),
        )
        .expect("Failed to open stream");
        Self {
            stream,
            pool,
            model: Vec::new(),
            position: 0,
            frozen: false,
            steps: 0,
        }
    }

    /// Applies one operation to both sides and verifies the result.
    pub fn apply(&mut self, op: &StreamOp) {
        let segments_before = self.stream.segment_count() as u64;
        let stats_before = self.pool.stats();

        match op {
            StreamOp::Write(data) => {
                let result = self.stream.write(data);
                if self.expect_mutation(result) {
                    let end = self.position + data.len();
                    if end > self.model.len() {
                        self.model.resize(end, 0);
                    }
                    self.model[self.position..end].copy_from_slice(data);
                    self.position = end;
                }
            }
            StreamOp::WriteByte(value) => {
                let result = self.stream.write_byte(*value);
                if self.expect_mutation(result) {
                    if self.position == self.model.len() {
                        self.model.push(*value);
                    } else {
                        self.model[self.position] = *value;
                    }
                    self.position += 1;
                }
            }
            StreamOp::Read(n) => {
                let mut buf = vec![0u8; *n];
                let read = self.stream.read(&mut buf).expect("Read failed");
                let available = self.model.len() - self.position;
                assert_eq!(read, (*n).min(available), "step {}: short read", self.steps);
                assert_eq!(
                    &buf[..read],
                    &self.model[self.position..self.position + read],
                    "step {}: read mismatch",
                    self.steps
                );
                self.position += read;
            }
            StreamOp::ReadByte => {
                let value = self.stream.read_byte().expect("Read failed");
                assert_eq!(value, self.model.get(self.position).copied());
                if value.is_some() {
                    self.position += 1;
                }
            }
            StreamOp::Seek(target) => {
                let result = self.stream.set_position(*target);
                if *target as usize <= self.model.len() {
                    result.expect("Seek within bounds failed");
                    self.position = *target as usize;
                } else {
                    assert_eq!(
                        result,
                        Err(StreamError::PositionOutOfRange {
                            position: *target,
                            length: self.model.len() as u64,
                        })
                    );
                }
            }
            StreamOp::SetLength(length) => {
                let result = self.stream.set_length(*length);
                if self.expect_mutation(result) {
                    self.model.resize(*length as usize, 0);
                    self.position = self.position.min(*length as usize);
                }
            }
            StreamOp::SetSegmentSize(size) => {
                self.stream
                    .set_segment_size(*size)
                    .expect("Failed to set segment size");
            }
            StreamOp::Freeze => {
                self.stream.freeze().expect("Freeze failed");
                self.frozen = true;
            }
            StreamOp::Unfreeze => {
                self.stream.unfreeze().expect("Unfreeze failed");
                self.frozen = false;
            }
        }

        self.verify_pool_traffic(segments_before, stats_before);
        self.verify();
        self.steps += 1;
    }

    /// Applies a sequence of operations.
    pub fn run(&mut self, ops: &[StreamOp]) {
        for op in ops {
            self.apply(op);
        }
    }

    /// Checks the stream against the model.
    pub fn verify(&self) {
        let step = self.steps;
        if let Err(violation) = self.stream.check_invariants() {
            panic!("step {step}: {violation}");
        }
        assert_eq!(self.stream.len(), self.model.len() as u64, "step {step}: length");
        assert_eq!(self.stream.position(), self.position as u64, "step {step}: position");
        assert_eq!(self.stream.is_frozen(), self.frozen, "step {step}: frozen flag");

        let view = self.stream.export_view().expect("Failed to export view");
        assert!(view == self.model[..], "step {step}: contents differ");

        // Only the last segment may be partially filled, and none is empty
        // unless the stream is.
        let chunks = view.chunks().count();
        assert_eq!(self.stream.segment_count(), chunks.max(1), "step {step}: segment count");
        assert_eq!(
            self.stream.locate(self.stream.position()),
            Some(self.stream.segment_position()),
            "step {step}: cursor coordinates"
        );
    }

    fn verify_pool_traffic(&self, segments_before: u64, before: segstream_core::PoolStats) {
        let after = self.pool.stats();
        let segments_after = self.stream.segment_count() as u64;
        let rented = after.rents - before.rents;
        let returned = after.returns - before.returns;

        assert_eq!(
            segments_before + rented - returned,
            segments_after,
            "step {}: segments leaked or double-returned",
            self.steps
        );
        assert!(
            rented == 0 || returned == 0,
            "step {}: a single operation both rented and returned",
            self.steps
        );
    }

    fn expect_mutation(&self, result: Result<(), StreamError>) -> bool {
        if self.frozen {
            assert!(
                matches!(result, Err(StreamError::Frozen { .. })),
                "step {}: mutation allowed while frozen",
                self.steps
            );
            false
        } else {
            result.expect("Mutation failed");
            true
        }
    }

    /// Returns the expected contents.
    pub fn model(&self) -> &[u8] {
        &self.model
    }

    /// Returns the number of operations applied.
    pub fn steps(&self) -> usize {
        self.steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators::{op_sequence_strategy, segment_size_strategy};
    use proptest::prelude::*;
    use segstream_core::{ArrayPool, BytesPool};

    #[test]
    fn harness_tracks_simple_sequence() {
        let mut harness = ModelHarness::<ArrayPool>::new(4);
        harness.run(&[
            StreamOp::Write(vec![1, 2, 3, 4, 5, 6]),
            StreamOp::Seek(3),
            StreamOp::Read(2),
            StreamOp::SetLength(2),
            StreamOp::Freeze,
            StreamOp::Write(vec![9]),
            StreamOp::Unfreeze,
            StreamOp::WriteByte(7),
        ]);
        assert_eq!(harness.model(), &[1, 2, 7]);
        assert_eq!(harness.steps(), 8);
    }

    #[test]
    fn harness_survives_segment_size_changes() {
        let mut harness = ModelHarness::<BytesPool>::new(3);
        harness.run(&[
            StreamOp::Write(vec![0xAA; 7]),
            StreamOp::SetSegmentSize(5),
            StreamOp::Write(vec![0xBB; 9]),
            StreamOp::Seek(8),
            StreamOp::Read(4),
            StreamOp::SetLength(4),
            StreamOp::SetLength(20),
            StreamOp::Seek(0),
            StreamOp::Read(20),
        ]);
        assert_eq!(harness.model().len(), 20);
        assert!(harness.model()[4..].iter().all(|&b| b == 0));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(128))]

        #[test]
        fn array_stream_matches_model(
            segment_size in segment_size_strategy(),
            ops in op_sequence_strategy(64),
        ) {
            let mut harness = ModelHarness::<ArrayPool>::new(segment_size);
            harness.run(&ops);
            let pool = Arc::clone(&harness.pool);
            drop(harness);
            prop_assert_eq!(pool.stats().outstanding(), 0);
        }

        #[test]
        fn bytes_stream_matches_model(
            segment_size in segment_size_strategy(),
            ops in op_sequence_strategy(64),
        ) {
            let mut harness = ModelHarness::<BytesPool>::new(segment_size);
            harness.run(&ops);
        }
    }
}
