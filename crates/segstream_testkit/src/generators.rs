//! Property-based test generators using proptest.
//!
//! Provides strategies for generating stream operation sequences that stay
//! within a small working range, so segment boundaries are hit often.

use proptest::prelude::*;

/// A single operation against a stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamOp {
    /// Write bytes at the cursor.
    Write(Vec<u8>),
    /// Write one byte at the cursor.
    WriteByte(u8),
    /// Read up to this many bytes.
    Read(usize),
    /// Read one byte.
    ReadByte,
    /// Move the cursor to an absolute position.
    Seek(u64),
    /// Grow or shrink the stream.
    SetLength(u64),
    /// Change the capacity of newly rented segments.
    SetSegmentSize(usize),
    /// Enter the frozen state.
    Freeze,
    /// Leave the frozen state.
    Unfreeze,
}

/// Strategy for generating segment capacities.
pub fn segment_size_strategy() -> impl Strategy<Value = usize> {
    prop_oneof![
        3 => 1usize..=8,
        1 => Just(16usize),
        1 => Just(64usize),
    ]
}

/// Strategy for generating write payloads.
pub fn payload_strategy(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=max_len)
}

/// Strategy for generating a single operation.
///
/// Positions and lengths are drawn from `0..=max_len`; seeks past the
/// current end are expected to be rejected.
pub fn stream_op_strategy(max_len: u64) -> impl Strategy<Value = StreamOp> {
    let payload = (max_len / 2).max(1) as usize;
    prop_oneof![
        6 => payload_strategy(payload).prop_map(StreamOp::Write),
        2 => any::<u8>().prop_map(StreamOp::WriteByte),
        3 => (0..=payload).prop_map(StreamOp::Read),
        1 => Just(StreamOp::ReadByte),
        3 => (0..=max_len).prop_map(StreamOp::Seek),
        3 => (0..=max_len).prop_map(StreamOp::SetLength),
        1 => (1usize..=16).prop_map(StreamOp::SetSegmentSize),
        1 => Just(StreamOp::Freeze),
        1 => Just(StreamOp::Unfreeze),
    ]
}

/// Strategy for generating operation sequences.
pub fn op_sequence_strategy(max_ops: usize) -> impl Strategy<Value = Vec<StreamOp>> {
    prop::collection::vec(stream_op_strategy(96), 1..=max_ops)
}
