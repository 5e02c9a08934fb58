//! Fuzz testing harnesses.
//!
//! These functions take raw fuzzer input and must never panic unless the
//! stream disagrees with its reference model.

use crate::generators::StreamOp;
use crate::model::ModelHarness;
use segstream_core::{ArrayPool, ArrayStream, BytesPool};

/// Decodes operations from fuzzer input and checks them against the model.
///
/// The first byte picks the segment size and the pool.
pub fn fuzz_stream_operations(data: &[u8]) {
    let Some((&header, rest)) = data.split_first() else {
        return;
    };
    let segment_size = usize::from(header & 0x3F) + 1;
    let ops = parse_sequence(rest);

    if header & 0x40 == 0 {
        ModelHarness::<ArrayPool>::new(segment_size).run(&ops);
    } else {
        ModelHarness::<BytesPool>::new(segment_size).run(&ops);
    }
}

/// Feeds fuzzer input through the `std::io` adapters.
///
/// Any byte pattern is valid input; only the outcome is checked.
pub fn fuzz_io_roundtrip(data: &[u8]) {
    use std::io::{Read, Seek, SeekFrom, Write};

    let segment_size = data.first().map_or(1, |&b| usize::from(b % 32) + 1);
    let mut stream = ArrayStream::builder()
        .segment_size(segment_size)
        .build()
        .expect("Failed to build stream");

    Write::write_all(&mut stream, data).expect("Write failed");
    Seek::seek(&mut stream, SeekFrom::Start(0)).expect("Seek failed");
    let mut out = Vec::with_capacity(data.len());
    Read::read_to_end(&mut stream, &mut out).expect("Read failed");
    assert_eq!(out, data);
}

/// Parses operations from fuzzer input.
///
/// Each operation starts with a tag byte; truncated operations end the
/// sequence.
pub fn parse_sequence(data: &[u8]) -> Vec<StreamOp> {
    let mut ops = Vec::new();
    let mut offset = 0;

    while offset < data.len() {
        let tag = data[offset];
        offset += 1;

        let op = match tag % 9 {
            0 => {
                let Some(&len) = data.get(offset) else {
                    break;
                };
                offset += 1;
                let len = usize::from(len % 64);
                if offset + len > data.len() {
                    break;
                }
                let payload = data[offset..offset + len].to_vec();
                offset += len;
                StreamOp::Write(payload)
            }
            1 => {
                let Some(&value) = data.get(offset) else {
                    break;
                };
                offset += 1;
                StreamOp::WriteByte(value)
            }
            2 => {
                let Some(&len) = data.get(offset) else {
                    break;
                };
                offset += 1;
                StreamOp::Read(usize::from(len))
            }
            3 => StreamOp::ReadByte,
            4 => {
                let Some(&target) = data.get(offset) else {
                    break;
                };
                offset += 1;
                StreamOp::Seek(u64::from(target))
            }
            5 => {
                let Some(&length) = data.get(offset) else {
                    break;
                };
                offset += 1;
                StreamOp::SetLength(u64::from(length))
            }
            6 => {
                let Some(&size) = data.get(offset) else {
                    break;
                };
                offset += 1;
                StreamOp::SetSegmentSize(usize::from(size % 16) + 1)
            }
            7 => StreamOp::Freeze,
            _ => StreamOp::Unfreeze,
        };

        ops.push(op);
    }

    ops
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand::rngs::StdRng;

    #[test]
    fn parse_stops_at_truncated_operation() {
        let ops = parse_sequence(&[0, 3, 1, 2, 3, 1]);
        assert_eq!(ops, vec![StreamOp::Write(vec![1, 2, 3])]);
    }

    #[test]
    fn parse_decodes_every_tag() {
        let ops = parse_sequence(&[0, 0, 1, 9, 2, 4, 3, 4, 1, 5, 7, 6, 17, 7, 8]);
        assert_eq!(
            ops,
            vec![
                StreamOp::Write(vec![]),
                StreamOp::WriteByte(9),
                StreamOp::Read(4),
                StreamOp::ReadByte,
                StreamOp::Seek(1),
                StreamOp::SetLength(7),
                StreamOp::SetSegmentSize(2),
                StreamOp::Freeze,
                StreamOp::Unfreeze,
            ]
        );
    }

    #[test]
    fn fuzz_empty_input() {
        fuzz_stream_operations(&[]);
        fuzz_io_roundtrip(&[]);
    }

    #[test]
    fn fuzz_random_inputs() {
        let mut rng = StdRng::seed_from_u64(0x5e65);
        for _ in 0..200 {
            let len = rng.gen_range(0..512);
            let data: Vec<u8> = (0..len).map(|_| rng.gen()).collect();
            fuzz_stream_operations(&data);
            fuzz_io_roundtrip(&data);
        }
    }
}
