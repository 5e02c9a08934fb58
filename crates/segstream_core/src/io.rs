//! `std::io` trait implementations.
//!
//! Each call maps onto the stream's own operations; errors convert into
//! [`io::Error`] through `From<StreamError>`.

use crate::pool::SegmentPool;
use crate::stream::SegmentedStream;
use std::io::{self, BufRead, Read, Seek, SeekFrom, Write};

impl<P: SegmentPool> Read for SegmentedStream<P> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(SegmentedStream::read(self, buf)?)
    }
}

impl<P: SegmentPool> BufRead for SegmentedStream<P> {
    /// Returns the unread part of the current segment without copying.
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        Ok(self.current_chunk()?)
    }

    fn consume(&mut self, amt: usize) {
        self.consume_chunk(amt);
    }
}

impl<P: SegmentPool> Write for SegmentedStream<P> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        SegmentedStream::write(self, buf)?;
        Ok(buf.len())
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        Ok(SegmentedStream::write(self, buf)?)
    }

    fn flush(&mut self) -> io::Result<()> {
        // Writes land in the segments immediately
        Ok(())
    }
}

impl<P: SegmentPool> Seek for SegmentedStream<P> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        Ok(SegmentedStream::seek(self, pos)?)
    }

    fn stream_position(&mut self) -> io::Result<u64> {
        Ok(self.position())
    }
}
