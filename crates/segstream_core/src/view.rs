//! Zero-copy views over a stream's segments.

use crate::segment::Segment;
use crate::store::Layout;
use bytes::{Buf, Bytes};
use std::fmt;

/// One contiguous run of valid bytes: a prefix of a single segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ChunkSpan {
    segment: usize,
    len: usize,
}

/// Builds the spans covering `[0, length)` of a layout.
pub(crate) fn build_spans<S: Segment>(layout: &Layout<'_, S>) -> Box<[ChunkSpan]> {
    (0..layout.segment_count())
        .map(|segment| ChunkSpan {
            segment,
            len: layout.used_of(segment),
        })
        .filter(|span| span.len > 0)
        .collect()
}

/// A read-only, contiguous logical view of a stream's data.
///
/// The view borrows the stream's segments directly; nothing is copied until
/// [`SegmentView::to_vec`] or [`SegmentView::to_bytes`] is called. Because it
/// borrows the stream, no write can happen while a view is alive.
///
/// # Example
///
/// ```rust
/// use segstream_core::ArrayStream;
///
/// let mut stream = ArrayStream::builder().segment_size(4).build().unwrap();
/// stream.write(b"hello world").unwrap();
/// stream.freeze().unwrap();
///
/// let view = stream.export_view().unwrap();
/// assert_eq!(view.len(), 11);
/// assert_eq!(view.chunks().count(), 3);
/// assert_eq!(view.to_vec(), b"hello world");
/// ```
pub struct SegmentView<'a, S> {
    segments: &'a [S],
    spans: &'a [ChunkSpan],
    len: u64,
}

impl<S> Clone for SegmentView<'_, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S> Copy for SegmentView<'_, S> {}

impl<'a, S: Segment> SegmentView<'a, S> {
    pub(crate) fn new(segments: &'a [S], spans: &'a [ChunkSpan], len: u64) -> Self {
        debug_assert_eq!(spans.iter().map(|s| s.len as u64).sum::<u64>(), len);
        Self {
            segments,
            spans,
            len,
        }
    }

    /// Returns the number of bytes in the view.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Returns `true` if the view holds no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Iterates over the contiguous slices making up the view, in order.
    pub fn chunks(&self) -> impl Iterator<Item = &'a [u8]> + 'a {
        let segments = self.segments;
        let spans = self.spans;
        spans
            .iter()
            .map(move |span| &segments[span.segment].as_bytes()[..span.len])
    }

    /// Returns the byte at `position`, or `None` past the end.
    #[must_use]
    pub fn get(&self, position: u64) -> Option<u8> {
        let mut before = 0u64;
        for chunk in self.chunks() {
            let end = before + chunk.len() as u64;
            if position < end {
                return Some(chunk[(position - before) as usize]);
            }
            before = end;
        }
        None
    }

    /// Copies bytes starting at `offset` into `dst`.
    ///
    /// Returns the number of bytes copied, which is short only when the view
    /// ends first.
    pub fn copy_to_slice(&self, offset: u64, dst: &mut [u8]) -> usize {
        let mut copied = 0;
        let mut before = 0u64;
        for chunk in self.chunks() {
            if copied == dst.len() {
                break;
            }
            let end = before + chunk.len() as u64;
            let start = offset + copied as u64;
            if start < end {
                let from = (start - before) as usize;
                let n = (chunk.len() - from).min(dst.len() - copied);
                dst[copied..copied + n].copy_from_slice(&chunk[from..from + n]);
                copied += n;
            }
            before = end;
        }
        copied
    }

    /// Copies the view into one contiguous vector.
    #[must_use]
    pub fn to_vec(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.len as usize);
        for chunk in self.chunks() {
            out.extend_from_slice(chunk);
        }
        out
    }

    /// Copies the view into a [`Bytes`] buffer.
    #[must_use]
    pub fn to_bytes(&self) -> Bytes {
        Bytes::from(self.to_vec())
    }

    /// Returns a [`Buf`] that walks the view chunk by chunk without copying.
    #[must_use]
    pub fn reader(&self) -> ViewReader<'a> {
        ViewReader {
            chunks: self.chunks().collect(),
            index: 0,
            offset: 0,
            remaining: self.len as usize,
        }
    }
}

impl<S: Segment> PartialEq<[u8]> for SegmentView<'_, S> {
    fn eq(&self, other: &[u8]) -> bool {
        if self.len != other.len() as u64 {
            return false;
        }
        let mut rest = other;
        for chunk in self.chunks() {
            let (head, tail) = rest.split_at(chunk.len());
            if head != chunk {
                return false;
            }
            rest = tail;
        }
        true
    }
}

impl<S: Segment> fmt::Debug for SegmentView<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SegmentView")
            .field("len", &self.len)
            .field("chunks", &self.spans.len())
            .finish()
    }
}

/// A multi-chunk [`Buf`] over a [`SegmentView`].
#[derive(Debug, Clone)]
pub struct ViewReader<'a> {
    chunks: Vec<&'a [u8]>,
    index: usize,
    offset: usize,
    remaining: usize,
}

impl Buf for ViewReader<'_> {
    fn remaining(&self) -> usize {
        self.remaining
    }

    fn chunk(&self) -> &[u8] {
        match self.chunks.get(self.index) {
            Some(chunk) => &chunk[self.offset..],
            None => &[],
        }
    }

    fn advance(&mut self, mut cnt: usize) {
        assert!(
            cnt <= self.remaining,
            "advance past end: {cnt} > {}",
            self.remaining
        );
        self.remaining -= cnt;
        while cnt > 0 {
            let left = self.chunks[self.index].len() - self.offset;
            if cnt < left {
                self.offset += cnt;
                return;
            }
            cnt -= left;
            self.index += 1;
            self.offset = 0;
        }
    }
}
