//! Segment list ownership and raw byte access.
//!
//! A [`SegmentStore`] owns the mutable list; freezing moves the same
//! segments into a [`FrozenSegments`] snapshot and thawing moves them back.
//! Both hand out a [`Layout`], the read-only view every read, seek and
//! export goes through.

use crate::cursor::{Cursor, SegmentPosition};
use crate::pool::SegmentPool;
use crate::segment::Segment;
use tracing::trace;
use zeroize::Zeroize;

/// Read-only description of a segment list and its logical length.
pub(crate) struct Layout<'a, S> {
    segments: &'a [S],
    last_used: usize,
    length: u64,
}

impl<S> Clone for Layout<'_, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S> Copy for Layout<'_, S> {}

impl<'a, S: Segment> Layout<'a, S> {
    pub(crate) fn new(segments: &'a [S], last_used: usize, length: u64) -> Self {
        debug_assert!(!segments.is_empty(), "layout without segments");
        Self {
            segments,
            last_used,
            length,
        }
    }

    #[inline]
    pub(crate) fn segments(&self) -> &'a [S] {
        self.segments
    }

    #[inline]
    pub(crate) fn len(&self) -> u64 {
        self.length
    }

    #[inline]
    pub(crate) fn segment_count(&self) -> usize {
        self.segments.len()
    }

    #[inline]
    pub(crate) fn last_used(&self) -> usize {
        self.last_used
    }

    /// Capacity of segment `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is outside the list; that is a cursor bug.
    #[inline]
    pub(crate) fn capacity_of(&self, index: usize) -> usize {
        self.segment(index).capacity()
    }

    /// Bytes of valid data in segment `index`.
    #[inline]
    pub(crate) fn used_of(&self, index: usize) -> usize {
        if index + 1 == self.segments.len() {
            self.last_used
        } else {
            self.capacity_of(index)
        }
    }

    #[inline]
    pub(crate) fn segment(&self, index: usize) -> &'a S {
        match self.segments.get(index) {
            Some(segment) => segment,
            None => panic!(
                "segment index {index} out of range ({} segments)",
                self.segments.len()
            ),
        }
    }

    pub(crate) fn byte_at(&self, at: SegmentPosition) -> u8 {
        self.segment(at.index).as_bytes()[at.offset]
    }

    /// Maps `position` to segment coordinates, or `None` past the end.
    ///
    /// A position on a segment boundary maps to the start of the next
    /// segment when one exists.
    pub(crate) fn locate(&self, position: u64) -> Option<SegmentPosition> {
        if position > self.length {
            return None;
        }
        if position == 0 {
            return Some(SegmentPosition::new(0, 0));
        }

        let mut before = 0u64;
        for (index, segment) in self.segments.iter().enumerate() {
            let end = before + segment.capacity() as u64;
            if position < end {
                return Some(SegmentPosition::new(index, (position - before) as usize));
            }
            if position == end {
                return Some(if index + 1 < self.segments.len() {
                    SegmentPosition::new(index + 1, 0)
                } else {
                    SegmentPosition::new(index, segment.capacity())
                });
            }
            before = end;
        }
        None
    }

    /// Finds the segment that holds the byte just before `length`, i.e. the
    /// segment that becomes last when the data is cut to `length`.
    pub(crate) fn owner_of_end(&self, length: u64) -> SegmentPosition {
        debug_assert!(length > 0 && length <= self.length);
        let mut before = 0u64;
        for (index, segment) in self.segments.iter().enumerate() {
            let end = before + segment.capacity() as u64;
            if length <= end {
                return SegmentPosition::new(index, (length - before) as usize);
            }
            before = end;
        }
        panic!("length {length} beyond segment list");
    }

    /// Copies bytes from the cursor into `dst`, advancing the cursor.
    ///
    /// Returns the number of bytes copied; fewer than `dst.len()` only at
    /// the end of the data.
    pub(crate) fn read_into(&self, cursor: &mut Cursor, dst: &mut [u8]) -> usize {
        let mut read = 0;
        while read < dst.len() && cursor.position() < self.length {
            let index = cursor.index();
            let offset = cursor.offset();
            let available = self.used_of(index) - offset;
            debug_assert!(available > 0, "cursor stuck at {index}:{offset}");
            let n = available.min(dst.len() - read);

            dst[read..read + n]
                .copy_from_slice(&self.segment(index).as_bytes()[offset..offset + n]);
            cursor.advance(self, n);
            read += n;
        }
        read
    }

    /// Recomputes the logical length from the segment list.
    pub(crate) fn recompute_length(&self) -> u64 {
        let full: u64 = self.segments[..self.segments.len() - 1]
            .iter()
            .map(|s| s.capacity() as u64)
            .sum();
        full + self.last_used as u64
    }

    /// Sum of all segment capacities.
    pub(crate) fn buffer_capacity(&self) -> u64 {
        self.segments.iter().map(|s| s.capacity() as u64).sum()
    }
}

/// Returns a segment to its pool, zeroing it first if requested.
pub(crate) fn release<P: SegmentPool>(pool: &P, mut segment: P::Segment, clear: bool) {
    if clear {
        segment.as_mut_bytes().zeroize();
    }
    pool.give_back(segment);
}

/// The mutable segment list.
#[derive(Debug)]
pub(crate) struct SegmentStore<S> {
    pub(crate) segments: Vec<S>,
    pub(crate) last_used: usize,
    pub(crate) length: u64,
}

impl<S: Segment> SegmentStore<S> {
    /// Creates a store holding one empty segment.
    pub(crate) fn new(first: S) -> Self {
        Self {
            segments: vec![first],
            last_used: 0,
            length: 0,
        }
    }

    pub(crate) fn layout(&self) -> Layout<'_, S> {
        Layout::new(&self.segments, self.last_used, self.length)
    }

    /// Rents one segment and appends it as the new, empty last segment.
    pub(crate) fn append_segment<P>(&mut self, pool: &P, capacity: usize)
    where
        P: SegmentPool<Segment = S>,
    {
        debug_assert_eq!(
            self.last_used,
            self.segments.last().map_or(0, Segment::capacity),
            "appending behind a partially filled segment"
        );
        self.segments.push(pool.rent(capacity));
        self.last_used = 0;
    }

    /// Returns every segment from `from` onwards to the pool.
    ///
    /// The caller fixes up `last_used` and `length` afterwards.
    pub(crate) fn release_tail<P>(&mut self, pool: &P, from: usize, clear: bool)
    where
        P: SegmentPool<Segment = S>,
    {
        assert!(from >= 1, "the first segment is never released by truncation");
        if from >= self.segments.len() {
            return;
        }
        let released = self.segments.len() - from;
        for segment in self.segments.drain(from..) {
            release(pool, segment, clear);
        }
        trace!(released, remaining = self.segments.len(), "released tail segments");
    }

    /// Copies `src` at the cursor, advancing it.
    ///
    /// The store must already be long enough to hold the bytes.
    pub(crate) fn write_from(&mut self, cursor: &mut Cursor, src: &[u8]) {
        debug_assert!(cursor.position() + src.len() as u64 <= self.length);
        let mut written = 0;
        while written < src.len() {
            cursor.normalize(&self.layout());
            let index = cursor.index();
            let offset = cursor.offset();
            let segment = &mut self.segments[index];
            let n = (segment.capacity() - offset).min(src.len() - written);

            segment.as_mut_bytes()[offset..offset + n]
                .copy_from_slice(&src[written..written + n]);
            cursor.advance(&self.layout(), n);
            written += n;
        }
    }

    /// Writes one byte at the cursor, advancing it.
    pub(crate) fn write_byte(&mut self, cursor: &mut Cursor, value: u8) {
        cursor.normalize(&self.layout());
        let at = cursor.coordinates();
        self.segments[at.index].as_mut_bytes()[at.offset] = value;
        cursor.advance(&self.layout(), 1);
    }

    /// Moves the list into an immutable snapshot.
    pub(crate) fn freeze(self) -> FrozenSegments<S> {
        FrozenSegments {
            segments: self.segments.into_boxed_slice(),
            last_used: self.last_used,
            length: self.length,
        }
    }

    pub(crate) fn into_segments(self) -> Vec<S> {
        self.segments
    }
}

/// Segments captured by a freeze.
#[derive(Debug)]
pub(crate) struct FrozenSegments<S> {
    segments: Box<[S]>,
    last_used: usize,
    length: u64,
}

impl<S: Segment> FrozenSegments<S> {
    pub(crate) fn layout(&self) -> Layout<'_, S> {
        Layout::new(&self.segments, self.last_used, self.length)
    }

    /// Hands the same segments back as a mutable list.
    pub(crate) fn thaw(self) -> SegmentStore<S> {
        SegmentStore {
            segments: self.segments.into_vec(),
            last_used: self.last_used,
            length: self.length,
        }
    }

    pub(crate) fn into_segments(self) -> Vec<S> {
        self.segments.into_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::ArrayPool;

    fn filled(caps: &[usize]) -> Vec<Vec<u8>> {
        let mut next = 0u8;
        caps.iter()
            .map(|&c| {
                (0..c)
                    .map(|_| {
                        next = next.wrapping_add(1);
                        next
                    })
                    .collect()
            })
            .collect()
    }

    #[test]
    fn used_of_distinguishes_last_segment() {
        let segs = filled(&[4, 4]);
        let layout = Layout::new(&segs, 2, 6);
        assert_eq!(layout.used_of(0), 4);
        assert_eq!(layout.used_of(1), 2);
        assert_eq!(layout.recompute_length(), 6);
        assert_eq!(layout.buffer_capacity(), 8);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn segment_index_past_end_panics() {
        let segs = filled(&[4]);
        let layout = Layout::new(&segs, 4, 4);
        let _ = layout.byte_at(SegmentPosition::new(1, 0));
    }

    #[test]
    fn owner_of_end_keeps_boundary_in_earlier_segment() {
        let segs = filled(&[4, 4, 4]);
        let layout = Layout::new(&segs, 1, 9);
        assert_eq!(layout.owner_of_end(4), SegmentPosition::new(0, 4));
        assert_eq!(layout.owner_of_end(5), SegmentPosition::new(1, 1));
        assert_eq!(layout.owner_of_end(9), SegmentPosition::new(2, 1));
    }

    #[test]
    fn read_into_crosses_segments() {
        let segs = filled(&[4, 4]);
        let layout = Layout::new(&segs, 2, 6);
        let mut cursor = Cursor::at(&layout, 3);
        let mut buf = [0u8; 8];
        let n = layout.read_into(&mut cursor, &mut buf);
        assert_eq!(n, 3);
        assert_eq!(&buf[..3], &[4, 5, 6]);
        assert_eq!(cursor.position(), 6);
    }

    #[test]
    fn release_tail_returns_each_segment_once() {
        let pool = ArrayPool::new();
        let mut store = SegmentStore::new(pool.rent(4));
        store.last_used = 4;
        store.append_segment(&pool, 4);
        store.last_used = 4;
        store.append_segment(&pool, 4);

        store.release_tail(&pool, 1, false);
        assert_eq!(store.segments.len(), 1);
        assert_eq!(pool.stats().returns, 2);
    }

    #[test]
    fn release_with_clear_zeroes_memory() {
        let pool = ArrayPool::new();
        let mut seg = pool.rent(4);
        seg.copy_from_slice(&[9, 9, 9, 9]);
        release(&pool, seg, true);

        assert_eq!(pool.rent(4), vec![0, 0, 0, 0]);
    }

    #[test]
    fn freeze_and_thaw_keep_the_same_buffers() {
        let pool = ArrayPool::new();
        let store = SegmentStore::new(pool.rent(4));
        let ptr = store.segments[0].as_ptr();

        let thawed = store.freeze().thaw();
        assert_eq!(thawed.segments[0].as_ptr(), ptr);
        assert_eq!(pool.stats().rents, 1);
    }
}
