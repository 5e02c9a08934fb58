//! Mapping between logical positions and segment coordinates.

use crate::segment::Segment;
use crate::store::Layout;

/// A location inside the segment list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SegmentPosition {
    /// Index of the segment.
    pub index: usize,
    /// Byte offset inside that segment, in `0..=capacity`.
    pub offset: usize,
}

impl SegmentPosition {
    /// Creates a segment position.
    #[must_use]
    pub const fn new(index: usize, offset: usize) -> Self {
        Self { index, offset }
    }
}

/// The stream's current position together with its segment coordinates.
///
/// # Invariants
///
/// - `position` equals the capacities of all segments before `index`
///   plus `offset`
/// - `offset` never exceeds the capacity of segment `index`
/// - `offset == capacity` only when `index` is the last segment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Cursor {
    position: u64,
    at: SegmentPosition,
}

impl Cursor {
    /// Creates a cursor at `position`, walking the layout to find it.
    pub(crate) fn at<S: Segment>(layout: &Layout<'_, S>, position: u64) -> Self {
        let mut cursor = Self::default();
        cursor.seek(layout, position);
        cursor
    }

    #[inline]
    pub(crate) fn position(&self) -> u64 {
        self.position
    }

    #[inline]
    pub(crate) fn coordinates(&self) -> SegmentPosition {
        self.at
    }

    #[inline]
    pub(crate) fn index(&self) -> usize {
        self.at.index
    }

    #[inline]
    pub(crate) fn offset(&self) -> usize {
        self.at.offset
    }

    /// Moves to an absolute position with a full walk of the layout.
    ///
    /// # Panics
    ///
    /// Panics if `position` is beyond the layout's length.
    pub(crate) fn seek<S: Segment>(&mut self, layout: &Layout<'_, S>, position: u64) {
        self.at = layout
            .locate(position)
            .unwrap_or_else(|| panic!("cursor seek to {position} past length {}", layout.len()));
        self.position = position;
    }

    /// Moves forward `n` bytes inside the current segment.
    pub(crate) fn advance<S: Segment>(&mut self, layout: &Layout<'_, S>, n: usize) {
        debug_assert!(self.at.offset + n <= layout.capacity_of(self.at.index));
        self.at.offset += n;
        self.position += n as u64;
        self.normalize(layout);
    }

    /// Steps onto the next segment if the cursor sits at the end of a full one.
    pub(crate) fn normalize<S: Segment>(&mut self, layout: &Layout<'_, S>) {
        if self.at.offset == layout.capacity_of(self.at.index)
            && self.at.index + 1 < layout.segment_count()
        {
            self.at = SegmentPosition::new(self.at.index + 1, 0);
        }
    }

    /// Pulls the position back to `limit` if it lies beyond it.
    pub(crate) fn clamp(&mut self, limit: u64) {
        if self.position > limit {
            self.position = limit;
        }
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }
}
