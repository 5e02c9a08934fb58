//! Growing and shrinking the segment list to a target logical length.
//!
//! Both operations assume the caller has already validated the target
//! (frozen state, length cap); once started they always complete.

use crate::cursor::Cursor;
use crate::pool::SegmentPool;
use crate::segment::Segment;
use crate::store::SegmentStore;
use tracing::trace;
use zeroize::Zeroize;

impl<S: Segment> SegmentStore<S> {
    /// Extends the logical length to `new_length`.
    ///
    /// The last segment's spare room is used first; further segments of
    /// `segment_size` are rented one at a time. With `clear`, only the newly
    /// added range is zeroed.
    pub(crate) fn grow_to<P>(
        &mut self,
        pool: &P,
        segment_size: usize,
        new_length: u64,
        clear: bool,
        cursor: &mut Cursor,
    ) where
        P: SegmentPool<Segment = S>,
    {
        debug_assert!(new_length >= self.length);
        let mut needed = new_length - self.length;
        let mut rented = 0usize;

        loop {
            let last = self.segments.len() - 1;
            let capacity = self.segments[last].capacity();
            let take = needed.min((capacity - self.last_used) as u64) as usize;
            if take > 0 {
                if clear {
                    self.segments[last].as_mut_bytes()[self.last_used..self.last_used + take]
                        .zeroize();
                }
                self.last_used += take;
                needed -= take as u64;
            }
            if needed == 0 {
                break;
            }
            self.append_segment(pool, segment_size);
            rented += 1;
        }

        self.length = new_length;
        cursor.normalize(&self.layout());
        debug_assert_eq!(self.layout().recompute_length(), self.length);
        if rented > 0 {
            trace!(rented, length = new_length, "grew segment list");
        }
    }

    /// Cuts the logical length down to `new_length`.
    ///
    /// Segments past the one that now holds the final byte are returned to
    /// the pool. The cursor is clamped to the new length and then re-walked.
    pub(crate) fn shrink_to<P>(
        &mut self,
        pool: &P,
        new_length: u64,
        clear_on_return: bool,
        cursor: &mut Cursor,
    ) where
        P: SegmentPool<Segment = S>,
    {
        debug_assert!(new_length <= self.length);

        if new_length == 0 {
            self.release_tail(pool, 1, clear_on_return);
            self.last_used = 0;
            self.length = 0;
            cursor.reset();
            return;
        }

        let owner = self.layout().owner_of_end(new_length);
        self.release_tail(pool, owner.index + 1, clear_on_return);
        self.last_used = owner.offset;
        self.length = new_length;

        cursor.clamp(new_length);
        let position = cursor.position();
        cursor.seek(&self.layout(), position);
        debug_assert_eq!(self.layout().recompute_length(), self.length);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::ArrayPool;

    fn store(pool: &ArrayPool, segment_size: usize) -> SegmentStore<Vec<u8>> {
        SegmentStore::new(pool.rent(segment_size))
    }

    #[test]
    fn grow_fills_spare_then_rents() {
        let pool = ArrayPool::new();
        let mut store = store(&pool, 4);
        let mut cursor = Cursor::default();

        store.grow_to(&pool, 4, 3, false, &mut cursor);
        assert_eq!(store.segments.len(), 1);
        assert_eq!(store.last_used, 3);

        store.grow_to(&pool, 4, 9, false, &mut cursor);
        assert_eq!(store.segments.len(), 3);
        assert_eq!(store.last_used, 1);
        assert_eq!(store.length, 9);
    }

    #[test]
    fn grow_with_clear_zeroes_only_new_range() {
        let pool = ArrayPool::new();
        let mut dirty = pool.rent(4);
        dirty.copy_from_slice(&[7, 7, 7, 7]);
        pool.give_back(dirty);

        let mut store = store(&pool, 4);
        let mut cursor = Cursor::default();
        store.segments[0][0] = 1;
        store.grow_to(&pool, 4, 1, false, &mut cursor);
        store.grow_to(&pool, 4, 4, true, &mut cursor);

        assert_eq!(store.segments[0], vec![1, 0, 0, 0]);
    }

    #[test]
    fn grow_exactly_to_boundary_does_not_rent() {
        let pool = ArrayPool::new();
        let mut store = store(&pool, 4);
        let mut cursor = Cursor::default();

        store.grow_to(&pool, 4, 4, false, &mut cursor);
        assert_eq!(store.segments.len(), 1);
        assert_eq!(store.last_used, 4);
        assert_eq!(pool.stats().rents, 1);
    }

    #[test]
    fn grow_normalizes_cursor_at_full_segment_end() {
        let pool = ArrayPool::new();
        let mut store = store(&pool, 4);
        let mut cursor = Cursor::default();
        store.grow_to(&pool, 4, 4, false, &mut cursor);
        cursor.seek(&store.layout(), 4);
        assert_eq!((cursor.index(), cursor.offset()), (0, 4));

        store.grow_to(&pool, 4, 5, false, &mut cursor);
        assert_eq!((cursor.index(), cursor.offset()), (1, 0));
    }

    #[test]
    fn shrink_releases_trailing_segments_and_clamps_cursor() {
        let pool = ArrayPool::new();
        let mut store = store(&pool, 4);
        let mut cursor = Cursor::default();
        store.grow_to(&pool, 4, 10, false, &mut cursor);
        cursor.seek(&store.layout(), 9);

        store.shrink_to(&pool, 4, false, &mut cursor);
        assert_eq!(store.segments.len(), 1);
        assert_eq!(store.last_used, 4);
        assert_eq!(pool.stats().returns, 2);
        assert_eq!(cursor.position(), 4);
        assert_eq!((cursor.index(), cursor.offset()), (0, 4));
    }

    #[test]
    fn shrink_to_zero_keeps_first_segment() {
        let pool = ArrayPool::new();
        let mut store = store(&pool, 4);
        let mut cursor = Cursor::default();
        store.grow_to(&pool, 4, 12, false, &mut cursor);

        store.shrink_to(&pool, 0, false, &mut cursor);
        assert_eq!(store.segments.len(), 1);
        assert_eq!(store.length, 0);
        assert_eq!(store.last_used, 0);
        assert_eq!(cursor.position(), 0);
        assert_eq!(pool.stats().returns, 2);
    }
}
