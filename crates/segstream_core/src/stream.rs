//! The pooled segmented stream.

use crate::config::StreamConfig;
use crate::cursor::{Cursor, SegmentPosition};
use crate::error::{StreamError, StreamResult};
use crate::pool::{ArrayPool, BytesPool, SegmentPool};
use crate::segment::Segment;
use crate::store::{self, FrozenSegments, Layout, SegmentStore};
use crate::view::{build_spans, ChunkSpan, SegmentView};
use std::cell::OnceCell;
use std::io::SeekFrom;
use std::mem;
use std::sync::Arc;
use tracing::debug;

/// A stream over `Vec<u8>` segments.
pub type ArrayStream = SegmentedStream<ArrayPool>;

/// A stream over `BytesMut` segments.
pub type BytesStream = SegmentedStream<BytesPool>;

/// Which representation currently owns the segments.
#[derive(Debug)]
enum State<S> {
    Mutable(SegmentStore<S>),
    Frozen(FrozenSegments<S>),
    Closed,
}

impl<S: Segment> State<S> {
    fn layout(&self) -> StreamResult<Layout<'_, S>> {
        match self {
            State::Mutable(store) => Ok(store.layout()),
            State::Frozen(frozen) => Ok(frozen.layout()),
            State::Closed => Err(StreamError::Closed),
        }
    }

    fn mutable(&mut self, operation: &'static str) -> StreamResult<&mut SegmentStore<S>> {
        match self {
            State::Mutable(store) => Ok(store),
            State::Frozen(_) => Err(StreamError::frozen(operation)),
            State::Closed => Err(StreamError::Closed),
        }
    }
}

/// A random-access, growable byte stream built from pooled segments.
///
/// Data lives in fixed-capacity segments rented from a shared
/// [`SegmentPool`]. Every segment but the last is always full, so a logical
/// position maps to a segment with a short walk, and sequential reads and
/// writes advance the cursor incrementally.
///
/// The stream is either mutable or frozen. [`freeze`](Self::freeze) moves
/// the segment list into an immutable snapshot that can be exported as a
/// zero-copy [`SegmentView`]; [`unfreeze`](Self::unfreeze) hands the same
/// buffers back for further writes. Neither transition rents, returns or
/// copies a buffer.
///
/// # Thread Safety
///
/// A stream is `Send` but not `Sync`: it has a single owner and no internal
/// locking. Only the pool is shared.
///
/// # Example
///
/// ```rust
/// use segstream_core::ArrayStream;
/// use std::io::SeekFrom;
///
/// let mut stream = ArrayStream::builder().segment_size(4).build().unwrap();
/// stream.write(&[1, 2, 3, 4, 5, 6]).unwrap();
/// assert_eq!(stream.segment_count(), 2);
///
/// stream.seek(SeekFrom::Start(3)).unwrap();
/// let mut buf = [0u8; 2];
/// assert_eq!(stream.read(&mut buf).unwrap(), 2);
/// assert_eq!(buf, [4, 5]);
///
/// stream.set_length(2).unwrap();
/// assert_eq!(stream.to_array().unwrap(), vec![1, 2]);
/// ```
pub struct SegmentedStream<P: SegmentPool> {
    pool: Arc<P>,
    config: StreamConfig,
    state: State<P::Segment>,
    cursor: Cursor,
    view: OnceCell<Box<[ChunkSpan]>>,
    saved_data: Option<Vec<u8>>,
}

impl<P: SegmentPool + Default> SegmentedStream<P> {
    /// Creates a stream with default configuration over a private pool.
    #[must_use]
    pub fn new() -> Self {
        Self::open(Arc::default(), StreamConfig::default())
    }

    /// Starts building a stream.
    #[must_use]
    pub fn builder() -> StreamBuilder<P> {
        StreamBuilder::new()
    }
}

impl<P: SegmentPool + Default> Default for SegmentedStream<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: SegmentPool> SegmentedStream<P> {
    /// Creates a stream over a shared pool.
    ///
    /// One segment is rented immediately.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn with_pool(pool: Arc<P>, config: StreamConfig) -> StreamResult<Self> {
        config.validate()?;
        Ok(Self::open(pool, config))
    }

    fn open(pool: Arc<P>, config: StreamConfig) -> Self {
        let first = pool.rent(config.segment_size);
        debug!(segment_size = config.segment_size, "opened segmented stream");
        Self {
            pool,
            config,
            state: State::Mutable(SegmentStore::new(first)),
            cursor: Cursor::default(),
            view: OnceCell::new(),
            saved_data: None,
        }
    }

    /// Creates a stream holding a copy of `data`, positioned at the start.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or `data` exceeds
    /// the length cap.
    pub fn from_slice(pool: Arc<P>, config: StreamConfig, data: &[u8]) -> StreamResult<Self> {
        let mut stream = Self::with_pool(pool, config)?;
        stream.write(data)?;
        stream.cursor.reset();
        Ok(stream)
    }

    /// Returns the stream configuration.
    #[must_use]
    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    /// Returns the pool segments are rented from.
    #[must_use]
    pub fn pool(&self) -> &Arc<P> {
        &self.pool
    }

    /// Returns the largest logical length this stream may reach.
    #[must_use]
    pub fn max_length(&self) -> u64 {
        self.config
            .max_length
            .map_or(P::MAX_STREAM_LENGTH, |max| max.min(P::MAX_STREAM_LENGTH))
    }

    /// Returns the logical length, or 0 once closed.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.state.layout().map_or(0, |layout| layout.len())
    }

    /// Returns `true` if the stream holds no data.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the current position.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.cursor.position()
    }

    /// Moves to an absolute position.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::PositionOutOfRange`] if `position` is beyond the
    /// logical length, or [`StreamError::Closed`].
    pub fn set_position(&mut self, position: u64) -> StreamResult<()> {
        let layout = self.state.layout()?;
        if position > layout.len() {
            return Err(StreamError::PositionOutOfRange {
                position,
                length: layout.len(),
            });
        }
        self.cursor.seek(&layout, position);
        Ok(())
    }

    /// Moves relative to the start, the current position or the end.
    ///
    /// Returns the new absolute position.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::NegativePosition`] for targets before the start
    /// and [`StreamError::PositionOutOfRange`] for targets past the end.
    pub fn seek(&mut self, pos: SeekFrom) -> StreamResult<u64> {
        let length = self.state.layout()?.len();
        let target = match pos {
            SeekFrom::Start(offset) => i128::from(offset),
            SeekFrom::Current(delta) => i128::from(self.cursor.position()) + i128::from(delta),
            SeekFrom::End(delta) => i128::from(length) + i128::from(delta),
        };
        if target < 0 {
            return Err(StreamError::NegativePosition);
        }
        let position = u64::try_from(target).map_err(|_| StreamError::PositionOutOfRange {
            position: u64::MAX,
            length,
        })?;
        self.set_position(position)?;
        Ok(position)
    }

    /// Reads up to `buf.len()` bytes from the current position.
    ///
    /// Returns the number of bytes read; 0 means the end of the data.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Closed`] if the stream is closed.
    pub fn read(&mut self, buf: &mut [u8]) -> StreamResult<usize> {
        let layout = self.state.layout()?;
        Ok(layout.read_into(&mut self.cursor, buf))
    }

    /// Reads one byte, or `None` at the end of the data.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Closed`] if the stream is closed.
    pub fn read_byte(&mut self) -> StreamResult<Option<u8>> {
        let layout = self.state.layout()?;
        if self.cursor.position() >= layout.len() {
            return Ok(None);
        }
        let value = layout.byte_at(self.cursor.coordinates());
        self.cursor.advance(&layout, 1);
        Ok(Some(value))
    }

    /// Reads from an absolute offset without moving the position.
    ///
    /// Returns the number of bytes copied; 0 if `offset` is at or past the end.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Closed`] if the stream is closed.
    pub fn read_at(&self, offset: u64, buf: &mut [u8]) -> StreamResult<usize> {
        let layout = self.state.layout()?;
        if offset >= layout.len() {
            return Ok(0);
        }
        let mut cursor = Cursor::at(&layout, offset);
        Ok(layout.read_into(&mut cursor, buf))
    }

    /// Unread bytes of the current segment, borrowed in place.
    pub(crate) fn current_chunk(&self) -> StreamResult<&[u8]> {
        let layout = self.state.layout()?;
        if self.cursor.position() >= layout.len() {
            return Ok(&[]);
        }
        let at = self.cursor.coordinates();
        let used = layout.used_of(at.index);
        Ok(&layout.segment(at.index).as_bytes()[at.offset..used])
    }

    /// Advances past `amt` bytes, stopping at the end of the data.
    ///
    /// Stays inside the current segment when it can and walks the layout
    /// otherwise.
    pub(crate) fn consume_chunk(&mut self, amt: usize) {
        if let Ok(layout) = self.state.layout() {
            let remaining = layout.len() - self.cursor.position();
            let amt = (amt as u64).min(remaining);
            let at = self.cursor.coordinates();
            let in_segment = (layout.used_of(at.index) - at.offset) as u64;
            if amt <= in_segment {
                self.cursor.advance(&layout, amt as usize);
            } else {
                self.cursor.seek(&layout, self.cursor.position() + amt);
            }
        }
    }

    /// Writes all of `buf` at the current position, growing as needed.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Frozen`] while frozen,
    /// [`StreamError::CapacityExceeded`] if the write would pass the length
    /// cap, or [`StreamError::Closed`]. Nothing is written on error.
    pub fn write(&mut self, buf: &[u8]) -> StreamResult<()> {
        let max = self.max_length();
        let store = self.state.mutable("write")?;
        self.view.take();

        let end = self
            .cursor
            .position()
            .checked_add(buf.len() as u64)
            .filter(|&end| end <= max)
            .ok_or(StreamError::CapacityExceeded {
                requested: self.cursor.position().saturating_add(buf.len() as u64),
                max,
            })?;
        if buf.is_empty() {
            return Ok(());
        }

        if end > store.length {
            store.grow_to(&*self.pool, self.config.segment_size, end, false, &mut self.cursor);
        }
        store.write_from(&mut self.cursor, buf);
        Ok(())
    }

    /// Writes one byte at the current position.
    ///
    /// # Errors
    ///
    /// Same conditions as [`write`](Self::write).
    pub fn write_byte(&mut self, value: u8) -> StreamResult<()> {
        let max = self.max_length();
        let store = self.state.mutable("write")?;
        self.view.take();

        let end = self.cursor.position() + 1;
        if end > max {
            return Err(StreamError::CapacityExceeded {
                requested: end,
                max,
            });
        }
        if end > store.length {
            store.grow_to(&*self.pool, self.config.segment_size, end, false, &mut self.cursor);
        }
        store.write_byte(&mut self.cursor, value);
        Ok(())
    }

    /// Grows or truncates the logical length.
    ///
    /// Growth zero-fills the new range; truncation returns segments that no
    /// longer hold data to the pool and pulls the position back if needed.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Frozen`] while frozen,
    /// [`StreamError::CapacityExceeded`] past the length cap, or
    /// [`StreamError::Closed`].
    pub fn set_length(&mut self, length: u64) -> StreamResult<()> {
        let max = self.max_length();
        let store = self.state.mutable("set length")?;
        self.view.take();
        if length > max {
            return Err(StreamError::CapacityExceeded {
                requested: length,
                max,
            });
        }

        if length > store.length {
            store.grow_to(&*self.pool, self.config.segment_size, length, true, &mut self.cursor);
        } else if length < store.length {
            store.shrink_to(
                &*self.pool,
                length,
                self.config.clear_on_return,
                &mut self.cursor,
            );
        }
        Ok(())
    }

    /// Returns the capacity used for newly rented segments.
    #[must_use]
    pub fn segment_size(&self) -> usize {
        self.config.segment_size
    }

    /// Changes the capacity of segments rented from now on.
    ///
    /// Segments already held keep their capacity.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::InvalidSegmentSize`] for a zero size.
    pub fn set_segment_size(&mut self, size: usize) -> StreamResult<()> {
        if size == 0 {
            return Err(StreamError::InvalidSegmentSize { size });
        }
        self.config.segment_size = size;
        Ok(())
    }

    /// Publishes the current contents as an immutable snapshot.
    ///
    /// Does nothing if already frozen.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Closed`] if the stream is closed.
    pub fn freeze(&mut self) -> StreamResult<()> {
        self.state = match mem::replace(&mut self.state, State::Closed) {
            State::Mutable(store) => {
                debug!(length = store.length, "froze stream");
                State::Frozen(store.freeze())
            }
            frozen @ State::Frozen(_) => frozen,
            State::Closed => return Err(StreamError::Closed),
        };
        Ok(())
    }

    /// Takes the snapshot back for further writes.
    ///
    /// Does nothing if not frozen.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Closed`] if the stream is closed.
    pub fn unfreeze(&mut self) -> StreamResult<()> {
        self.state = match mem::replace(&mut self.state, State::Closed) {
            State::Frozen(frozen) => {
                let store = frozen.thaw();
                debug!(length = store.length, "unfroze stream");
                State::Mutable(store)
            }
            mutable @ State::Mutable(_) => mutable,
            State::Closed => return Err(StreamError::Closed),
        };
        Ok(())
    }

    /// Returns `true` while the stream is frozen.
    #[must_use]
    pub fn is_frozen(&self) -> bool {
        matches!(self.state, State::Frozen(_))
    }

    /// Returns `true` once the stream has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        matches!(self.state, State::Closed)
    }

    /// Returns a zero-copy view of the whole contents.
    ///
    /// The chunk layout is cached until the next write or resize.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Closed`] if the stream is closed.
    pub fn export_view(&self) -> StreamResult<SegmentView<'_, P::Segment>> {
        let layout = self.state.layout()?;
        let spans = self.view.get_or_init(|| build_spans(&layout));
        Ok(SegmentView::new(layout.segments(), spans, layout.len()))
    }

    /// Copies the whole contents into a new vector.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Closed`] if the stream is closed.
    pub fn to_array(&self) -> StreamResult<Vec<u8>> {
        Ok(self.export_view()?.to_vec())
    }

    /// Returns every segment to the pool.
    ///
    /// With `save_on_close`, the contents are first copied into
    /// [`saved_data`](Self::saved_data). Closing twice does nothing.
    pub fn close(&mut self) {
        if self.is_closed() {
            return;
        }
        if self.config.save_on_close {
            self.saved_data = self.to_array().ok();
        }

        let segments = match mem::replace(&mut self.state, State::Closed) {
            State::Mutable(store) => store.into_segments(),
            State::Frozen(frozen) => frozen.into_segments(),
            State::Closed => Vec::new(),
        };
        let returned = segments.len();
        for segment in segments {
            store::release(&*self.pool, segment, self.config.clear_on_return);
        }
        self.cursor.reset();
        self.view.take();
        debug!(returned, "closed segmented stream");
    }

    /// Returns the contents captured at close time, if any.
    #[must_use]
    pub fn saved_data(&self) -> Option<&[u8]> {
        self.saved_data.as_deref()
    }

    /// Takes the contents captured at close time.
    pub fn take_saved_data(&mut self) -> Option<Vec<u8>> {
        self.saved_data.take()
    }

    /// Returns the number of segments held (0 once closed).
    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.state.layout().map_or(0, |layout| layout.segment_count())
    }

    /// Returns the total capacity of all held segments.
    #[must_use]
    pub fn buffer_capacity(&self) -> u64 {
        self.state.layout().map_or(0, |layout| layout.buffer_capacity())
    }

    /// Returns the cursor's segment coordinates.
    #[must_use]
    pub fn segment_position(&self) -> SegmentPosition {
        self.cursor.coordinates()
    }

    /// Maps a logical position to segment coordinates with a full walk.
    ///
    /// Returns `None` past the end or once closed.
    #[must_use]
    pub fn locate(&self, position: u64) -> Option<SegmentPosition> {
        self.state.layout().ok()?.locate(position)
    }

    /// Verifies the internal bookkeeping.
    ///
    /// # Errors
    ///
    /// Returns a description of the first violated invariant.
    pub fn check_invariants(&self) -> Result<(), String> {
        let Ok(layout) = self.state.layout() else {
            return Ok(());
        };

        let recomputed = layout.recompute_length();
        if recomputed != layout.len() {
            return Err(format!(
                "length {} does not match segments ({recomputed})",
                layout.len()
            ));
        }
        let last = layout.segment_count() - 1;
        if layout.last_used() > layout.capacity_of(last) {
            return Err(format!(
                "last segment uses {} of {} bytes",
                layout.last_used(),
                layout.capacity_of(last)
            ));
        }
        if self.cursor.position() > layout.len() {
            return Err(format!(
                "position {} beyond length {}",
                self.cursor.position(),
                layout.len()
            ));
        }
        let walked = layout.locate(self.cursor.position());
        if walked != Some(self.cursor.coordinates()) {
            return Err(format!(
                "cursor at {:?} but position {} maps to {walked:?}",
                self.cursor.coordinates(),
                self.cursor.position()
            ));
        }
        Ok(())
    }
}

impl<P: SegmentPool> Drop for SegmentedStream<P> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<P: SegmentPool> std::fmt::Debug for SegmentedStream<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match self.state {
            State::Mutable(_) => "mutable",
            State::Frozen(_) => "frozen",
            State::Closed => "closed",
        };
        f.debug_struct("SegmentedStream")
            .field("state", &state)
            .field("length", &self.len())
            .field("position", &self.cursor.position())
            .field("segments", &self.segment_count())
            .field("config", &self.config)
            .finish()
    }
}

/// Builder for [`SegmentedStream`].
#[derive(Debug)]
pub struct StreamBuilder<P> {
    pool: Option<Arc<P>>,
    config: StreamConfig,
}

impl<P: SegmentPool + Default> StreamBuilder<P> {
    /// Creates a builder with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            pool: None,
            config: StreamConfig::default(),
        }
    }

    /// Shares an existing pool instead of creating a private one.
    #[must_use]
    pub fn pool(mut self, pool: Arc<P>) -> Self {
        self.pool = Some(pool);
        self
    }

    /// Replaces the whole configuration.
    #[must_use]
    pub fn config(mut self, config: StreamConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the segment capacity.
    #[must_use]
    pub fn segment_size(mut self, size: usize) -> Self {
        self.config.segment_size = size;
        self
    }

    /// Sets whether segments are zeroed before returning to the pool.
    #[must_use]
    pub fn clear_on_return(mut self, value: bool) -> Self {
        self.config.clear_on_return = value;
        self
    }

    /// Sets whether the contents are saved when the stream closes.
    #[must_use]
    pub fn save_on_close(mut self, value: bool) -> Self {
        self.config.save_on_close = value;
        self
    }

    /// Caps the logical length.
    #[must_use]
    pub fn max_length(mut self, max: u64) -> Self {
        self.config.max_length = Some(max);
        self
    }

    /// Builds the stream.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> StreamResult<SegmentedStream<P>> {
        let pool = self.pool.unwrap_or_default();
        SegmentedStream::with_pool(pool, self.config)
    }
}

impl<P: SegmentPool + Default> Default for StreamBuilder<P> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream(segment_size: usize) -> ArrayStream {
        ArrayStream::builder()
            .segment_size(segment_size)
            .build()
            .unwrap()
    }

    #[test]
    fn new_stream_holds_one_empty_segment() {
        let stream = stream(4);
        assert_eq!(stream.len(), 0);
        assert_eq!(stream.segment_count(), 1);
        assert_eq!(stream.position(), 0);
        assert_eq!(stream.pool().stats().rents, 1);
    }

    #[test]
    fn zero_segment_size_is_rejected() {
        let result = ArrayStream::builder().segment_size(0).build();
        assert!(matches!(
            result,
            Err(StreamError::InvalidSegmentSize { size: 0 })
        ));
    }

    #[test]
    fn write_then_read_across_segments() {
        let mut stream = stream(4);
        stream.write(&[1, 2, 3, 4, 5, 6]).unwrap();
        assert_eq!(stream.len(), 6);
        assert_eq!(stream.segment_count(), 2);
        assert_eq!(stream.position(), 6);

        stream.set_position(0).unwrap();
        let mut buf = [0u8; 10];
        assert_eq!(stream.read(&mut buf).unwrap(), 6);
        assert_eq!(&buf[..6], &[1, 2, 3, 4, 5, 6]);
        assert_eq!(stream.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn overwrite_in_middle_keeps_length() {
        let mut stream = stream(4);
        stream.write(b"abcdefgh").unwrap();
        stream.set_position(2).unwrap();
        stream.write(b"XYZ").unwrap();

        assert_eq!(stream.len(), 8);
        assert_eq!(stream.position(), 5);
        assert_eq!(stream.to_array().unwrap(), b"abXYZfgh");
    }

    #[test]
    fn write_extending_past_end() {
        let mut stream = stream(4);
        stream.write(b"abcdef").unwrap();
        stream.set_position(5).unwrap();
        stream.write(b"123456").unwrap();

        assert_eq!(stream.len(), 11);
        assert_eq!(stream.segment_count(), 3);
        assert_eq!(stream.to_array().unwrap(), b"abcde123456");
        stream.check_invariants().unwrap();
    }

    #[test]
    fn byte_fast_paths() {
        let mut stream = stream(2);
        for b in 0..5u8 {
            stream.write_byte(b).unwrap();
            stream.check_invariants().unwrap();
        }
        assert_eq!(stream.segment_count(), 3);

        stream.set_position(0).unwrap();
        let mut read = Vec::new();
        while let Some(b) = stream.read_byte().unwrap() {
            read.push(b);
        }
        assert_eq!(read, vec![0, 1, 2, 3, 4]);
        assert_eq!(stream.read_byte().unwrap(), None);
    }

    #[test]
    fn seek_origins() {
        let mut stream = stream(4);
        stream.write(b"0123456789").unwrap();

        assert_eq!(stream.seek(SeekFrom::Start(3)).unwrap(), 3);
        assert_eq!(stream.seek(SeekFrom::Current(2)).unwrap(), 5);
        assert_eq!(stream.seek(SeekFrom::Current(-5)).unwrap(), 0);
        assert_eq!(stream.seek(SeekFrom::End(-1)).unwrap(), 9);
        assert_eq!(stream.seek(SeekFrom::End(0)).unwrap(), 10);
        assert_eq!(stream.read_byte().unwrap(), None);
    }

    #[test]
    fn seek_rejects_out_of_range_without_moving() {
        let mut stream = stream(4);
        stream.write(b"abc").unwrap();
        stream.set_position(1).unwrap();

        assert_eq!(
            stream.seek(SeekFrom::Current(-2)),
            Err(StreamError::NegativePosition)
        );
        assert_eq!(
            stream.seek(SeekFrom::End(1)),
            Err(StreamError::PositionOutOfRange {
                position: 4,
                length: 3
            })
        );
        assert_eq!(stream.position(), 1);
    }

    #[test]
    fn read_at_does_not_move_cursor() {
        let mut stream = stream(3);
        stream.write(b"hello world").unwrap();
        stream.set_position(2).unwrap();

        let mut buf = [0u8; 5];
        assert_eq!(stream.read_at(6, &mut buf).unwrap(), 5);
        assert_eq!(&buf, b"world");
        assert_eq!(stream.read_at(11, &mut buf).unwrap(), 0);
        assert_eq!(stream.position(), 2);
    }

    #[test]
    fn set_length_grows_with_zeroes() {
        let mut stream = stream(4);
        stream.write(b"abcdef").unwrap();
        stream.set_length(2).unwrap();
        stream.set_length(7).unwrap();

        assert_eq!(stream.to_array().unwrap(), b"ab\0\0\0\0\0");
        assert_eq!(stream.position(), 2);
        stream.check_invariants().unwrap();
    }

    #[test]
    fn capacity_cap_rejects_before_mutation() {
        let mut stream = ArrayStream::builder()
            .segment_size(4)
            .max_length(6)
            .build()
            .unwrap();
        stream.write(b"abcd").unwrap();

        let err = stream.write(b"xyz").unwrap_err();
        assert_eq!(
            err,
            StreamError::CapacityExceeded {
                requested: 7,
                max: 6
            }
        );
        assert!(!err.is_usage_fault());
        assert_eq!(stream.len(), 4);
        assert_eq!(stream.segment_count(), 1);
        assert!(stream.set_length(7).is_err());
        assert!(stream.write(b"xy").is_ok());
    }

    #[test]
    fn frozen_stream_rejects_writes_and_keeps_reads() {
        let mut stream = stream(4);
        stream.write(b"abcdef").unwrap();
        stream.freeze().unwrap();
        assert!(stream.is_frozen());

        assert_eq!(stream.write(b"x"), Err(StreamError::frozen("write")));
        assert_eq!(stream.write_byte(1), Err(StreamError::frozen("write")));
        assert_eq!(
            stream.set_length(1),
            Err(StreamError::frozen("set length"))
        );
        assert_eq!(stream.to_array().unwrap(), b"abcdef");

        stream.set_position(4).unwrap();
        let mut buf = [0u8; 2];
        assert_eq!(stream.read(&mut buf).unwrap(), 2);
        assert_eq!(&buf, b"ef");
    }

    #[test]
    fn freeze_transitions_are_idempotent_and_free() {
        let mut stream = stream(4);
        stream.write(b"abcdefghij").unwrap();
        let before = stream.pool().stats();

        stream.freeze().unwrap();
        stream.freeze().unwrap();
        stream.unfreeze().unwrap();
        stream.unfreeze().unwrap();

        assert!(!stream.is_frozen());
        assert_eq!(stream.pool().stats(), before);
        stream.write(b"k").unwrap();
        assert_eq!(stream.to_array().unwrap(), b"abcdefghijk");
    }

    #[test]
    fn export_view_is_cached_until_write() {
        let mut stream = stream(4);
        stream.write(b"abcdef").unwrap();

        let first = stream.export_view().unwrap().chunks().next().unwrap().as_ptr();
        let again = stream.export_view().unwrap().chunks().next().unwrap().as_ptr();
        assert_eq!(first, again);

        stream.write(b"gh").unwrap();
        let view = stream.export_view().unwrap();
        assert_eq!(view.len(), 8);
        assert!(view == b"abcdefgh"[..]);
    }

    #[test]
    fn changing_segment_size_affects_only_new_segments() {
        let mut stream = stream(4);
        stream.write(b"abcdef").unwrap();
        stream.set_segment_size(8).unwrap();
        stream.write(b"ghijklmnop").unwrap();

        assert_eq!(stream.segment_count(), 3);
        assert_eq!(stream.buffer_capacity(), 4 + 4 + 8);
        assert_eq!(stream.to_array().unwrap(), b"abcdefghijklmnop");
        stream.check_invariants().unwrap();

        stream.set_position(9).unwrap();
        assert_eq!(stream.segment_position(), SegmentPosition::new(2, 1));
        assert!(stream.set_segment_size(0).is_err());
    }

    #[test]
    fn close_returns_every_segment_once() {
        let pool = Arc::new(ArrayPool::new());
        let mut stream = ArrayStream::builder()
            .pool(Arc::clone(&pool))
            .segment_size(4)
            .build()
            .unwrap();
        stream.write(&[7u8; 10]).unwrap();
        stream.freeze().unwrap();

        stream.close();
        stream.close();
        assert!(stream.is_closed());
        assert_eq!(pool.stats().returns, 3);
        assert_eq!(stream.len(), 0);
        assert_eq!(stream.read(&mut [0u8; 1]), Err(StreamError::Closed));
        assert_eq!(stream.write(b"x"), Err(StreamError::Closed));
        assert_eq!(stream.freeze(), Err(StreamError::Closed));

        drop(stream);
        assert_eq!(pool.stats().returns, 3);
    }

    #[test]
    fn save_on_close_captures_contents() {
        let mut stream = ArrayStream::builder()
            .segment_size(4)
            .save_on_close(true)
            .build()
            .unwrap();
        stream.write(b"persist me").unwrap();
        assert!(stream.saved_data().is_none());

        stream.close();
        assert_eq!(stream.saved_data(), Some(&b"persist me"[..]));
        assert_eq!(stream.take_saved_data(), Some(b"persist me".to_vec()));
    }

    #[test]
    fn clear_on_return_zeroes_released_segments() {
        let pool = Arc::new(ArrayPool::new());
        let mut stream = ArrayStream::builder()
            .pool(Arc::clone(&pool))
            .segment_size(4)
            .clear_on_return(true)
            .build()
            .unwrap();
        stream.write(b"secretsecret").unwrap();
        stream.set_length(4).unwrap();
        drop(stream);

        for _ in 0..3 {
            assert_eq!(pool.rent(4), vec![0, 0, 0, 0]);
        }
    }

    #[test]
    fn from_slice_starts_at_zero() {
        let pool = Arc::new(BytesPool::new());
        let config = StreamConfig::new().segment_size(3);
        let stream = BytesStream::from_slice(pool, config, b"abcdefg").unwrap();
        assert_eq!(stream.position(), 0);
        assert_eq!(stream.len(), 7);
        assert_eq!(stream.segment_count(), 3);
        stream.check_invariants().unwrap();
    }

    #[test]
    fn debug_output_names_state() {
        let mut stream = stream(4);
        stream.freeze().unwrap();
        let text = format!("{stream:?}");
        assert!(text.contains("frozen"));
    }

    #[test]
    fn view_cache_follows_mutability() {
        let mut stream = ArrayStream::builder()
            .segment_size(4)
            .max_length(8)
            .build()
            .unwrap();
        stream.write(b"abcdef").unwrap();

        stream.export_view().unwrap();
        assert!(stream.view.get().is_some());
        assert!(stream.set_length(9).is_err());
        assert!(stream.view.get().is_none());

        stream.export_view().unwrap();
        stream.set_length(6).unwrap();
        assert!(stream.view.get().is_none());

        stream.export_view().unwrap();
        assert!(stream.write(b"0123456789").is_err());
        assert!(stream.view.get().is_none());

        stream.freeze().unwrap();
        stream.export_view().unwrap();
        assert!(stream.write(b"x").is_err());
        assert!(stream.set_length(1).is_err());
        assert!(stream.view.get().is_some());
        assert_eq!(stream.to_array().unwrap(), b"abcdef");
    }
}
