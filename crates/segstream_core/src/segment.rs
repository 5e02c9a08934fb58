//! The capability every pooled segment buffer provides.

use bytes::BytesMut;

/// A fixed-capacity byte buffer rented from a pool.
///
/// A segment's capacity never changes while a stream holds it. The stream
/// only tracks how much of the *last* segment is in use; every other segment
/// is always full.
///
/// # Implementors
///
/// - `Vec<u8>` - raw array segments, rented from [`crate::ArrayPool`]
/// - [`BytesMut`] - opaque memory owners, rented from [`crate::BytesPool`]
pub trait Segment: Send + Unpin + 'static {
    /// Returns the number of bytes the segment can hold.
    fn capacity(&self) -> usize;

    /// Returns the whole segment as a read-only slice of `capacity()` bytes.
    fn as_bytes(&self) -> &[u8];

    /// Returns the whole segment as a mutable slice of `capacity()` bytes.
    fn as_mut_bytes(&mut self) -> &mut [u8];
}

impl Segment for Vec<u8> {
    #[inline]
    fn capacity(&self) -> usize {
        self.len()
    }

    #[inline]
    fn as_bytes(&self) -> &[u8] {
        self
    }

    #[inline]
    fn as_mut_bytes(&mut self) -> &mut [u8] {
        self
    }
}

impl Segment for BytesMut {
    #[inline]
    fn capacity(&self) -> usize {
        self.len()
    }

    #[inline]
    fn as_bytes(&self) -> &[u8] {
        self
    }

    #[inline]
    fn as_mut_bytes(&mut self) -> &mut [u8] {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_unpin<T: Unpin>() {}

    #[test]
    fn streams_are_unpin_for_every_segment_type() {
        assert_unpin::<crate::ArrayStream>();
        assert_unpin::<crate::BytesStream>();
    }

    #[test]
    fn vec_segment_capacity_is_its_length() {
        let mut seg = vec![0u8; 8];
        assert_eq!(Segment::capacity(&seg), 8);
        seg.as_mut_bytes()[7] = 9;
        assert_eq!(seg.as_bytes()[7], 9);
    }

    #[test]
    fn bytes_segment_capacity_is_its_length() {
        let mut seg = BytesMut::zeroed(4);
        assert_eq!(Segment::capacity(&seg), 4);
        seg.as_mut_bytes().copy_from_slice(b"abcd");
        assert_eq!(seg.as_bytes(), b"abcd");
    }
}
