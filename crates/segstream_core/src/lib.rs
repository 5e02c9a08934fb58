//! # segstream
//!
//! A random-access byte stream built from fixed-size buffers rented from a
//! shared pool.
//!
//! Data is kept in an ordered list of segments. Every segment except the
//! last is full, so the stream grows by renting one more segment and shrinks
//! by handing trailing segments back, never by reallocating and copying.
//! A stream can be frozen to publish its contents as an immutable,
//! zero-copy [`SegmentView`], and unfrozen to take the same buffers back for
//! further writes.
//!
//! ## Design Principles
//!
//! - Segments come from a [`SegmentPool`] and always go back to it, exactly once
//! - The cursor is kept normalized after every operation, so sequential access
//!   never re-walks the segment list
//! - Frozen and mutable are distinct states; write paths cannot reach frozen
//!   segments
//! - Every fallible operation validates before it mutates
//!
//! ## Available Streams
//!
//! - [`ArrayStream`] - `Vec<u8>` segments from an [`ArrayPool`]
//! - [`BytesStream`] - `BytesMut` segments from a [`BytesPool`]
//!
//! ## Example
//!
//! ```rust
//! use segstream_core::{ArrayPool, ArrayStream, StreamConfig};
//! use std::sync::Arc;
//!
//! let pool = Arc::new(ArrayPool::new());
//! let mut stream = ArrayStream::with_pool(pool, StreamConfig::new().segment_size(8)).unwrap();
//! stream.write(b"hello segmented world").unwrap();
//!
//! stream.freeze().unwrap();
//! let view = stream.export_view().unwrap();
//! assert_eq!(view.to_vec(), b"hello segmented world");
//!
//! stream.unfreeze().unwrap();
//! stream.set_length(5).unwrap();
//! assert_eq!(stream.to_array().unwrap(), b"hello");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod capacity;
mod config;
mod cursor;
mod error;
mod io;
mod pool;
mod segment;
mod store;
mod stream;
mod view;

#[cfg(feature = "tokio")]
mod async_io;

pub use config::{StreamConfig, DEFAULT_SEGMENT_SIZE};
pub use cursor::SegmentPosition;
pub use error::{StreamError, StreamResult};
pub use pool::{ArrayPool, BytesPool, PoolConfig, PoolStats, SegmentPool, DEFAULT_MAX_RETAINED};
pub use segment::Segment;
pub use stream::{ArrayStream, BytesStream, SegmentedStream, StreamBuilder};
pub use view::{SegmentView, ViewReader};
