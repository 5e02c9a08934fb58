//! Error types for stream operations.

use std::io;
use thiserror::Error;

/// Result type for stream operations.
pub type StreamResult<T> = Result<T, StreamError>;

/// Errors that can occur during stream operations.
///
/// Every error is reported before the stream is mutated: an operation that
/// returns `Err` leaves length, position and segments exactly as they were.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StreamError {
    /// A mutating operation was attempted while the stream is frozen.
    #[error("stream is frozen: cannot {operation}")]
    Frozen {
        /// The rejected operation.
        operation: &'static str,
    },

    /// The stream has been closed and its segments returned to the pool.
    #[error("stream is closed")]
    Closed,

    /// A position beyond the logical length was requested.
    #[error("position {position} is beyond the stream length {length}")]
    PositionOutOfRange {
        /// The requested position.
        position: u64,
        /// The current logical length.
        length: u64,
    },

    /// A relative seek resolved to a position before the start of the stream.
    #[error("seek to a negative position")]
    NegativePosition,

    /// The configured segment size is not usable.
    #[error("invalid segment size: {size}")]
    InvalidSegmentSize {
        /// The rejected size.
        size: usize,
    },

    /// The logical length would exceed what the backing pool can represent.
    #[error("capacity exceeded: requested length {requested}, maximum {max}")]
    CapacityExceeded {
        /// The length the operation would have produced.
        requested: u64,
        /// The largest length the stream may hold.
        max: u64,
    },
}

impl StreamError {
    /// Creates a frozen-state fault for the named operation.
    pub fn frozen(operation: &'static str) -> Self {
        Self::Frozen { operation }
    }

    /// Returns `true` if the error is a caller contract violation rather than
    /// exhaustion of accumulated capacity.
    #[must_use]
    pub fn is_usage_fault(&self) -> bool {
        !matches!(self, Self::CapacityExceeded { .. })
    }
}

impl From<StreamError> for io::Error {
    fn from(err: StreamError) -> Self {
        let kind = match &err {
            StreamError::Frozen { .. } => io::ErrorKind::PermissionDenied,
            StreamError::Closed => io::ErrorKind::NotConnected,
            StreamError::CapacityExceeded { .. } => io::ErrorKind::OutOfMemory,
            StreamError::PositionOutOfRange { .. }
            | StreamError::NegativePosition
            | StreamError::InvalidSegmentSize { .. } => io::ErrorKind::InvalidInput,
        };
        io::Error::new(kind, err)
    }
}
