//! CLI command implementations.

pub mod bench;
pub mod inspect;
pub mod verify;

use segstream_core::{SegmentPool, SegmentedStream, StreamConfig};
use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Errors raised by the CLI itself.
#[derive(Debug, Error)]
pub enum CliError {
    /// The `--pool` value names no known pool.
    #[error("unknown pool '{0}' (expected 'array' or 'bytes')")]
    UnknownPool(String),

    /// A verification step produced the wrong result.
    #[error("verification failed: {failed} of {checked} checks")]
    VerificationFailed {
        /// Failed checks.
        failed: usize,
        /// Checks run.
        checked: usize,
    },
}

/// Which buffer pool backs the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolKind {
    /// `Vec<u8>` segments.
    Array,
    /// `BytesMut` segments.
    Bytes,
}

impl PoolKind {
    /// Returns the name used on the command line.
    pub fn name(self) -> &'static str {
        match self {
            Self::Array => "array",
            Self::Bytes => "bytes",
        }
    }
}

impl FromStr for PoolKind {
    type Err = CliError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "array" => Ok(Self::Array),
            "bytes" => Ok(Self::Bytes),
            _ => Err(CliError::UnknownPool(s.to_string())),
        }
    }
}

/// Copies a file into a new stream on a fresh pool.
///
/// The cursor is left at the end of the data.
pub(crate) fn load_file<P: SegmentPool + Default>(
    path: &Path,
    segment_size: usize,
) -> Result<(Arc<P>, SegmentedStream<P>), Box<dyn std::error::Error>> {
    let pool = Arc::new(P::default());
    let mut stream =
        SegmentedStream::with_pool(Arc::clone(&pool), StreamConfig::new().segment_size(segment_size))?;

    let mut reader = BufReader::new(File::open(path)?);
    let copied = io::copy(&mut reader, &mut stream)?;
    debug!(path = %path.display(), copied, "loaded file into stream");

    Ok((pool, stream))
}

pub(crate) fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{}", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.1} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}
