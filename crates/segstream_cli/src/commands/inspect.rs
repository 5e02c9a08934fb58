//! Inspect command implementation.

use super::{format_size, load_file, PoolKind};
use segstream_core::{ArrayPool, BytesPool, PoolStats, SegmentPool};
use serde::Serialize;
use std::path::Path;

/// Stream inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Input path.
    pub path: String,
    /// Pool backing the stream.
    pub pool: &'static str,
    /// Logical length in bytes.
    pub length: u64,
    /// Capacity of newly rented segments.
    pub segment_size: usize,
    /// Number of segments held.
    pub segment_count: usize,
    /// Total capacity of held segments.
    pub buffer_capacity: u64,
    /// Capacity held beyond the logical length.
    pub slack: u64,
    /// Largest length this pool's streams accept.
    pub max_length: u64,
    /// Pool counters after loading.
    pub pool_stats: PoolSummary,
    /// Per-segment detail (if requested).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segments: Option<Vec<SegmentStats>>,
}

/// Serializable copy of [`PoolStats`].
#[derive(Debug, Serialize)]
pub struct PoolSummary {
    /// Buffers handed out.
    pub rents: u64,
    /// Rents served from the free list.
    pub hits: u64,
    /// Rents that allocated.
    pub misses: u64,
    /// Buffers given back.
    pub returns: u64,
    /// Returned buffers discarded.
    pub drops: u64,
    /// Buffers still rented.
    pub outstanding: u64,
    /// Fraction of rents served from the free list.
    pub hit_rate: f64,
}

impl From<PoolStats> for PoolSummary {
    fn from(stats: PoolStats) -> Self {
        Self {
            rents: stats.rents,
            hits: stats.hits,
            misses: stats.misses,
            returns: stats.returns,
            drops: stats.drops,
            outstanding: stats.outstanding(),
            hit_rate: stats.hit_rate(),
        }
    }
}

/// Statistics for a single segment.
#[derive(Debug, Serialize)]
pub struct SegmentStats {
    /// Segment index.
    pub index: usize,
    /// Logical offset of the segment's first byte.
    pub start: u64,
    /// Bytes of data held.
    pub used: usize,
}

/// Runs the inspect command.
pub fn run(
    path: &Path,
    pool: PoolKind,
    segment_size: usize,
    show_segments: bool,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    if !path.exists() {
        return Err(format!("No file found at {:?}", path).into());
    }

    let result = match pool {
        PoolKind::Array => inspect::<ArrayPool>(path, pool, segment_size, show_segments)?,
        PoolKind::Bytes => inspect::<BytesPool>(path, pool, segment_size, show_segments)?,
    };

    // Output
    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            print_text_output(&result);
        }
    }

    Ok(())
}

fn inspect<P: SegmentPool + Default>(
    path: &Path,
    kind: PoolKind,
    segment_size: usize,
    show_segments: bool,
) -> Result<InspectResult, Box<dyn std::error::Error>> {
    let (pool, stream) = load_file::<P>(path, segment_size)?;
    stream.check_invariants()?;

    let segments = if show_segments {
        let view = stream.export_view()?;
        let mut start = 0u64;
        let stats = view
            .chunks()
            .enumerate()
            .map(|(index, chunk)| {
                let entry = SegmentStats {
                    index,
                    start,
                    used: chunk.len(),
                };
                start += chunk.len() as u64;
                entry
            })
            .collect::<Vec<_>>();
        Some(stats)
    } else {
        None
    };

    Ok(InspectResult {
        path: path.display().to_string(),
        pool: kind.name(),
        length: stream.len(),
        segment_size: stream.segment_size(),
        segment_count: stream.segment_count(),
        buffer_capacity: stream.buffer_capacity(),
        slack: stream.buffer_capacity() - stream.len(),
        max_length: stream.max_length(),
        pool_stats: pool.stats().into(),
        segments,
    })
}

fn print_text_output(result: &InspectResult) {
    println!("Segmented Stream Inspection");
    println!("===========================");
    println!();
    println!("Path: {}", result.path);
    println!("Pool: {}", result.pool);
    println!();
    println!("Layout:");
    println!("  Length:        {} bytes", format_size(result.length));
    println!("  Segment size:  {} bytes", format_size(result.segment_size as u64));
    println!("  Segments:      {}", result.segment_count);
    println!(
        "  Capacity:      {} bytes",
        format_size(result.buffer_capacity)
    );
    println!("  Slack:         {} bytes", format_size(result.slack));
    println!();
    println!("Pool:");
    println!("  Rents:       {}", result.pool_stats.rents);
    println!("  Hits:        {}", result.pool_stats.hits);
    println!("  Misses:      {}", result.pool_stats.misses);
    println!("  Returns:     {}", result.pool_stats.returns);
    println!("  Outstanding: {}", result.pool_stats.outstanding);
    println!("  Hit rate:    {:.1}%", result.pool_stats.hit_rate * 100.0);

    if let Some(segments) = &result.segments {
        println!();
        println!("Segments:");
        for segment in segments {
            println!(
                "  [{}] @{} {} bytes",
                segment.index, segment.start, segment.used
            );
        }
    }
}
