//! segstream CLI
//!
//! Command-line tools for loading data into segmented streams and checking
//! how they behave.
//!
//! # Commands
//!
//! - `inspect` - Load a file and report segment layout and pool statistics
//! - `verify` - Load a file and run it through freeze, export and truncate
//! - `bench` - Time a write/read loop over synthetic data

mod commands;

use clap::{Parser, Subcommand};
use commands::PoolKind;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Segmented stream command-line tools.
#[derive(Parser)]
#[command(name = "segstream")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the input file
    #[arg(global = true, short, long)]
    path: Option<PathBuf>,

    /// Segment capacity in bytes
    #[arg(global = true, long, default_value_t = segstream_core::DEFAULT_SEGMENT_SIZE)]
    segment_size: usize,

    /// Buffer pool (array, bytes)
    #[arg(global = true, long, default_value = "array")]
    pool: String,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a file and report segment layout and pool statistics
    Inspect {
        /// List every segment
        #[arg(short, long)]
        segments: bool,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Load a file and check freeze, export, truncate and unfreeze
    Verify {
        /// Length to truncate to (defaults to half the file)
        #[arg(short, long)]
        truncate: Option<u64>,
    },

    /// Time a write/read loop over synthetic data
    Bench {
        /// Bytes written per iteration
        #[arg(short, long, default_value = "1048576")]
        bytes: usize,

        /// Number of iterations
        #[arg(short, long, default_value = "16")]
        iterations: usize,

        /// Size of each write call
        #[arg(short, long, default_value = "512")]
        chunk: usize,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let pool: PoolKind = cli.pool.parse()?;

    match cli.command {
        Commands::Inspect { segments, format } => {
            let path = cli.path.ok_or("Input path required for inspect")?;
            commands::inspect::run(&path, pool, cli.segment_size, segments, &format)?;
        }
        Commands::Verify { truncate } => {
            let path = cli.path.ok_or("Input path required for verify")?;
            commands::verify::run(&path, pool, cli.segment_size, truncate)?;
        }
        Commands::Bench {
            bytes,
            iterations,
            chunk,
        } => {
            commands::bench::run(pool, cli.segment_size, bytes, iterations, chunk)?;
        }
        Commands::Version => {
            println!("segstream CLI v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
