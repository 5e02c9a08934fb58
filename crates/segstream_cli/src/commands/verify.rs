//! Verify command implementation.

use super::{load_file, CliError, PoolKind};
use segstream_core::{ArrayPool, BytesPool, SegmentPool, StreamError};
use std::path::Path;
use tracing::info;

/// Verification result.
#[derive(Debug, Default)]
pub struct VerifyResult {
    /// Number of checks run.
    pub checks_run: usize,
    /// Description of every failed check.
    pub errors: Vec<String>,
}

impl VerifyResult {
    fn check(&mut self, name: &str, passed: bool) {
        self.checks_run += 1;
        if passed {
            println!("  ✓ {}", name);
        } else {
            println!("  ✗ {}", name);
            self.errors.push(name.to_string());
        }
    }

    fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Runs the verify command.
pub fn run(
    path: &Path,
    pool: PoolKind,
    segment_size: usize,
    truncate: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("Verifying {:?} on the {} pool", path, pool.name());
    println!();

    let expected = std::fs::read(path)?;
    let result = match pool {
        PoolKind::Array => verify::<ArrayPool>(path, segment_size, &expected, truncate)?,
        PoolKind::Bytes => verify::<BytesPool>(path, segment_size, &expected, truncate)?,
    };

    println!();
    if result.is_ok() {
        println!("✓ Stream verification passed ({} checks)", result.checks_run);
        Ok(())
    } else {
        println!("✗ Stream verification failed");
        Err(CliError::VerificationFailed {
            failed: result.errors.len(),
            checked: result.checks_run,
        }
        .into())
    }
}

fn verify<P: SegmentPool + Default>(
    path: &Path,
    segment_size: usize,
    expected: &[u8],
    truncate: Option<u64>,
) -> Result<VerifyResult, Box<dyn std::error::Error>> {
    let mut result = VerifyResult::default();
    let (pool, mut stream) = load_file::<P>(path, segment_size)?;
    let length = expected.len() as u64;
    let target = truncate.unwrap_or(length / 2).min(length);

    println!("Loading...");
    result.check("length matches file", stream.len() == length);
    result.check("bookkeeping is consistent", stream.check_invariants().is_ok());

    println!("Freezing...");
    let rents_before = pool.stats().rents;
    stream.freeze()?;
    result.check("view matches file", stream.export_view()? == *expected);
    result.check("freeze rented nothing", pool.stats().rents == rents_before);
    result.check(
        "writes are rejected",
        matches!(stream.write(b"x"), Err(StreamError::Frozen { .. })),
    );
    result.check(
        "resizes are rejected",
        matches!(stream.set_length(target), Err(StreamError::Frozen { .. })),
    );
    result.check("length unchanged", stream.len() == length);

    println!("Unfreezing and truncating to {} bytes...", target);
    stream.unfreeze()?;
    let held = stream.segment_count();
    let returns_before = pool.stats().returns;
    stream.set_length(target)?;
    let released = (held - stream.segment_count()) as u64;
    result.check(
        "released segments went back to the pool",
        pool.stats().returns - returns_before == released,
    );
    result.check(
        "prefix preserved",
        stream.to_array()? == expected[..target as usize],
    );
    result.check("bookkeeping is consistent", stream.check_invariants().is_ok());

    drop(stream);
    result.check("every segment returned", pool.stats().outstanding() == 0);

    info!(
        checks = result.checks_run,
        failed = result.errors.len(),
        "verification finished"
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use segstream_testkit::patterned_data;
    use std::io::Write;

    fn temp_file(data: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(data).unwrap();
        file
    }

    #[test]
    fn verify_passes_for_both_pools() {
        let data = patterned_data(5000);
        let file = temp_file(&data);

        let array = verify::<ArrayPool>(file.path(), 128, &data, None).unwrap();
        assert!(array.is_ok(), "{:?}", array.errors);
        let bytes = verify::<BytesPool>(file.path(), 100, &data, Some(4321)).unwrap();
        assert!(bytes.is_ok(), "{:?}", bytes.errors);
        assert_eq!(bytes.checks_run, array.checks_run);
    }

    #[test]
    fn verify_handles_empty_file() {
        let file = temp_file(b"");
        let result = verify::<ArrayPool>(file.path(), 16, b"", Some(10)).unwrap();
        assert!(result.is_ok(), "{:?}", result.errors);
    }
}
