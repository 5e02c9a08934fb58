//! Shared helpers for the segmented stream benchmarks.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod utils;
