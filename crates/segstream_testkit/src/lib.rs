//! # segstream Testkit
//!
//! Test utilities for segmented streams.
//!
//! This crate provides:
//! - Stream fixtures that keep their pool around for counter checks
//! - Property-based operation generators using proptest
//! - A reference-model harness that checks a stream after every operation
//! - Fuzz testing harnesses
//! - Stress testing utilities for shared pools
//!
//! ## Usage
//!
//! ```rust
//! use segstream_testkit::prelude::*;
//!
//! let mut harness = ModelHarness::<segstream_core::ArrayPool>::new(4);
//! harness.run(&[
//!     StreamOp::Write(vec![1, 2, 3, 4, 5, 6]),
//!     StreamOp::SetLength(2),
//! ]);
//! assert_eq!(harness.model(), &[1, 2]);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod fuzz;
pub mod generators;
pub mod model;
pub mod stress;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::fuzz::*;
    pub use crate::generators::*;
    pub use crate::model::*;
    pub use crate::stress::*;
}

pub use fixtures::*;
pub use fuzz::*;
pub use generators::*;
pub use model::*;
pub use stress::*;
