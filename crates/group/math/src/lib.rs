//! # Group Math
//!
//! Exact decimal arithmetic used for member weights, tallies and policy
//! thresholds.
//!
//! Weights are never represented as floats. Every value is a [`Dec`], a
//! fixed-precision decimal parsed from its canonical string form. Arithmetic
//! returns fresh values and reports failure instead of panicking or silently
//! saturating.

#![deny(unsafe_code)]

mod dec;
mod error;

pub use dec::*;
pub use error::*;
