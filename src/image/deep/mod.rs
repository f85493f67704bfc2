//! Algorithms on deep data.
//!
//! Deep data allows multiple samples per pixel at different depths.
//! These modules combine the samples of many deep pixels into one,
//! and compute the weights and geometry that the operators use for gathering pixels.

pub mod compositing;
pub mod gaussian;
pub mod merge;
pub mod resample;
