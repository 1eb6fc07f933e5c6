//! Segment fitting.
//!
//! Responsibilities:
//!
//! - generate boundary grids
//! - turn a high-order delay polynomial into linear segments (parallel)
//! - measure how far the segments stray from the polynomial

pub mod boundaries;
pub mod fitter;

pub use boundaries::*;
pub use fitter::*;
