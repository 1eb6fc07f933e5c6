//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the fitter input (`HighOrderPolynomial`) and output (`LinearSegment`)
//! - the encoder's physical inputs (`PhysicalParameters`, `EncoderInputRow`)
//! - the enums that select encoder behaviour (`RegisterVersion`, `Rounding`, ...)

pub mod types;

pub use types::*;
