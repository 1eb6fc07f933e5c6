//! Input data sources beyond the CSV ingest path.

pub mod synth;

pub use synth::*;
