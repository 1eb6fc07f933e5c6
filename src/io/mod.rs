//! Input/output helpers.
//!
//! - encoder input CSV ingest + validation (`ingest`)
//! - register record exports (CSV/JSON/binary) (`records`)

pub mod ingest;
pub mod records;

pub use ingest::*;
pub use records::*;
