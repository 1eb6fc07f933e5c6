//! `fodm-gen` library crate.
//!
//! The binary (`fodm`) is a thin wrapper around this library so that:
//!
//! - the fitter and encoder are testable without spawning processes
//! - other tools can produce register images without going through the CLI
//!
//! Core path: [`fit::fit_segments`] turns a high-order delay polynomial into
//! linear segments, [`encode::Encoder`] turns each segment into a bit-exact
//! FODM register record.

pub mod app;
pub mod cli;
pub mod config;
pub mod data;
pub mod debug;
pub mod domain;
pub mod encode;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod report;
