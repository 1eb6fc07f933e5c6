//! FODM register encoding.
//!
//! Responsibilities:
//!
//! - select the register generation and its formula variants (`EncoderProfile`)
//! - turn a linear segment into bit-exact register fields (`Encoder`)
//! - pack records into the firmware byte layout (`RegisterRecord`)

pub mod encoder;
pub mod profile;
pub mod register;

pub use encoder::*;
pub use profile::*;
pub use register::*;
