//! Numeric building blocks: extended-precision scalar, polynomial evaluation
//! and the 2x2 least-squares line fit.

pub mod ols;
pub mod poly;
pub mod precise;

pub use ols::*;
pub use poly::*;
pub use precise::Precise;
