//! Polynomial evaluation (Horner's method).

use super::precise::Precise;

/// Evaluate `coeffs` (highest degree first) at `x`.
pub fn horner(coeffs: &[f64], x: f64) -> f64 {
    coeffs.iter().fold(0.0, |acc, &c| acc * x + c)
}

/// Evaluate `coeffs` at `x` in extended precision.
///
/// Returns `None` if a coefficient or `x` is not finite.
pub fn horner_precise(coeffs: &[f64], x: f64) -> Option<Precise> {
    let x = Precise::from_f64(x)?;
    coeffs.iter().try_fold(Precise::zero(), |acc, &c| {
        Some(&(&acc * &x) + &Precise::from_f64(c)?)
    })
}
