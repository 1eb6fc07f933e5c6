//! Least-squares line fit.
//!
//! Each segment is approximated by `y ≈ intercept + slope * s`, which is a
//! two-parameter regression. The normal equations
//!
//! ```text
//! [ n    Σs  ] [intercept]   [ Σy  ]
//! [ Σs   Σs² ] [ slope   ] = [ Σsy ]
//! ```
//!
//! are accumulated sample by sample and solved with the closed-form 2x2
//! inverse. A singular system (all samples at the same `s`) yields `None`.

use nalgebra::{Matrix2, Vector2};

/// Result of a successful line fit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineFit {
    pub intercept: f64,
    pub slope: f64,
}

/// Running sums for the 2x2 normal equations.
#[derive(Debug, Clone, Default)]
pub struct LineAccumulator {
    n: f64,
    sum_s: f64,
    sum_ss: f64,
    sum_y: f64,
    sum_sy: f64,
}

impl LineAccumulator {
    pub fn push(&mut self, s: f64, y: f64) {
        self.n += 1.0;
        self.sum_s += s;
        self.sum_ss += s * s;
        self.sum_y += y;
        self.sum_sy += s * y;
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0.0
    }

    /// Mean of the accumulated `y` values (0 when empty).
    pub fn mean_y(&self) -> f64 {
        if self.is_empty() { 0.0 } else { self.sum_y / self.n }
    }

    /// `n·Σs² − (Σs)²`
    pub fn determinant(&self) -> f64 {
        self.n * self.sum_ss - self.sum_s * self.sum_s
    }

    pub fn solve(&self) -> Option<LineFit> {
        let det = self.determinant();
        if det == 0.0 || !det.is_finite() {
            return None;
        }

        let xtx = Matrix2::new(self.n, self.sum_s, self.sum_s, self.sum_ss);
        let xty = Vector2::new(self.sum_y, self.sum_sy);
        let beta = xtx.try_inverse()? * xty;

        if !beta.iter().all(|v| v.is_finite()) {
            return None;
        }

        Some(LineFit {
            intercept: beta[0],
            slope: beta[1],
        })
    }
}
