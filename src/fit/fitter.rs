//! Piecewise-linear approximation of a high-order delay polynomial.
//!
//! Given:
//! - a polynomial valid on `[start, stop)`
//! - `N + 1` boundary timestamps
//!
//! we produce, for each pair of consecutive boundaries, one `LinearSegment`,
//! either by exact two-point evaluation or by a least-squares line fit over
//! evenly spaced samples.
//!
//! Boundary problems (outside the window, going backwards) are reported per
//! segment instead of aborting the batch; all segments are still computed so
//! callers can inspect the full picture. Callers must not use the output of a
//! report whose `ok()` is false.

use rayon::prelude::*;
use serde::Serialize;
use tracing::warn;

use crate::domain::{HighOrderPolynomial, LinearSegment};
use crate::error::AppError;
use crate::math::{LineAccumulator, Precise, horner, horner_precise};

/// How each segment is derived from the polynomial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitMode {
    /// Line through the polynomial values at both boundaries, evaluated in
    /// extended precision.
    TwoPoint,
    /// Least-squares line over `points + 1` evenly spaced samples.
    LeastSquares { points: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultKind {
    /// Segment ends after the polynomial's `stop`.
    EndsAfterStop,
    /// Segment starts before the polynomial's `start`.
    StartsBeforeStart,
    /// Segment ends before it starts.
    EndsBeforeStart,
    /// No slope could be determined (zero width, singular normal equations).
    Degenerate,
}

impl FaultKind {
    /// Structural faults invalidate the whole report; `Degenerate` does not.
    pub fn is_structural(self) -> bool {
        !matches!(self, FaultKind::Degenerate)
    }

    pub fn describe(self) -> &'static str {
        match self {
            FaultKind::EndsAfterStop => "ends after the polynomial stop time",
            FaultKind::StartsBeforeStart => "starts before the polynomial start time",
            FaultKind::EndsBeforeStart => "ends before it starts",
            FaultKind::Degenerate => "has no well-defined slope",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SegmentFault {
    pub index: usize,
    pub kind: FaultKind,
}

/// Output of `fit_segments`.
#[derive(Debug, Clone)]
pub struct FitReport {
    /// One segment per boundary pair, in boundary order.
    pub segments: Vec<LinearSegment>,
    pub faults: Vec<SegmentFault>,
}

impl FitReport {
    /// `true` iff no structural fault was found.
    pub fn ok(&self) -> bool {
        !self.faults.iter().any(|f| f.kind.is_structural())
    }

    pub fn structural_faults(&self) -> impl Iterator<Item = &SegmentFault> {
        self.faults.iter().filter(|f| f.kind.is_structural())
    }

    /// Indices of segments whose slope could not be determined.
    pub fn degenerate_segments(&self) -> Vec<usize> {
        self.faults
            .iter()
            .filter(|f| f.kind == FaultKind::Degenerate)
            .map(|f| f.index)
            .collect()
    }
}

/// Fit one linear segment per consecutive boundary pair.
///
/// Errors only when the request itself is meaningless (fewer than two
/// boundaries, non-finite boundaries, zero LSQ points); everything else is
/// reported through `FitReport::faults`.
pub fn fit_segments(
    poly: &HighOrderPolynomial,
    boundaries: &[f64],
    mode: FitMode,
) -> Result<FitReport, AppError> {
    poly.validate()?;
    if boundaries.len() < 2 {
        return Err(AppError::new(
            3,
            format!(
                "At least two segment boundaries are required (got {}).",
                boundaries.len()
            ),
        ));
    }
    if let Some(i) = boundaries.iter().position(|b| !b.is_finite()) {
        return Err(AppError::new(3, format!("Segment boundary {i} is not finite.")));
    }
    if mode == (FitMode::LeastSquares { points: 0 }) {
        return Err(AppError::new(2, "Least-squares fitting needs at least one point."));
    }

    let fitted = boundaries
        .par_windows(2)
        .map(|pair| fit_one(poly, pair[0], pair[1], mode))
        .collect::<Result<Vec<_>, AppError>>()?;

    let mut segments = Vec::with_capacity(fitted.len());
    let mut faults = Vec::new();
    for (index, (segment, kinds)) in fitted.into_iter().enumerate() {
        for kind in kinds {
            warn!(
                segment = index,
                start = segment.start,
                stop = segment.stop,
                "segment {}",
                kind.describe()
            );
            faults.push(SegmentFault { index, kind });
        }
        segments.push(segment);
    }

    Ok(FitReport { segments, faults })
}

fn fit_one(
    poly: &HighOrderPolynomial,
    b0: f64,
    b1: f64,
    mode: FitMode,
) -> Result<(LinearSegment, Vec<FaultKind>), AppError> {
    let mut faults = Vec::new();
    if b1 > poly.stop {
        faults.push(FaultKind::EndsAfterStop);
    }
    if b0 < poly.start {
        faults.push(FaultKind::StartsBeforeStart);
    }
    if b1 < b0 {
        faults.push(FaultKind::EndsBeforeStart);
    }

    let (slope, intercept, degenerate) = match mode {
        FitMode::TwoPoint => two_point(poly, b0, b1)?,
        FitMode::LeastSquares { points } => least_squares(poly, b0, b1, points),
    };
    if degenerate {
        faults.push(FaultKind::Degenerate);
    }

    let segment = LinearSegment {
        start: b0,
        stop: b1,
        slope,
        intercept,
    };
    Ok((segment, faults))
}

fn two_point(poly: &HighOrderPolynomial, b0: f64, b1: f64) -> Result<(f64, f64, bool), AppError> {
    let t1 = b0 - poly.start;
    let t2 = b1 - poly.start;

    let eval = |t: f64| {
        horner_precise(&poly.coeffs, t)
            .ok_or_else(|| AppError::new(4, format!("Polynomial evaluation failed at t={t}.")))
    };
    let y1 = eval(t1)?;
    let y2 = eval(t2)?;

    let width = t2 - t1;
    let Some(width) = Precise::from_f64(width).filter(|w| !w.is_zero()) else {
        return Ok((0.0, y1.to_f64(), true));
    };
    let slope = (&y2 - &y1) / width;
    Ok((slope.to_f64(), y1.to_f64(), false))
}

fn least_squares(poly: &HighOrderPolynomial, b0: f64, b1: f64, points: usize) -> (f64, f64, bool) {
    let step = (b1 - b0) / points as f64;
    // Samples are accumulated relative to the first one; the polynomial value
    // itself is ~1e4 ns while the variation over a segment is tiny.
    let y_ref = horner(&poly.coeffs, b0 - poly.start);

    let mut acc = LineAccumulator::default();
    for j in 0..=points {
        let s = j as f64 * step;
        let t = b0 + s - poly.start;
        acc.push(s, horner(&poly.coeffs, t) - y_ref);
    }

    match acc.solve() {
        Some(line) => (line.slope, line.intercept + y_ref, false),
        None => (0.0, acc.mean_y() + y_ref, true),
    }
}

/// How closely a set of segments follows the polynomial.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Deviation {
    /// Largest `|segment - polynomial|` seen (ns).
    pub max_abs: f64,
    /// Sum of signed `segment - polynomial` over all samples (ns); a fit bias
    /// shows up as a drift away from zero.
    pub cumulative: f64,
    pub samples: usize,
}

/// Compare each segment against the polynomial at `samples + 1` evenly spaced
/// points per segment (endpoints included).
pub fn max_abs_deviation(
    poly: &HighOrderPolynomial,
    report: &FitReport,
    samples: usize,
) -> Result<Deviation, AppError> {
    if samples == 0 {
        return Err(AppError::new(2, "Deviation sampling needs at least one point."));
    }

    let per_segment = report
        .segments
        .par_iter()
        .map(|segment| segment_deviation(poly, segment, samples))
        .collect::<Result<Vec<_>, AppError>>()?;

    let mut out = Deviation {
        max_abs: 0.0,
        cumulative: 0.0,
        samples: 0,
    };
    for (max_abs, sum, n) in per_segment {
        out.max_abs = out.max_abs.max(max_abs);
        out.cumulative += sum;
        out.samples += n;
    }
    Ok(out)
}

fn segment_deviation(
    poly: &HighOrderPolynomial,
    segment: &LinearSegment,
    samples: usize,
) -> Result<(f64, f64, usize), AppError> {
    let step = (segment.stop - segment.start) / samples as f64;
    let intercept = Precise::from_f64(segment.intercept);
    let slope = Precise::from_f64(segment.slope);
    let (Some(intercept), Some(slope)) = (intercept, slope) else {
        return Err(AppError::new(4, "Segment coefficients are not finite."));
    };

    let mut max_abs = 0.0_f64;
    let mut sum = 0.0;
    for j in 0..=samples {
        let s = j as f64 * step;
        let t = segment.start + s - poly.start;
        let expected = horner_precise(&poly.coeffs, t)
            .ok_or_else(|| AppError::new(4, format!("Polynomial evaluation failed at t={t}.")))?;
        let s = Precise::from_f64(s)
            .ok_or_else(|| AppError::new(4, "Segment sample offset is not finite."))?;
        let diff = (&intercept + &(&slope * &s) - expected).to_f64();
        max_abs = max_abs.max(diff.abs());
        sum += diff;
    }
    Ok((max_abs, sum, samples + 1))
}
