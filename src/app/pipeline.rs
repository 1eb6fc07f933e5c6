//! Shared "fit then encode" workflow.
//!
//! Kept separate from the command handlers so the whole path
//! polynomial -> boundaries -> segments -> register records
//! can be driven (and tested) without going through the CLI.

use tracing::info;

use crate::domain::{HighOrderPolynomial, PhysicalParameters};
use crate::encode::{Encoder, EncoderProfile};
use crate::error::AppError;
use crate::fit::{Deviation, FitMode, FitReport, fit_segments, max_abs_deviation, uniform_boundaries};
use crate::report::EncodeSummary;

/// How to cut the polynomial into segments.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segmentation {
    pub start: f64,
    pub interval: f64,
    pub count: usize,
    pub mode: FitMode,
}

impl Segmentation {
    /// As many `interval`-long segments from `start` as fit before `poly.stop`.
    pub fn covering(poly: &HighOrderPolynomial, start: f64, interval: f64, mode: FitMode) -> Result<Self, AppError> {
        if !(interval.is_finite() && interval > 0.0) {
            return Err(AppError::new(2, format!("Invalid segment interval: {interval}.")));
        }
        let span = poly.stop - start;
        // Tolerate boundary round-off (10 s / 0.01 s is 999.9999999999999).
        let count = (span / interval + 1e-9).floor();
        if !count.is_finite() || count < 1.0 {
            return Err(AppError::new(
                2,
                format!("No {interval} s segment fits between {start} and {}.", poly.stop),
            ));
        }
        Ok(Self {
            start,
            interval,
            count: count as usize,
            mode,
        })
    }
}

/// Segments plus the diagnostics computed for them.
#[derive(Debug, Clone)]
pub struct FitOutput {
    pub report: FitReport,
    pub deviation: Option<Deviation>,
}

/// Fit the polynomial; `deviation_samples == 0` skips the deviation check.
pub fn run_fit(
    poly: &HighOrderPolynomial,
    segmentation: &Segmentation,
    deviation_samples: usize,
) -> Result<FitOutput, AppError> {
    let boundaries = uniform_boundaries(segmentation.start, segmentation.interval, segmentation.count)?;
    let report = fit_segments(poly, &boundaries, segmentation.mode)?;
    info!(
        segments = report.segments.len(),
        faults = report.faults.len(),
        ok = report.ok(),
        "fitted segments"
    );

    let deviation = if deviation_samples > 0 {
        let dev = max_abs_deviation(poly, &report, deviation_samples)?;
        info!(max_abs = dev.max_abs, cumulative = dev.cumulative, "fit deviation");
        Some(dev)
    } else {
        None
    };

    Ok(FitOutput { report, deviation })
}

/// All outputs of a fit-and-encode run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub fit: FitOutput,
    pub encoded: EncodeSummary,
    pub profile: EncoderProfile,
}

/// Fit, then encode every segment. Refuses to encode an invalid fit.
pub fn run_fit_and_encode(
    poly: &HighOrderPolynomial,
    segmentation: &Segmentation,
    params: &PhysicalParameters,
    profile: EncoderProfile,
    deviation_samples: usize,
) -> Result<RunOutput, AppError> {
    let fit = run_fit(poly, segmentation, deviation_samples)?;
    if !fit.report.ok() {
        return Err(AppError::new(
            3,
            format!(
                "Segment fit is invalid ({} structural fault(s)); refusing to encode.",
                fit.report.structural_faults().count()
            ),
        ));
    }

    let encoder = Encoder::new(profile);
    let results = encoder.encode_batch(&fit.report.segments, poly.start, params);
    let encoded = EncodeSummary::collect(results.into_iter().enumerate());
    info!(
        encoded = encoded.records.len(),
        failed = encoded.failures.len(),
        "encoded registers"
    );

    Ok(RunOutput {
        fit,
        encoded,
        profile,
    })
}
