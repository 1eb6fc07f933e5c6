//! Formatted terminal output.
//!
//! Formatting lives here so the fitting and encoding code stays free of
//! presentation concerns.

use super::EncodeSummary;
use crate::domain::HighOrderPolynomial;
use crate::encode::EncoderProfile;
use crate::fit::{Deviation, FitMode, FitReport};

pub fn format_fit_summary(
    poly: &HighOrderPolynomial,
    report: &FitReport,
    mode: FitMode,
    deviation: Option<&Deviation>,
) -> String {
    let mut out = String::new();

    out.push_str("=== fodm - segment fit ===\n");
    out.push_str(&format!(
        "Polynomial: degree {} on [{:.6}, {:.6}) s\n",
        poly.degree(),
        poly.start,
        poly.stop
    ));
    out.push_str(&format!(
        "Coefficients: [{}]\n",
        fmt_vec(&poly.coeffs)
    ));
    let mode = match mode {
        FitMode::TwoPoint => "two-point".to_string(),
        FitMode::LeastSquares { points } => format!("least-squares ({points} points)"),
    };
    out.push_str(&format!("Mode: {mode}\n"));
    out.push_str(&format!("Segments: {}\n", report.segments.len()));

    if let (Some(first), Some(last)) = (report.segments.first(), report.segments.last()) {
        out.push_str(&format!(
            "Span: [{:.6}, {:.6}] s\n",
            first.start, last.stop
        ));
    }

    if let Some(dev) = deviation {
        out.push_str(&format!(
            "Deviation: max |err| = {:.3e} ns, cumulative = {:.3e} ns over {} samples\n",
            dev.max_abs, dev.cumulative, dev.samples
        ));
    }

    if report.ok() {
        out.push_str("Status: OK\n");
    } else {
        out.push_str("Status: INVALID (segments outside the polynomial window or out of order)\n");
    }

    for fault in &report.faults {
        out.push_str(&format!(
            "  segment {:>6}: {}\n",
            fault.index,
            fault.kind.describe()
        ));
    }

    out
}

pub fn format_encode_summary(summary: &EncodeSummary, profile: &EncoderProfile) -> String {
    let mut out = String::new();

    out.push_str("=== fodm - register encode ===\n");
    out.push_str(&format!(
        "Profile: {:?} | delay_linear={:?} | redistribute={} | phase_constant={:?} | time_factor={:?} | negate_ds={} | rounding={:?}\n",
        profile.version,
        profile.delay_linear,
        profile.redistribute_linear_error,
        profile.phase_constant,
        profile.time_factor_origin,
        profile.negate_down_shift,
        profile.rounding,
    ));
    out.push_str(&format!(
        "Records: {} encoded, {} failed\n",
        summary.records.len(),
        summary.failures.len()
    ));

    for failure in &summary.failures {
        out.push_str(&format!("  #{:>6}: {}\n", failure.position, failure.error));
    }

    out
}

/// Fixed-width table of the first `limit` records.
pub fn format_records_table(summary: &EncodeSummary, limit: usize) -> String {
    let mut out = String::new();
    if summary.records.is_empty() || limit == 0 {
        return out;
    }

    out.push_str(&format!(
        "{:>20} {:>10} {:>11} {:>20} {:>20} {:>9} {:>10} {:>20}\n",
        "first_input", "delay_c", "phase_c", "delay_l", "phase_l", "validity", "pps", "first_output"
    ));
    for record in summary.records.iter().take(limit) {
        let f = record.fields();
        out.push_str(&format!(
            "{:>20} {:>10} {:>11} {:>20} {:>20} {:>9} {:>10} {:>20}\n",
            f.first_input_timestamp,
            f.delay_constant,
            f.phase_constant,
            f.delay_linear,
            f.phase_linear,
            f.validity_period,
            f.output_pps,
            f.first_output_timestamp
        ));
    }
    if summary.records.len() > limit {
        out.push_str(&format!("... ({} more)\n", summary.records.len() - limit));
    }

    out
}

fn fmt_vec(values: &[f64]) -> String {
    values
        .iter()
        .map(|v| format!("{v:.6e}"))
        .collect::<Vec<_>>()
        .join(", ")
}
