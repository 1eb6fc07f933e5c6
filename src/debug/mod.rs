//! Debug dump of fitted segments.
//!
//! One line per segment, `start,stop,slope,intercept`, preceded by a commented
//! header. Meant for plotting the fit next to the polynomial; it is not a
//! byte-exact interchange format.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use chrono::Local;

use crate::domain::HighOrderPolynomial;
use crate::error::AppError;
use crate::fit::FitReport;

pub fn write_segment_dump(
    path: &Path,
    poly: &HighOrderPolynomial,
    report: &FitReport,
) -> Result<(), AppError> {
    let mut file = File::create(path).map_err(|e| {
        AppError::new(2, format!("Failed to create segment dump '{}': {e}", path.display()))
    })?;

    writeln!(file, "# fodm segment dump")
        .and_then(|_| writeln!(file, "# generated: {}", Local::now().to_rfc3339()))
        .and_then(|_| {
            writeln!(
                file,
                "# polynomial: [{:.12}, {:.12}) degree {}",
                poly.start,
                poly.stop,
                poly.degree()
            )
        })
        .and_then(|_| file.write_all(format_segment_dump(report).as_bytes()))
        .map_err(|e| AppError::new(2, format!("Failed to write segment dump: {e}")))
}

/// Data lines of the dump (no header).
pub fn format_segment_dump(report: &FitReport) -> String {
    let mut out = String::new();
    for seg in &report.segments {
        out.push_str(&format!(
            "{:.12},{:.12},{:.16},{:.16}\n",
            seg.start, seg.stop, seg.slope, seg.intercept
        ));
    }
    out
}
