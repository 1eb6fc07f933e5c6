//! CSV ingest of encoder inputs.
//!
//! Each row describes one FO segment plus the physical parameters it is to be
//! encoded with:
//!
//! ```text
//! fo_delay_const,fo_delay_linear,fodm_start_t,fodm_stop_t,hodm_start_t,
//! input_sample_rate,output_sample_rate,f_wb,f_as,f_ds,f_scfo
//! ```
//!
//! Times are milliseconds since the epoch and are parsed straight into the
//! extended-precision scalar, so no digits are lost to `f64` on the way in.
//!
//! Design goals:
//! - **Strict schema** for required columns (clear errors + exit code 2)
//! - **Row-level validation** (skip bad rows, but report what happened)

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;

use crate::domain::PhysicalParameters;
use crate::encode::EncodeInput;
use crate::error::AppError;
use crate::math::Precise;

pub const INPUT_COLUMNS: [&str; 11] = [
    "fo_delay_const",
    "fo_delay_linear",
    "fodm_start_t",
    "fodm_stop_t",
    "hodm_start_t",
    "input_sample_rate",
    "output_sample_rate",
    "f_wb",
    "f_as",
    "f_ds",
    "f_scfo",
];

/// A row-level error encountered during ingest.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// One parsed input row.
#[derive(Debug, Clone)]
pub struct InputRecord {
    pub line: usize,
    pub input: EncodeInput,
    pub params: PhysicalParameters,
}

#[derive(Debug, Clone)]
pub struct IngestedInputs {
    pub records: Vec<InputRecord>,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
}

pub fn load_encoder_inputs(path: &Path) -> Result<IngestedInputs, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display()))
    })?;
    read_encoder_inputs(file)
}

pub fn read_encoder_inputs<R: Read>(reader: R) -> Result<IngestedInputs, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
        .clone();
    let header_map = build_header_map(&headers);

    let missing: Vec<&str> = INPUT_COLUMNS
        .iter()
        .copied()
        .filter(|c| !header_map.contains_key(*c))
        .collect();
    if !missing.is_empty() {
        return Err(AppError::new(
            2,
            format!("CSV is missing required column(s): {}", missing.join(", ")),
        ));
    }

    let mut records = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // records() starts after the header line; CSV lines are 1-based.
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        match parse_row(&record, &header_map) {
            Ok((input, params)) => records.push(InputRecord {
                line,
                input,
                params,
            }),
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    Ok(IngestedInputs {
        records,
        row_errors,
        rows_read,
    })
}

fn parse_row(
    record: &StringRecord,
    header_map: &HashMap<String, usize>,
) -> Result<(EncodeInput, PhysicalParameters), String> {
    let field = |name: &str| get_field(record, header_map, name);
    let precise = |name: &str| -> Result<Precise, String> {
        let raw = field(name)?;
        raw.parse::<Precise>()
            .map_err(|e| format!("invalid number for '{name}': '{raw}' ({e})"))
    };
    let float = |name: &str| -> Result<f64, String> {
        let raw = field(name)?;
        raw.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| format!("invalid number for '{name}': '{raw}'"))
    };
    let rate = |name: &str| -> Result<u32, String> {
        let raw = field(name)?;
        parse_rate(raw).ok_or_else(|| format!("invalid sample rate for '{name}': '{raw}'"))
    };

    let input = EncodeInput::from_millis(
        precise("hodm_start_t")?,
        precise("fodm_start_t")?,
        precise("fodm_stop_t")?,
        precise("fo_delay_linear")?,
        precise("fo_delay_const")?,
    );
    let params = PhysicalParameters {
        input_sample_rate: rate("input_sample_rate")?,
        output_sample_rate: rate("output_sample_rate")?,
        freq_down_shift: float("f_ds")?,
        freq_align_shift: float("f_as")?,
        freq_wb_shift: float("f_wb")?,
        freq_scfo_shift: float("f_scfo")?,
    };
    Ok((input, params))
}

fn get_field<'a>(
    record: &'a StringRecord,
    header_map: &HashMap<String, usize>,
    name: &str,
) -> Result<&'a str, String> {
    header_map
        .get(name)
        .and_then(|&idx| record.get(idx))
        .filter(|v| !v.is_empty())
        .ok_or_else(|| format!("missing value for '{name}'"))
}

/// Sample rates are integers, but spreadsheets like to write `220000000.0`.
fn parse_rate(raw: &str) -> Option<u32> {
    if let Ok(v) = raw.parse::<u32>() {
        return Some(v);
    }
    let v = raw.parse::<f64>().ok()?;
    if v.fract() == 0.0 && (0.0..=u32::MAX as f64).contains(&v) {
        Some(v as u32)
    } else {
        None
    }
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports sometimes prefix the first header with a BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "fo_delay_const,fo_delay_linear,fodm_start_t,fodm_stop_t,hodm_start_t,input_sample_rate,output_sample_rate,f_wb,f_as,f_ds,f_scfo";

    fn p(s: &str) -> Precise {
        s.parse().unwrap()
    }

    #[test]
    fn parses_millisecond_times_exactly() {
        let csv = format!(
            "{HEADER}\n12.5,-3.25,987654321123.456,987654321133.456,987654321000,220000200,220200960,0,0,-198000180,-180774.0\n"
        );
        let out = read_encoder_inputs(csv.as_bytes()).unwrap();
        assert!(out.row_errors.is_empty());
        assert_eq!(out.rows_read, 1);

        let rec = &out.records[0];
        assert_eq!(rec.line, 2);
        assert_eq!(rec.input.start, p("987654321.123456"));
        assert_eq!(rec.input.stop, p("987654321.133456"));
        assert_eq!(rec.input.ho_start, p("987654321"));
        assert_eq!(rec.input.delay_constant, p("12.5"));
        assert_eq!(rec.input.delay_linear, p("-3.25"));
        assert_eq!(rec.params.input_sample_rate, 220_000_200);
        assert_eq!(rec.params.freq_down_shift, -198_000_180.0);
        assert_eq!(rec.params.freq_scfo_shift, -180_774.0);
    }

    #[test]
    fn bad_rows_are_collected_not_fatal() {
        let csv = format!(
            "{HEADER}\n1,0,10,20,0,1000,1000,0,0,0,0\n1,0,abc,20,0,1000,1000,0,0,0,0\n1,0,10,20,0,-5,1000,0,0,0,0\n"
        );
        let out = read_encoder_inputs(csv.as_bytes()).unwrap();
        assert_eq!(out.rows_read, 3);
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.row_errors.len(), 2);
        assert_eq!(out.row_errors[0].line, 3);
        assert!(out.row_errors[0].message.contains("fodm_start_t"));
        assert!(out.row_errors[1].message.contains("input_sample_rate"));
    }

    #[test]
    fn missing_columns_fail_fast() {
        let err = read_encoder_inputs("fo_delay_const,f_wb\n1,2\n".as_bytes()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("fodm_start_t"));
    }

    #[test]
    fn header_names_are_normalized() {
        let header = HEADER.replace("fo_delay_const", "\u{feff}FO_DELAY_CONST");
        let csv = format!("{header}\n1,0,10,20,0,1000.0,1000,0,0,0,0\n");
        let out = read_encoder_inputs(csv.as_bytes()).unwrap();
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.records[0].params.input_sample_rate, 1000);
    }
}
