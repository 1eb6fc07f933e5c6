//! Register record exports.
//!
//! - CSV: one row per record, firmware field order, for spreadsheets and diffing
//!   against reference dumps
//! - JSON: the same fields plus the record version
//! - binary: the packed little-endian image the firmware loads

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::domain::RegisterVersion;
use crate::encode::{RegisterFields, RegisterRecord};
use crate::error::AppError;

fn create(path: &Path, what: &str) -> Result<BufWriter<File>, AppError> {
    File::create(path).map(BufWriter::new).map_err(|e| {
        AppError::new(2, format!("Failed to create {what} '{}': {e}", path.display()))
    })
}

pub fn write_records_csv(path: &Path, records: &[RegisterRecord]) -> Result<(), AppError> {
    let file = create(path, "register CSV")?;
    write_csv(file, records)
}

pub fn write_csv<W: Write>(out: W, records: &[RegisterRecord]) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_writer(out);
    for record in records {
        writer
            .serialize(record.fields())
            .map_err(|e| AppError::new(2, format!("Failed to write register CSV row: {e}")))?;
    }
    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush register CSV: {e}")))
}

#[derive(Debug, Serialize)]
struct JsonRecord {
    version: RegisterVersion,
    #[serde(flatten)]
    fields: RegisterFields,
}

pub fn write_records_json(path: &Path, records: &[RegisterRecord]) -> Result<(), AppError> {
    let file = create(path, "register JSON")?;
    write_json(file, records)
}

pub fn write_json<W: Write>(mut out: W, records: &[RegisterRecord]) -> Result<(), AppError> {
    let rows: Vec<JsonRecord> = records
        .iter()
        .map(|r| JsonRecord {
            version: r.version(),
            fields: r.fields(),
        })
        .collect();
    serde_json::to_writer_pretty(&mut out, &rows)
        .map_err(|e| AppError::new(2, format!("Failed to write register JSON: {e}")))?;
    writeln!(out).map_err(|e| AppError::new(2, format!("Failed to write register JSON: {e}")))
}

pub fn write_records_binary(path: &Path, records: &[RegisterRecord]) -> Result<(), AppError> {
    let file = create(path, "register image")?;
    write_binary(file, records)
}

/// Concatenate the packed records. Mixed versions are rejected; the firmware
/// image has a single record size.
pub fn write_binary<W: Write>(mut out: W, records: &[RegisterRecord]) -> Result<(), AppError> {
    if let Some(first) = records.first() {
        let version = first.version();
        if let Some(i) = records.iter().position(|r| r.version() != version) {
            return Err(AppError::new(
                3,
                format!("Record {i} is {:?} but the image started as {version:?}.", records[i].version()),
            ));
        }
    }
    for record in records {
        out.write_all(&record.to_le_bytes())
            .map_err(|e| AppError::new(2, format!("Failed to write register image: {e}")))?;
    }
    out.flush()
        .map_err(|e| AppError::new(2, format!("Failed to write register image: {e}")))
}
