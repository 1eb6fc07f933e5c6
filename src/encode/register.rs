//! FODM register records.
//!
//! Field order is the firmware order. Both layouts are naturally aligned, so
//! the packed little-endian image has no padding.

use serde::{Deserialize, Serialize};

use super::EncodeError;
use crate::domain::RegisterVersion;

/// Legacy layout: 32-bit linear terms (40 bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterRecordV1 {
    pub first_input_timestamp: u64,
    pub delay_constant: u32,
    pub phase_constant: i32,
    pub delay_linear: u32,
    pub phase_linear: i32,
    pub validity_period: u32,
    pub output_pps: u32,
    pub first_output_timestamp: u64,
}

/// Extended layout: 64-bit linear terms (48 bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterRecordV2 {
    pub first_input_timestamp: u64,
    pub delay_constant: u32,
    pub phase_constant: i32,
    pub delay_linear: u64,
    pub phase_linear: i64,
    pub validity_period: u32,
    pub output_pps: u32,
    pub first_output_timestamp: u64,
}

impl RegisterRecordV1 {
    pub fn to_le_bytes(&self) -> [u8; 40] {
        let mut out = [0u8; 40];
        let mut w = ByteWriter::new(&mut out);
        w.put(&self.first_input_timestamp.to_le_bytes());
        w.put(&self.delay_constant.to_le_bytes());
        w.put(&self.phase_constant.to_le_bytes());
        w.put(&self.delay_linear.to_le_bytes());
        w.put(&self.phase_linear.to_le_bytes());
        w.put(&self.validity_period.to_le_bytes());
        w.put(&self.output_pps.to_le_bytes());
        w.put(&self.first_output_timestamp.to_le_bytes());
        out
    }
}

impl RegisterRecordV2 {
    pub fn to_le_bytes(&self) -> [u8; 48] {
        let mut out = [0u8; 48];
        let mut w = ByteWriter::new(&mut out);
        w.put(&self.first_input_timestamp.to_le_bytes());
        w.put(&self.delay_constant.to_le_bytes());
        w.put(&self.phase_constant.to_le_bytes());
        w.put(&self.delay_linear.to_le_bytes());
        w.put(&self.phase_linear.to_le_bytes());
        w.put(&self.validity_period.to_le_bytes());
        w.put(&self.output_pps.to_le_bytes());
        w.put(&self.first_output_timestamp.to_le_bytes());
        out
    }
}

struct ByteWriter<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> ByteWriter<'a> {
    fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn put(&mut self, bytes: &[u8]) {
        self.buf[self.pos..self.pos + bytes.len()].copy_from_slice(bytes);
        self.pos += bytes.len();
    }
}

/// Register fields widened to the largest type any version uses.
///
/// This is the version-independent view used for exports and reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterFields {
    pub first_input_timestamp: u64,
    pub delay_constant: u32,
    pub phase_constant: i32,
    pub delay_linear: u64,
    pub phase_linear: i64,
    pub validity_period: u32,
    #[serde(rename = "output_PPS")]
    pub output_pps: u32,
    pub first_output_timestamp: u64,
}

/// One encoded register record of either layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RegisterRecord {
    V1(RegisterRecordV1),
    V2(RegisterRecordV2),
}

impl RegisterRecord {
    /// Narrow `fields` into the layout of `version`.
    pub fn from_fields(version: RegisterVersion, fields: RegisterFields) -> Result<Self, EncodeError> {
        Ok(match version {
            RegisterVersion::V1 => RegisterRecord::V1(RegisterRecordV1 {
                first_input_timestamp: fields.first_input_timestamp,
                delay_constant: fields.delay_constant,
                phase_constant: fields.phase_constant,
                delay_linear: u32::try_from(fields.delay_linear)
                    .map_err(|_| EncodeError::FieldOverflow { field: "delay_linear" })?,
                phase_linear: i32::try_from(fields.phase_linear)
                    .map_err(|_| EncodeError::FieldOverflow { field: "phase_linear" })?,
                validity_period: fields.validity_period,
                output_pps: fields.output_pps,
                first_output_timestamp: fields.first_output_timestamp,
            }),
            RegisterVersion::V2 => RegisterRecord::V2(RegisterRecordV2 {
                first_input_timestamp: fields.first_input_timestamp,
                delay_constant: fields.delay_constant,
                phase_constant: fields.phase_constant,
                delay_linear: fields.delay_linear,
                phase_linear: fields.phase_linear,
                validity_period: fields.validity_period,
                output_pps: fields.output_pps,
                first_output_timestamp: fields.first_output_timestamp,
            }),
        })
    }

    pub fn version(&self) -> RegisterVersion {
        match self {
            RegisterRecord::V1(_) => RegisterVersion::V1,
            RegisterRecord::V2(_) => RegisterVersion::V2,
        }
    }

    pub fn fields(&self) -> RegisterFields {
        match *self {
            RegisterRecord::V1(r) => RegisterFields {
                first_input_timestamp: r.first_input_timestamp,
                delay_constant: r.delay_constant,
                phase_constant: r.phase_constant,
                delay_linear: u64::from(r.delay_linear),
                phase_linear: i64::from(r.phase_linear),
                validity_period: r.validity_period,
                output_pps: r.output_pps,
                first_output_timestamp: r.first_output_timestamp,
            },
            RegisterRecord::V2(r) => RegisterFields {
                first_input_timestamp: r.first_input_timestamp,
                delay_constant: r.delay_constant,
                phase_constant: r.phase_constant,
                delay_linear: r.delay_linear,
                phase_linear: r.phase_linear,
                validity_period: r.validity_period,
                output_pps: r.output_pps,
                first_output_timestamp: r.first_output_timestamp,
            },
        }
    }

    pub fn to_le_bytes(&self) -> Vec<u8> {
        match self {
            RegisterRecord::V1(r) => r.to_le_bytes().to_vec(),
            RegisterRecord::V2(r) => r.to_le_bytes().to_vec(),
        }
    }
}
