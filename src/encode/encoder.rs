//! Linear segment -> FODM register fields.
//!
//! Every intermediate is carried in [`Precise`]; values are only converted to
//! integers at the very end, after scaling to their fixed-point format:
//!
//! | field | format |
//! |---|---|
//! | `delay_linear` | unsigned, 2^31 (V1) or 2^63 (V2) fractional bits |
//! | `phase_linear` | signed turns, 2^31 (V1) or 2^63 (V2) |
//! | `delay_constant` | unsigned input-sample fraction, 2^32 |
//! | `phase_constant` | signed turns, 2^31 |

use rayon::prelude::*;
use tracing::debug;

use super::profile::EncoderProfile;
use super::register::{RegisterFields, RegisterRecord};
use crate::domain::{
    DelayLinearFormula, EncoderInputRow, LinearSegment, PhaseConstantFormula, PhysicalParameters,
    RegisterVersion, TimeFactorOrigin,
};
use crate::math::Precise;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodeError {
    #[error("sample rates must be non-zero (input={input}, output={output})")]
    ZeroSampleRate { input: u32, output: u32 },
    #[error("{what} is not a finite number")]
    NonFinite { what: &'static str },
    #[error("validity window is empty: stop does not reach the next output sample after start")]
    EmptyValidityWindow,
    #[error("{field} would be negative")]
    NegativeTimestamp { field: &'static str },
    #[error("{field} does not fit its register field")]
    FieldOverflow { field: &'static str },
}

/// Encoder input with times already in extended precision.
///
/// Times are seconds since the epoch; `delay_linear` is in ns/s and
/// `delay_constant` (the delay at `start`) in ns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeInput {
    pub ho_start: Precise,
    pub start: Precise,
    pub stop: Precise,
    pub delay_linear: Precise,
    pub delay_constant: Precise,
}

fn finite(value: f64, what: &'static str) -> Result<Precise, EncodeError> {
    Precise::from_f64(value).ok_or(EncodeError::NonFinite { what })
}

impl EncodeInput {
    pub fn from_segment(segment: &LinearSegment, ho_start: f64) -> Result<Self, EncodeError> {
        Ok(Self {
            ho_start: finite(ho_start, "polynomial start")?,
            start: finite(segment.start, "segment start")?,
            stop: finite(segment.stop, "segment stop")?,
            delay_linear: finite(segment.slope, "delay rate")?,
            delay_constant: finite(segment.intercept, "delay constant")?,
        })
    }

    /// Build from millisecond timestamps (the CSV convention).
    pub fn from_millis(
        ho_start_ms: Precise,
        start_ms: Precise,
        stop_ms: Precise,
        delay_linear: Precise,
        delay_constant: Precise,
    ) -> Self {
        let milli = Precise::from(1000u32);
        Self {
            ho_start: ho_start_ms / &milli,
            start: start_ms / &milli,
            stop: stop_ms / &milli,
            delay_linear,
            delay_constant,
        }
    }

    pub fn from_row(row: &EncoderInputRow) -> Result<Self, EncodeError> {
        Ok(Self::from_millis(
            finite(row.hodm_start_t, "hodm_start_t")?,
            finite(row.fodm_start_t, "fodm_start_t")?,
            finite(row.fodm_stop_t, "fodm_stop_t")?,
            finite(row.fo_delay_linear, "fo_delay_linear")?,
            finite(row.fo_delay_const, "fo_delay_const")?,
        ))
    }
}

/// Register record plus the unscaled values it was derived from.
#[derive(Debug, Clone)]
pub struct Encoding {
    pub record: RegisterRecord,
    /// `input_rate / output_rate`.
    pub resampling_rate: Precise,
    /// Unscaled `delay_linear` ratio.
    pub delay_linear: Precise,
    /// `delay_linear` quantisation error accumulated over the window, in input samples.
    pub delay_linear_error: Precise,
    /// `phase_linear` in turns per output sample, reduced to `[-0.5, 0.5)`.
    pub phase_linear: Precise,
    /// `phase_constant` in turns, reduced to `[-0.5, 0.5)`.
    pub phase_constant: Precise,
}

#[derive(Debug, Clone, Default)]
pub struct Encoder {
    profile: EncoderProfile,
}

impl Encoder {
    pub fn new(profile: EncoderProfile) -> Self {
        Self { profile }
    }

    pub fn for_version(version: RegisterVersion) -> Self {
        Self::new(EncoderProfile::for_version(version))
    }

    pub fn profile(&self) -> &EncoderProfile {
        &self.profile
    }

    /// Encode one fitted segment. `ho_start` is the start of the polynomial the
    /// segment was fitted from (seconds since the epoch).
    pub fn encode(
        &self,
        segment: &LinearSegment,
        ho_start: f64,
        params: &PhysicalParameters,
    ) -> Result<RegisterRecord, EncodeError> {
        let input = EncodeInput::from_segment(segment, ho_start)?;
        self.encode_input(&input, params)
    }

    pub fn encode_input(
        &self,
        input: &EncodeInput,
        params: &PhysicalParameters,
    ) -> Result<RegisterRecord, EncodeError> {
        self.encode_detailed(input, params).map(|e| e.record)
    }

    /// Encode segments in parallel; one result per segment, in order.
    pub fn encode_batch(
        &self,
        segments: &[LinearSegment],
        ho_start: f64,
        params: &PhysicalParameters,
    ) -> Vec<Result<RegisterRecord, EncodeError>> {
        segments
            .par_iter()
            .map(|segment| self.encode(segment, ho_start, params))
            .collect()
    }

    pub fn encode_detailed(
        &self,
        input: &EncodeInput,
        params: &PhysicalParameters,
    ) -> Result<Encoding, EncodeError> {
        if params.input_sample_rate == 0 || params.output_sample_rate == 0 {
            return Err(EncodeError::ZeroSampleRate {
                input: params.input_sample_rate,
                output: params.output_sample_rate,
            });
        }
        let p = &self.profile;
        let one = Precise::one();
        let nano = Precise::from(1_000_000_000u32);
        let input_rate = Precise::from(params.input_sample_rate);
        let output_rate = Precise::from(params.output_sample_rate);

        let fo_delay_linear = &input.delay_linear / &nano;
        let fo_delay_constant = &input.delay_constant / &nano;

        // Delay.
        let resampling_rate = &input_rate / &output_rate;
        let delay_linear = match p.delay_linear {
            DelayLinearFormula::ScaledRatio => &resampling_rate * &(&one + &fo_delay_linear),
            DelayLinearFormula::Additive => &resampling_rate + &fo_delay_linear,
        };
        let linear_scale = Precise::pow2(p.version.linear_bits());
        let delay_linear_scaled = (&delay_linear * &linear_scale).round(p.rounding);

        let current = (&output_rate * &input.start).floor();
        let next = (&output_rate * &input.stop).floor();
        let window = &next - &current;
        if window < one {
            return Err(EncodeError::EmptyValidityWindow);
        }

        let delay_linear_error = if p.redistribute_linear_error {
            let quantised = &delay_linear_scaled / &linear_scale;
            &quantised * &window - &delay_linear * &window
        } else {
            Precise::zero()
        };
        let delay_constant_input =
            &fo_delay_constant * &input_rate - &delay_linear_error / Precise::from(2u32);

        let first_input = &resampling_rate * &current + &delay_constant_input;
        let mut first_input_int = first_input.floor();
        let fraction_scale = Precise::pow2(32);
        let mut delay_constant_scaled =
            ((&first_input - &first_input_int) * &fraction_scale).round(p.rounding);
        if delay_constant_scaled >= fraction_scale {
            delay_constant_scaled = &delay_constant_scaled - &fraction_scale;
            first_input_int = &first_input_int + &one;
        }
        if first_input_int.is_negative() {
            return Err(EncodeError::NegativeTimestamp {
                field: "first_input_timestamp",
            });
        }

        // Phase.
        let down_shift = finite(params.freq_down_shift, "freq_down_shift")?;
        let down_shift = if p.negate_down_shift { -down_shift } else { down_shift };
        let wb_minus_ds = finite(params.freq_wb_shift, "freq_wb_shift")? - down_shift;
        let scfo_plus_as = finite(params.freq_scfo_shift, "freq_scfo_shift")?
            + finite(params.freq_align_shift, "freq_align_shift")?;

        let phase_linear_temp = (&scfo_plus_as + &(&wb_minus_ds * &fo_delay_linear)) / &output_rate;
        let origin = match p.time_factor_origin {
            TimeFactorOrigin::Epoch => input.start.clone(),
            TimeFactorOrigin::PolynomialStart => &input.start - &input.ho_start,
        };
        let time_factor = (&origin * &output_rate).floor();
        let phase_constant_temp = match p.phase_constant {
            PhaseConstantFormula::FullLinear => &time_factor * &phase_linear_temp,
            PhaseConstantFormula::ShiftOnly => &(&time_factor * &scfo_plus_as) / &output_rate,
        } + &wb_minus_ds * &fo_delay_constant;

        let phase_linear = phase_linear_temp.mod_pmhalf();
        let phase_constant = phase_constant_temp.mod_pmhalf();
        let phase_linear_scaled = (&phase_linear * &linear_scale).round(p.rounding);
        let phase_constant_scaled = (&phase_constant * &Precise::pow2(31)).round(p.rounding);

        let pps = (&current / &output_rate).ceil() * &output_rate;

        debug!(
            resampling_rate = %resampling_rate,
            delay_linear = %delay_linear,
            window = %window,
            delay_linear_error = %delay_linear_error,
            first_input = %first_input,
            phase_linear_temp = %phase_linear_temp,
            phase_constant_temp = %phase_constant_temp,
            time_factor = %time_factor,
            "encoded segment"
        );

        let fields = RegisterFields {
            first_input_timestamp: first_input_int
                .to_u64()
                .ok_or(EncodeError::FieldOverflow { field: "first_input_timestamp" })?,
            delay_constant: to_u32(&delay_constant_scaled, "delay_constant")?,
            phase_constant: to_i32(&phase_constant_scaled, "phase_constant")?,
            delay_linear: delay_linear_scaled
                .to_u64()
                .ok_or(EncodeError::FieldOverflow { field: "delay_linear" })?,
            phase_linear: phase_linear_scaled
                .to_i64()
                .ok_or(EncodeError::FieldOverflow { field: "phase_linear" })?,
            validity_period: to_u32(&(&window - &one), "validity_period")?,
            output_pps: (pps
                .to_u64()
                .ok_or(EncodeError::NegativeTimestamp { field: "output_PPS" })?
                & 0xffff_ffff) as u32,
            first_output_timestamp: current
                .to_u64()
                .ok_or(EncodeError::NegativeTimestamp { field: "first_output_timestamp" })?,
        };

        Ok(Encoding {
            record: RegisterRecord::from_fields(p.version, fields)?,
            resampling_rate,
            delay_linear,
            delay_linear_error,
            phase_linear,
            phase_constant,
        })
    }
}

fn to_u32(value: &Precise, field: &'static str) -> Result<u32, EncodeError> {
    if value.is_negative() {
        return Err(EncodeError::FieldOverflow { field });
    }
    value
        .to_u64()
        .and_then(|v| u32::try_from(v).ok())
        .ok_or(EncodeError::FieldOverflow { field })
}

fn to_i32(value: &Precise, field: &'static str) -> Result<i32, EncodeError> {
    value
        .to_i64()
        .and_then(|v| i32::try_from(v).ok())
        .ok_or(EncodeError::FieldOverflow { field })
}
