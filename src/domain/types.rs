//! Shared domain types.
//!
//! These types are kept lightweight and serializable so they can be:
//!
//! - passed between the fitter and the encoder in-memory
//! - loaded from TOML run files and CSV inputs
//! - exported to JSON/CSV alongside the encoded registers

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// A high-order delay polynomial valid on `[start, stop)`.
///
/// Coefficients are ordered highest degree first, in ns, ns/s, ns/s², ...
/// The polynomial variable is time in seconds measured from `start`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighOrderPolynomial {
    pub start: f64,
    pub stop: f64,
    pub coeffs: Vec<f64>,
}

impl HighOrderPolynomial {
    pub fn new(start: f64, stop: f64, coeffs: Vec<f64>) -> Result<Self, AppError> {
        let poly = Self {
            start,
            stop,
            coeffs,
        };
        poly.validate()?;
        Ok(poly)
    }

    /// Build from the packed `[start, stop, c_n, ..., c_0]` layout used by
    /// delay-model dumps.
    pub fn from_packed(packed: &[f64]) -> Result<Self, AppError> {
        match packed {
            [start, stop, coeffs @ ..] => Self::new(*start, *stop, coeffs.to_vec()),
            _ => Err(AppError::new(
                3,
                "Packed polynomial needs at least start, stop and one coefficient.",
            )),
        }
    }

    /// Check the invariants `new` enforces (used again after deserialization).
    pub fn validate(&self) -> Result<(), AppError> {
        if self.coeffs.is_empty() {
            return Err(AppError::new(3, "Polynomial has no coefficients."));
        }
        if let Some(bad) = self.coeffs.iter().position(|c| !c.is_finite()) {
            return Err(AppError::new(
                3,
                format!("Polynomial coefficient {bad} is not finite."),
            ));
        }
        if !self.start.is_finite() || !self.stop.is_finite() {
            return Err(AppError::new(3, "Polynomial validity window must be finite."));
        }
        Ok(())
    }

    pub fn degree(&self) -> usize {
        self.coeffs.len().saturating_sub(1)
    }
}

/// A first-order approximation of the delay over `[start, stop)`.
///
/// `slope` is in ns/s and `intercept` (the delay at `start`) in ns.
/// `start`/`stop` are seconds since the epoch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearSegment {
    pub start: f64,
    pub stop: f64,
    pub slope: f64,
    pub intercept: f64,
}

impl LinearSegment {
    /// Delay (ns) at `t` seconds since the epoch.
    pub fn delay_at(&self, t: f64) -> f64 {
        self.intercept + self.slope * (t - self.start)
    }
}

/// Sample rates and frequency shifts of one signal path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicalParameters {
    /// Samples per second entering the resampler.
    pub input_sample_rate: u32,
    /// Samples per second leaving the resampler.
    pub output_sample_rate: u32,
    /// Down-conversion shift (Hz).
    #[serde(default)]
    pub freq_down_shift: f64,
    /// Alignment shift (Hz).
    #[serde(default)]
    pub freq_align_shift: f64,
    /// Wideband shift (Hz).
    #[serde(default)]
    pub freq_wb_shift: f64,
    /// Sample-clock frequency offset shift (Hz).
    #[serde(default)]
    pub freq_scfo_shift: f64,
}

impl PhysicalParameters {
    /// Rates only, all frequency shifts zero.
    pub fn with_rates(input_sample_rate: u32, output_sample_rate: u32) -> Self {
        Self {
            input_sample_rate,
            output_sample_rate,
            freq_down_shift: 0.0,
            freq_align_shift: 0.0,
            freq_wb_shift: 0.0,
            freq_scfo_shift: 0.0,
        }
    }
}

/// Register layout generation.
///
/// `V1` packs the linear terms into 32-bit fields, `V2` widens them to 64 bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RegisterVersion {
    V1,
    #[default]
    V2,
}

impl RegisterVersion {
    /// Fractional bits of `delay_linear` and `phase_linear`.
    pub fn linear_bits(self) -> u32 {
        match self {
            RegisterVersion::V1 => 31,
            RegisterVersion::V2 => 63,
        }
    }

    /// Size of one packed record in bytes.
    pub fn record_len(self) -> usize {
        match self {
            RegisterVersion::V1 => 40,
            RegisterVersion::V2 => 48,
        }
    }
}

/// How the FO delay rate is combined with the resampling ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum DelayLinearFormula {
    /// `rr * (1 + rate)`.
    ScaledRatio,
    /// `rr + rate` (legacy firmware).
    Additive,
}

/// How `phase_constant` is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum PhaseConstantFormula {
    /// `time_factor * phase_linear + (f_wb - f_ds) * delay`.
    FullLinear,
    /// `time_factor * (f_scfo + f_align) / output_rate + (f_wb - f_ds) * delay`.
    ShiftOnly,
}

/// Reference point of the `time_factor` sample count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum TimeFactorOrigin {
    /// Output samples since the epoch.
    #[default]
    Epoch,
    /// Output samples since the start of the HO polynomial.
    PolynomialStart,
}

/// Tie-breaking rule used when scaled fields are rounded to integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Rounding {
    /// Ties away from zero, like C `round`.
    #[default]
    HalfAwayFromZero,
    /// Ties to even (banker's rounding).
    HalfEven,
}

/// One row of encoder input as written by the synthetic generator.
///
/// Times are milliseconds since the epoch, delays in ns and ns/s, shifts in Hz.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncoderInputRow {
    pub fo_delay_const: f64,
    pub fo_delay_linear: f64,
    pub fodm_start_t: f64,
    pub fodm_stop_t: f64,
    pub hodm_start_t: f64,
    pub input_sample_rate: u32,
    pub output_sample_rate: u32,
    pub f_wb: f64,
    pub f_as: f64,
    pub f_ds: f64,
    pub f_scfo: f64,
}

impl EncoderInputRow {
    pub fn params(&self) -> PhysicalParameters {
        PhysicalParameters {
            input_sample_rate: self.input_sample_rate,
            output_sample_rate: self.output_sample_rate,
            freq_down_shift: self.f_ds,
            freq_align_shift: self.f_as,
            freq_wb_shift: self.f_wb,
            freq_scfo_shift: self.f_scfo,
        }
    }
}
