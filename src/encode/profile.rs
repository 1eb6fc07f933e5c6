//! Encoder behaviour switches.
//!
//! The register formulas changed between firmware generations; each difference
//! is a separate option so that both generations (and mixtures, for
//! cross-checking against reference dumps) can be produced side by side.

use serde::{Deserialize, Serialize};

use crate::domain::{
    DelayLinearFormula, PhaseConstantFormula, RegisterVersion, Rounding, TimeFactorOrigin,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncoderProfile {
    pub version: RegisterVersion,
    pub delay_linear: DelayLinearFormula,
    /// Fold half of the `delay_linear` quantisation error, accumulated over the
    /// validity window, back into the constant term.
    pub redistribute_linear_error: bool,
    pub phase_constant: PhaseConstantFormula,
    pub time_factor_origin: TimeFactorOrigin,
    /// Use `-f_ds` in place of `f_ds` in the phase terms.
    pub negate_down_shift: bool,
    pub rounding: Rounding,
}

impl EncoderProfile {
    /// Defaults matching the firmware generation `version`.
    pub fn for_version(version: RegisterVersion) -> Self {
        match version {
            RegisterVersion::V1 => Self {
                version,
                delay_linear: DelayLinearFormula::Additive,
                redistribute_linear_error: false,
                phase_constant: PhaseConstantFormula::ShiftOnly,
                time_factor_origin: TimeFactorOrigin::Epoch,
                negate_down_shift: false,
                rounding: Rounding::HalfAwayFromZero,
            },
            RegisterVersion::V2 => Self {
                version,
                delay_linear: DelayLinearFormula::ScaledRatio,
                redistribute_linear_error: true,
                phase_constant: PhaseConstantFormula::FullLinear,
                time_factor_origin: TimeFactorOrigin::Epoch,
                negate_down_shift: false,
                rounding: Rounding::HalfAwayFromZero,
            },
        }
    }

    pub fn with_delay_linear(mut self, formula: DelayLinearFormula) -> Self {
        self.delay_linear = formula;
        self
    }

    pub fn with_redistribution(mut self, enabled: bool) -> Self {
        self.redistribute_linear_error = enabled;
        self
    }

    pub fn with_phase_constant(mut self, formula: PhaseConstantFormula) -> Self {
        self.phase_constant = formula;
        self
    }

    pub fn with_time_factor_origin(mut self, origin: TimeFactorOrigin) -> Self {
        self.time_factor_origin = origin;
        self
    }

    pub fn with_negated_down_shift(mut self, negate: bool) -> Self {
        self.negate_down_shift = negate;
        self
    }

    pub fn with_rounding(mut self, rounding: Rounding) -> Self {
        self.rounding = rounding;
        self
    }
}

impl Default for EncoderProfile {
    fn default() -> Self {
        Self::for_version(RegisterVersion::default())
    }
}

/// Partial profile, as read from a config file or the command line.
///
/// `None` leaves the corresponding option at its version default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProfileOverrides {
    pub version: Option<RegisterVersion>,
    pub delay_linear: Option<DelayLinearFormula>,
    pub redistribute_linear_error: Option<bool>,
    pub phase_constant: Option<PhaseConstantFormula>,
    pub time_factor_origin: Option<TimeFactorOrigin>,
    pub negate_down_shift: Option<bool>,
    pub rounding: Option<Rounding>,
}

impl ProfileOverrides {
    /// Layer `top` over `self` (values set in `top` win).
    pub fn merge(self, top: ProfileOverrides) -> ProfileOverrides {
        ProfileOverrides {
            version: top.version.or(self.version),
            delay_linear: top.delay_linear.or(self.delay_linear),
            redistribute_linear_error: top
                .redistribute_linear_error
                .or(self.redistribute_linear_error),
            phase_constant: top.phase_constant.or(self.phase_constant),
            time_factor_origin: top.time_factor_origin.or(self.time_factor_origin),
            negate_down_shift: top.negate_down_shift.or(self.negate_down_shift),
            rounding: top.rounding.or(self.rounding),
        }
    }

    pub fn resolve(self) -> EncoderProfile {
        let base = EncoderProfile::for_version(self.version.unwrap_or_default());
        EncoderProfile {
            version: base.version,
            delay_linear: self.delay_linear.unwrap_or(base.delay_linear),
            redistribute_linear_error: self
                .redistribute_linear_error
                .unwrap_or(base.redistribute_linear_error),
            phase_constant: self.phase_constant.unwrap_or(base.phase_constant),
            time_factor_origin: self.time_factor_origin.unwrap_or(base.time_factor_origin),
            negate_down_shift: self.negate_down_shift.unwrap_or(base.negate_down_shift),
            rounding: self.rounding.unwrap_or(base.rounding),
        }
    }
}
