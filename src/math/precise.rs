//! Extended-precision scalar.
//!
//! Register fields are derived from products such as `output_rate * t` where `t`
//! is a time since the epoch (~1e9 s) and the result must keep sub-sample
//! fractions, so `f64` silently loses the digits that end up in the hardware
//! registers. Everything on that path goes through [`Precise`] instead.
//!
//! `Precise` wraps a `BigDecimal` and rounds every arithmetic result to
//! [`SIGNIFICANT_DIGITS`] significant digits, which keeps the representation
//! bounded and the results reproducible. Callers use the ordinary operators;
//! nothing outside this module touches `bigdecimal` directly.

use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};
use std::str::FromStr;

use bigdecimal::{BigDecimal, ParseBigDecimalError, RoundingMode};
use num_bigint::BigInt;
use num_traits::{FromPrimitive, One, ToPrimitive, Zero};

use crate::domain::Rounding;

/// Significant decimal digits carried by every intermediate result.
pub const SIGNIFICANT_DIGITS: u64 = 50;

#[derive(Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Precise(BigDecimal);

impl Precise {
    fn rounded(value: BigDecimal) -> Self {
        if value.digits() > SIGNIFICANT_DIGITS {
            Self(value.with_prec(SIGNIFICANT_DIGITS))
        } else {
            Self(value)
        }
    }

    pub fn zero() -> Self {
        Self(BigDecimal::zero())
    }

    pub fn one() -> Self {
        Self(BigDecimal::one())
    }

    /// `2^exp`, exact.
    pub fn pow2(exp: u32) -> Self {
        let value = BigInt::one() << (exp as usize);
        Self(BigDecimal::new(value, 0))
    }

    /// Exact decimal expansion of a finite `f64` (rounded to the working precision).
    ///
    /// Returns `None` for NaN and infinities.
    pub fn from_f64(value: f64) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }
        BigDecimal::from_f64(value).map(Self::rounded)
    }

    /// `numerator / 10^scale`, exact (e.g. `from_scaled(15, 1) == 1.5`).
    pub fn from_scaled(numerator: i64, scale: i64) -> Self {
        Self::rounded(BigDecimal::new(BigInt::from(numerator), scale))
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.0 < BigDecimal::zero()
    }

    pub fn abs(&self) -> Self {
        if self.is_negative() { -self } else { self.clone() }
    }

    fn to_integer(&self, mode: RoundingMode) -> Self {
        Self(self.0.with_scale_round(0, mode))
    }

    pub fn floor(&self) -> Self {
        self.to_integer(RoundingMode::Floor)
    }

    pub fn ceil(&self) -> Self {
        self.to_integer(RoundingMode::Ceiling)
    }

    pub fn trunc(&self) -> Self {
        self.to_integer(RoundingMode::Down)
    }

    /// Round to the nearest integer; ties are resolved by `rounding`.
    pub fn round(&self, rounding: Rounding) -> Self {
        let mode = match rounding {
            Rounding::HalfAwayFromZero => RoundingMode::HalfUp,
            Rounding::HalfEven => RoundingMode::HalfEven,
        };
        self.to_integer(mode)
    }

    /// C `fmod(self, 1)`: the fractional part, carrying the sign of `self`.
    pub fn fmod_one(&self) -> Self {
        self - &self.trunc()
    }

    /// Reduce a phase expressed in turns into `[-0.5, 0.5)`.
    ///
    /// `fmod(fmod(v, 1) + 1.5, 1) - 0.5`
    pub fn mod_pmhalf(&self) -> Self {
        let one_and_half = Self::from_scaled(15, 1);
        let half = Self::from_scaled(5, 1);
        (&self.fmod_one() + &one_and_half).fmod_one() - half
    }

    /// `self / rhs`, or `None` when `rhs` is zero.
    pub fn checked_div(&self, rhs: &Precise) -> Option<Precise> {
        if rhs.is_zero() { None } else { Some(self / rhs) }
    }

    /// Integer part as `u64` (truncating); `None` when negative or too large.
    pub fn to_u64(&self) -> Option<u64> {
        let (int, _) = self.0.with_scale_round(0, RoundingMode::Down).as_bigint_and_exponent();
        int.to_u64()
    }

    /// Integer part as `i64` (truncating); `None` when out of range.
    pub fn to_i64(&self) -> Option<i64> {
        let (int, _) = self.0.with_scale_round(0, RoundingMode::Down).as_bigint_and_exponent();
        int.to_i64()
    }

    /// Nearest `f64` (NaN if the value is out of `f64` range).
    pub fn to_f64(&self) -> f64 {
        self.0.to_f64().unwrap_or(f64::NAN)
    }
}

impl From<u32> for Precise {
    fn from(value: u32) -> Self {
        Self(BigDecimal::from(value))
    }
}

impl From<u64> for Precise {
    fn from(value: u64) -> Self {
        Self::rounded(BigDecimal::from(value))
    }
}

impl From<i64> for Precise {
    fn from(value: i64) -> Self {
        Self::rounded(BigDecimal::from(value))
    }
}

impl FromStr for Precise {
    type Err = ParseBigDecimalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BigDecimal::from_str(s.trim()).map(Self::rounded)
    }
}

impl fmt::Display for Precise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl fmt::Debug for Precise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Precise({})", self.0)
    }
}

macro_rules! forward_binop {
    ($op:ident, $method:ident) => {
        impl $op<&Precise> for &Precise {
            type Output = Precise;

            fn $method(self, rhs: &Precise) -> Precise {
                Precise::rounded((&self.0).$method(&rhs.0))
            }
        }

        impl $op<Precise> for Precise {
            type Output = Precise;

            fn $method(self, rhs: Precise) -> Precise {
                (&self).$method(&rhs)
            }
        }

        impl $op<&Precise> for Precise {
            type Output = Precise;

            fn $method(self, rhs: &Precise) -> Precise {
                (&self).$method(rhs)
            }
        }

        impl $op<Precise> for &Precise {
            type Output = Precise;

            fn $method(self, rhs: Precise) -> Precise {
                self.$method(&rhs)
            }
        }
    };
}

forward_binop!(Add, add);
forward_binop!(Sub, sub);
forward_binop!(Mul, mul);
// Division by zero panics, as with the primitive integer types; use
// `checked_div` when the divisor is not known to be non-zero.
forward_binop!(Div, div);

impl Neg for Precise {
    type Output = Precise;

    fn neg(self) -> Precise {
        Precise(-self.0)
    }
}

impl Neg for &Precise {
    type Output = Precise;

    fn neg(self) -> Precise {
        Precise(-self.0.clone())
    }
}
