//! Fixed-point positions and velocities.
//!
//! Coordinates in point memory are Q39.24 words. Velocities use the same
//! representation so the executor never touches floating point.

use std::fmt;
use std::ops::{Add, Neg, Sub};

use serde::{Deserialize, Serialize};

use crate::consts::TICKS_PER_MS;

/// Signed Q39.24 fixed-point value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fixed(i64);

impl Fixed {
    /// Number of fractional bits.
    pub const FRAC_BITS: u32 = 24;
    pub const ZERO: Self = Self(0);
    pub const ONE: Self = Self(1 << Self::FRAC_BITS);
    pub const MAX: Self = Self(i64::MAX);
    pub const MIN: Self = Self(i64::MIN);

    /// Wrap a raw point-memory word.
    #[inline]
    pub const fn from_raw(raw: i64) -> Self {
        Self(raw)
    }

    /// The raw word as stored in point memory.
    #[inline]
    pub const fn raw(self) -> i64 {
        self.0
    }

    /// Integer value, saturating at the representable range.
    #[inline]
    pub const fn from_int(value: i64) -> Self {
        Self(value.saturating_mul(1 << Self::FRAC_BITS))
    }

    /// Nearest representable value; NaN maps to zero, infinities saturate.
    pub fn from_f64(value: f64) -> Self {
        // `as` saturates on overflow and maps NaN to 0.
        Self((value * (1u64 << Self::FRAC_BITS) as f64).round() as i64)
    }

    pub fn to_f64(self) -> f64 {
        self.0 as f64 / (1u64 << Self::FRAC_BITS) as f64
    }

    #[inline]
    pub const fn abs(self) -> Self {
        Self(self.0.saturating_abs())
    }

    #[inline]
    pub const fn saturating_add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }

    #[inline]
    pub const fn saturating_sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }
}

impl Add for Fixed {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        self.saturating_add(rhs)
    }
}

impl Sub for Fixed {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        self.saturating_sub(rhs)
    }
}

impl Neg for Fixed {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Self(self.0.saturating_neg())
    }
}

impl fmt::Display for Fixed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}", self.to_f64())
    }
}

// ─── Velocity scaling ───────────────────────────────────────────────

/// Unit of time the computed velocity is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeBase {
    /// Units per quarter-millisecond tick.
    #[default]
    Tick,
    /// Units per millisecond.
    Millisecond,
}

impl TimeBase {
    const fn ticks_per_unit(self) -> i128 {
        match self {
            Self::Tick => 1,
            Self::Millisecond => TICKS_PER_MS as i128,
        }
    }
}

/// Rounding applied to the fixed-point quotient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rounding {
    /// Toward zero.
    #[default]
    Truncate,
    /// Toward negative infinity.
    Floor,
    /// Half away from zero.
    Nearest,
}

/// How `(target - previous) / time` is turned into a velocity word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VelocityScaling {
    pub time_base: TimeBase,
    pub rounding: Rounding,
}

impl VelocityScaling {
    pub const fn new(time_base: TimeBase, rounding: Rounding) -> Self {
        Self { time_base, rounding }
    }

    /// Velocity covering `delta` in `time_ticks` quarter-ms ticks.
    ///
    /// Returns `None` for a zero move time. The quotient is computed in
    /// 128 bits and saturated to the `Fixed` range.
    pub fn velocity(&self, delta: Fixed, time_ticks: u32) -> Option<Fixed> {
        if time_ticks == 0 {
            return None;
        }
        let num = delta.raw() as i128 * self.time_base.ticks_per_unit();
        let den = time_ticks as i128;
        let quotient = match self.rounding {
            Rounding::Truncate => num / den,
            Rounding::Floor => num.div_euclid(den),
            Rounding::Nearest => {
                let magnitude = (2 * num.abs() + den) / (2 * den);
                if num < 0 { -magnitude } else { magnitude }
            }
        };
        Some(Fixed::from_raw(
            quotient.clamp(i64::MIN as i128, i64::MAX as i128) as i64,
        ))
    }
}
