//! Logical axes and the `Axes` register bitmask.
//!
//! Axes are ordered X, Y, Z, U, V, W, A, B, C. The same order gives the
//! coordinate sub-arrays inside a buffer block. In the `Axes` register X is
//! the most significant bit (256) and C the least (1), so X+Y is 384.

use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::{AXES_MASK_MAX, AXIS_COUNT};

/// One of the nine logical coordinate axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Axis {
    X = 0,
    Y = 1,
    Z = 2,
    U = 3,
    V = 4,
    W = 5,
    A = 6,
    B = 7,
    C = 8,
}

impl Axis {
    /// All axes in block order.
    pub const ALL: [Axis; AXIS_COUNT] = [
        Self::X,
        Self::Y,
        Self::Z,
        Self::U,
        Self::V,
        Self::W,
        Self::A,
        Self::B,
        Self::C,
    ];

    /// Convert from a 0-based index. Returns `None` for invalid values.
    #[inline]
    pub const fn from_index(index: usize) -> Option<Self> {
        if index < AXIS_COUNT {
            Some(Self::ALL[index])
        } else {
            None
        }
    }

    /// 0-based position in block order.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// The single-bit mask selecting this axis.
    #[inline]
    pub const fn mask(self) -> AxisMask {
        AxisMask::from_bits_truncate(1 << (AXIS_COUNT - 1 - self as usize))
    }

    /// Upper-case axis letter.
    pub const fn letter(self) -> char {
        match self {
            Self::A => 'A',
            Self::B => 'B',
            Self::C => 'C',
            Self::U => 'U',
            Self::V => 'V',
            Self::W => 'W',
            Self::X => 'X',
            Self::Y => 'Y',
            Self::Z => 'Z',
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

impl FromStr for Axis {
    type Err = AxisMaskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        match (chars.next().map(|c| c.to_ascii_uppercase()), chars.next()) {
            (Some(c), None) => Self::ALL
                .into_iter()
                .find(|axis| axis.letter() == c)
                .ok_or_else(|| AxisMaskError::UnknownAxis(s.to_string())),
            _ => Err(AxisMaskError::UnknownAxis(s.to_string())),
        }
    }
}

bitflags! {
    /// Value of the `Axes` register: one bit per enabled axis.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct AxisMask: u16 {
        const X = 0x100;
        const Y = 0x080;
        const Z = 0x040;
        const U = 0x020;
        const V = 0x010;
        const W = 0x008;
        const A = 0x004;
        const B = 0x002;
        const C = 0x001;
    }
}

/// Errors raised while interpreting axis selections.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AxisMaskError {
    /// Register value outside 1..=511.
    #[error("axes value {0} out of range [1, 511]")]
    OutOfRange(i64),

    /// Axis name not one of X, Y, Z, U, V, W, A, B, C.
    #[error("unknown axis '{0}'")]
    UnknownAxis(String),
}

impl AxisMask {
    /// Interpret a raw `Axes` register value.
    ///
    /// # Errors
    ///
    /// `AxisMaskError::OutOfRange` for 0, negative values and values above 511.
    pub fn from_register(value: i64) -> Result<Self, AxisMaskError> {
        if !(1..=AXES_MASK_MAX).contains(&value) {
            return Err(AxisMaskError::OutOfRange(value));
        }
        Ok(Self::from_bits_truncate(value as u16))
    }

    /// Raw register value.
    #[inline]
    pub const fn register_value(&self) -> i64 {
        self.bits() as i64
    }

    /// Whether `axis` is selected.
    #[inline]
    pub const fn has(&self, axis: Axis) -> bool {
        self.contains(axis.mask())
    }

    /// Selected axes in block order.
    pub fn axes(&self) -> heapless::Vec<Axis, AXIS_COUNT> {
        let mut out = heapless::Vec::new();
        for axis in Axis::ALL {
            if self.has(axis) {
                // Capacity equals the number of axes, push cannot fail.
                let _ = out.push(axis);
            }
        }
        out
    }
}

impl FromIterator<Axis> for AxisMask {
    fn from_iter<I: IntoIterator<Item = Axis>>(iter: I) -> Self {
        iter.into_iter()
            .fold(AxisMask::empty(), |mask, axis| mask | axis.mask())
    }
}
