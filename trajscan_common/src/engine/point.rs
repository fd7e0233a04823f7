//! Trajectory points and the packed time word.
//!
//! The time slot of a buffer block holds three fields in one word:
//!
//! ```text
//! bits  0..23  move time in quarter-millisecond ticks
//! bits 24..27  user code (subroutine selector)
//! bits 28..31  velocity mode
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::axis::Axis;
use super::fixed::Fixed;
use crate::consts::{AXIS_COUNT, MOVE_TIME_MAX, USER_CODE_MAX};

pub const TIME_SHIFT: u32 = 0;
pub const TIME_WIDTH: u32 = 24;
pub const USER_SHIFT: u32 = 24;
pub const USER_WIDTH: u32 = 4;
pub const VEL_MODE_SHIFT: u32 = 28;
pub const VEL_MODE_WIDTH: u32 = 4;

/// How the servo blends velocity across a point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum VelocityMode {
    /// Blend the incoming and outgoing segment velocities.
    #[default]
    Average = 0,
    /// Use the velocity of the segment ending at this point.
    Incoming = 1,
    /// Use the velocity of the segment starting at this point.
    Outgoing = 2,
}

impl VelocityMode {
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Average),
            1 => Some(Self::Incoming),
            2 => Some(Self::Outgoing),
            _ => None,
        }
    }
}

/// Errors raised while packing or unpacking a point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PointError {
    #[error("move time {0} exceeds 24 bits")]
    MoveTimeOutOfRange(u32),

    #[error("user code {0} exceeds 4 bits")]
    UserCodeOutOfRange(u8),

    #[error("unknown velocity mode {0}")]
    InvalidVelocityMode(u8),
}

/// One sample of a pre-planned trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TrajectoryPoint {
    /// Move time in quarter-millisecond ticks.
    pub time: u32,
    /// Target coordinate per axis, indexed by [`Axis::index`].
    pub coordinates: [Fixed; AXIS_COUNT],
    pub user_code: u8,
    pub velocity_mode: VelocityMode,
}

impl TrajectoryPoint {
    /// A point at the origin on every axis.
    pub const fn new(time: u32) -> Self {
        Self {
            time,
            coordinates: [Fixed::ZERO; AXIS_COUNT],
            user_code: 0,
            velocity_mode: VelocityMode::Average,
        }
    }

    #[must_use]
    pub const fn with_coordinate(mut self, axis: Axis, value: Fixed) -> Self {
        self.coordinates[axis.index()] = value;
        self
    }

    #[must_use]
    pub const fn with_user_code(mut self, user_code: u8) -> Self {
        self.user_code = user_code;
        self
    }

    #[must_use]
    pub const fn with_velocity_mode(mut self, mode: VelocityMode) -> Self {
        self.velocity_mode = mode;
        self
    }

    #[inline]
    pub const fn coordinate(&self, axis: Axis) -> Fixed {
        self.coordinates[axis.index()]
    }

    /// Check that every field fits its slot in the time word.
    pub const fn validate(&self) -> Result<(), PointError> {
        if self.time > MOVE_TIME_MAX {
            return Err(PointError::MoveTimeOutOfRange(self.time));
        }
        if self.user_code > USER_CODE_MAX {
            return Err(PointError::UserCodeOutOfRange(self.user_code));
        }
        Ok(())
    }

    /// Pack time, user code and velocity mode into one word.
    pub const fn time_word(&self) -> Result<u32, PointError> {
        if let Err(e) = self.validate() {
            return Err(e);
        }
        Ok((self.time << TIME_SHIFT)
            | ((self.user_code as u32) << USER_SHIFT)
            | ((self.velocity_mode as u32) << VEL_MODE_SHIFT))
    }
}

/// Fields recovered from a packed time word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWord {
    pub time: u32,
    pub user_code: u8,
    pub velocity_mode: VelocityMode,
}

impl TimeWord {
    /// Unpack a word read from point memory.
    pub const fn unpack(word: u32) -> Result<Self, PointError> {
        let mode = extract(word, VEL_MODE_SHIFT, VEL_MODE_WIDTH) as u8;
        let Some(velocity_mode) = VelocityMode::from_u8(mode) else {
            return Err(PointError::InvalidVelocityMode(mode));
        };
        Ok(Self {
            time: extract(word, TIME_SHIFT, TIME_WIDTH),
            user_code: extract(word, USER_SHIFT, USER_WIDTH) as u8,
            velocity_mode,
        })
    }
}

/// `width` bits of `word` starting at `shift`.
#[inline]
pub const fn extract(word: u32, shift: u32, width: u32) -> u32 {
    (word >> shift) & ((1u32 << width) - 1)
}
