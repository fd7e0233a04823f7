//! Status, error and buffer identifier enums.
//!
//! All enums use `#[repr(u8)]` so their discriminants are exactly the values
//! published through the `Status`, `Error` and `CurrentBuffer` registers.

use serde::{Deserialize, Serialize};

/// Engine lifecycle status (`Status` register).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum EngineStatus {
    /// Configured, not yet activated. The only state accepting `BufferLength`.
    Initialised = 0,
    /// Consuming points every tick.
    Active = 1,
    /// Starved or aborted. Resumes on fresh data or abort release.
    Idle = 2,
    /// Faulted. Terminal until re-initialisation.
    Error = 3,
}

impl EngineStatus {
    /// Convert from raw `u8`. Returns `None` for invalid values.
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Initialised),
            1 => Some(Self::Active),
            2 => Some(Self::Idle),
            3 => Some(Self::Error),
            _ => None,
        }
    }

    /// Whether the consumer side owns the current buffer.
    #[inline]
    pub const fn is_running(self) -> bool {
        matches!(self, Self::Active | Self::Idle)
    }
}

impl Default for EngineStatus {
    fn default() -> Self {
        Self::Initialised
    }
}

/// Latched fault code (`Error` register).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ErrorCode {
    None = 0,
    /// `Axes` register outside 1..=511 at activation.
    InvalidAxes = 1,
    /// A point with a move time of zero reached the executor.
    ZeroMoveTime = 2,
    /// Servo layer reported a runtime or following error.
    RuntimeOrFollowingError = 3,
}

impl ErrorCode {
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::None),
            1 => Some(Self::InvalidAxes),
            2 => Some(Self::ZeroMoveTime),
            3 => Some(Self::RuntimeOrFollowingError),
            _ => None,
        }
    }

    #[inline]
    pub const fn is_fault(self) -> bool {
        !matches!(self, Self::None)
    }
}

impl Default for ErrorCode {
    fn default() -> Self {
        Self::None
    }
}

/// One of the two ping-pong point buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum BufferId {
    A = 0,
    B = 1,
}

impl BufferId {
    pub const BOTH: [BufferId; 2] = [Self::A, Self::B];

    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::A),
            1 => Some(Self::B),
            _ => None,
        }
    }

    /// The alternate buffer.
    #[inline]
    pub const fn other(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl Default for BufferId {
    fn default() -> Self {
        Self::A
    }
}

impl std::fmt::Display for BufferId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::A => f.write_str("A"),
            Self::B => f.write_str("B"),
        }
    }
}
