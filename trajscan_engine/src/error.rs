//! Host-facing error types.
//!
//! These report misuse of the host interface and never change the engine's
//! `Status` or `Error` registers. Engine faults are latched as
//! [`ErrorCode`](trajscan_common::engine::state::ErrorCode) instead.

use thiserror::Error;
use trajscan_common::engine::point::PointError;
use trajscan_common::engine::registers::Register;
use trajscan_common::engine::state::{BufferId, EngineStatus};

/// Errors from the buffer fill handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BufferError {
    /// The staged count already equals `BufferLength`.
    #[error("buffer {buffer} is full ({capacity} points)")]
    Overflow { buffer: BufferId, capacity: u32 },

    /// The consumer owns this buffer.
    #[error("buffer {0} is being drained by the engine")]
    Busy(BufferId),

    /// `write_point`/`commit_fill` without a preceding `begin_fill`.
    #[error("buffer {0} is not open for filling")]
    NotFilling(BufferId),

    #[error("point cannot be stored: {0}")]
    InvalidPoint(#[from] PointError),
}

/// Errors from control register writes and lifecycle requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ControlError {
    /// Operation is only honored at `Initialised`.
    #[error("operation requires Initialised status, engine is {0:?}")]
    NotInitialised(EngineStatus),

    #[error("buffer length {value} out of range [1, {max}]")]
    InvalidBufferLength { value: i64, max: u32 },

    #[error("register {0} is read-only")]
    ReadOnlyRegister(Register),

    #[error("invalid transition: {0}")]
    InvalidTransition(&'static str),
}
