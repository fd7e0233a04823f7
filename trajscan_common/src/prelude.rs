//! Prelude module for common re-exports.
//!
//! `use trajscan_common::prelude::*;` brings in the types both the engine
//! and host tooling touch on every call.

use std::time::Duration;

// ─── Logging ────────────────────────────────────────────────────────
pub use crate::config::LogLevel;

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, SharedConfig, Validate};

// ─── System Constants ───────────────────────────────────────────────
pub use crate::consts::{AXIS_COUNT, CYCLE_TIME_US, DEFAULT_PHYSICAL_CAPACITY};

// ─── Engine Types ───────────────────────────────────────────────────
pub use crate::engine::axis::{Axis, AxisMask, AxisMaskError};
pub use crate::engine::fixed::{Fixed, Rounding, TimeBase, VelocityScaling};
pub use crate::engine::point::{PointError, TimeWord, TrajectoryPoint, VelocityMode};
pub use crate::engine::registers::{Register, RegisterAccess, StatusRegisters};
pub use crate::engine::state::{BufferId, EngineStatus, ErrorCode};

/// Default controller tick period as Duration.
pub const DEFAULT_CYCLE_TIME: Duration = Duration::from_micros(CYCLE_TIME_US as u64);
