//! Servo layer boundary.
//!
//! The engine hands one [`AxisCommand`] per enabled axis per consumed point
//! to a [`ServoLayer`] and samples its fault line twice per tick. The real
//! servo loop lives outside this crate; [`SimulatedServo`] stands in for it
//! when running without hardware and in tests.

use tracing::error;
use trajscan_common::consts::{AXIS_COUNT, TICKS_PER_MS};
use trajscan_common::engine::axis::Axis;
use trajscan_common::engine::fixed::Fixed;
use trajscan_common::engine::point::VelocityMode;

/// Command for one axis derived from one trajectory point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisCommand {
    pub target: Fixed,
    pub velocity: Fixed,
    /// Move time in quarter-millisecond ticks.
    pub move_time: u32,
    pub velocity_mode: VelocityMode,
    pub user_code: u8,
}

/// What the engine needs from the servo loop.
pub trait ServoLayer {
    /// Measured position, used to seed velocity computation at activation.
    fn actual_position(&self, axis: Axis) -> Fixed;

    /// Queue the next segment for `axis`.
    fn command(&mut self, axis: Axis, command: &AxisCommand);

    /// Runtime or following error present.
    fn fault(&self) -> bool;
}

// ─── Lag Evaluation ─────────────────────────────────────────────────

/// Result of following-error evaluation for a single axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LagResult {
    /// Absolute following error.
    pub lag_error: Fixed,
    /// Whether the lag exceeds the limit.
    pub exceeded: bool,
}

/// Compare `|target - actual|` with `limit`. A limit of zero or less
/// disables the check.
pub fn evaluate_lag(target: Fixed, actual: Fixed, limit: Fixed) -> LagResult {
    let lag_error = (target - actual).abs();
    LagResult {
        lag_error,
        exceeded: limit > Fixed::ZERO && lag_error > limit,
    }
}

// ─── Simulated Servo ────────────────────────────────────────────────

/// Per-axis state of the simulated servo.
#[derive(Debug, Clone, Copy, Default)]
struct SimAxis {
    position: Fixed,
    /// Units per millisecond. `None` follows every command exactly.
    max_velocity: Option<Fixed>,
    last_command: Option<AxisCommand>,
    last_lag: Fixed,
}

/// Servo stand-in that moves each axis toward its target within a velocity
/// limit and latches a following error when the lag gets too large.
#[derive(Debug, Clone)]
pub struct SimulatedServo {
    axes: [SimAxis; AXIS_COUNT],
    following_error_limit: Fixed,
    faulted: bool,
    commands: u64,
}

impl SimulatedServo {
    /// Servo with every axis at zero, no velocity limit and no
    /// following-error check.
    pub fn new() -> Self {
        Self {
            axes: [SimAxis::default(); AXIS_COUNT],
            following_error_limit: Fixed::ZERO,
            faulted: false,
            commands: 0,
        }
    }

    #[must_use]
    pub fn with_following_error_limit(mut self, limit: Fixed) -> Self {
        self.following_error_limit = limit;
        self
    }

    #[must_use]
    pub fn with_max_velocity(mut self, axis: Axis, per_ms: Fixed) -> Self {
        self.axes[axis.index()].max_velocity = Some(per_ms);
        self
    }

    #[must_use]
    pub fn with_position(mut self, axis: Axis, position: Fixed) -> Self {
        self.axes[axis.index()].position = position;
        self
    }

    /// Latch a fault as if the servo loop had reported one.
    pub fn inject_fault(&mut self) {
        self.faulted = true;
    }

    pub fn clear_fault(&mut self) {
        self.faulted = false;
    }

    pub fn last_command(&self, axis: Axis) -> Option<AxisCommand> {
        self.axes[axis.index()].last_command
    }

    pub fn last_lag(&self, axis: Axis) -> Fixed {
        self.axes[axis.index()].last_lag
    }

    /// Total commands received across all axes.
    pub const fn command_count(&self) -> u64 {
        self.commands
    }

    /// Furthest the axis can travel in `move_time` ticks.
    fn reach(max_per_ms: Fixed, move_time: u32) -> Fixed {
        let raw = max_per_ms.raw() as i128 * move_time as i128 / TICKS_PER_MS as i128;
        Fixed::from_raw(raw.clamp(0, i64::MAX as i128) as i64)
    }
}

impl Default for SimulatedServo {
    fn default() -> Self {
        Self::new()
    }
}

impl ServoLayer for SimulatedServo {
    fn actual_position(&self, axis: Axis) -> Fixed {
        self.axes[axis.index()].position
    }

    fn command(&mut self, axis: Axis, command: &AxisCommand) {
        self.commands += 1;
        let limit = self.following_error_limit;
        let sim = &mut self.axes[axis.index()];
        sim.last_command = Some(*command);

        let wanted = command.target - sim.position;
        let step = match sim.max_velocity {
            Some(max) => {
                let reach = Self::reach(max, command.move_time);
                wanted.clamp(-reach, reach)
            }
            None => wanted,
        };
        sim.position = sim.position + step;

        let lag = evaluate_lag(command.target, sim.position, limit);
        sim.last_lag = lag.lag_error;
        if lag.exceeded && !self.faulted {
            error!(
                axis = %axis,
                lag = %lag.lag_error,
                limit = %limit,
                "following error limit exceeded"
            );
            self.faulted = true;
        }
    }

    fn fault(&self) -> bool {
        self.faulted
    }
}
