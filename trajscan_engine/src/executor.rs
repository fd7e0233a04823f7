//! Per-point execution.
//!
//! Reads one point through the indirection table, derives each enabled
//! axis's segment velocity from the previous target and commits the
//! resulting commands to the servo layer. Status handling lives in
//! [`crate::engine`].

use tracing::trace;
use trajscan_common::consts::AXIS_COUNT;
use trajscan_common::engine::axis::Axis;
use trajscan_common::engine::fixed::{Fixed, VelocityScaling};
use trajscan_common::engine::point::VelocityMode;
use trajscan_common::engine::state::ErrorCode;

use crate::servo::{AxisCommand, ServoLayer};
use crate::stream::decoder::AxisSet;
use crate::stream::indirection::{Field, IndirectionTable, PointMemory};

/// Motion state carried between points for one axis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AxisState {
    pub previous_position: Fixed,
    pub current_velocity: Fixed,
}

/// Header fields of the point just executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutedPoint {
    pub move_time: u32,
    pub user_code: u8,
    pub velocity_mode: VelocityMode,
}

/// Velocity computation and servo hand-off for the enabled axes.
#[derive(Debug, Clone)]
pub struct TrajectoryExecutor {
    axis_set: AxisSet,
    states: [AxisState; AXIS_COUNT],
    scaling: VelocityScaling,
}

impl TrajectoryExecutor {
    pub fn new(scaling: VelocityScaling) -> Self {
        Self {
            axis_set: AxisSet::empty(),
            states: [AxisState::default(); AXIS_COUNT],
            scaling,
        }
    }

    #[inline]
    pub fn axis_set(&self) -> &AxisSet {
        &self.axis_set
    }

    #[inline]
    pub const fn scaling(&self) -> VelocityScaling {
        self.scaling
    }

    /// State of `axis`, `None` when the axis is not enabled.
    pub fn axis_state(&self, axis: Axis) -> Option<AxisState> {
        self.axis_set
            .is_enabled(axis)
            .then(|| self.states[axis.index()])
    }

    /// Take over `axis_set` and seed each enabled axis from the servo's
    /// measured position.
    pub fn seed<S: ServoLayer + ?Sized>(&mut self, axis_set: AxisSet, servo: &S) {
        self.states = [AxisState::default(); AXIS_COUNT];
        for &axis in axis_set.axes() {
            self.states[axis.index()] = AxisState {
                previous_position: servo.actual_position(axis),
                current_velocity: Fixed::ZERO,
            };
        }
        self.axis_set = axis_set;
    }

    /// Drop all axis state.
    pub fn clear(&mut self) {
        self.axis_set = AxisSet::empty();
        self.states = [AxisState::default(); AXIS_COUNT];
    }

    /// Execute the point `table` is bound to.
    ///
    /// A zero move time is rejected before any command is issued.
    pub fn execute<S: ServoLayer + ?Sized>(
        &mut self,
        table: &IndirectionTable,
        memory: &PointMemory,
        servo: &mut S,
    ) -> Result<ExecutedPoint, ErrorCode> {
        let move_time = table.read(Field::Time, memory) as u32;
        if move_time == 0 {
            return Err(ErrorCode::ZeroMoveTime);
        }
        let user_code = table.read(Field::User, memory) as u8;
        let velocity_mode =
            VelocityMode::from_u8(table.read(Field::VelMode, memory) as u8).unwrap_or_default();

        for &axis in self.axis_set.axes() {
            let target = Fixed::from_raw(table.read(Field::Coord(axis), memory));
            let state = &mut self.states[axis.index()];
            let velocity = self
                .scaling
                .velocity(target - state.previous_position, move_time)
                .unwrap_or(Fixed::ZERO);

            servo.command(
                axis,
                &AxisCommand {
                    target,
                    velocity,
                    move_time,
                    velocity_mode,
                    user_code,
                },
            );
            state.previous_position = target;
            state.current_velocity = velocity;
            trace!(axis = %axis, target = %target, velocity = %velocity, "axis command");
        }

        Ok(ExecutedPoint {
            move_time,
            user_code,
            velocity_mode,
        })
    }
}
