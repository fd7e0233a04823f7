//! The trajectory streaming engine.
//!
//! [`TrajectoryEngine`] owns everything the controller keeps between ticks:
//! status machine, latched error, host control inputs, buffers, indirection
//! table and per-axis executor state. Host operations and [`tick`] both take
//! `&mut self`, so a reader can never observe a half-finished swap.
//!
//! [`tick`]: TrajectoryEngine::tick

use tracing::{debug, error, info, warn};
use trajscan_common::engine::axis::Axis;
use trajscan_common::engine::point::TrajectoryPoint;
use trajscan_common::engine::state::{BufferId, EngineStatus, ErrorCode};

use crate::config::EngineConfig;
use crate::error::{BufferError, ControlError};
use crate::executor::{AxisState, TrajectoryExecutor};
use crate::servo::ServoLayer;
use crate::state::{EngineEvent, EngineStateMachine, TransitionResult};
use crate::stream::buffer::{AdvanceOutcome, BufferManager, ResumeOutcome};
use crate::stream::decoder::decode_axes;
use crate::stream::indirection::IndirectionTable;

/// What one call to [`TrajectoryEngine::tick`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Initialised or Error: nothing to do.
    Inactive,
    /// Parked by an abort request, waiting for the host to continue.
    Parked,
    /// No point available.
    Starved,
    /// One point executed.
    Consumed {
        /// The alternate buffer was swapped in after this point.
        swapped: bool,
        /// The stream ran dry after this point.
        exhausted: bool,
    },
    /// A fault was latched this tick.
    Faulted(ErrorCode),
}

/// Double-buffered trajectory streaming engine.
#[derive(Debug, Clone)]
pub struct TrajectoryEngine {
    pub(crate) machine: EngineStateMachine,
    pub(crate) error: ErrorCode,
    /// Last value written to `Abort`.
    pub(crate) abort: bool,
    /// Rising edge on `Abort` not yet seen by a tick.
    pub(crate) abort_pending: bool,
    /// Set when a tick consumes an abort request. Cleared by a commit or by
    /// writing 0 to `Abort`.
    pub(crate) parked: bool,
    pub(crate) axes_register: i64,
    pub(crate) buffers: BufferManager,
    table: IndirectionTable,
    executor: TrajectoryExecutor,
    pub(crate) total_points: u64,
}

impl TrajectoryEngine {
    /// Engine at Initialised with point memory preallocated for
    /// `config.physical_capacity` points per buffer.
    pub fn new(config: &EngineConfig) -> Self {
        let buffers = BufferManager::new(config.physical_capacity, config.buffer_length);
        let table = IndirectionTable::new(buffers.memory().blank_address());
        Self {
            machine: EngineStateMachine::new(),
            error: ErrorCode::None,
            abort: false,
            abort_pending: false,
            parked: false,
            axes_register: config.axes_register(),
            buffers,
            table,
            executor: TrajectoryExecutor::new(config.velocity),
            total_points: 0,
        }
    }

    // ─── Observers ──────────────────────────────────────────────────

    #[inline]
    pub const fn status(&self) -> EngineStatus {
        self.machine.status()
    }

    #[inline]
    pub const fn error_code(&self) -> ErrorCode {
        self.error
    }

    #[inline]
    pub const fn total_points(&self) -> u64 {
        self.total_points
    }

    #[inline]
    pub const fn current_buffer(&self) -> BufferId {
        self.buffers.current()
    }

    #[inline]
    pub const fn buffer_length(&self) -> u32 {
        self.buffers.buffer_length()
    }

    #[inline]
    pub const fn abort_requested(&self) -> bool {
        self.abort
    }

    #[inline]
    pub const fn is_parked(&self) -> bool {
        self.parked
    }

    pub fn axis_state(&self, axis: Axis) -> Option<AxisState> {
        self.executor.axis_state(axis)
    }

    // ─── Host: buffer handshake ─────────────────────────────────────

    pub fn begin_fill(&mut self, id: BufferId) -> Result<(), BufferError> {
        self.buffers.begin_fill(id)
    }

    pub fn write_point(&mut self, id: BufferId, point: &TrajectoryPoint) -> Result<(), BufferError> {
        self.buffers.write_point(id, point)
    }

    /// Publish the staged points of `id`. A successful commit is also the
    /// host's continuation after an abort.
    pub fn commit_fill(&mut self, id: BufferId) -> Result<u32, BufferError> {
        let fill = self.buffers.commit_fill(id)?;
        if self.parked {
            info!(buffer = %id, "commit after abort, continuing");
            self.parked = false;
        }
        Ok(fill)
    }

    /// `begin_fill`, one `write_point` per point, `commit_fill`.
    pub fn fill_buffer(
        &mut self,
        id: BufferId,
        points: &[TrajectoryPoint],
    ) -> Result<u32, BufferError> {
        self.begin_fill(id)?;
        for point in points {
            self.write_point(id, point)?;
        }
        self.commit_fill(id)
    }

    // ─── Host: lifecycle ────────────────────────────────────────────

    /// Decode `Axes`, seed axis state from the servo and start consuming.
    ///
    /// An invalid axis selection latches `InvalidAxes` and moves to Error;
    /// the resulting status is returned either way.
    pub fn activate<S: ServoLayer + ?Sized>(
        &mut self,
        servo: &S,
    ) -> Result<EngineStatus, ControlError> {
        let status = self.status();
        if status != EngineStatus::Initialised {
            return Err(ControlError::NotInitialised(status));
        }

        let axis_set = match decode_axes(self.axes_register) {
            Ok(set) => set,
            Err(e) => {
                error!(axes = self.axes_register, "activation failed: {e}");
                self.error = ErrorCode::InvalidAxes;
                return self.transition(EngineEvent::ActivationFailed);
            }
        };

        axis_set.bind(&mut self.table);
        info!(
            axes = ?axis_set.axes(),
            buffer_length = self.buffers.buffer_length(),
            "trajectory scan activated"
        );
        self.executor.seed(axis_set, servo);
        self.buffers.start();
        self.transition(EngineEvent::Activate)
    }

    /// Clear any latched error and return to Initialised with empty buffers.
    pub fn reinitialise(&mut self) {
        if let TransitionResult::Ok(_) = self.machine.handle_event(EngineEvent::Reinitialise) {
            info!(previous_error = ?self.error, "engine reinitialised");
        }
        self.error = ErrorCode::None;
        self.abort = false;
        self.abort_pending = false;
        self.parked = false;
        self.total_points = 0;
        self.buffers.reset();
        self.executor.clear();
        self.table.reset();
    }

    fn transition(&mut self, event: EngineEvent) -> Result<EngineStatus, ControlError> {
        match self.machine.handle_event(event) {
            TransitionResult::Ok(status) => Ok(status),
            TransitionResult::Rejected(reason) => Err(ControlError::InvalidTransition(reason)),
        }
    }

    /// Transition requested by the tick itself. Rejections indicate an
    /// internal inconsistency and are only logged.
    fn apply(&mut self, event: EngineEvent) {
        if let Err(e) = self.transition(event) {
            error!(?event, "{e}");
        }
    }

    fn fault(&mut self, code: ErrorCode) -> TickOutcome {
        if !self.error.is_fault() {
            self.error = code;
        }
        error!(
            error = ?code,
            buffer = %self.buffers.current(),
            index = self.buffers.read_index(),
            total_points = self.total_points,
            "trajectory scan halted"
        );
        self.apply(EngineEvent::Fault);
        TickOutcome::Faulted(code)
    }

    // ─── Controller tick ────────────────────────────────────────────

    /// One controller tick: consume at most one point.
    pub fn tick<S: ServoLayer + ?Sized>(&mut self, servo: &mut S) -> TickOutcome {
        let status = self.status();
        if !status.is_running() {
            return TickOutcome::Inactive;
        }

        if self.abort_pending {
            self.abort_pending = false;
            self.parked = true;
            if status == EngineStatus::Active {
                warn!(
                    buffer = %self.buffers.current(),
                    remaining = self.buffers.remaining(),
                    "abort requested, parking"
                );
                self.apply(EngineEvent::AbortRequested);
            }
            return TickOutcome::Parked;
        }
        if self.parked {
            return TickOutcome::Parked;
        }

        if servo.fault() {
            return self.fault(ErrorCode::RuntimeOrFollowingError);
        }

        if status == EngineStatus::Idle || self.buffers.remaining() == 0 {
            match self.buffers.try_resume() {
                ResumeOutcome::Starved => {
                    if status == EngineStatus::Active {
                        warn!(total_points = self.total_points, "buffers starved");
                        self.apply(EngineEvent::Starved);
                    }
                    return TickOutcome::Starved;
                }
                outcome => {
                    if status == EngineStatus::Idle {
                        info!(?outcome, buffer = %self.buffers.current(), "resuming");
                        self.apply(EngineEvent::Resumed);
                    }
                }
            }
        }

        self.table.rebind(
            self.buffers.current_address(),
            self.buffers.read_index(),
            self.buffers.buffer_length(),
        );
        if let Err(code) = self.executor.execute(&self.table, self.buffers.memory(), servo) {
            return self.fault(code);
        }
        self.total_points += 1;

        let (swapped, exhausted) = match self.buffers.advance() {
            AdvanceOutcome::Continue => (false, false),
            AdvanceOutcome::Swapped { from, to } => {
                debug!(%from, %to, total_points = self.total_points, "swapped buffers");
                (true, false)
            }
            AdvanceOutcome::Exhausted => {
                warn!(total_points = self.total_points, "buffers exhausted");
                self.apply(EngineEvent::Starved);
                (false, true)
            }
        };

        // Commands already issued stay in place.
        if servo.fault() {
            return self.fault(ErrorCode::RuntimeOrFollowingError);
        }

        TickOutcome::Consumed { swapped, exhausted }
    }
}
