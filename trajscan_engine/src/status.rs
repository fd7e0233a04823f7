//! Status/control register interface.
//!
//! The host reads any register and writes only `Abort`, `Axes` and
//! `BufferLength`. Every value is derived from engine state at the moment of
//! the call, so the current-buffer registers always agree with
//! `CurrentBuffer`.

use tracing::{debug, info};
use trajscan_common::consts::REGISTER_MAP_VERSION;
use trajscan_common::engine::registers::{Register, RegisterAccess, StatusRegisters};
use trajscan_common::engine::state::{BufferId, EngineStatus};

use crate::engine::TrajectoryEngine;
use crate::error::ControlError;

impl TrajectoryEngine {
    /// Consistent copy of every register.
    pub fn snapshot(&self) -> StatusRegisters {
        let buffers = &self.buffers;
        StatusRegisters {
            status: self.status(),
            error: self.error,
            current_buffer: buffers.current(),
            abort: self.abort,
            _pad: [0; 4],
            axes: self.axes_register,
            buffer_length: buffers.buffer_length(),
            version: REGISTER_MAP_VERSION,
            total_points: self.total_points,
            current_index: buffers.read_index(),
            current_buffer_fill: buffers.current_fill(),
            buffer_adr_a: buffers.address(BufferId::A),
            buffer_adr_b: buffers.address(BufferId::B),
            current_buffer_adr: buffers.current_address(),
            buffer_fill_a: buffers.fill_level(BufferId::A),
            buffer_fill_b: buffers.fill_level(BufferId::B),
            prev_buffer_fill: buffers.prev_fill(),
        }
    }

    /// Integer value of one register.
    pub fn read(&self, register: Register) -> i64 {
        self.snapshot().get(register)
    }

    /// Host write to a control register.
    ///
    /// `Abort` is edge-triggered: a 0 to non-zero transition queues one
    /// park request for the next tick. Writing 0 while parked continues.
    /// `Axes` is stored and only decoded at the next activation.
    /// `BufferLength` is only accepted at Initialised and must lie in
    /// `1..=physical capacity`.
    pub fn write(&mut self, register: Register, value: i64) -> Result<(), ControlError> {
        if register.access() != RegisterAccess::HostWritable {
            return Err(ControlError::ReadOnlyRegister(register));
        }
        match register {
            Register::Abort => {
                let abort = value != 0;
                if abort && !self.abort {
                    info!("abort requested");
                    self.abort_pending = true;
                } else if !abort && self.parked {
                    info!("abort cleared, continuing");
                    self.parked = false;
                }
                self.abort = abort;
            }
            Register::Axes => {
                debug!(axes = value, "axes register written");
                self.axes_register = value;
            }
            Register::BufferLength => {
                let status = self.status();
                if status != EngineStatus::Initialised {
                    return Err(ControlError::NotInitialised(status));
                }
                let max = self.buffers.physical_capacity();
                if value < 1 || value > max as i64 {
                    return Err(ControlError::InvalidBufferLength { value, max });
                }
                self.buffers.set_buffer_length(value as u32);
                debug!(buffer_length = value, "buffer length set");
            }
            _ => return Err(ControlError::ReadOnlyRegister(register)),
        }
        Ok(())
    }
}
