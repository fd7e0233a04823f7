//! Host-side tooling: point sets and the ping-pong feeder.
//!
//! A point set is a JSON object of parallel arrays:
//!
//! ```json
//! {
//!   "time": [400, 400, 400],
//!   "velocity_mode": [0, 0, 1],
//!   "user": [0, 0, 0],
//!   "x": [0.0, 1.0, 2.0],
//!   "y": [0.0, 0.0, 0.5]
//! }
//! ```
//!
//! `time` is in quarter-millisecond ticks; `velocity_mode` and `user` are
//! optional; every other key names an axis and holds positions in user
//! units.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};
use trajscan_common::consts::TICKS_PER_MS;
use trajscan_common::engine::axis::{Axis, AxisMask};
use trajscan_common::engine::fixed::Fixed;
use trajscan_common::engine::float48::{self, FloatWordError};
use trajscan_common::engine::point::{PointError, TrajectoryPoint, VelocityMode};
use trajscan_common::engine::state::BufferId;

use crate::engine::TrajectoryEngine;
use crate::error::BufferError;

/// Errors raised by host tooling.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("failed to read point set {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("invalid point set JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid point set: {0}")]
    InvalidShape(String),

    #[error("point {index}: {source}")]
    InvalidPoint { index: usize, source: PointError },

    #[error(
        "axis {axis} exceeds {limit} units/ms at point {index} ({velocity:.3} units/ms)"
    )]
    VelocityLimit {
        axis: Axis,
        index: usize,
        velocity: f64,
        limit: f64,
    },

    #[error(transparent)]
    Buffer(#[from] BufferError),

    #[error(transparent)]
    FloatWord(#[from] FloatWordError),
}

// ─── Point Set ──────────────────────────────────────────────────────

/// Pre-planned trajectory in host units.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PointSet {
    pub time: Vec<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub velocity_mode: Vec<u8>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub user: Vec<u8>,
    #[serde(flatten)]
    pub axes: BTreeMap<Axis, Vec<f64>>,
}

impl PointSet {
    /// Parse and validate a JSON point set.
    pub fn from_json(text: &str) -> Result<Self, HostError> {
        let set: Self = serde_json::from_str(text)?;
        set.validate()?;
        Ok(set)
    }

    pub fn load(path: &Path) -> Result<Self, HostError> {
        let text = std::fs::read_to_string(path).map_err(|e| HostError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_json(&text)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.time.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Axes the set carries positions for.
    pub fn axis_mask(&self) -> AxisMask {
        self.axes.keys().copied().collect()
    }

    /// Check array lengths and per-point fields.
    pub fn validate(&self) -> Result<(), HostError> {
        let n = self.len();
        if n == 0 {
            return Err(HostError::InvalidShape("time array is empty".to_string()));
        }
        if self.axes.is_empty() {
            return Err(HostError::InvalidShape("no axis arrays".to_string()));
        }
        for (axis, positions) in &self.axes {
            if positions.len() != n {
                return Err(HostError::InvalidShape(format!(
                    "axis {axis} has {} points, time has {n}",
                    positions.len()
                )));
            }
            if let Some(i) = positions.iter().position(|p| !p.is_finite()) {
                return Err(HostError::InvalidShape(format!(
                    "axis {axis} point {i} is not finite"
                )));
            }
        }
        for (name, column) in [("velocity_mode", &self.velocity_mode), ("user", &self.user)] {
            if !column.is_empty() && column.len() != n {
                return Err(HostError::InvalidShape(format!(
                    "{name} has {} entries, time has {n}",
                    column.len()
                )));
            }
        }
        for index in 0..n {
            if self.time[index] == 0 {
                return Err(HostError::InvalidShape(format!(
                    "point {index} has zero move time"
                )));
            }
            self.point(index)?;
        }
        Ok(())
    }

    /// Point `index` in engine form.
    pub fn point(&self, index: usize) -> Result<TrajectoryPoint, HostError> {
        let time = self.time.get(index).copied().ok_or_else(|| {
            HostError::InvalidShape(format!("point {index} out of range"))
        })?;
        let invalid = |source| HostError::InvalidPoint { index, source };

        let mode = self.velocity_mode.get(index).copied().unwrap_or(0);
        let velocity_mode =
            VelocityMode::from_u8(mode).ok_or(invalid(PointError::InvalidVelocityMode(mode)))?;
        let mut point = TrajectoryPoint::new(time)
            .with_user_code(self.user.get(index).copied().unwrap_or(0))
            .with_velocity_mode(velocity_mode);
        for (&axis, positions) in &self.axes {
            point = point.with_coordinate(axis, Fixed::from_f64(positions[index]));
        }
        point.validate().map_err(invalid)?;
        Ok(point)
    }

    /// `len` points starting at `start`, wrapping around the end of the set.
    pub fn chunk(&self, start: usize, len: usize) -> Result<Vec<TrajectoryPoint>, HostError> {
        let n = self.len();
        if n == 0 {
            return Ok(Vec::new());
        }
        (0..len).map(|offset| self.point((start + offset) % n)).collect()
    }

    /// Reject segments faster than `limits` (units per millisecond). Axes
    /// without a limit are not checked.
    pub fn check_max_velocities(&self, limits: &BTreeMap<Axis, f64>) -> Result<(), HostError> {
        for (&axis, &limit) in limits {
            let Some(positions) = self.axes.get(&axis) else {
                continue;
            };
            for index in 1..positions.len() {
                let move_ms = self.time[index] as f64 / TICKS_PER_MS as f64;
                let velocity = (positions[index] - positions[index - 1]).abs() / move_ms;
                if velocity > limit {
                    return Err(HostError::VelocityLimit {
                        axis,
                        index,
                        velocity,
                        limit,
                    });
                }
            }
        }
        info!(axes = limits.len(), "velocities OK");
        Ok(())
    }

    /// Point `index` as controller memory literals: the time word in hex
    /// followed by each axis position as a 48-bit float word.
    pub fn controller_literals(&self, index: usize) -> Result<Vec<String>, HostError> {
        let point = self.point(index)?;
        let time_word = point
            .time_word()
            .map_err(|source| HostError::InvalidPoint { index, source })?;
        let mut out = Vec::with_capacity(1 + self.axes.len());
        out.push(format!("${time_word:x}"));
        for (axis, positions) in &self.axes {
            out.push(format!(
                "{}={}",
                axis.letter(),
                float48::to_controller_literal(positions[index])?
            ));
        }
        Ok(out)
    }
}

// ─── Feeder ─────────────────────────────────────────────────────────

/// Streams a point set into the engine, alternating buffers.
///
/// Both buffers are primed before activation. Afterwards the feeder refills
/// the alternate buffer every time the engine swaps away from the one it
/// last wrote, wrapping around the point set until `total_points` have been
/// sent.
#[derive(Debug, Clone)]
pub struct HostFeeder {
    points: PointSet,
    total_points: u64,
    sent: u64,
    next_index: usize,
    last_written: Option<BufferId>,
    fills: u64,
}

impl HostFeeder {
    /// Feeder for `total_points` points; zero means one pass of the set.
    pub fn new(points: PointSet, total_points: u64) -> Self {
        let total_points = if total_points == 0 {
            points.len() as u64
        } else {
            total_points
        };
        Self {
            points,
            total_points,
            sent: 0,
            next_index: 0,
            last_written: None,
            fills: 0,
        }
    }

    #[inline]
    pub const fn sent(&self) -> u64 {
        self.sent
    }

    #[inline]
    pub const fn total_points(&self) -> u64 {
        self.total_points
    }

    #[inline]
    pub const fn remaining(&self) -> u64 {
        self.total_points - self.sent
    }

    #[inline]
    pub const fn is_done(&self) -> bool {
        self.sent >= self.total_points
    }

    /// Buffers filled so far.
    #[inline]
    pub const fn fills(&self) -> u64 {
        self.fills
    }

    #[inline]
    pub fn points(&self) -> &PointSet {
        &self.points
    }

    /// Fill A and then B ahead of activation.
    pub fn prime(&mut self, engine: &mut TrajectoryEngine) -> Result<(), HostError> {
        for id in BufferId::BOTH {
            if self.is_done() {
                break;
            }
            self.fill(engine, id)?;
        }
        Ok(())
    }

    /// Refill the alternate buffer if the engine has moved off the last one
    /// written. Returns the buffer filled, if any.
    pub fn service(&mut self, engine: &mut TrajectoryEngine) -> Result<Option<BufferId>, HostError> {
        if self.is_done() {
            return Ok(None);
        }
        let alternate = engine.current_buffer().other();
        if self.last_written == Some(alternate) {
            return Ok(None);
        }
        self.fill(engine, alternate)?;
        Ok(Some(alternate))
    }

    fn fill(&mut self, engine: &mut TrajectoryEngine, id: BufferId) -> Result<(), HostError> {
        let count = self.remaining().min(engine.buffer_length() as u64) as usize;
        let chunk = self.points.chunk(self.next_index, count)?;
        let published = engine.fill_buffer(id, &chunk)?;

        self.next_index = (self.next_index + count) % self.points.len().max(1);
        self.sent += published as u64;
        self.last_written = Some(id);
        self.fills += 1;
        debug!(buffer = %id, points = published, sent = self.sent, "buffer filled");
        Ok(())
    }
}
