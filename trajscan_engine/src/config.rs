//! TOML configuration for the trajscan runner.
//!
//! One file with four tables: `[shared]` (log level, service name),
//! `[engine]`, `[servo]` and `[host]`. Numeric parameters are checked against
//! the bounds in [`trajscan_common::consts`]; optional fields fall back to
//! their defaults.
//!
//! ```toml
//! [shared]
//! service_name = "trajscan"
//!
//! [engine]
//! buffer_length = 100
//! axes = ["x", "y"]
//!
//! [engine.velocity]
//! time_base = "tick"
//! rounding = "truncate"
//!
//! [servo]
//! following_error_limit = 0.5
//!
//! [host]
//! points_file = "config/snake_scan.json"
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use trajscan_common::config::{ConfigError, ConfigLoader, SharedConfig, Validate};
use trajscan_common::consts::{
    CYCLE_TIME_US, CYCLE_TIME_US_MAX, CYCLE_TIME_US_MIN, DEFAULT_PHYSICAL_CAPACITY,
    PHYSICAL_CAPACITY_MAX,
};
use trajscan_common::engine::axis::{Axis, AxisMask};
use trajscan_common::engine::fixed::{Fixed, VelocityScaling};

use crate::servo::SimulatedServo;

// ─── Top-Level Config ───────────────────────────────────────────────

/// Complete runner configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub shared: SharedConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub servo: ServoConfig,
    #[serde(default)]
    pub host: HostConfig,
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        self.engine.validate()?;
        self.servo.validate()?;
        self.host.validate()
    }
}

/// Load and validate the runner configuration.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    AppConfig::load_validated(path)
}

// ─── Engine ─────────────────────────────────────────────────────────

/// Streaming engine parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Controller tick period in microseconds.
    pub cycle_time_us: u32,
    /// Points per buffer the point memory is sized for.
    pub physical_capacity: u32,
    /// Initial `BufferLength` register value.
    pub buffer_length: u32,
    /// Initial `Axes` selection.
    pub axes: Vec<Axis>,
    pub velocity: VelocityScaling,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cycle_time_us: CYCLE_TIME_US,
            physical_capacity: DEFAULT_PHYSICAL_CAPACITY,
            buffer_length: DEFAULT_PHYSICAL_CAPACITY,
            axes: vec![Axis::X, Axis::Y],
            velocity: VelocityScaling::default(),
        }
    }
}

impl EngineConfig {
    /// Initial value for the `Axes` register.
    pub fn axes_register(&self) -> i64 {
        self.axes.iter().copied().collect::<AxisMask>().register_value()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cycle_time_us < CYCLE_TIME_US_MIN || self.cycle_time_us > CYCLE_TIME_US_MAX {
            return Err(ConfigError::ValidationError(format!(
                "cycle_time_us {} out of range [{}, {}]",
                self.cycle_time_us, CYCLE_TIME_US_MIN, CYCLE_TIME_US_MAX
            )));
        }
        if self.physical_capacity == 0 || self.physical_capacity > PHYSICAL_CAPACITY_MAX {
            return Err(ConfigError::ValidationError(format!(
                "physical_capacity {} out of range [1, {}]",
                self.physical_capacity, PHYSICAL_CAPACITY_MAX
            )));
        }
        if self.buffer_length == 0 || self.buffer_length > self.physical_capacity {
            return Err(ConfigError::ValidationError(format!(
                "buffer_length {} out of range [1, {}]",
                self.buffer_length, self.physical_capacity
            )));
        }
        if self.axes.is_empty() {
            return Err(ConfigError::ValidationError(
                "engine.axes must name at least one axis".to_string(),
            ));
        }
        Ok(())
    }
}

// ─── Servo ──────────────────────────────────────────────────────────

/// Simulated servo parameters. Distances in user units, velocities in
/// units per millisecond.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServoConfig {
    /// Following-error limit. Zero disables the check.
    pub following_error_limit: f64,
    pub max_velocity: BTreeMap<Axis, f64>,
    pub initial_position: BTreeMap<Axis, f64>,
}

impl ServoConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.following_error_limit.is_finite() || self.following_error_limit < 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "servo.following_error_limit {} must be finite and >= 0",
                self.following_error_limit
            )));
        }
        validate_velocity_limits("servo.max_velocity", &self.max_velocity)?;
        if let Some((axis, _)) = self.initial_position.iter().find(|(_, p)| !p.is_finite()) {
            return Err(ConfigError::ValidationError(format!(
                "servo.initial_position.{} must be finite",
                axis.letter().to_ascii_lowercase()
            )));
        }
        Ok(())
    }

    /// Build the simulated servo described by this section.
    pub fn build(&self) -> SimulatedServo {
        let mut servo = SimulatedServo::new()
            .with_following_error_limit(Fixed::from_f64(self.following_error_limit));
        for (&axis, &limit) in &self.max_velocity {
            servo = servo.with_max_velocity(axis, Fixed::from_f64(limit));
        }
        for (&axis, &position) in &self.initial_position {
            servo = servo.with_position(axis, Fixed::from_f64(position));
        }
        servo
    }
}

// ─── Host ───────────────────────────────────────────────────────────

/// Host feeder parameters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// JSON point set. Required unless given on the command line.
    pub points_file: Option<PathBuf>,
    /// Points to stream, wrapping around the set. Zero streams one pass.
    pub total_points: u64,
    /// Per-axis velocity limit checked before streaming [units/ms].
    pub max_velocity: BTreeMap<Axis, f64>,
}

impl HostConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_velocity_limits("host.max_velocity", &self.max_velocity)
    }
}

fn validate_velocity_limits(section: &str, limits: &BTreeMap<Axis, f64>) -> Result<(), ConfigError> {
    for (axis, &limit) in limits {
        if !limit.is_finite() || limit <= 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "{section}.{} = {limit} must be finite and > 0",
                axis.letter().to_ascii_lowercase()
            )));
        }
    }
    Ok(())
}
