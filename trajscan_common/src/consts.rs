//! System-wide constants for the trajscan workspace.
//!
//! Single source of truth for all numeric limits and default paths.

/// Number of logical axes (A, B, C, U, V, W, X, Y, Z).
pub const AXIS_COUNT: usize = 9;

/// Largest valid value of the `Axes` register (all nine bits set).
pub const AXES_MASK_MAX: i64 = 0x1FF;

/// Sub-arrays per buffer block: one time word followed by nine coordinates.
pub const BLOCK_FIELDS: u32 = 1 + AXIS_COUNT as u32;

/// Number of rebindable slots in the indirection table
/// (time, nine coordinates, user code, velocity mode).
pub const FIELD_SLOTS: usize = AXIS_COUNT + 3;

/// Move time ticks per millisecond (one tick = 250 µs).
pub const TICKS_PER_MS: u32 = 4;

/// Largest move time that fits in the 24-bit time field.
pub const MOVE_TIME_MAX: u32 = 0x00FF_FFFF;

/// Largest user code that fits in the 4-bit user field.
pub const USER_CODE_MAX: u8 = 0x0F;

/// Default physical capacity of each point buffer.
pub const DEFAULT_PHYSICAL_CAPACITY: u32 = 1000;

/// Upper bound for the configurable physical capacity.
pub const PHYSICAL_CAPACITY_MAX: u32 = 65_535;

/// Default controller tick period in microseconds.
pub const CYCLE_TIME_US: u32 = 1000;

/// Minimum controller tick period in microseconds.
pub const CYCLE_TIME_US_MIN: u32 = 100;

/// Maximum controller tick period in microseconds.
pub const CYCLE_TIME_US_MAX: u32 = 100_000;

/// Value reported by the `Version` register.
pub const REGISTER_MAP_VERSION: u32 = 2;

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "config/trajscan.toml";
