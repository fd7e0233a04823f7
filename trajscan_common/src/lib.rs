//! trajscan Common Library
//!
//! This crate provides the shared constants, data formats and configuration
//! loading utilities used by the trajectory streaming engine and its host
//! tooling.
//!
//! # Module Structure
//!
//! - [`consts`] - Axis counts, buffer limits and time base constants
//! - [`config`] - Configuration loading traits and types
//! - [`engine`] - Axis identifiers, fixed-point values, trajectory points,
//!   engine status enums and the register map
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use trajscan_common::prelude::*;
//!
//! let point = TrajectoryPoint::new(400).with_coordinate(Axis::X, Fixed::from_int(100));
//! assert_eq!(point.coordinate(Axis::X), Fixed::from_int(100));
//! ```

pub mod config;
pub mod consts;
pub mod engine;
pub mod prelude;
