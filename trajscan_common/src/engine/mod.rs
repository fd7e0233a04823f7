//! Streaming engine shared types.
//!
//! Everything the host tooling and the engine must agree on lives here:
//! axis identifiers and the `Axes` bitmask, fixed-point values, trajectory
//! points and their packed time word, status/error enums, the register map,
//! and the controller's 48-bit floating-point word format.

pub mod axis;
pub mod fixed;
pub mod float48;
pub mod point;
pub mod registers;
pub mod state;
