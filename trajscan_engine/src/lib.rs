//! # Trajectory Scan Engine
//!
//! Double-buffered trajectory streaming for a multi-axis motion controller.
//! A host fills two point buffers in alternation while the controller
//! consumes one point per tick, swapping buffers without stopping motion.
//!
//! ## Layers
//!
//! 1. **stream**: point memory, indirection table, axis decoding and the
//!    ping-pong buffer manager
//! 2. **executor**: per-point velocity derivation and servo hand-off
//! 3. **engine**: status machine, error latching and the tick
//! 4. **status**: host register interface
//! 5. **host** / **cycle**: point sets, the feeder and the paced runner
//!
//! Point memory is allocated once at construction; the tick path does not
//! allocate.

pub mod config;
pub mod cycle;
pub mod engine;
pub mod error;
pub mod executor;
pub mod host;
pub mod servo;
pub mod state;
pub mod status;
pub mod stream;
