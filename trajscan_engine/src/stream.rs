//! Point streaming plumbing.
//!
//! The engine reads every point through three layers, leaves first:
//! [`decoder`] turns the `Axes` register into the enabled axis set,
//! [`indirection`] owns point memory and the field accessors that address
//! it, and [`buffer`] runs the ping-pong fill/drain handshake on top.

pub mod buffer;
pub mod decoder;
pub mod indirection;
