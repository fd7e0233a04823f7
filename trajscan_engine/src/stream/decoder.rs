//! `Axes` register decoding.

use trajscan_common::consts::AXIS_COUNT;
use trajscan_common::engine::axis::{Axis, AxisMask, AxisMaskError};

use super::indirection::{Field, IndirectionTable};

/// Enabled axes for one activation, in X..C order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AxisSet {
    mask: AxisMask,
    axes: heapless::Vec<Axis, AXIS_COUNT>,
}

impl AxisSet {
    /// No axes enabled. Only used between activations.
    pub fn empty() -> Self {
        Self::default()
    }

    #[inline]
    pub const fn mask(&self) -> AxisMask {
        self.mask
    }

    #[inline]
    pub fn axes(&self) -> &[Axis] {
        &self.axes
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.axes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.axes.is_empty()
    }

    #[inline]
    pub const fn is_enabled(&self, axis: Axis) -> bool {
        self.mask.has(axis)
    }

    /// Reset `table` and make exactly the enabled coordinates live.
    pub fn bind(&self, table: &mut IndirectionTable) {
        table.reset();
        for &axis in &self.axes {
            table.enable(Field::Coord(axis));
        }
    }
}

/// Decode a raw `Axes` register value. Valid values are 1..=511.
pub fn decode_axes(value: i64) -> Result<AxisSet, AxisMaskError> {
    let mask = AxisMask::from_register(value)?;
    Ok(AxisSet {
        mask,
        axes: mask.axes(),
    })
}
