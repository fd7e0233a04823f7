//! Shared fixtures.

use trajscan_common::engine::axis::Axis;
use trajscan_common::engine::fixed::Fixed;
use trajscan_common::engine::point::TrajectoryPoint;
use trajscan_engine::config::EngineConfig;
use trajscan_engine::engine::TrajectoryEngine;

pub fn engine(physical_capacity: u32, buffer_length: u32, axes: &[Axis]) -> TrajectoryEngine {
    TrajectoryEngine::new(&EngineConfig {
        physical_capacity,
        buffer_length,
        axes: axes.to_vec(),
        ..EngineConfig::default()
    })
}

/// `n` X/Y points starting at X = `start`, Y = -X, one millisecond apart.
pub fn xy_ramp(start: i64, n: i64) -> Vec<TrajectoryPoint> {
    (start..start + n)
        .map(|i| {
            TrajectoryPoint::new(4)
                .with_coordinate(Axis::X, Fixed::from_int(i))
                .with_coordinate(Axis::Y, Fixed::from_int(-i))
        })
        .collect()
}
