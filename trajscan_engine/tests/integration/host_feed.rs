//! Integration test: host feeder against the engine.

use trajscan_common::engine::axis::Axis;
use trajscan_common::engine::fixed::Fixed;
use trajscan_common::engine::state::{BufferId, EngineStatus};
use trajscan_engine::engine::TickOutcome;
use trajscan_engine::host::{HostError, HostFeeder, PointSet};
use trajscan_engine::servo::{ServoLayer, SimulatedServo};

use super::common::engine;

fn triangle() -> PointSet {
    PointSet::from_json(r#"{"time": [4, 4, 4, 4, 4], "x": [0.0, 1.0, 2.0, 1.0, 0.0]}"#).unwrap()
}

#[test]
fn feeder_wraps_the_point_set() {
    let set = triangle();
    let mut e = engine(8, 3, &[Axis::X]);
    let mut servo = SimulatedServo::new();
    let mut feeder = HostFeeder::new(set.clone(), 12);

    feeder.prime(&mut e).unwrap();
    assert_eq!(feeder.sent(), 6);
    e.activate(&servo).unwrap();

    let mut positions = Vec::new();
    loop {
        feeder.service(&mut e).unwrap();
        match e.tick(&mut servo) {
            TickOutcome::Consumed { exhausted, .. } => {
                positions.push(servo.actual_position(Axis::X));
                if exhausted {
                    break;
                }
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    let expected: Vec<_> = (0..12)
        .map(|i| Fixed::from_f64(set.axes[&Axis::X][i % set.len()]))
        .collect();
    assert_eq!(positions, expected);
    assert!(feeder.is_done());
    assert_eq!(feeder.fills(), 4);
    assert_eq!(e.status(), EngineStatus::Idle);
}

#[test]
fn unserviced_feeder_starves_engine() {
    let mut e = engine(8, 2, &[Axis::X]);
    let mut servo = SimulatedServo::new();
    let mut feeder = HostFeeder::new(triangle(), 0);
    assert_eq!(feeder.total_points(), 5);

    feeder.prime(&mut e).unwrap();
    e.activate(&servo).unwrap();
    for _ in 0..4 {
        e.tick(&mut servo);
    }
    assert_eq!(e.tick(&mut servo), TickOutcome::Starved);
    assert_eq!(e.total_points(), 4);

    // One remaining point goes into A, which the engine has left.
    assert_eq!(feeder.service(&mut e).unwrap(), Some(BufferId::A));
    assert!(feeder.is_done());
    assert!(matches!(e.tick(&mut servo), TickOutcome::Consumed { .. }));
    assert_eq!(e.total_points(), 5);
    assert_eq!(servo.actual_position(Axis::X), Fixed::ZERO);
}

#[test]
fn velocity_limits_checked_before_streaming() {
    let set = triangle();
    // One unit per millisecond.
    let limits = [(Axis::X, 0.5)].into_iter().collect();
    assert!(matches!(
        set.check_max_velocities(&limits),
        Err(HostError::VelocityLimit { axis: Axis::X, index: 1, .. })
    ));
}
