//! Integration test: fault latching.
//!
//! Zero move time, following error and servo faults move the engine to
//! Error. The code stays latched until reinitialisation.

use trajscan_common::engine::axis::Axis;
use trajscan_common::engine::fixed::Fixed;
use trajscan_common::engine::point::TrajectoryPoint;
use trajscan_common::engine::registers::Register;
use trajscan_common::engine::state::{BufferId, EngineStatus, ErrorCode};
use trajscan_engine::engine::TickOutcome;
use trajscan_engine::error::ControlError;
use trajscan_engine::servo::{ServoLayer, SimulatedServo};

use super::common::{engine, xy_ramp};

#[test]
fn zero_move_time_faults_without_moving() {
    let mut e = engine(10, 4, &[Axis::X]);
    let mut servo = SimulatedServo::new();
    let mut points = xy_ramp(1, 3);
    points[1] = TrajectoryPoint::new(0).with_coordinate(Axis::X, Fixed::from_int(50));
    e.fill_buffer(BufferId::A, &points).unwrap();
    e.activate(&servo).unwrap();

    assert!(matches!(e.tick(&mut servo), TickOutcome::Consumed { .. }));
    assert_eq!(
        e.tick(&mut servo),
        TickOutcome::Faulted(ErrorCode::ZeroMoveTime)
    );
    assert_eq!(e.status(), EngineStatus::Error);
    assert_eq!(e.read(Register::Error), ErrorCode::ZeroMoveTime as i64);
    assert_eq!(e.total_points(), 1);
    assert_eq!(servo.actual_position(Axis::X), Fixed::from_int(1));

    // Latched.
    assert_eq!(e.tick(&mut servo), TickOutcome::Inactive);
    assert_eq!(e.error_code(), ErrorCode::ZeroMoveTime);
}

#[test]
fn following_error_faults_after_commanding() {
    let mut e = engine(10, 4, &[Axis::X]);
    let mut servo = SimulatedServo::new()
        .with_max_velocity(Axis::X, Fixed::from_f64(0.1))
        .with_following_error_limit(Fixed::from_f64(0.5));

    // 1 unit per millisecond against a 0.1 units/ms axis.
    e.fill_buffer(BufferId::A, &xy_ramp(1, 4)).unwrap();
    e.activate(&servo).unwrap();

    assert_eq!(
        e.tick(&mut servo),
        TickOutcome::Faulted(ErrorCode::RuntimeOrFollowingError)
    );
    assert_eq!(e.status(), EngineStatus::Error);
    // The point was still counted.
    assert_eq!(e.total_points(), 1);
    assert_eq!(servo.actual_position(Axis::X), Fixed::from_f64(0.1));
}

#[test]
fn servo_fault_while_idle_latches() {
    let mut e = engine(10, 4, &[Axis::X]);
    let mut servo = SimulatedServo::new();
    e.activate(&servo).unwrap();
    assert_eq!(e.tick(&mut servo), TickOutcome::Starved);
    assert_eq!(e.status(), EngineStatus::Idle);

    servo.inject_fault();
    assert_eq!(
        e.tick(&mut servo),
        TickOutcome::Faulted(ErrorCode::RuntimeOrFollowingError)
    );
    assert_eq!(e.status(), EngineStatus::Error);
}

#[test]
fn invalid_axes_fail_activation() {
    for bad in [0, 512, -1] {
        let mut e = engine(10, 4, &[Axis::X]);
        e.write(Register::Axes, bad).unwrap();
        assert_eq!(e.activate(&SimulatedServo::new()), Ok(EngineStatus::Error));
        assert_eq!(e.error_code(), ErrorCode::InvalidAxes);
        assert_eq!(e.read(Register::Axes), bad);
    }
}

#[test]
fn reinitialise_recovers_from_error() {
    let mut e = engine(10, 4, &[Axis::X]);
    let mut servo = SimulatedServo::new();
    e.activate(&servo).unwrap();
    servo.inject_fault();
    e.tick(&mut servo);
    assert_eq!(e.status(), EngineStatus::Error);
    assert_eq!(
        e.write(Register::BufferLength, 2),
        Err(ControlError::NotInitialised(EngineStatus::Error))
    );

    servo.clear_fault();
    e.reinitialise();
    assert_eq!(e.status(), EngineStatus::Initialised);
    assert_eq!(e.read(Register::Error), 0);
    e.write(Register::BufferLength, 2).unwrap();

    e.fill_buffer(BufferId::A, &xy_ramp(9, 2)).unwrap();
    e.activate(&servo).unwrap();
    e.tick(&mut servo);
    assert_eq!(servo.actual_position(Axis::X), Fixed::from_int(9));
}
