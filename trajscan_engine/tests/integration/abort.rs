//! Integration test: abort parking and resume.
//!
//! `Abort` is edge-triggered: a rising edge parks the engine at Idle on the
//! next tick. It stays parked until the host continues, either by committing
//! a buffer or by writing 0, and then resumes from the exact point it
//! stopped at.

use trajscan_common::engine::axis::Axis;
use trajscan_common::engine::fixed::Fixed;
use trajscan_common::engine::registers::Register;
use trajscan_common::engine::state::{BufferId, EngineStatus, ErrorCode};
use trajscan_engine::engine::TickOutcome;
use trajscan_engine::servo::{ServoLayer, SimulatedServo};

use super::common::{engine, xy_ramp};

#[test]
fn abort_parks_and_resumes_in_place() {
    let mut e = engine(10, 5, &[Axis::X]);
    let mut servo = SimulatedServo::new();
    e.fill_buffer(BufferId::A, &xy_ramp(1, 5)).unwrap();
    e.activate(&servo).unwrap();

    e.tick(&mut servo);
    e.tick(&mut servo);
    e.write(Register::Abort, 1).unwrap();

    for _ in 0..5 {
        assert_eq!(e.tick(&mut servo), TickOutcome::Parked);
        assert_eq!(e.status(), EngineStatus::Idle);
    }
    assert_eq!(e.read(Register::CurrentIndex), 2);
    assert_eq!(e.total_points(), 2);
    assert_eq!(servo.actual_position(Axis::X), Fixed::from_int(2));
    assert_eq!(e.error_code(), ErrorCode::None);

    e.write(Register::Abort, 0).unwrap();
    assert!(matches!(e.tick(&mut servo), TickOutcome::Consumed { .. }));
    assert_eq!(e.status(), EngineStatus::Active);
    assert_eq!(servo.actual_position(Axis::X), Fixed::from_int(3));
}

#[test]
fn abort_before_activation_parks_on_first_tick() {
    let mut e = engine(10, 5, &[Axis::X]);
    let mut servo = SimulatedServo::new();
    e.fill_buffer(BufferId::A, &xy_ramp(1, 5)).unwrap();
    e.write(Register::Abort, 1).unwrap();
    e.activate(&servo).unwrap();

    assert_eq!(e.tick(&mut servo), TickOutcome::Parked);
    assert_eq!(e.status(), EngineStatus::Idle);
    assert_eq!(servo.command_count(), 0);
}

#[test]
fn host_can_refill_while_parked() {
    let mut e = engine(10, 2, &[Axis::X]);
    let mut servo = SimulatedServo::new();
    e.fill_buffer(BufferId::A, &xy_ramp(1, 2)).unwrap();
    e.activate(&servo).unwrap();
    e.write(Register::Abort, 1).unwrap();
    e.tick(&mut servo);

    e.fill_buffer(BufferId::B, &xy_ramp(3, 2)).unwrap();
    e.write(Register::Abort, 0).unwrap();

    let consumed = (0..4)
        .filter(|_| matches!(e.tick(&mut servo), TickOutcome::Consumed { .. }))
        .count();
    assert_eq!(consumed, 4);
    assert_eq!(servo.actual_position(Axis::X), Fixed::from_int(4));
}

#[test]
fn abort_does_not_affect_initialised_or_error() {
    let mut e = engine(10, 2, &[Axis::X]);
    let mut servo = SimulatedServo::new();
    e.write(Register::Abort, 1).unwrap();
    assert_eq!(e.tick(&mut servo), TickOutcome::Inactive);
    assert_eq!(e.status(), EngineStatus::Initialised);
}

#[test]
fn commit_continues_with_abort_still_set() {
    let mut e = engine(10, 5, &[Axis::X]);
    let mut servo = SimulatedServo::new();
    e.fill_buffer(BufferId::A, &xy_ramp(1, 5)).unwrap();
    e.activate(&servo).unwrap();

    e.tick(&mut servo);
    e.tick(&mut servo);
    e.write(Register::Abort, 1).unwrap();
    assert_eq!(e.tick(&mut servo), TickOutcome::Parked);
    assert_eq!(e.tick(&mut servo), TickOutcome::Parked);
    assert_eq!(e.total_points(), 2);

    e.fill_buffer(BufferId::B, &xy_ramp(6, 5)).unwrap();
    assert!(!e.is_parked());
    assert!(matches!(e.tick(&mut servo), TickOutcome::Consumed { .. }));
    assert_eq!(e.status(), EngineStatus::Active);
    assert_eq!(servo.actual_position(Axis::X), Fixed::from_int(3));
    assert_eq!(e.read(Register::Abort), 1);

    while matches!(e.tick(&mut servo), TickOutcome::Consumed { .. }) {}
    assert_eq!(e.total_points(), 10);
    assert_eq!(servo.actual_position(Axis::X), Fixed::from_int(10));
}

#[test]
fn rewriting_a_held_abort_does_not_park_again() {
    let mut e = engine(10, 5, &[Axis::X]);
    let mut servo = SimulatedServo::new();
    e.fill_buffer(BufferId::A, &xy_ramp(1, 5)).unwrap();
    e.activate(&servo).unwrap();

    e.write(Register::Abort, 1).unwrap();
    assert_eq!(e.tick(&mut servo), TickOutcome::Parked);
    e.fill_buffer(BufferId::B, &xy_ramp(6, 5)).unwrap();
    assert!(matches!(e.tick(&mut servo), TickOutcome::Consumed { .. }));

    e.write(Register::Abort, 1).unwrap();
    assert!(matches!(e.tick(&mut servo), TickOutcome::Consumed { .. }));

    e.write(Register::Abort, 0).unwrap();
    e.write(Register::Abort, 1).unwrap();
    assert_eq!(e.tick(&mut servo), TickOutcome::Parked);
    assert_eq!(e.total_points(), 2);
    assert_eq!(e.read(Register::CurrentIndex), 2);
}

#[test]
fn reinitialise_clears_abort() {
    let mut e = engine(10, 5, &[Axis::X]);
    let mut servo = SimulatedServo::new();
    e.fill_buffer(BufferId::A, &xy_ramp(1, 5)).unwrap();
    e.activate(&servo).unwrap();
    e.write(Register::Abort, 1).unwrap();
    assert_eq!(e.tick(&mut servo), TickOutcome::Parked);

    e.reinitialise();
    assert_eq!(e.read(Register::Abort), 0);
    assert!(!e.is_parked());
    e.fill_buffer(BufferId::A, &xy_ramp(1, 5)).unwrap();
    e.activate(&servo).unwrap();
    assert!(matches!(e.tick(&mut servo), TickOutcome::Consumed { .. }));
}
