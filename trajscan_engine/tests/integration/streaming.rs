//! Integration test: continuous ping-pong streaming.
//!
//! The host refills whichever buffer the engine is not consuming while the
//! engine swaps between them without losing or repeating a point.

use trajscan_common::engine::axis::Axis;
use trajscan_common::engine::fixed::Fixed;
use trajscan_common::engine::registers::Register;
use trajscan_common::engine::state::{BufferId, EngineStatus};
use trajscan_engine::engine::TickOutcome;
use trajscan_engine::error::BufferError;
use trajscan_engine::servo::{ServoLayer, SimulatedServo};

use super::common::{engine, xy_ramp};

const CONTINUE: TickOutcome = TickOutcome::Consumed {
    swapped: false,
    exhausted: false,
};
const SWAPPED: TickOutcome = TickOutcome::Consumed {
    swapped: true,
    exhausted: false,
};
const EXHAUSTED: TickOutcome = TickOutcome::Consumed {
    swapped: false,
    exhausted: true,
};

#[test]
fn ping_pong_stream_keeps_registers_consistent() {
    let mut e = engine(10, 4, &[Axis::X, Axis::Y]);
    let mut servo = SimulatedServo::new();

    e.fill_buffer(BufferId::A, &xy_ramp(1, 4)).unwrap();
    e.fill_buffer(BufferId::B, &xy_ramp(5, 4)).unwrap();
    assert_eq!(e.activate(&servo), Ok(EngineStatus::Active));
    assert_eq!(e.read(Register::BufferAdrB), 40);

    let mut outcomes = Vec::new();
    for _ in 0..4 {
        outcomes.push(e.tick(&mut servo));
        assert!(e.snapshot().is_consistent());
    }
    assert_eq!(outcomes, vec![CONTINUE, CONTINUE, CONTINUE, SWAPPED]);
    assert_eq!(e.read(Register::CurrentBuffer), 1);
    assert_eq!(e.read(Register::CurrentBufferAdr), 40);
    assert_eq!(e.read(Register::PrevBufferFill), 4);
    assert_eq!(e.read(Register::CurrentIndex), 0);

    // B is now owned by the engine.
    assert_eq!(e.begin_fill(BufferId::B), Err(BufferError::Busy(BufferId::B)));
    e.fill_buffer(BufferId::A, &xy_ramp(9, 3)).unwrap();

    for i in 0..7 {
        let outcome = e.tick(&mut servo);
        assert!(e.snapshot().is_consistent());
        match i {
            3 => assert_eq!(outcome, SWAPPED),
            6 => assert_eq!(outcome, EXHAUSTED),
            _ => assert_eq!(outcome, CONTINUE),
        }
    }

    assert_eq!(e.status(), EngineStatus::Idle);
    assert_eq!(e.read(Register::TotalPoints), 11);
    assert_eq!(e.read(Register::CurrentBuffer), 0);
    assert_eq!(e.read(Register::CurrentBufferFill), 3);
    assert_eq!(servo.actual_position(Axis::X), Fixed::from_int(11));
    assert_eq!(servo.actual_position(Axis::Y), Fixed::from_int(-11));
}

#[test]
fn segment_velocity_follows_points() {
    let mut e = engine(10, 4, &[Axis::X, Axis::Y]);
    let mut servo = SimulatedServo::new();
    e.fill_buffer(BufferId::A, &xy_ramp(1, 2)).unwrap();
    e.activate(&servo).unwrap();

    e.tick(&mut servo);
    e.tick(&mut servo);
    // One unit per 4 ticks.
    let x = e.axis_state(Axis::X).unwrap();
    assert_eq!(x.previous_position, Fixed::from_int(2));
    assert_eq!(x.current_velocity.raw(), 4_194_304);
    assert_eq!(e.axis_state(Axis::Y).unwrap().current_velocity.raw(), -4_194_304);
    assert_eq!(e.axis_state(Axis::Z), None);
}

#[test]
fn consumed_buffer_is_never_replayed() {
    let mut e = engine(10, 2, &[Axis::X]);
    let mut servo = SimulatedServo::new();
    e.fill_buffer(BufferId::A, &xy_ramp(1, 2)).unwrap();
    e.fill_buffer(BufferId::B, &xy_ramp(3, 2)).unwrap();
    e.activate(&servo).unwrap();

    let outcomes: Vec<_> = (0..4).map(|_| e.tick(&mut servo)).collect();
    assert_eq!(outcomes, vec![CONTINUE, SWAPPED, CONTINUE, EXHAUSTED]);
    assert_eq!(e.status(), EngineStatus::Idle);

    for _ in 0..3 {
        assert_eq!(e.tick(&mut servo), TickOutcome::Starved);
    }
    assert_eq!(e.total_points(), 4);
    assert_eq!(servo.actual_position(Axis::X), Fixed::from_int(4));

    // A fresh commit on A resumes motion.
    e.fill_buffer(BufferId::A, &xy_ramp(5, 1)).unwrap();
    assert_eq!(e.tick(&mut servo), EXHAUSTED);
    assert_eq!(e.current_buffer(), BufferId::A);
    assert_eq!(e.total_points(), 5);
    assert_eq!(servo.actual_position(Axis::X), Fixed::from_int(5));
}

#[test]
fn partial_fill_and_overflow() {
    let mut e = engine(10, 3, &[Axis::X]);
    e.fill_buffer(BufferId::A, &xy_ramp(0, 1)).unwrap();
    assert_eq!(e.read(Register::BufferFillA), 1);
    assert_eq!(e.read(Register::CurrentBufferFill), 1);

    assert_eq!(
        e.fill_buffer(BufferId::B, &xy_ramp(0, 4)),
        Err(BufferError::Overflow {
            buffer: BufferId::B,
            capacity: 3
        })
    );
    // The overflowing fill was never committed.
    assert_eq!(e.read(Register::BufferFillB), 0);
}

#[test]
fn buffer_length_moves_block_b() {
    let mut e = engine(100, 100, &[Axis::X]);
    assert_eq!(e.read(Register::BufferAdrB), 1000);
    e.write(Register::BufferLength, 25).unwrap();
    assert_eq!(e.read(Register::BufferLength), 25);
    assert_eq!(e.read(Register::BufferAdrB), 250);

    let mut servo = SimulatedServo::new();
    e.fill_buffer(BufferId::B, &xy_ramp(7, 1)).unwrap();
    e.activate(&servo).unwrap();
    assert_eq!(e.tick(&mut servo), EXHAUSTED);
    assert_eq!(e.read(Register::CurrentBufferAdr), 250);
    assert_eq!(servo.actual_position(Axis::X), Fixed::from_int(7));
}
