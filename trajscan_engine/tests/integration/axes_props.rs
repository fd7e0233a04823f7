//! Property tests: axis decoding and stream accounting.

use proptest::prelude::*;
use trajscan_common::engine::axis::{Axis, AxisMask};
use trajscan_common::engine::registers::Register;
use trajscan_common::engine::state::{BufferId, EngineStatus, ErrorCode};
use trajscan_engine::engine::TickOutcome;
use trajscan_engine::servo::SimulatedServo;
use trajscan_engine::stream::decoder::decode_axes;
use trajscan_engine::stream::indirection::{Field, IndirectionTable, PointMemory};

use super::common::{engine, xy_ramp};

proptest! {
    #[test]
    fn valid_masks_decode_in_axis_order(value in 1i64..=511) {
        let set = decode_axes(value).unwrap();
        prop_assert_eq!(set.mask().register_value(), value);
        prop_assert_eq!(set.len() as u32, (value as u32).count_ones());

        let indices: Vec<usize> = set.axes().iter().map(|a| a.index()).collect();
        let mut sorted = indices.clone();
        sorted.sort_unstable();
        prop_assert_eq!(&indices, &sorted);
        for axis in Axis::ALL {
            prop_assert_eq!(set.is_enabled(axis), value & (1 << (8 - axis.index())) != 0);
        }
    }

    #[test]
    fn out_of_range_masks_are_rejected(value in prop_oneof![i64::MIN..=0i64, 512i64..=i64::MAX]) {
        prop_assert!(decode_axes(value).is_err());
        prop_assert!(AxisMask::from_register(value).is_err());
    }

    #[test]
    fn disabled_axes_read_blank(value in 1i64..=511) {
        let memory = PointMemory::new(4);
        let mut table = IndirectionTable::new(memory.blank_address());
        let set = decode_axes(value).unwrap();
        set.bind(&mut table);
        for axis in Axis::ALL {
            prop_assert_eq!(table.is_live(Field::Coord(axis)), set.is_enabled(axis));
        }
        prop_assert!(table.is_live(Field::Time));
    }

    #[test]
    fn activation_latches_invalid_axes(value in 512i64..=4096) {
        let mut e = engine(4, 4, &[Axis::X]);
        e.write(Register::Axes, value).unwrap();
        prop_assert_eq!(e.activate(&SimulatedServo::new()), Ok(EngineStatus::Error));
        prop_assert_eq!(e.error_code(), ErrorCode::InvalidAxes);
    }

    /// However the host splits a run into fills, every committed point is
    /// consumed exactly once.
    #[test]
    fn every_point_is_consumed_once(fills in proptest::collection::vec(1i64..=6, 1..12)) {
        let mut e = engine(6, 6, &[Axis::X]);
        let mut servo = SimulatedServo::new();
        let mut next = 0i64;
        let mut buffer = BufferId::A;
        let mut committed = 0u64;

        let first = fills[0];
        e.fill_buffer(buffer, &xy_ramp(next, first)).unwrap();
        next += first;
        committed += first as u64;
        e.activate(&servo).unwrap();

        for &n in &fills[1..] {
            buffer = buffer.other();
            // Drain until the target buffer is released.
            while e.begin_fill(buffer).is_err() {
                let consumed = matches!(e.tick(&mut servo), TickOutcome::Consumed { .. });
                prop_assert!(consumed, "engine stopped while draining");
            }
            e.fill_buffer(buffer, &xy_ramp(next, n)).unwrap();
            next += n;
            committed += n as u64;
        }
        for _ in 0..(fills.len() * 6 + 1) {
            e.tick(&mut servo);
        }

        prop_assert_eq!(e.total_points(), committed);
        prop_assert_eq!(e.status(), EngineStatus::Idle);
    }
}
