//! Integration test: shipped configuration and point set.

use std::path::PathBuf;

use trajscan_common::config::ConfigLoader;
use trajscan_common::engine::axis::Axis;
use trajscan_common::engine::state::EngineStatus;
use trajscan_engine::config::{load_config, AppConfig};
use trajscan_engine::cycle::{CycleRunner, StopReason};
use trajscan_engine::host::PointSet;

fn workspace_file(relative: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("..").join(relative)
}

#[test]
fn shipped_config_is_valid() {
    let config = load_config(&workspace_file("config/trajscan.toml")).unwrap();
    assert_eq!(config.shared.service_name, "trajscan");
    assert_eq!(config.engine.axes, vec![Axis::X, Axis::Y]);
    assert_eq!(config.engine.axes_register(), 384);
}

#[test]
fn shipped_point_set_streams_to_completion() {
    let config = load_config(&workspace_file("config/trajscan.toml")).unwrap();
    let points = PointSet::load(&workspace_file("config/snake_scan.json")).unwrap();
    assert_eq!(points.axis_mask().register_value(), config.engine.axes_register());
    let len = points.len() as u64;

    let mut runner = CycleRunner::new(&config, points).unwrap();
    let mut reason = None;
    for _ in 0..1000 {
        reason = runner.step().unwrap();
        if reason.is_some() {
            break;
        }
    }
    assert_eq!(reason, Some(StopReason::Completed));
    assert_eq!(runner.engine().total_points(), len);
    assert_eq!(runner.engine().status(), EngineStatus::Idle);
    assert!(runner.engine().snapshot().is_consistent());
}

#[test]
fn effective_config_round_trips_through_toml() {
    let config = load_config(&workspace_file("config/trajscan.toml")).unwrap();
    let text = toml::to_string_pretty(&config).unwrap();

    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("effective.toml");
    std::fs::write(&path, text).unwrap();

    let reloaded = load_config(&path).unwrap();
    assert_eq!(reloaded.engine.buffer_length, config.engine.buffer_length);
    assert_eq!(reloaded.engine.velocity, config.engine.velocity);
    assert_eq!(reloaded.servo.max_velocity, config.servo.max_velocity);
    assert_eq!(reloaded.host.points_file, config.host.points_file);
}

#[test]
fn invalid_buffer_length_is_rejected() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("bad.toml");
    std::fs::write(
        &path,
        "[shared]\nservice_name = \"t\"\n[engine]\nphysical_capacity = 10\nbuffer_length = 11\n",
    )
    .unwrap();
    let err = load_config(&path).unwrap_err();
    assert!(err.to_string().contains("buffer_length"));
}

#[test]
fn missing_config_is_reported() {
    let err = AppConfig::load(&workspace_file("config/does_not_exist.toml")).unwrap_err();
    assert!(err.to_string().contains("does_not_exist"));
}
