//! Unit tests for TOML configuration parsing.

use motion_kernel::config::{load_config, parse_config, MachineConfig, PlannerSettings, StepperSettings};
use motion_kernel::kinematics::{Axis, Kinematics};

const AXES: &str = r#"
[axes.x]
steps_per_mm = 80.0
max_feedrate_mm_per_sec = 300.0
max_acceleration_mm_per_sec2 = 3000.0

[axes.y]
steps_per_mm = 80.0
max_feedrate_mm_per_sec = 300.0
max_acceleration_mm_per_sec2 = 3000.0
invert_direction = true

[axes.z]
steps_per_mm = 400.0
max_feedrate_mm_per_sec = 5.0
max_acceleration_mm_per_sec2 = 100.0

[axes.e]
steps_per_mm = 93.0
max_feedrate_mm_per_sec = 25.0
max_acceleration_mm_per_sec2 = 10000.0
"#;

/// Test parsing a machine with only the required axis tables.
#[test]
fn test_parse_axes_only() {
    let config: MachineConfig = toml::from_str(AXES).expect("Failed to parse TOML");

    assert_eq!(config.kinematics, Kinematics::Cartesian);
    assert_eq!(config.axes.get(Axis::E).steps_per_mm.0, 93.0);
    assert!(config.axes.get(Axis::Y).invert_direction);
    assert!(!config.axes.get(Axis::X).invert_direction);
    assert_eq!(config.motion.extruders, 1);
    assert_eq!(config.motion.min_steps_per_segment, 6);
}

/// Test parsing motion, stepper and advance sections.
#[test]
fn test_parse_full_machine() {
    let toml_str = format!(
        r#"
kinematics = {{ type = "core_xy" }}

[motion]
acceleration_mm_per_sec2 = 1500.0
max_xy_jerk_mm_per_sec = 10.0
min_segment_time_us = 15000
slowdown = false
extruders = 2
flow_percentage = 95

[stepper]
timer_frequency_hz = 2000000
max_step_frequency_hz = 30000

[advance]
k = 0.02
{}"#,
        AXES
    );

    let config = parse_config(&toml_str).expect("Failed to parse config");
    assert_eq!(config.kinematics, Kinematics::CoreXy);
    assert_eq!(config.motion.acceleration.0, 1500.0);
    assert_eq!(config.motion.flow_percentage.value(), 95);
    assert!(!config.motion.slowdown);
    assert_eq!(config.stepper.max_step_frequency_hz, 30_000);
    assert!(config.advance.is_enabled());

    let planner = PlannerSettings::from_config(&config);
    assert_eq!(planner.extruders, 2);
    assert_eq!(planner.advance_k, 0.02);
    assert_eq!(planner.min_segment_time_us, 15_000);

    let stepper = StepperSettings::from_config(&config);
    assert_eq!(stepper.invert_mask, Axis::Y.bit());
    assert!(stepper.advance_enabled);
}

/// Test parsing a delta geometry table.
#[test]
fn test_parse_delta_geometry() {
    let toml_str = format!(
        "kinematics = {{ type = \"delta\", diagonal_rod_mm = 215.0, radius_mm = 105.0 }}\n{}",
        AXES
    );

    let config = parse_config(&toml_str).expect("Failed to parse config");
    let Kinematics::Delta(geometry) = config.kinematics else {
        panic!("expected delta kinematics");
    };
    assert_eq!(geometry.diagonal_rod, 215.0);
    assert_eq!(geometry.radius, 105.0);
    assert!(geometry.segments_per_second > 0.0);
}

/// Test that an out-of-range flow percentage fails to deserialize.
#[test]
fn test_flow_percentage_rejected_at_parse() {
    let toml_str = format!("[motion]\nflow_percentage = 0\n{}", AXES);
    assert!(parse_config(&toml_str).is_err());
}

/// Test that a missing axis table is a parse error.
#[test]
fn test_missing_axis_fails() {
    let toml_str = AXES.replace("[axes.e]", "[axes.w]");
    assert!(parse_config(&toml_str).is_err());
}

/// Test loading from a file.
#[test]
fn test_load_config_from_file() {
    let path = std::env::temp_dir().join(format!("motion-kernel-{}.toml", std::process::id()));
    std::fs::write(&path, AXES).expect("Failed to write temp config");

    let config = load_config(&path).expect("Failed to load config");
    assert_eq!(config.axes.get(Axis::Z).steps_per_mm.0, 400.0);

    let _ = std::fs::remove_file(&path);
    assert!(load_config(&path).is_err());
}
