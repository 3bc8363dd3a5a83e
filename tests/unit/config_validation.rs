//! Unit tests for configuration validation.

use motion_kernel::config::{parse_config, validate_config, MachineConfig};
use motion_kernel::error::{ConfigError, Error};
use motion_kernel::kinematics::Axis;

fn axes(z_steps_per_mm: f32) -> String {
    format!(
        r#"
[axes.x]
steps_per_mm = 80.0
max_feedrate_mm_per_sec = 300.0
max_acceleration_mm_per_sec2 = 3000.0

[axes.y]
steps_per_mm = 80.0
max_feedrate_mm_per_sec = 300.0
max_acceleration_mm_per_sec2 = 3000.0

[axes.z]
steps_per_mm = {}
max_feedrate_mm_per_sec = 5.0
max_acceleration_mm_per_sec2 = 100.0

[axes.e]
steps_per_mm = 93.0
max_feedrate_mm_per_sec = 25.0
max_acceleration_mm_per_sec2 = 10000.0
"#,
        z_steps_per_mm
    )
}

/// Test validation of a valid configuration.
#[test]
fn test_valid_config_passes_validation() {
    let config: MachineConfig = toml::from_str(&axes(400.0)).expect("Failed to parse TOML");
    assert!(validate_config(&config).is_ok());
}

/// Test validation fails for a zero steps/mm.
#[test]
fn test_zero_steps_per_mm() {
    let result = parse_config(&axes(0.0));
    assert!(matches!(
        result,
        Err(Error::Config(ConfigError::InvalidStepsPerMm { axis: Axis::Z, .. }))
    ));
}

/// Test validation fails for a negative acceleration.
#[test]
fn test_negative_acceleration() {
    let toml_str = format!("[motion]\ntravel_acceleration_mm_per_sec2 = -10.0\n{}", axes(400.0));
    assert!(matches!(
        parse_config(&toml_str),
        Err(Error::Config(ConfigError::InvalidAcceleration(_)))
    ));
}

/// Test validation fails for too many extruders.
#[test]
fn test_too_many_extruders() {
    let toml_str = format!("[motion]\nextruders = 9\n{}", axes(400.0));
    assert!(matches!(
        parse_config(&toml_str),
        Err(Error::Config(ConfigError::InvalidExtruderCount(9)))
    ));
}

/// Test validation fails when the step batching thresholds are out of order.
#[test]
fn test_step_batching_order() {
    let toml_str = format!(
        "[stepper]\ndouble_step_frequency_hz = 20000\nquad_step_frequency_hz = 10000\n{}",
        axes(400.0)
    );
    assert!(matches!(
        parse_config(&toml_str),
        Err(Error::Config(ConfigError::InvalidStepRates { .. }))
    ));
}

/// Test validation fails for a delta whose rods are shorter than the radius.
#[test]
fn test_impossible_delta() {
    let toml_str = format!(
        "kinematics = {{ type = \"delta\", diagonal_rod_mm = 100.0, radius_mm = 120.0 }}\n{}",
        axes(80.0)
    );
    assert!(matches!(
        parse_config(&toml_str),
        Err(Error::Config(ConfigError::InvalidDeltaGeometry { .. }))
    ));
}
