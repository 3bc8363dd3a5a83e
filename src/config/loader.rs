//! Configuration loading from files (std only).

use std::fs;
use std::path::Path;

use crate::error::{ConfigError, Error, Result};

use super::MachineConfig;

/// Load configuration from a TOML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
///
/// # Example
///
/// ```rust,ignore
/// use motion_kernel::load_config;
///
/// let config = load_config("machine.toml")?;
/// ```
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<MachineConfig> {
    let content = fs::read_to_string(path.as_ref()).map_err(|e| {
        let msg = heapless::String::try_from(e.to_string().as_str()).unwrap_or_default();
        Error::Config(ConfigError::IoError(msg))
    })?;

    parse_config(&content)
}

/// Parse configuration from a TOML string.
///
/// # Errors
///
/// Returns an error if the TOML is invalid or fails validation.
pub fn parse_config(content: &str) -> Result<MachineConfig> {
    let config: MachineConfig = toml::from_str(content).map_err(|e| {
        let msg = heapless::String::try_from(e.message()).unwrap_or_default();
        Error::Config(ConfigError::ParseError(msg))
    })?;

    super::validation::validate_config(&config)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinematics::{Axis, Kinematics};

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
steps_per_mm = 95.0
max_feedrate_mm_per_sec = 25.0
max_acceleration_mm_per_sec2 = 10000.0
"#;

    #[test]
    fn test_parse_minimal_config() {
        let config = parse_config(AXES).unwrap();
        assert_eq!(config.kinematics, Kinematics::Cartesian);
        assert!(config.axes.get(Axis::Y).invert_direction);
        assert_eq!(config.motion.extruders, 1);
        assert_eq!(config.stepper.timer_frequency_hz, 2_000_000);
    }

    #[test]
    fn test_parse_core_xy_with_motion() {
        let toml = format!(
            r#"
[kinematics]
type = "core_xy"

[motion]
acceleration_mm_per_sec2 = 1500.0
max_xy_jerk_mm_per_sec = 10.0
extruders = 2
flow_percentage = 95
{}"#,
            AXES
        );

        let config = parse_config(&toml).unwrap();
        assert_eq!(config.kinematics, Kinematics::CoreXy);
        assert!((config.motion.acceleration.0 - 1500.0).abs() < 1e-3);
        assert_eq!(config.motion.extruders, 2);
        assert_eq!(config.motion.flow_percentage.value(), 95);
        // untouched fields keep their defaults
        assert!((config.motion.max_z_jerk.0 - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_parse_delta() {
        let toml = format!(
            r#"
[kinematics]
type = "delta"
diagonal_rod_mm = 250.0
radius_mm = 124.0
{}"#,
            AXES
        );

        let config = parse_config(&toml).unwrap();
        match config.kinematics {
            Kinematics::Delta(g) => {
                assert_eq!(g.diagonal_rod, 250.0);
                assert_eq!(g.segments_per_second, 200.0);
            }
            other => panic!("unexpected kinematics {:?}", other),
        }
    }

    #[test]
    fn test_invalid_flow_is_a_parse_error() {
        let toml = format!("[motion]\nflow_percentage = 0\n{}", AXES);
        assert!(matches!(
            parse_config(&toml),
            Err(Error::Config(ConfigError::ParseError(_)))
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            load_config("/nonexistent/machine.toml"),
            Err(Error::Config(ConfigError::IoError(_)))
        ));
    }
}
