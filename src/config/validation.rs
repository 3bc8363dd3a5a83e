//! Configuration validation.
//!
//! The planner divides by steps/mm and accelerations on every move without
//! re-checking them, so every such value is checked here, once.

use crate::error::{ConfigError, Error, Result};
use crate::kinematics::{Axis, Kinematics, MAX_EXTRUDERS};

use super::axis::AxisConfig;
use super::machine::{MotionConfig, StepperConfig};
use super::MachineConfig;

/// Validate a machine configuration.
///
/// Checks:
/// - Every axis has positive steps/mm, max feed rate and max acceleration
/// - Default accelerations are positive and jerk limits non-negative
/// - The extruder count is supported
/// - The step timer can represent the configured step-rate range
/// - Delta geometry (if any) can reach the bed center
pub fn validate_config(config: &MachineConfig) -> Result<()> {
    for (axis, axis_config) in config.axes.iter() {
        validate_axis(axis, axis_config)?;
    }

    validate_motion(&config.motion)?;
    validate_stepper(&config.stepper)?;

    if let Kinematics::Delta(geometry) = config.kinematics {
        if !geometry.is_valid() {
            return Err(Error::Config(ConfigError::InvalidDeltaGeometry {
                diagonal_rod: geometry.diagonal_rod,
                radius: geometry.radius,
            }));
        }
    }

    Ok(())
}

/// False for zero, negative and NaN.
fn is_positive(value: f32) -> bool {
    value > 0.0
}

fn validate_axis(axis: Axis, config: &AxisConfig) -> Result<()> {
    if !is_positive(config.steps_per_mm.0) {
        return Err(Error::Config(ConfigError::InvalidStepsPerMm {
            axis,
            value: config.steps_per_mm.0,
        }));
    }

    if !is_positive(config.max_feedrate.0) {
        return Err(Error::Config(ConfigError::InvalidMaxFeedrate {
            axis,
            value: config.max_feedrate.0,
        }));
    }

    if !is_positive(config.max_acceleration.0) || config.max_acceleration_steps_per_s2() == 0 {
        return Err(Error::Config(ConfigError::InvalidMaxAcceleration {
            axis,
            value: config.max_acceleration.0,
        }));
    }

    Ok(())
}

fn validate_motion(config: &MotionConfig) -> Result<()> {
    for acceleration in [
        config.acceleration,
        config.retract_acceleration,
        config.travel_acceleration,
    ] {
        if !is_positive(acceleration.0) {
            return Err(Error::Config(ConfigError::InvalidAcceleration(acceleration.0)));
        }
    }

    for jerk in [config.max_xy_jerk, config.max_z_jerk, config.max_e_jerk] {
        if jerk.0.is_nan() || jerk.0 < 0.0 {
            return Err(Error::Config(ConfigError::InvalidJerk(jerk.0)));
        }
    }

    if !is_positive(config.minimum_planner_speed.0) {
        return Err(Error::Config(ConfigError::InvalidMinimumPlannerSpeed(
            config.minimum_planner_speed.0,
        )));
    }

    if config.extruders == 0 || config.extruders as usize > MAX_EXTRUDERS {
        return Err(Error::Config(ConfigError::InvalidExtruderCount(config.extruders)));
    }

    Ok(())
}

fn validate_stepper(config: &StepperConfig) -> Result<()> {
    if config.min_step_rate == 0 || config.min_step_rate >= config.max_step_frequency_hz {
        return Err(Error::Config(ConfigError::InvalidStepRates {
            min: config.min_step_rate,
            max: config.max_step_frequency_hz,
        }));
    }

    if config.double_step_frequency_hz >= config.quad_step_frequency_hz {
        return Err(Error::Config(ConfigError::InvalidStepRates {
            min: config.double_step_frequency_hz,
            max: config.quad_step_frequency_hz,
        }));
    }

    // The fastest tick (after step_loops division) must still last at least
    // the minimum timer period, and the slowest idle period must be nonzero.
    let fastest_tick_rate = config.max_step_frequency_hz.min(config.double_step_frequency_hz.max(1));
    if config.timer_frequency_hz == 0
        || config.idle_frequency_hz == 0
        || config.timer_frequency_hz / config.idle_frequency_hz == 0
        || config.timer_frequency_hz / fastest_tick_rate.max(1) < config.min_timer_period.max(1)
    {
        return Err(Error::Config(ConfigError::InvalidTimerFrequency(
            config.timer_frequency_hz,
        )));
    }

    Ok(())
}
