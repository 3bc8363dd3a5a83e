//! Runtime snapshots derived from the machine configuration.
//!
//! The planner and the executor read these on every move and every tick.
//! They are plain values: a configuration change builds new snapshots and
//! swaps them in whole.

use crate::kinematics::{Axis, Kinematics, NUM_AXES};

use super::machine::MachineConfig;
use super::units::FlowPercentage;

/// Everything `buffer_line` needs, precomputed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlannerSettings {
    /// Machine geometry.
    pub kinematics: Kinematics,

    /// Steps per millimeter, per axis.
    pub steps_per_mm: [f32; NUM_AXES],

    /// Maximum actuator speed, per axis (mm/s).
    pub max_feedrate: [f32; NUM_AXES],

    /// Maximum actuator acceleration, per axis (steps/s²).
    pub max_acceleration_steps_per_s2: [u32; NUM_AXES],

    /// Acceleration for moves that extrude (mm/s²).
    pub acceleration: f32,

    /// Acceleration for extruder-only moves (mm/s²).
    pub retract_acceleration: f32,

    /// Acceleration for moves that do not extrude (mm/s²).
    pub travel_acceleration: f32,

    /// XY junction jerk (mm/s).
    pub max_xy_jerk: f32,

    /// Z junction jerk (mm/s).
    pub max_z_jerk: f32,

    /// E junction jerk (mm/s).
    pub max_e_jerk: f32,

    /// Feed-rate floor for extruding moves (mm/s).
    pub min_feedrate: f32,

    /// Feed-rate floor for travel moves (mm/s).
    pub min_travel_feedrate: f32,

    /// Segment time below which the planner slows down (µs).
    pub min_segment_time_us: u32,

    /// Whether short segments are stretched while the queue drains.
    pub slowdown: bool,

    /// Exit speed of the newest block (mm/s).
    pub minimum_planner_speed: f32,

    /// Minimum dominant-axis step count of an accepted move.
    pub min_steps_per_segment: u32,

    /// Configured extruder count.
    pub extruders: u8,

    /// Initial flow override.
    pub flow: FlowPercentage,

    /// Pressure advance coefficient (s). Zero when disabled.
    pub advance_k: f32,

    /// Step timer tick rate, for fixed-point acceleration rates.
    pub timer_frequency_hz: u32,

    /// Floor for initial and final step rates.
    pub min_step_rate: u32,
}

impl PlannerSettings {
    /// Compute the planner snapshot from a validated configuration.
    pub fn from_config(config: &MachineConfig) -> Self {
        let mut steps_per_mm = [0.0; NUM_AXES];
        let mut max_feedrate = [0.0; NUM_AXES];
        let mut max_acceleration_steps_per_s2 = [0; NUM_AXES];

        for (axis, axis_config) in config.axes.iter() {
            let i = axis.index();
            steps_per_mm[i] = axis_config.steps_per_mm.value();
            max_feedrate[i] = axis_config.max_feedrate.value();
            max_acceleration_steps_per_s2[i] = axis_config.max_acceleration_steps_per_s2();
        }

        let motion = &config.motion;
        Self {
            kinematics: config.kinematics,
            steps_per_mm,
            max_feedrate,
            max_acceleration_steps_per_s2,
            acceleration: motion.acceleration.value(),
            retract_acceleration: motion.retract_acceleration.value(),
            travel_acceleration: motion.travel_acceleration.value(),
            max_xy_jerk: motion.max_xy_jerk.value(),
            max_z_jerk: motion.max_z_jerk.value(),
            max_e_jerk: motion.max_e_jerk.value(),
            min_feedrate: motion.min_feedrate.value(),
            min_travel_feedrate: motion.min_travel_feedrate.value(),
            min_segment_time_us: motion.min_segment_time_us,
            slowdown: motion.slowdown,
            minimum_planner_speed: motion.minimum_planner_speed.value(),
            min_steps_per_segment: motion.min_steps_per_segment,
            extruders: motion.extruders,
            flow: motion.flow_percentage,
            advance_k: if config.advance.is_enabled() { config.advance.k } else { 0.0 },
            timer_frequency_hz: config.stepper.timer_frequency_hz,
            min_step_rate: config.stepper.min_step_rate,
        }
    }

    /// Steps per millimeter of one axis.
    #[inline]
    pub fn steps_per_mm(&self, axis: Axis) -> f32 {
        self.steps_per_mm[axis.index()]
    }
}

/// Everything the stepper interrupt needs, precomputed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepperSettings {
    /// Step timer tick rate.
    pub timer_frequency_hz: u32,

    /// Step-rate ceiling.
    pub max_step_frequency: u32,

    /// Rate above which two steps are emitted per tick.
    pub double_step_frequency: u32,

    /// Rate above which four steps are emitted per tick.
    pub quad_step_frequency: u32,

    /// Shortest timer period.
    pub min_timer_period: u32,

    /// Timer period while idle.
    pub idle_period: u32,

    /// Direction bits whose pin level is inverted.
    pub invert_mask: u8,

    /// Whether E pulses go through the pressure-advance accumulator.
    pub advance_enabled: bool,

    /// Configured extruder count.
    pub extruders: u8,
}

impl StepperSettings {
    /// Compute the executor snapshot from a validated configuration.
    pub fn from_config(config: &MachineConfig) -> Self {
        let stepper = &config.stepper;
        let invert_mask = config
            .axes
            .iter()
            .filter(|(_, axis_config)| axis_config.invert_direction)
            .fold(0u8, |mask, (axis, _)| mask | axis.bit());

        Self {
            timer_frequency_hz: stepper.timer_frequency_hz,
            max_step_frequency: stepper.max_step_frequency_hz,
            double_step_frequency: stepper.double_step_frequency_hz,
            quad_step_frequency: stepper.quad_step_frequency_hz,
            min_timer_period: stepper.min_timer_period,
            idle_period: stepper.timer_frequency_hz / stepper.idle_frequency_hz.max(1),
            invert_mask,
            advance_enabled: config.advance.is_enabled(),
            extruders: config.motion.extruders,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::axis::{AxesConfig, AxisConfig};
    use crate::config::machine::{AdvanceConfig, MotionConfig, StepperConfig};
    use crate::config::units::{MmPerSec, MmPerSecSquared, StepsPerMm};

    fn axis(steps_per_mm: f32, invert: bool) -> AxisConfig {
        AxisConfig {
            steps_per_mm: StepsPerMm(steps_per_mm),
            max_feedrate: MmPerSec(200.0),
            max_acceleration: MmPerSecSquared(1000.0),
            invert_direction: invert,
        }
    }

    fn make_test_config() -> MachineConfig {
        MachineConfig {
            kinematics: Kinematics::Cartesian,
            axes: AxesConfig {
                x: axis(80.0, false),
                y: axis(80.0, true),
                z: axis(400.0, false),
                e: axis(100.0, true),
            },
            motion: MotionConfig::default(),
            stepper: StepperConfig::default(),
            advance: AdvanceConfig::default(),
        }
    }

    #[test]
    fn test_planner_snapshot() {
        let settings = PlannerSettings::from_config(&make_test_config());

        assert_eq!(settings.steps_per_mm(Axis::Z), 400.0);
        // 1000 mm/s² * 400 steps/mm
        assert_eq!(settings.max_acceleration_steps_per_s2[2], 400_000);
        assert_eq!(settings.advance_k, 0.0);
    }

    #[test]
    fn test_stepper_snapshot() {
        let settings = StepperSettings::from_config(&make_test_config());

        assert_eq!(settings.invert_mask, Axis::Y.bit() | Axis::E.bit());
        // 2 MHz / 1 kHz
        assert_eq!(settings.idle_period, 2000);
        assert!(!settings.advance_enabled);
    }
}
