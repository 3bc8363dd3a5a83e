//! Machine configuration - root configuration structure.

use serde::Deserialize;

use crate::kinematics::Kinematics;

use super::axis::AxesConfig;
use super::units::{FlowPercentage, MmPerSec, MmPerSecSquared};

/// Root configuration structure from TOML.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct MachineConfig {
    /// Machine geometry.
    #[serde(default)]
    pub kinematics: Kinematics,

    /// Per-axis resolution and limits.
    pub axes: AxesConfig,

    /// Planner defaults.
    #[serde(default)]
    pub motion: MotionConfig,

    /// Step timer parameters.
    #[serde(default)]
    pub stepper: StepperConfig,

    /// Pressure advance.
    #[serde(default)]
    pub advance: AdvanceConfig,
}

/// Planner defaults: accelerations, jerk limits and segment handling.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Acceleration for moves that extrude.
    #[serde(rename = "acceleration_mm_per_sec2")]
    pub acceleration: MmPerSecSquared,

    /// Acceleration for extruder-only moves.
    #[serde(rename = "retract_acceleration_mm_per_sec2")]
    pub retract_acceleration: MmPerSecSquared,

    /// Acceleration for moves that do not extrude.
    #[serde(rename = "travel_acceleration_mm_per_sec2")]
    pub travel_acceleration: MmPerSecSquared,

    /// Instantaneous XY speed change allowed at a junction.
    #[serde(rename = "max_xy_jerk_mm_per_sec")]
    pub max_xy_jerk: MmPerSec,

    /// Instantaneous Z speed change allowed at a junction.
    #[serde(rename = "max_z_jerk_mm_per_sec")]
    pub max_z_jerk: MmPerSec,

    /// Instantaneous E speed change allowed at a junction.
    #[serde(rename = "max_e_jerk_mm_per_sec")]
    pub max_e_jerk: MmPerSec,

    /// Floor for the feed rate of extruding moves.
    #[serde(rename = "min_feedrate_mm_per_sec")]
    pub min_feedrate: MmPerSec,

    /// Floor for the feed rate of travel moves.
    #[serde(rename = "min_travel_feedrate_mm_per_sec")]
    pub min_travel_feedrate: MmPerSec,

    /// Shortest segment time before the planner slows down to let the queue refill.
    pub min_segment_time_us: u32,

    /// Stretch short segments while the queue is draining.
    pub slowdown: bool,

    /// Speed every queue ends at; also the floor for junction speeds.
    #[serde(rename = "minimum_planner_speed_mm_per_sec")]
    pub minimum_planner_speed: MmPerSec,

    /// Moves whose dominant axis has fewer steps are dropped.
    pub min_steps_per_segment: u32,

    /// Number of extruders sharing the E configuration.
    pub extruders: u8,

    /// Initial flow override for every extruder.
    pub flow_percentage: FlowPercentage,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            acceleration: MmPerSecSquared(3000.0),
            retract_acceleration: MmPerSecSquared(3000.0),
            travel_acceleration: MmPerSecSquared(3000.0),
            max_xy_jerk: MmPerSec(20.0),
            max_z_jerk: MmPerSec(0.4),
            max_e_jerk: MmPerSec(5.0),
            min_feedrate: MmPerSec(0.0),
            min_travel_feedrate: MmPerSec(0.0),
            min_segment_time_us: 20_000,
            slowdown: true,
            minimum_planner_speed: MmPerSec(0.05),
            min_steps_per_segment: 6,
            extruders: 1,
            flow_percentage: FlowPercentage::NOMINAL,
        }
    }
}

/// Step timer parameters.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct StepperConfig {
    /// Tick rate of the step timer.
    pub timer_frequency_hz: u32,

    /// Hard ceiling on any block's step rate.
    pub max_step_frequency_hz: u32,

    /// Floor for initial and final step rates.
    pub min_step_rate: u32,

    /// Above this rate the interrupt emits two steps per tick.
    pub double_step_frequency_hz: u32,

    /// Above this rate the interrupt emits four steps per tick.
    pub quad_step_frequency_hz: u32,

    /// Shortest timer period the interrupt may be scheduled at.
    pub min_timer_period: u32,

    /// Interrupt rate while no block is queued.
    pub idle_frequency_hz: u32,
}

impl Default for StepperConfig {
    fn default() -> Self {
        Self {
            timer_frequency_hz: 2_000_000,
            max_step_frequency_hz: 40_000,
            min_step_rate: 120,
            double_step_frequency_hz: 10_000,
            quad_step_frequency_hz: 20_000,
            min_timer_period: 100,
            idle_frequency_hz: 1_000,
        }
    }
}

/// Pressure advance.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct AdvanceConfig {
    /// Extra filament per unit of E speed, in seconds. Zero disables advance.
    pub k: f32,
}

impl AdvanceConfig {
    /// True when advance steps are generated.
    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.k > 0.0
    }
}
