//! Per-axis configuration from TOML.

use serde::Deserialize;

use crate::kinematics::Axis;

use super::units::{MmPerSec, MmPerSecSquared, StepsPerMm};

/// Limits and resolution of one actuator.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct AxisConfig {
    /// Steps per millimeter of actuator travel.
    pub steps_per_mm: StepsPerMm,

    /// Maximum actuator speed in millimeters per second.
    #[serde(rename = "max_feedrate_mm_per_sec")]
    pub max_feedrate: MmPerSec,

    /// Maximum actuator acceleration in millimeters per second squared.
    #[serde(rename = "max_acceleration_mm_per_sec2")]
    pub max_acceleration: MmPerSecSquared,

    /// Invert direction pin logic.
    #[serde(default)]
    pub invert_direction: bool,
}

impl AxisConfig {
    /// Maximum acceleration expressed in steps per second squared.
    pub fn max_acceleration_steps_per_s2(&self) -> u32 {
        (self.max_acceleration.0 * self.steps_per_mm.0) as u32
    }
}

/// The four planned axes.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct AxesConfig {
    /// X axis (A motor, tower 1).
    pub x: AxisConfig,
    /// Y axis (B motor, tower 2).
    pub y: AxisConfig,
    /// Z axis (C motor, tower 3).
    pub z: AxisConfig,
    /// Extruders. All extruders share one E configuration.
    pub e: AxisConfig,
}

impl AxesConfig {
    /// Configuration for one axis.
    pub fn get(&self, axis: Axis) -> &AxisConfig {
        match axis {
            Axis::X => &self.x,
            Axis::Y => &self.y,
            Axis::Z => &self.z,
            Axis::E => &self.e,
        }
    }

    /// Iterate axes in index order.
    pub fn iter(&self) -> impl Iterator<Item = (Axis, &AxisConfig)> {
        Axis::ALL.into_iter().map(move |axis| (axis, self.get(axis)))
    }
}
