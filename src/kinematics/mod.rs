//! Kinematics transform.
//!
//! Maps logical targets (real units) to actuator step positions for the
//! supported machine geometries. The set is closed, so the geometry is an enum
//! matched once per move.
//!
//! The planner keeps its position in *position space*: logical axis steps on
//! Cartesian and coupled machines, tower steps on a delta. Actuator space is
//! what the executor counts. On coupled machines the two differ by a fixed
//! sum/difference.

mod axis;
mod delta;

use serde::Deserialize;

pub use axis::{Axis, AxisVector, MAX_EXTRUDERS, NUM_AXES};
pub use delta::DeltaGeometry;

use crate::config::units::Steps;

/// Machine geometry.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Kinematics {
    /// Each logical axis drives one actuator.
    #[default]
    Cartesian,
    /// A = X + Y, B = X - Y.
    CoreXy,
    /// A = X + Z, C = X - Z.
    CoreXz,
    /// B = Y + Z, C = Y - Z.
    CoreYz,
    /// Three-tower linear delta.
    Delta(DeltaGeometry),
}

/// One move resolved into step and millimeter deltas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedMove {
    /// Target in position space, in steps.
    pub target: [i32; NUM_AXES],
    /// Signed step delta per actuator.
    pub actuator_steps: [i32; NUM_AXES],
    /// Signed travel per actuator in mm.
    pub actuator_mm: [f32; NUM_AXES],
    /// Signed tool-head travel in mm (X, Y, Z, E).
    pub head_mm: [f32; NUM_AXES],
}

impl Kinematics {
    /// Position-space steps for a logical position.
    pub fn position_steps(&self, logical: &AxisVector, steps_per_mm: &[f32; NUM_AXES]) -> [i32; NUM_AXES] {
        let mut out = [0i32; NUM_AXES];
        match self {
            Kinematics::Delta(geometry) => {
                let towers = geometry.inverse(logical.x(), logical.y(), logical.z());
                for (i, height) in towers.iter().enumerate() {
                    out[i] = Steps::from_mm(*height, steps_per_mm[i]).value();
                }
            }
            _ => {
                for i in 0..3 {
                    out[i] = Steps::from_mm(logical.0[i], steps_per_mm[i]).value();
                }
            }
        }
        out[3] = Steps::from_mm(logical.e(), steps_per_mm[3]).value();
        out
    }

    /// Actuator counters for a position-space position.
    pub fn actuator_steps(&self, position: &[i32; NUM_AXES]) -> [i32; NUM_AXES] {
        let [x, y, z, e] = *position;
        match self {
            Kinematics::Cartesian | Kinematics::Delta(_) => *position,
            Kinematics::CoreXy => [x + y, x - y, z, e],
            Kinematics::CoreXz => [x + z, y, x - z, e],
            Kinematics::CoreYz => [x, y + z, y - z, e],
        }
    }

    /// Position-space steps for a set of actuator counters.
    ///
    /// Inverse of [`Kinematics::actuator_steps`]; an odd sum on a coupled
    /// pair (a half step) truncates toward zero.
    pub fn position_from_actuators(&self, actuator: &[i32; NUM_AXES]) -> [i32; NUM_AXES] {
        let [a, b, c, e] = *actuator;
        match self {
            Kinematics::Cartesian | Kinematics::Delta(_) => *actuator,
            Kinematics::CoreXy => [(a + b) / 2, (a - b) / 2, c, e],
            Kinematics::CoreXz => [(a + c) / 2, b, (a - c) / 2, e],
            Kinematics::CoreYz => [a, (b + c) / 2, (b - c) / 2, e],
        }
    }

    /// Resolve a move from the current position to a logical target.
    ///
    /// `from_mm` is only consulted on a delta, where the head travel cannot be
    /// recovered from tower steps.
    pub fn resolve(
        &self,
        from: &[i32; NUM_AXES],
        from_mm: &AxisVector,
        to_mm: &AxisVector,
        steps_per_mm: &[f32; NUM_AXES],
    ) -> ResolvedMove {
        let target = self.position_steps(to_mm, steps_per_mm);
        let mut d = [0i32; NUM_AXES];
        for i in 0..NUM_AXES {
            d[i] = target[i] - from[i];
        }

        let actuator_steps = self.actuator_steps(&d);

        let mut actuator_mm = [0.0f32; NUM_AXES];
        for i in 0..NUM_AXES {
            actuator_mm[i] = actuator_steps[i] as f32 / steps_per_mm[i];
        }

        let mut head_mm = [0.0f32; NUM_AXES];
        match self {
            Kinematics::Delta(_) => {
                for i in 0..3 {
                    head_mm[i] = to_mm.0[i] - from_mm.0[i];
                }
            }
            _ => {
                for i in 0..3 {
                    head_mm[i] = d[i] as f32 / steps_per_mm[i];
                }
            }
        }
        head_mm[3] = d[3] as f32 / steps_per_mm[3];

        ResolvedMove {
            target,
            actuator_steps,
            actuator_mm,
            head_mm,
        }
    }

    /// Logical position for a set of actuator counters.
    pub fn forward(&self, actuator: &[i32; NUM_AXES], steps_per_mm: &[f32; NUM_AXES]) -> AxisVector {
        let mm = |i: usize, steps: f32| steps / steps_per_mm[i];
        let [a, b, c, e] = actuator.map(|s| s as f32);
        let e = mm(3, e);
        match self {
            Kinematics::Cartesian => AxisVector::new(mm(0, a), mm(1, b), mm(2, c), e),
            Kinematics::CoreXy => AxisVector::new(mm(0, (a + b) / 2.0), mm(1, (a - b) / 2.0), mm(2, c), e),
            Kinematics::CoreXz => AxisVector::new(mm(0, (a + c) / 2.0), mm(1, b), mm(2, (a - c) / 2.0), e),
            Kinematics::CoreYz => AxisVector::new(mm(0, a), mm(1, (b + c) / 2.0), mm(2, (b - c) / 2.0), e),
            Kinematics::Delta(geometry) => {
                let (x, y, z) = geometry.forward([mm(0, a), mm(1, b), mm(2, c)]);
                AxisVector::new(x, y, z, e)
            }
        }
    }
}
