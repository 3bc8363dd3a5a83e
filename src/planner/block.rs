//! Motion blocks.

use crate::kinematics::{Axis, NUM_AXES};
use crate::motion::{MotionPhase, TrapezoidProfile};

/// One planned, constrained line segment.
///
/// Filled by the planner, executed by the stepper interrupt. Everything the
/// interrupt reads is integral; the float fields belong to the look-ahead.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Block {
    /// Step count per actuator.
    pub steps: [u32; NUM_AXES],

    /// Largest entry of `steps`; the Bresenham reference.
    pub step_event_count: u32,

    /// One bit per actuator, set for negative motion.
    pub direction_bits: u8,

    /// Extruder the E steps go to.
    pub active_extruder: u8,

    /// Length of the move (mm).
    pub millimeters: f32,

    /// Cruise speed (mm/s).
    pub nominal_speed: f32,

    /// Cruise step rate of the dominant axis (steps/s).
    pub nominal_rate: u32,

    /// Acceleration along the move (mm/s²).
    pub acceleration: f32,

    /// Acceleration of the dominant axis (steps/s²).
    pub acceleration_steps_per_s2: u32,

    /// Step-rate increase per timer tick, 8.24 fixed point.
    pub acceleration_rate: u32,

    /// Planned entry speed (mm/s).
    pub entry_speed: f32,

    /// Highest entry speed the junction allows (mm/s).
    pub max_entry_speed: f32,

    /// Exit speed of the profile the interrupt will run (mm/s).
    pub exit_speed: f32,

    /// Rate boundaries of the velocity trapezoid.
    pub profile: TrapezoidProfile,

    /// Full pressure advance at cruise, in 1/256 E steps.
    pub advance: i32,

    /// Advance change per step event while ramping, in 1/256 E steps.
    pub advance_rate: i32,

    /// Block can reach nominal speed and stop within its own length.
    pub nominal_length: bool,

    /// Entry or exit speed changed since the profile was computed.
    pub recalculate: bool,

    /// The interrupt owns this block.
    pub busy: bool,
}

impl Block {
    /// A block that moves nothing.
    pub const EMPTY: Self = Self {
        steps: [0; NUM_AXES],
        step_event_count: 0,
        direction_bits: 0,
        active_extruder: 0,
        millimeters: 0.0,
        nominal_speed: 0.0,
        nominal_rate: 0,
        acceleration: 0.0,
        acceleration_steps_per_s2: 0,
        acceleration_rate: 0,
        entry_speed: 0.0,
        max_entry_speed: 0.0,
        exit_speed: 0.0,
        profile: TrapezoidProfile::EMPTY,
        advance: 0,
        advance_rate: 0,
        nominal_length: false,
        recalculate: false,
        busy: false,
    };

    /// Steps along one actuator.
    #[inline]
    pub fn steps(&self, axis: Axis) -> u32 {
        self.steps[axis.index()]
    }

    /// True if the actuator moves in the negative direction.
    #[inline]
    pub fn is_reverse(&self, axis: Axis) -> bool {
        self.direction_bits & axis.bit() != 0
    }

    /// True if the actuator moves at all.
    #[inline]
    pub fn moves(&self, axis: Axis) -> bool {
        self.steps[axis.index()] != 0
    }

    /// True if pressure advance applies to this block.
    #[inline]
    pub fn uses_advance(&self) -> bool {
        self.advance != 0
    }

    /// Phase of the step event with the given index.
    #[inline]
    pub fn phase_at(&self, step: u32) -> MotionPhase {
        self.profile.phase_at(step, self.step_event_count)
    }
}

impl Default for Block {
    fn default() -> Self {
        Self::EMPTY
    }
}
