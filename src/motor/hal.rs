//! Hardware seams of the motion kernel.
//!
//! The executor talks to pins and the step timer through [`StepperHal`]; the
//! planner calls back into the host through [`PlannerHooks`]. Both are small
//! so a board port only has to implement a handful of methods.

use crate::kinematics::{Axis, MAX_EXTRUDERS};

/// One stepper driver channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Actuator {
    /// First actuator (X, or tower A / motor A).
    X,
    /// Second actuator.
    Y,
    /// Third actuator.
    Z,
    /// Extruder drive with its index.
    E(u8),
}

impl Actuator {
    /// Number of distinct actuator channels.
    pub const COUNT: usize = 3 + MAX_EXTRUDERS;

    /// Actuator driven by `axis`, with `extruder` selecting the E drive.
    #[inline]
    pub fn for_axis(axis: Axis, extruder: u8) -> Self {
        match axis {
            Axis::X => Actuator::X,
            Axis::Y => Actuator::Y,
            Axis::Z => Actuator::Z,
            Axis::E => Actuator::E(extruder),
        }
    }

    /// Axis this actuator counts steps for.
    #[inline]
    pub fn axis(self) -> Axis {
        match self {
            Actuator::X => Axis::X,
            Actuator::Y => Axis::Y,
            Actuator::Z => Axis::Z,
            Actuator::E(_) => Axis::E,
        }
    }

    /// Channel index: X, Y, Z, then one slot per extruder.
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Actuator::X => 0,
            Actuator::Y => 1,
            Actuator::Z => 2,
            Actuator::E(n) => 3 + n as usize,
        }
    }
}

/// Pins and timer used by the stepper executor.
///
/// Every method is called from the step interrupt and must not block.
pub trait StepperHal {
    /// Pin error type.
    type Error;

    /// Free-running tick counter, used for idle tracking.
    fn read_wall_clock_ticks(&self) -> u32;

    /// Program the delay until the next step interrupt, in timer ticks.
    fn set_timer_period(&mut self, ticks: u32);

    /// Drive a direction pin to `level` (already corrected for inversion).
    fn write_direction_pin(&mut self, actuator: Actuator, level: bool) -> Result<(), Self::Error>;

    /// Emit one step pulse of the driver's minimum width.
    fn pulse_step_pin(&mut self, actuator: Actuator) -> Result<(), Self::Error>;
}

/// Host callbacks used by the planner.
pub trait PlannerHooks {
    /// Called repeatedly while the planner waits on the executor.
    ///
    /// Service the host's housekeeping here; on a host simulation this is
    /// where the executor gets to run.
    fn idle_hook(&mut self);

    /// Make sure the step interrupt is running. Called after every accepted move.
    fn arm_timer_interrupt(&mut self);

    /// Stop the step interrupt.
    fn disable_timer_interrupt(&mut self) {}
}

/// Hooks for hosts that drive the executor themselves.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHooks;

impl PlannerHooks for NoHooks {
    fn idle_hook(&mut self) {
        core::hint::spin_loop();
    }

    fn arm_timer_interrupt(&mut self) {}
}
