//! Motion module for motion-kernel.
//!
//! Provides trapezoid profile calculation, rate-to-period lookup and the
//! interrupt-side step execution.

mod advance;
mod executor;
mod profile;
mod timer;

pub use advance::{PressureAdvance, MAX_ADVANCE_STEPS_PER_TICK};
pub use executor::StepperExecutor;
pub use profile::{
    estimate_acceleration_distance, intersection_distance, max_allowable_speed, MotionPhase,
    TrapezoidProfile,
};
pub use timer::{SpeedTable, TimerStep, MIN_TABLE_RATE};
