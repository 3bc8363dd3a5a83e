//! Motor module for motion-kernel.
//!
//! Provides the hardware traits, the embedded-hal pin driver and the step
//! counters shared with the planner.

mod driver;
mod hal;
mod position;

pub use driver::{PinDriver, StepTimer, DEFAULT_PULSE_WIDTH_NS};
pub use hal::{Actuator, NoHooks, PlannerHooks, StepperHal};
pub use position::StepCounters;

pub use crate::planner::CriticalSection;
#[cfg(feature = "std")]
pub use crate::planner::StdCriticalSection;
