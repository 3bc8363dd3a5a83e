//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use core::convert::Infallible;

use motion_kernel::config::{parse_config, MachineConfig, PlannerSettings, StepperSettings};
use motion_kernel::motor::{Actuator, PlannerHooks, StepperHal};
use motion_kernel::planner::{CriticalSection, Planner};
use motion_kernel::StepperExecutor;

/// Cartesian printer, 80/80/400/100 steps/mm.
pub const CARTESIAN: &str = r#"
[motion]
acceleration_mm_per_sec2 = 1000.0
retract_acceleration_mm_per_sec2 = 1000.0
travel_acceleration_mm_per_sec2 = 1000.0
max_xy_jerk_mm_per_sec = 20.0
max_z_jerk_mm_per_sec = 0.4
max_e_jerk_mm_per_sec = 5.0
extruders = 2

[axes.x]
steps_per_mm = 80.0
max_feedrate_mm_per_sec = 200.0
max_acceleration_mm_per_sec2 = 3000.0

[axes.y]
steps_per_mm = 80.0
max_feedrate_mm_per_sec = 200.0
max_acceleration_mm_per_sec2 = 3000.0

[axes.z]
steps_per_mm = 400.0
max_feedrate_mm_per_sec = 5.0
max_acceleration_mm_per_sec2 = 100.0

[axes.e]
steps_per_mm = 100.0
max_feedrate_mm_per_sec = 50.0
max_acceleration_mm_per_sec2 = 5000.0
"#;

/// Parse a machine description, panicking on error.
pub fn machine(toml: &str) -> MachineConfig {
    parse_config(toml).expect("test config should parse")
}

/// Cartesian machine with a different geometry spliced in.
pub fn machine_with_kinematics(kinematics: &str) -> MachineConfig {
    machine(&format!("{}\n{}", kinematics, CARTESIAN))
}

pub fn planner_settings() -> PlannerSettings {
    PlannerSettings::from_config(&machine(CARTESIAN))
}

pub fn stepper_settings() -> StepperSettings {
    StepperSettings::from_config(&machine(CARTESIAN))
}

/// Simulated step hardware: counts pulses and integrates them by pin level.
#[derive(Debug, Default, Clone)]
pub struct SimHal {
    /// Pulses per actuator.
    pub pulses: [u32; Actuator::COUNT],
    /// Pulses per actuator, signed by the direction pin level.
    pub net: [i64; Actuator::COUNT],
    /// Current direction pin level per actuator.
    pub direction: [bool; Actuator::COUNT],
    /// Direction pin writes, in order.
    pub direction_writes: usize,
    /// Sum of every programmed timer period.
    pub clock: u32,
    /// Period programmed by the last tick.
    pub last_period: u32,
}

impl SimHal {
    /// Signed steps of one actuator, assuming no inverted pins.
    pub fn net(&self, actuator: Actuator) -> i64 {
        self.net[actuator.index()]
    }
}

impl StepperHal for SimHal {
    type Error = Infallible;

    fn read_wall_clock_ticks(&self) -> u32 {
        self.clock
    }

    fn set_timer_period(&mut self, ticks: u32) {
        self.clock = self.clock.wrapping_add(ticks);
        self.last_period = ticks;
    }

    fn write_direction_pin(&mut self, actuator: Actuator, level: bool) -> Result<(), Infallible> {
        self.direction[actuator.index()] = level;
        self.direction_writes += 1;
        Ok(())
    }

    fn pulse_step_pin(&mut self, actuator: Actuator) -> Result<(), Infallible> {
        let i = actuator.index();
        self.pulses[i] += 1;
        self.net[i] += if self.direction[i] { 1 } else { -1 };
        Ok(())
    }
}

/// Hooks that only count calls; for single-threaded tests that never fill the queue.
#[derive(Debug, Default)]
pub struct CountingHooks {
    pub idle_calls: usize,
    pub arms: usize,
    pub disables: usize,
}

impl PlannerHooks for CountingHooks {
    fn idle_hook(&mut self) {
        self.idle_calls += 1;
    }

    fn arm_timer_interrupt(&mut self) {
        self.arms += 1;
    }

    fn disable_timer_interrupt(&mut self) {
        self.disables += 1;
    }
}

/// Tick the executor until the queue drains. Returns the number of ticks.
pub fn run_until_idle<C, H, const N: usize>(
    planner: &Planner<'_, C, H, N>,
    executor: &mut StepperExecutor<'_, C, SimHal, N>,
) -> usize
where
    C: CriticalSection,
    H: PlannerHooks,
{
    let mut ticks = 0;
    while planner.has_moves() {
        executor.on_tick().expect("simulated pins never fail");
        ticks += 1;
        assert!(ticks < 10_000_000, "executor did not drain the queue");
    }
    ticks
}
