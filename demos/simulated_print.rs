//! Example: Planning and executing a short print on simulated hardware.
//!
//! This example demonstrates how to:
//! - Load a machine description from TOML
//! - Split a block queue between the planner and the step interrupt
//! - Drive embedded-hal pins through the `PinDriver`
//! - Stop and resynchronize the planner
//!
//! Run with: `cargo run --example simulated_print --features std`

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::thread;

use motion_kernel::{
    config::parse_config,
    error::Result,
    kinematics::AxisVector,
    motor::{Actuator, PinDriver, PlannerHooks, StepTimer},
    planner::{BlockQueue, Planner, StdCriticalSection},
    PlannerSettings, StepperExecutor, StepperSettings,
};

/// Mock STEP/DIR pin for demonstration.
struct MockPin;

impl embedded_hal::digital::ErrorType for MockPin {
    type Error = core::convert::Infallible;
}

impl embedded_hal::digital::OutputPin for MockPin {
    fn set_low(&mut self) -> core::result::Result<(), Self::Error> {
        Ok(())
    }

    fn set_high(&mut self) -> core::result::Result<(), Self::Error> {
        Ok(())
    }
}

/// Mock delay for demonstration.
struct MockDelay;

impl embedded_hal::delay::DelayNs for MockDelay {
    fn delay_ns(&mut self, _ns: u32) {
        // In real code, this would hold the STEP pulse high
    }
}

/// Simulated step timer: time advances by each programmed period.
#[derive(Default)]
struct SimTimer {
    now: u32,
}

impl StepTimer for SimTimer {
    fn now(&self) -> u32 {
        self.now
    }

    fn set_period(&mut self, ticks: u32) {
        self.now = self.now.wrapping_add(ticks);
    }
}

/// Host hooks: the "interrupt" is a thread gated by `enabled`.
struct HostHooks<'a> {
    enabled: &'a AtomicBool,
}

impl PlannerHooks for HostHooks<'_> {
    fn idle_hook(&mut self) {
        thread::yield_now();
    }

    fn arm_timer_interrupt(&mut self) {
        self.enabled.store(true, Ordering::Release);
    }

    fn disable_timer_interrupt(&mut self) {
        self.enabled.store(false, Ordering::Release);
    }
}

const MACHINE: &str = r#"
[motion]
acceleration_mm_per_sec2 = 1500.0
travel_acceleration_mm_per_sec2 = 3000.0
max_xy_jerk_mm_per_sec = 10.0

[axes.x]
steps_per_mm = 80.0
max_feedrate_mm_per_sec = 300.0
max_acceleration_mm_per_sec2 = 3000.0

[axes.y]
steps_per_mm = 80.0
max_feedrate_mm_per_sec = 300.0
max_acceleration_mm_per_sec2 = 3000.0

[axes.z]
steps_per_mm = 400.0
max_feedrate_mm_per_sec = 5.0
max_acceleration_mm_per_sec2 = 100.0

[axes.e]
steps_per_mm = 93.0
max_feedrate_mm_per_sec = 25.0
max_acceleration_mm_per_sec2 = 10000.0

[advance]
k = 0.02
"#;

fn main() -> Result<()> {
    println!("=== Simulated Print Example ===\n");

    let config = parse_config(MACHINE)?;
    let planner_settings = PlannerSettings::from_config(&config);
    let stepper_settings = StepperSettings::from_config(&config);
    println!(
        "Kinematics: {:?}, X {} steps/mm, advance k = {}",
        config.kinematics, planner_settings.steps_per_mm[0], planner_settings.advance_k
    );

    let mut driver = PinDriver::new(MockDelay, SimTimer::default());
    for actuator in [Actuator::X, Actuator::Y, Actuator::Z, Actuator::E(0)] {
        driver = driver.with_actuator(actuator, MockPin, MockPin);
    }

    let mut queue: BlockQueue<StdCriticalSection, 16> = BlockQueue::new(StdCriticalSection::new());
    let (producer, consumer) = queue.split();
    let enabled = AtomicBool::new(false);
    let finished = AtomicBool::new(false);
    let ticks = AtomicU32::new(0);
    let (enabled, finished, ticks) = (&enabled, &finished, &ticks);

    thread::scope(|s| -> Result<()> {
        // Step interrupt
        let interrupt = s.spawn(move || -> Result<()> {
            let mut executor = StepperExecutor::new(consumer, driver, stepper_settings);
            while !finished.load(Ordering::Acquire) {
                if enabled.load(Ordering::Acquire) {
                    executor.on_tick()?;
                    ticks.fetch_add(1, Ordering::Relaxed);
                } else {
                    thread::yield_now();
                }
            }
            Ok(())
        });

        let mut planner = Planner::new(producer, planner_settings, HostHooks { enabled });

        // A 20 mm square perimeter at layer height 0.2, then a retract.
        println!("Planning a square perimeter...");
        planner.buffer_line(AxisVector::new(0.0, 0.0, 0.2, 0.0), 5.0, 0);
        let corners = [(20.0, 0.0), (20.0, 20.0), (0.0, 20.0), (0.0, 0.0)];
        let mut e = 0.0;
        for (x, y) in corners {
            e += 0.8;
            planner.buffer_line(AxisVector::new(x, y, 0.2, e), 40.0, 0);
            println!("  queued to ({:5.1}, {:5.1}), {} blocks planned", x, y, planner.moves_planned());
        }
        planner.buffer_line(AxisVector::new(0.0, 0.0, 0.2, e - 1.0), 25.0, 0);

        for (i, block) in planner.plan_snapshot().iter().enumerate() {
            println!(
                "  block {}: {:6.2} mm, entry {:5.2} / nominal {:5.2} / exit {:5.2} mm/s",
                i, block.millimeters, block.entry_speed, block.nominal_speed, block.exit_speed
            );
        }

        planner.synchronize();
        let position = planner.stepper_position_mm();
        println!(
            "\nSquare done after {} ticks at ({:.3}, {:.3}, {:.3}), E {:.3}",
            ticks.load(Ordering::Relaxed),
            position.x(),
            position.y(),
            position.z(),
            position.e()
        );

        // A long travel move, stopped part way through.
        println!("\nStarting a 150 mm travel and stopping it...");
        planner.buffer_line(AxisVector::new(150.0, 0.0, 0.2, e - 1.0), 100.0, 0);
        while planner.stepper_position()[0] < 4000 {
            thread::yield_now();
        }
        planner.quick_stop();
        planner.synchronize();
        planner.sync_position_from_steppers();
        println!("Stopped at X = {:.3} mm", planner.position().x());

        finished.store(true, Ordering::Release);
        match interrupt.join() {
            Ok(result) => result,
            Err(_) => {
                println!("Interrupt thread panicked");
                Ok(())
            }
        }
    })?;

    println!("\n=== Example Complete ===");
    Ok(())
}
