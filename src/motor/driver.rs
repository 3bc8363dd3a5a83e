//! STEP/DIR pin driver.
//!
//! Generic over embedded-hal 1.0 pin and delay types. Binds one STEP and one
//! DIR pin per actuator channel and implements [`StepperHal`] on top of a
//! board-specific [`StepTimer`].

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use crate::error::MotorError;

use super::hal::{Actuator, StepperHal};

/// Default STEP pulse width (typical drivers need 1-2 µs).
pub const DEFAULT_PULSE_WIDTH_NS: u32 = 2_000;

/// Step interrupt timer of the board.
pub trait StepTimer {
    /// Free-running tick counter.
    fn now(&self) -> u32;

    /// Delay until the next compare match, in ticks.
    fn set_period(&mut self, ticks: u32);
}

struct Channel<STEP, DIR> {
    step: STEP,
    dir: DIR,
    /// Last level written to DIR (cached to avoid unnecessary pin writes).
    level: Option<bool>,
}

/// Stepper HAL built from embedded-hal pins.
///
/// Generic over:
/// - `STEP`: STEP pin type (must implement `OutputPin`)
/// - `DIR`: DIR pin type (must implement `OutputPin`)
/// - `DELAY`: Delay provider for the pulse width (must implement `DelayNs`)
/// - `TIMER`: The board's step timer
pub struct PinDriver<STEP, DIR, DELAY, TIMER>
where
    STEP: OutputPin,
    DIR: OutputPin,
    DELAY: DelayNs,
    TIMER: StepTimer,
{
    channels: [Option<Channel<STEP, DIR>>; Actuator::COUNT],
    delay: DELAY,
    timer: TIMER,
    pulse_width_ns: u32,
}

impl<STEP, DIR, DELAY, TIMER> PinDriver<STEP, DIR, DELAY, TIMER>
where
    STEP: OutputPin,
    DIR: OutputPin,
    DELAY: DelayNs,
    TIMER: StepTimer,
{
    /// Create a driver with no actuators bound.
    pub fn new(delay: DELAY, timer: TIMER) -> Self {
        Self {
            channels: core::array::from_fn(|_| None),
            delay,
            timer,
            pulse_width_ns: DEFAULT_PULSE_WIDTH_NS,
        }
    }

    /// Bind STEP and DIR pins to an actuator.
    pub fn with_actuator(mut self, actuator: Actuator, step: STEP, dir: DIR) -> Self {
        if let Some(slot) = self.channels.get_mut(actuator.index()) {
            *slot = Some(Channel { step, dir, level: None });
        }
        self
    }

    /// Set the STEP pulse width.
    pub fn with_pulse_width_ns(mut self, pulse_width_ns: u32) -> Self {
        self.pulse_width_ns = pulse_width_ns;
        self
    }

    /// Get the step timer.
    #[inline]
    pub fn timer(&self) -> &TIMER {
        &self.timer
    }

    /// True if pins are bound for the actuator.
    #[inline]
    pub fn is_bound(&self, actuator: Actuator) -> bool {
        matches!(self.channels.get(actuator.index()), Some(Some(_)))
    }

    fn channel(&mut self, actuator: Actuator) -> Result<&mut Channel<STEP, DIR>, MotorError> {
        self.channels
            .get_mut(actuator.index())
            .and_then(Option::as_mut)
            .ok_or(MotorError::UnboundActuator(actuator.index() as u8))
    }
}

impl<STEP, DIR, DELAY, TIMER> StepperHal for PinDriver<STEP, DIR, DELAY, TIMER>
where
    STEP: OutputPin,
    DIR: OutputPin,
    DELAY: DelayNs,
    TIMER: StepTimer,
{
    type Error = MotorError;

    fn read_wall_clock_ticks(&self) -> u32 {
        self.timer.now()
    }

    fn set_timer_period(&mut self, ticks: u32) {
        self.timer.set_period(ticks);
    }

    fn write_direction_pin(&mut self, actuator: Actuator, level: bool) -> Result<(), MotorError> {
        let channel = self.channel(actuator)?;
        if channel.level == Some(level) {
            return Ok(());
        }

        if level {
            channel.dir.set_high().map_err(|_| MotorError::PinError)?;
        } else {
            channel.dir.set_low().map_err(|_| MotorError::PinError)?;
        }

        channel.level = Some(level);
        Ok(())
    }

    fn pulse_step_pin(&mut self, actuator: Actuator) -> Result<(), MotorError> {
        let pulse_width_ns = self.pulse_width_ns;
        let channel = self.channel(actuator)?;
        channel.step.set_high().map_err(|_| MotorError::PinError)?;
        self.delay.delay_ns(pulse_width_ns);
        let channel = self.channel(actuator)?;
        channel.step.set_low().map_err(|_| MotorError::PinError)?;
        Ok(())
    }
}
