//! Stepper executor - step pulse generation.
//!
//! Runs in the step timer interrupt. Each call to [`StepperExecutor::on_tick`]
//! emits up to `step_loops` Bresenham step events of the current block,
//! advances the velocity trapezoid and programs the next timer period.

use crate::config::StepperSettings;
use crate::error::{MotorError, Result};
use crate::kinematics::{Axis, MAX_EXTRUDERS, NUM_AXES};
use crate::motor::{Actuator, StepperHal};
use crate::planner::{Block, Consumer, CriticalSection};

use super::advance::{PressureAdvance, MAX_ADVANCE_STEPS_PER_TICK};
use super::profile::MotionPhase;
use super::timer::SpeedTable;

/// Interrupt-side state of block execution.
pub struct StepperExecutor<'q, C, H, const N: usize>
where
    C: CriticalSection,
    H: StepperHal,
{
    queue: Consumer<'q, C, N>,
    hal: H,
    settings: StepperSettings,
    table: SpeedTable,

    /// Copy of the block being executed.
    current: Option<Block>,

    /// Bresenham error terms.
    counters: [i64; NUM_AXES],

    step_events_completed: u32,
    acceleration_time: u32,
    deceleration_time: u32,
    acc_step_rate: u32,
    step_loops: u8,
    nominal_period: u32,
    step_loops_nominal: u8,

    /// Direction bits last written to the pins.
    last_direction_bits: Option<u8>,
    /// Extruder the last direction write went to.
    last_extruder: u8,

    /// Advance state per extruder; each one drains to its own driver.
    advance: [PressureAdvance; MAX_EXTRUDERS],
    /// E direction last written for advance pulses, per extruder.
    advance_reverse: [Option<bool>; MAX_EXTRUDERS],
}

impl<'q, C, H, const N: usize> StepperExecutor<'q, C, H, N>
where
    C: CriticalSection,
    H: StepperHal,
{
    /// Create an idle executor.
    pub fn new(queue: Consumer<'q, C, N>, hal: H, settings: StepperSettings) -> Self {
        Self {
            queue,
            hal,
            table: SpeedTable::new(&settings),
            settings,
            current: None,
            counters: [0; NUM_AXES],
            step_events_completed: 0,
            acceleration_time: 0,
            deceleration_time: 0,
            acc_step_rate: 0,
            step_loops: 1,
            nominal_period: 0,
            step_loops_nominal: 1,
            last_direction_bits: None,
            last_extruder: 0,
            advance: [PressureAdvance::new(); MAX_EXTRUDERS],
            advance_reverse: [None; MAX_EXTRUDERS],
        }
    }

    /// Replace the timer settings.
    ///
    /// Takes effect immediately; call while no block is executing.
    pub fn apply_settings(&mut self, settings: StepperSettings) {
        self.table = SpeedTable::new(&settings);
        self.settings = settings;
        self.last_direction_bits = None;
        self.advance_reverse = [None; MAX_EXTRUDERS];
    }

    /// Get the HAL.
    #[inline]
    pub fn hal(&self) -> &H {
        &self.hal
    }

    /// Get the HAL mutably.
    #[inline]
    pub fn hal_mut(&mut self) -> &mut H {
        &mut self.hal
    }

    /// Give back the HAL.
    pub fn into_hal(self) -> H {
        self.hal
    }

    /// True while a block is executing.
    #[inline]
    pub fn is_busy(&self) -> bool {
        self.current.is_some()
    }

    /// The block being executed.
    #[inline]
    pub fn current_block(&self) -> Option<&Block> {
        self.current.as_ref()
    }

    /// Step events of the current block emitted so far.
    #[inline]
    pub fn step_events_completed(&self) -> u32 {
        self.step_events_completed
    }

    /// Current step rate of the dominant axis.
    #[inline]
    pub fn step_rate(&self) -> u32 {
        self.acc_step_rate
    }

    /// Phase of the next step event.
    pub fn phase(&self) -> MotionPhase {
        self.current
            .as_ref()
            .map(|b| b.phase_at(self.step_events_completed))
            .unwrap_or(MotionPhase::Complete)
    }

    /// Pressure advance pulses still owed to an extruder (negative for retraction).
    #[inline]
    pub fn pending_advance_steps(&self, extruder: u8) -> i32 {
        self.advance
            .get(extruder as usize)
            .map(PressureAdvance::pending)
            .unwrap_or(0)
    }

    /// Service one timer interrupt.
    ///
    /// Returns the period programmed for the next interrupt.
    ///
    /// # Errors
    ///
    /// Returns an error if a pin write fails. The interrupt should then be
    /// stopped; the step counters are valid up to the failed pulse.
    pub fn on_tick(&mut self) -> Result<u32> {
        if self.current.is_none() && !self.begin_block()? {
            if self.settings.advance_enabled {
                for advance in self.advance.iter_mut() {
                    advance.release();
                }
                self.drain_advance()?;
            }
            let period = self.settings.idle_period;
            self.hal.set_timer_period(period);
            return Ok(period);
        }

        let Some(block) = self.current else {
            return Ok(self.settings.idle_period);
        };

        if self.queue.take_abort() {
            debug!("aborting block at step {}", self.step_events_completed);
            self.step_events_completed = block.step_event_count;
        } else {
            self.emit_steps(&block)?;
        }

        let mut period = self.next_period(&block);
        if self.settings.advance_enabled {
            self.drain_advance()?;
        }

        if self.step_events_completed >= block.step_event_count {
            self.current = None;
            self.queue.retire();
            period = if self.begin_block()? {
                self.acceleration_time
            } else {
                self.settings.idle_period
            };
        }

        self.hal.set_timer_period(period);
        Ok(period)
    }

    /// Claim the next block and reset the trapezoid generator.
    fn begin_block(&mut self) -> Result<bool> {
        let Some(block) = self.queue.claim() else {
            return Ok(false);
        };

        self.apply_directions(&block)?;

        let half = -((block.step_event_count >> 1) as i64);
        self.counters = [half; NUM_AXES];
        self.step_events_completed = 0;

        self.deceleration_time = 0;
        let nominal = self.table.period_for(block.nominal_rate);
        self.nominal_period = nominal.period;
        self.step_loops_nominal = nominal.step_loops;
        self.acc_step_rate = block.profile.initial_rate;
        let initial = self.table.period_for(self.acc_step_rate);
        self.step_loops = initial.step_loops;
        self.acceleration_time = initial.period;

        if self.settings.advance_enabled {
            if let Some(advance) = self.advance.get_mut(block.active_extruder as usize) {
                advance.start_block(&block);
            }
        }

        trace!(
            "block start: {} events, rates {} {} {}",
            block.step_event_count,
            block.profile.initial_rate,
            block.nominal_rate,
            block.profile.final_rate
        );
        self.current = Some(block);
        Ok(true)
    }

    /// Write direction pins whose bit changed since the last block.
    fn apply_directions(&mut self, block: &Block) -> Result<()> {
        let extruder = block.active_extruder;
        let mut changed = match self.last_direction_bits {
            Some(last) => last ^ block.direction_bits,
            None => 0xff,
        };
        if extruder != self.last_extruder {
            changed |= Axis::E.bit();
            // The previous extruder stops ramping; its residual advance
            // retracts on its own driver.
            if let Some(previous) = self.advance.get_mut(self.last_extruder as usize) {
                previous.release();
            }
        }
        // Advance pulses own the E direction pin.
        if self.settings.advance_enabled {
            changed &= !Axis::E.bit();
        }

        for axis in Axis::ALL {
            if changed & axis.bit() == 0 {
                continue;
            }
            let reverse = block.is_reverse(axis);
            let level = self.direction_level(axis, reverse);
            self.hal
                .write_direction_pin(Actuator::for_axis(axis, extruder), level)
                .map_err(|_| pin_fault(axis))?;
        }

        self.last_direction_bits = Some(block.direction_bits);
        self.last_extruder = extruder;
        Ok(())
    }

    #[inline]
    fn direction_level(&self, axis: Axis, reverse: bool) -> bool {
        let inverted = self.settings.invert_mask & axis.bit() != 0;
        !reverse ^ inverted
    }

    /// Emit up to `step_loops` Bresenham step events.
    fn emit_steps(&mut self, block: &Block) -> Result<()> {
        let count = block.step_event_count as i64;
        let counters = self.queue.counters();
        let mut pulsed = false;

        for _ in 0..self.step_loops {
            for axis in Axis::ALL {
                let i = axis.index();
                self.counters[i] += block.steps[i] as i64;
                if self.counters[i] <= 0 {
                    continue;
                }
                self.counters[i] -= count;

                let reverse = block.is_reverse(axis);
                let advance = match axis {
                    Axis::E if self.settings.advance_enabled => self.advance.get_mut(block.active_extruder as usize),
                    _ => None,
                };
                if let Some(advance) = advance {
                    advance.queue_step(reverse);
                } else {
                    self.hal
                        .pulse_step_pin(Actuator::for_axis(axis, block.active_extruder))
                        .map_err(|_| pin_fault(axis))?;
                    pulsed = true;
                }
                counters.step(axis, reverse);
            }

            self.step_events_completed += 1;
            if self.step_events_completed >= block.step_event_count {
                break;
            }
        }

        if pulsed {
            self.queue.touch(self.hal.read_wall_clock_ticks());
        }
        Ok(())
    }

    /// Advance the trapezoid generator and return the next period.
    fn next_period(&mut self, block: &Block) -> u32 {
        let completed = self.step_events_completed;
        let profile = &block.profile;

        if completed < profile.accelerate_until {
            let ramp = ((self.acceleration_time as u64 * block.acceleration_rate as u64) >> 24) as u32;
            self.acc_step_rate = ramp.saturating_add(profile.initial_rate).min(block.nominal_rate);

            let next = self.table.period_for(self.acc_step_rate);
            self.step_loops = next.step_loops;
            self.acceleration_time = self.acceleration_time.saturating_add(next.period);
            if self.settings.advance_enabled {
                if let Some(advance) = self.advance.get_mut(block.active_extruder as usize) {
                    advance.accelerate(block, self.step_loops);
                }
            }
            next.period
        } else if completed >= profile.decelerate_after {
            let ramp = ((self.deceleration_time as u64 * block.acceleration_rate as u64) >> 24) as u32;
            let rate = if ramp > self.acc_step_rate {
                profile.final_rate
            } else {
                (self.acc_step_rate - ramp).max(profile.final_rate)
            };

            let next = self.table.period_for(rate);
            self.step_loops = next.step_loops;
            self.deceleration_time = self.deceleration_time.saturating_add(next.period);
            if self.settings.advance_enabled {
                if let Some(advance) = self.advance.get_mut(block.active_extruder as usize) {
                    advance.decelerate(block, self.step_loops);
                }
            }
            next.period
        } else {
            self.acc_step_rate = block.nominal_rate;
            self.step_loops = self.step_loops_nominal;
            self.nominal_period
        }
    }

    /// Emit pending pressure-advance pulses, a few per extruder per tick.
    fn drain_advance(&mut self) -> Result<()> {
        for extruder in 0..MAX_EXTRUDERS {
            let actuator = Actuator::E(extruder as u8);
            for _ in 0..MAX_ADVANCE_STEPS_PER_TICK {
                let Some(reverse) = self.advance[extruder].next_pulse() else {
                    break;
                };
                if self.advance_reverse[extruder] != Some(reverse) {
                    let level = self.direction_level(Axis::E, reverse);
                    self.hal
                        .write_direction_pin(actuator, level)
                        .map_err(|_| pin_fault(Axis::E))?;
                    self.advance_reverse[extruder] = Some(reverse);
                }
                self.hal.pulse_step_pin(actuator).map_err(|_| pin_fault(Axis::E))?;
            }
        }
        Ok(())
    }
}

fn pin_fault(axis: Axis) -> MotorError {
    warn!("pin fault on axis {}", axis.index());
    MotorError::PinError
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;
    use crate::motion::TrapezoidProfile;
    use crate::planner::{BlockQueue, StdCriticalSection};

    #[derive(Default)]
    struct RecordingHal {
        pulses: [u32; Actuator::COUNT],
        dir_writes: Vec<(Actuator, bool)>,
        periods: Vec<u32>,
    }

    impl StepperHal for RecordingHal {
        type Error = ();

        fn read_wall_clock_ticks(&self) -> u32 {
            self.periods.iter().sum()
        }

        fn set_timer_period(&mut self, ticks: u32) {
            self.periods.push(ticks);
        }

        fn write_direction_pin(&mut self, actuator: Actuator, level: bool) -> core::result::Result<(), ()> {
            self.dir_writes.push((actuator, level));
            Ok(())
        }

        fn pulse_step_pin(&mut self, actuator: Actuator) -> core::result::Result<(), ()> {
            self.pulses[actuator.index()] += 1;
            Ok(())
        }
    }

    fn settings() -> StepperSettings {
        StepperSettings {
            timer_frequency_hz: 2_000_000,
            max_step_frequency: 40_000,
            double_step_frequency: 10_000,
            quad_step_frequency: 20_000,
            min_timer_period: 100,
            idle_period: 2000,
            invert_mask: 0,
            advance_enabled: false,
            extruders: 1,
        }
    }

    fn trapezoid_block(steps: [u32; NUM_AXES], direction_bits: u8) -> Block {
        let count = *steps.iter().max().unwrap();
        let acceleration = 40_000;
        Block {
            steps,
            step_event_count: count,
            direction_bits,
            nominal_rate: 4000,
            acceleration_steps_per_s2: acceleration,
            acceleration_rate: (((acceleration as u64) << 24) / 2_000_000) as u32,
            profile: TrapezoidProfile::calculate(count, 4000, acceleration, 0.0, 0.0, 120),
            ..Block::EMPTY
        }
    }

    #[test]
    fn test_bresenham_emits_exact_steps() {
        let mut queue: BlockQueue<StdCriticalSection, 8> = BlockQueue::new(StdCriticalSection::new());
        let (mut producer, consumer) = queue.split();
        producer.push(trapezoid_block([1000, 333, 7, 0], Axis::Y.bit())).unwrap();

        let mut exec = StepperExecutor::new(consumer, RecordingHal::default(), settings());
        let mut ticks = 0;
        while exec.is_busy() || ticks == 0 {
            exec.on_tick().unwrap();
            ticks += 1;
            assert!(ticks < 10_000);
        }

        let hal = exec.hal();
        assert_eq!(hal.pulses[0], 1000);
        assert_eq!(hal.pulses[1], 333);
        assert_eq!(hal.pulses[2], 7);
        assert_eq!(producer.counters().snapshot(), [1000, -333, 7, 0]);
        assert!(producer.is_empty());
    }

    #[test]
    fn test_rate_ramps_up_then_down() {
        let mut queue: BlockQueue<StdCriticalSection, 8> = BlockQueue::new(StdCriticalSection::new());
        let (mut producer, consumer) = queue.split();
        producer.push(trapezoid_block([2000, 0, 0, 0], 0)).unwrap();

        let mut exec = StepperExecutor::new(consumer, RecordingHal::default(), settings());
        let mut saw = [false; 3];
        let mut peak = 0;
        loop {
            match exec.phase() {
                MotionPhase::Accelerating => saw[0] = true,
                MotionPhase::Cruising => saw[1] = true,
                MotionPhase::Decelerating => saw[2] = true,
                MotionPhase::Complete => {}
            }
            exec.on_tick().unwrap();
            peak = peak.max(exec.step_rate());
            if !exec.is_busy() {
                break;
            }
        }

        assert!(saw[0] && saw[1] && saw[2]);
        assert_eq!(peak, 4000);
        // the cruise period is the table period for 4000 steps/s
        assert!(exec.hal().periods.contains(&500));
    }

    #[test]
    fn test_direction_written_once_per_change() {
        let mut queue: BlockQueue<StdCriticalSection, 8> = BlockQueue::new(StdCriticalSection::new());
        let (mut producer, consumer) = queue.split();
        producer.push(trapezoid_block([100, 0, 0, 0], 0)).unwrap();
        producer.push(trapezoid_block([100, 0, 0, 0], 0)).unwrap();
        producer.push(trapezoid_block([100, 0, 0, 0], Axis::X.bit())).unwrap();

        let mut settings = settings();
        settings.invert_mask = Axis::X.bit();
        let mut exec = StepperExecutor::new(consumer, RecordingHal::default(), settings);
        for _ in 0..5_000 {
            exec.on_tick().unwrap();
        }

        let x_writes: Vec<bool> = exec
            .hal()
            .dir_writes
            .iter()
            .filter(|(a, _)| *a == Actuator::X)
            .map(|(_, level)| *level)
            .collect();
        // forward on an inverted axis is low, reverse is high
        assert_eq!(x_writes, vec![false, true]);
        assert_eq!(producer.counters().get(Axis::X), 100);
    }

    #[test]
    fn test_abort_retires_current_block() {
        let mut queue: BlockQueue<StdCriticalSection, 8> = BlockQueue::new(StdCriticalSection::new());
        let (mut producer, consumer) = queue.split();
        producer.push(trapezoid_block([5000, 0, 0, 0], 0)).unwrap();
        producer.push(trapezoid_block([5000, 0, 0, 0], 0)).unwrap();

        let mut exec = StepperExecutor::new(consumer, RecordingHal::default(), settings());
        for _ in 0..10 {
            exec.on_tick().unwrap();
        }
        assert!(producer.clear());
        exec.on_tick().unwrap();

        assert!(!exec.is_busy());
        assert!(producer.is_empty());
        let emitted = producer.counters().get(Axis::X);
        assert!(emitted > 0 && emitted < 5000);
        // idle afterwards
        assert_eq!(exec.on_tick().unwrap(), 2000);
    }

    #[test]
    fn test_advance_pulses_drain_on_idle() {
        let mut queue: BlockQueue<StdCriticalSection, 8> = BlockQueue::new(StdCriticalSection::new());
        let (mut producer, consumer) = queue.split();
        let mut block = trapezoid_block([2000, 0, 0, 200], 0);
        block.advance = 20 * 256;
        block.advance_rate = 64;
        producer.push(block).unwrap();

        let mut settings = settings();
        settings.advance_enabled = true;
        let mut exec = StepperExecutor::new(consumer, RecordingHal::default(), settings);
        for _ in 0..5_000 {
            exec.on_tick().unwrap();
        }

        assert!(!exec.is_busy());
        assert_eq!(exec.pending_advance_steps(0), 0);
        assert_eq!(producer.counters().get(Axis::E), 200);
    }
}
