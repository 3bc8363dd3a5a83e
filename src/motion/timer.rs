//! Step rate to timer period conversion.
//!
//! The stepper interrupt must not divide, so periods come from two
//! precomputed tables with linear interpolation between entries: a coarse
//! one for fast rates (256 steps/s per entry) and a fine one for slow rates
//! (8 steps/s per entry).

use crate::config::StepperSettings;

/// Lowest rate the tables resolve; slower requests get this rate's period.
pub const MIN_TABLE_RATE: u32 = 32;

const TABLE_LEN: usize = 256;
const FAST_SHIFT: u32 = 8;
const SLOW_SHIFT: u32 = 3;
const FAST_THRESHOLD: u32 = 1 << (FAST_SHIFT + SLOW_SHIFT);
const MAX_TABLE_RATE: u32 = ((TABLE_LEN as u32) << FAST_SHIFT) - 1;

/// Period of the next tick and the steps to emit in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerStep {
    /// Timer ticks until the next interrupt.
    pub period: u32,
    /// Step events per interrupt (1, 2 or 4).
    pub step_loops: u8,
}

/// Precomputed rate-to-period lookup.
#[derive(Debug, Clone)]
pub struct SpeedTable {
    /// `[period(i * 256), period(i * 256) - period((i + 1) * 256)]`
    fast: [[u32; 2]; TABLE_LEN],
    /// `[period(i * 8), period(i * 8) - period((i + 1) * 8)]`
    slow: [[u32; 2]; TABLE_LEN],
    max_step_frequency: u32,
    double_step_frequency: u32,
    quad_step_frequency: u32,
    min_timer_period: u32,
}

impl SpeedTable {
    /// Build the tables for a timer configuration.
    pub fn new(settings: &StepperSettings) -> Self {
        let hz = settings.timer_frequency_hz;
        let period = |rate: u32| hz / rate.max(1);

        let mut fast = [[0u32; 2]; TABLE_LEN];
        let mut slow = [[0u32; 2]; TABLE_LEN];
        for i in 0..TABLE_LEN as u32 {
            let base = period(i << FAST_SHIFT);
            fast[i as usize] = [base, base - period((i + 1) << FAST_SHIFT)];

            let base = period(i << SLOW_SHIFT);
            slow[i as usize] = [base, base - period((i + 1) << SLOW_SHIFT)];
        }

        Self {
            fast,
            slow,
            max_step_frequency: settings.max_step_frequency,
            double_step_frequency: settings.double_step_frequency,
            quad_step_frequency: settings.quad_step_frequency,
            min_timer_period: settings.min_timer_period,
        }
    }

    /// Timer period for a step rate (steps/s).
    ///
    /// Rates above the double/quad thresholds are split across 2 or 4 step
    /// events per tick. The result is never shorter than the minimum period.
    pub fn period_for(&self, rate: u32) -> TimerStep {
        let mut rate = rate.min(self.max_step_frequency);
        let step_loops = if rate > self.quad_step_frequency {
            rate >>= 2;
            4
        } else if rate > self.double_step_frequency {
            rate >>= 1;
            2
        } else {
            1
        };

        let rate = rate.clamp(MIN_TABLE_RATE, MAX_TABLE_RATE);
        let period = if rate >= FAST_THRESHOLD {
            let [base, gain] = self.fast[(rate >> FAST_SHIFT) as usize];
            base - ((gain * (rate & 0xff)) >> FAST_SHIFT)
        } else {
            let [base, gain] = self.slow[(rate >> SLOW_SHIFT) as usize];
            base - ((gain * (rate & 0x07)) >> SLOW_SHIFT)
        };

        TimerStep {
            period: period.max(self.min_timer_period),
            step_loops,
        }
    }
}
