//! Trapezoid profile calculation.
//!
//! Velocity trapezoids are expressed in step events of the dominant axis and
//! step rates (steps/s). The helpers here are the kinematic equations the
//! planner uses for both look-ahead and profile generation.

use libm::{ceilf, floorf, sqrtf};

/// Current phase of block execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotionPhase {
    /// Ramping up from the initial rate toward the nominal rate.
    Accelerating,
    /// Moving at the nominal rate.
    Cruising,
    /// Ramping down toward the final rate.
    Decelerating,
    /// Every step event has been emitted.
    Complete,
}

/// Distance needed to go from `initial_rate` to `target_rate` at
/// `acceleration`. Units follow the arguments (steps or mm).
#[inline]
pub fn estimate_acceleration_distance(initial_rate: f32, target_rate: f32, acceleration: f32) -> f32 {
    if acceleration == 0.0 {
        return 0.0;
    }
    (target_rate * target_rate - initial_rate * initial_rate) / (2.0 * acceleration)
}

/// Point at which to stop accelerating and start braking so that a move of
/// `distance` starting at `initial_rate` ends at exactly `final_rate`.
/// Used when the nominal rate is never reached.
#[inline]
pub fn intersection_distance(initial_rate: f32, final_rate: f32, acceleration: f32, distance: f32) -> f32 {
    if acceleration == 0.0 {
        return 0.0;
    }
    (2.0 * acceleration * distance - initial_rate * initial_rate + final_rate * final_rate)
        / (4.0 * acceleration)
}

/// Highest speed from which `target_velocity` is still reachable over
/// `distance` at (negative) `acceleration`.
#[inline]
pub fn max_allowable_speed(acceleration: f32, target_velocity: f32, distance: f32) -> f32 {
    sqrtf(target_velocity * target_velocity - 2.0 * acceleration * distance)
}

/// Step-event boundaries and rates of a velocity trapezoid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrapezoidProfile {
    /// Step rate at the first step event (steps/s).
    pub initial_rate: u32,

    /// Step rate at the last step event (steps/s).
    pub final_rate: u32,

    /// Step events `< accelerate_until` accelerate.
    pub accelerate_until: u32,

    /// Step events `>= decelerate_after` decelerate.
    pub decelerate_after: u32,

    /// Pressure advance at the first step event (1/256 E steps).
    pub initial_advance: i32,

    /// Pressure advance at the last step event (1/256 E steps).
    pub final_advance: i32,
}

impl TrapezoidProfile {
    /// Profile of a block with no steps.
    pub const EMPTY: Self = Self {
        initial_rate: 0,
        final_rate: 0,
        accelerate_until: 0,
        decelerate_after: 0,
        initial_advance: 0,
        final_advance: 0,
    };

    /// Compute the trapezoid for a block.
    ///
    /// # Arguments
    ///
    /// * `step_event_count` - Length of the block in step events
    /// * `nominal_rate` - Cruise rate (steps/s)
    /// * `acceleration` - Dominant-axis acceleration (steps/s²)
    /// * `entry_factor` - Entry speed divided by nominal speed
    /// * `exit_factor` - Exit speed divided by nominal speed
    /// * `min_rate` - Floor for the initial and final rates
    ///
    /// Rates are clamped into `[min_rate, nominal_rate]` and the three phase
    /// lengths always add up to `step_event_count`.
    pub fn calculate(
        step_event_count: u32,
        nominal_rate: u32,
        acceleration: u32,
        entry_factor: f32,
        exit_factor: f32,
        min_rate: u32,
    ) -> Self {
        if step_event_count == 0 {
            return Self::EMPTY;
        }

        let ceiling = nominal_rate.max(min_rate);
        let initial_rate = (ceilf(nominal_rate as f32 * entry_factor) as u32).clamp(min_rate, ceiling);
        let final_rate = (ceilf(nominal_rate as f32 * exit_factor) as u32).clamp(min_rate, ceiling);

        let count = step_event_count as i64;
        let (accelerate_steps, plateau_steps) = if acceleration == 0 {
            (0, count)
        } else {
            let accel = acceleration as f32;
            let nominal = ceiling as f32;
            let mut accelerate_steps =
                ceilf(estimate_acceleration_distance(initial_rate as f32, nominal, accel)) as i64;
            let decelerate_steps =
                floorf(estimate_acceleration_distance(nominal, final_rate as f32, -accel)) as i64;
            let mut plateau_steps = count - accelerate_steps - decelerate_steps;

            // Nominal rate is never reached: accelerate until the braking
            // curve toward the final rate is met.
            if plateau_steps < 0 {
                let meet = intersection_distance(initial_rate as f32, final_rate as f32, accel, count as f32);
                accelerate_steps = (ceilf(meet) as i64).clamp(0, count);
                plateau_steps = 0;
            }
            (accelerate_steps, plateau_steps)
        };

        Self {
            initial_rate,
            final_rate,
            accelerate_until: accelerate_steps as u32,
            decelerate_after: (accelerate_steps + plateau_steps) as u32,
            initial_advance: 0,
            final_advance: 0,
        }
    }

    /// Set the advance ramp ends for a block with full advance `advance`.
    pub fn with_advance(mut self, advance: i32, entry_factor: f32, exit_factor: f32) -> Self {
        self.initial_advance = (advance as f32 * entry_factor) as i32;
        self.final_advance = (advance as f32 * exit_factor) as i32;
        self
    }

    /// Step events spent accelerating.
    #[inline]
    pub fn accelerate_steps(&self) -> u32 {
        self.accelerate_until
    }

    /// Step events spent at the nominal rate.
    #[inline]
    pub fn plateau_steps(&self) -> u32 {
        self.decelerate_after.saturating_sub(self.accelerate_until)
    }

    /// Step events spent decelerating.
    #[inline]
    pub fn decelerate_steps(&self, step_event_count: u32) -> u32 {
        step_event_count.saturating_sub(self.decelerate_after)
    }

    /// Phase of the step event with index `step`.
    pub fn phase_at(&self, step: u32, step_event_count: u32) -> MotionPhase {
        if step >= step_event_count {
            MotionPhase::Complete
        } else if step < self.accelerate_until {
            MotionPhase::Accelerating
        } else if step < self.decelerate_after {
            MotionPhase::Cruising
        } else {
            MotionPhase::Decelerating
        }
    }
}

impl Default for TrapezoidProfile {
    fn default() -> Self {
        Self::EMPTY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_trapezoid() {
        // 4000 steps at 8000 steps/s, 80000 steps/s², starting from rest.
        let profile = TrapezoidProfile::calculate(4000, 8000, 80_000, 0.0, 0.0, 120);

        assert_eq!(profile.initial_rate, 120);
        assert_eq!(profile.final_rate, 120);
        // (8000² - 120²) / 160000 = 399.91
        assert_eq!(profile.accelerate_until, 400);
        assert_eq!(profile.decelerate_steps(4000), 399);
        assert_eq!(
            profile.accelerate_steps() + profile.plateau_steps() + profile.decelerate_steps(4000),
            4000
        );
    }

    #[test]
    fn test_triangle_profile() {
        let profile = TrapezoidProfile::calculate(200, 8000, 80_000, 0.0, 0.0, 120);

        assert_eq!(profile.plateau_steps(), 0);
        assert_eq!(profile.accelerate_until, profile.decelerate_after);
        assert!(profile.accelerate_until <= 200);
        // symmetric rates meet in the middle
        assert_eq!(profile.accelerate_until, 100);
    }

    #[test]
    fn test_asymmetric_triangle_clamped() {
        // Entry at nominal, exit at rest: all deceleration, and a very short block.
        let profile = TrapezoidProfile::calculate(10, 8000, 80_000, 1.0, 0.0, 120);

        assert_eq!(profile.initial_rate, 8000);
        assert_eq!(profile.accelerate_until, 0);
        assert!(profile.decelerate_after <= 10);
    }

    #[test]
    fn test_rates_clamped() {
        let profile = TrapezoidProfile::calculate(1000, 5000, 50_000, 1.5, 0.001, 120);

        assert_eq!(profile.initial_rate, 5000);
        assert_eq!(profile.final_rate, 120);
    }

    #[test]
    fn test_cruise_only() {
        let profile = TrapezoidProfile::calculate(500, 3000, 40_000, 1.0, 1.0, 120);

        assert_eq!(profile.accelerate_until, 0);
        assert_eq!(profile.decelerate_after, 500);
        assert_eq!(profile.phase_at(0, 500), MotionPhase::Cruising);
    }

    #[test]
    fn test_advance_scales_with_factors() {
        let profile = TrapezoidProfile::calculate(500, 3000, 40_000, 0.5, 0.25, 120).with_advance(1024, 0.5, 0.25);

        assert_eq!(profile.initial_advance, 512);
        assert_eq!(profile.final_advance, 256);
    }

    #[test]
    fn test_max_allowable_speed() {
        // stopping from 10 mm/s at 100 mm/s² takes 0.5 mm
        let v = max_allowable_speed(-100.0, 0.0, 0.5);
        assert!((v - 10.0).abs() < 1e-4);
        assert_eq!(estimate_acceleration_distance(0.0, 10.0, 100.0), 0.5);
    }
}
