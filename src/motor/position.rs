//! Actuator step counters.
//!
//! Written by the stepper interrupt on every pulse and read by the planner to
//! resynchronize after an abort.

use core::sync::atomic::{AtomicI32, Ordering};

use crate::kinematics::{Axis, NUM_AXES};

/// Absolute step position of each actuator.
#[derive(Debug, Default)]
pub struct StepCounters {
    counts: [AtomicI32; NUM_AXES],
}

impl StepCounters {
    /// Counters at the origin.
    pub const fn new() -> Self {
        Self {
            counts: [
                AtomicI32::new(0),
                AtomicI32::new(0),
                AtomicI32::new(0),
                AtomicI32::new(0),
            ],
        }
    }

    /// Current count of one actuator.
    #[inline]
    pub fn get(&self, axis: Axis) -> i32 {
        self.counts[axis.index()].load(Ordering::Relaxed)
    }

    /// Every counter at once.
    ///
    /// Counters are read one after another; take the snapshot while the
    /// executor is idle for a consistent position.
    pub fn snapshot(&self) -> [i32; NUM_AXES] {
        core::array::from_fn(|i| self.counts[i].load(Ordering::Relaxed))
    }

    /// Move one counter by a single step.
    #[inline]
    pub fn step(&self, axis: Axis, reverse: bool) {
        let delta = if reverse { -1 } else { 1 };
        self.counts[axis.index()].fetch_add(delta, Ordering::Relaxed);
    }

    /// Overwrite one counter.
    #[inline]
    pub fn set(&self, axis: Axis, steps: i32) {
        self.counts[axis.index()].store(steps, Ordering::Relaxed);
    }

    /// Overwrite every counter.
    pub fn set_all(&self, steps: &[i32; NUM_AXES]) {
        for (count, value) in self.counts.iter().zip(steps) {
            count.store(*value, Ordering::Relaxed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_counting() {
        let counters = StepCounters::new();

        counters.step(Axis::X, false);
        counters.step(Axis::X, false);
        counters.step(Axis::E, true);
        assert_eq!(counters.snapshot(), [2, 0, 0, -1]);

        counters.set(Axis::Z, 400);
        assert_eq!(counters.get(Axis::Z), 400);

        counters.set_all(&[0; NUM_AXES]);
        assert_eq!(counters.snapshot(), [0; NUM_AXES]);
    }
}
