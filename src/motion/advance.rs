//! Pressure advance accumulator.
//!
//! While a block ramps, the extruder is pushed ahead of (or pulled behind)
//! its nominal position by an amount proportional to the E speed. The
//! executor feeds the ramp and every regular E step in here, then drains the
//! resulting signed pulse count a few pulses per tick.

use crate::planner::Block;

/// Advance pulses emitted per tick at most.
pub const MAX_ADVANCE_STEPS_PER_TICK: u32 = 8;

/// Extra E pulses owed to the extruder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PressureAdvance {
    /// Signed E pulses waiting to be emitted.
    pending: i32,
    /// Current advance, in 1/256 E steps.
    advance: i32,
    /// Whole advance steps already added to `pending`.
    applied: i32,
}

impl PressureAdvance {
    /// Empty accumulator.
    pub const fn new() -> Self {
        Self {
            pending: 0,
            advance: 0,
            applied: 0,
        }
    }

    /// Pulses waiting to be emitted (negative for retraction).
    #[inline]
    pub fn pending(&self) -> i32 {
        self.pending
    }

    /// Current advance in 1/256 E steps.
    #[inline]
    pub fn advance(&self) -> i32 {
        self.advance
    }

    /// Queue a regular E step.
    #[inline]
    pub fn queue_step(&mut self, reverse: bool) {
        self.pending += if reverse { -1 } else { 1 };
    }

    /// Jump to the block's initial advance.
    pub fn start_block(&mut self, block: &Block) {
        self.advance = block.profile.initial_advance;
        self.sync();
    }

    /// Ramp up by `step_loops` step events, capped at the block's full advance.
    pub fn accelerate(&mut self, block: &Block, step_loops: u8) {
        self.advance = (self.advance + block.advance_rate * step_loops as i32).min(block.advance);
        self.sync();
    }

    /// Ramp down by `step_loops` step events, floored at the final advance.
    pub fn decelerate(&mut self, block: &Block, step_loops: u8) {
        self.advance = (self.advance - block.advance_rate * step_loops as i32).max(block.profile.final_advance);
        self.sync();
    }

    /// Drop all advance; used when the queue runs dry.
    pub fn release(&mut self) {
        self.advance = 0;
        self.sync();
    }

    /// Take one pending pulse. Returns its direction (`true` = reverse).
    pub fn next_pulse(&mut self) -> Option<bool> {
        match self.pending {
            0 => None,
            p if p > 0 => {
                self.pending -= 1;
                Some(false)
            }
            _ => {
                self.pending += 1;
                Some(true)
            }
        }
    }

    fn sync(&mut self) {
        let whole = self.advance >> 8;
        self.pending += whole - self.applied;
        self.applied = whole;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motion::TrapezoidProfile;

    fn block() -> Block {
        Block {
            advance: 10 * 256,
            advance_rate: 64,
            profile: TrapezoidProfile {
                initial_advance: 2 * 256,
                final_advance: 256,
                ..TrapezoidProfile::EMPTY
            },
            ..Block::EMPTY
        }
    }

    #[test]
    fn test_ramp_and_release() {
        let block = block();
        let mut adv = PressureAdvance::new();

        adv.start_block(&block);
        assert_eq!(adv.pending(), 2);

        for _ in 0..100 {
            adv.accelerate(&block, 1);
        }
        // capped at the full advance
        assert_eq!(adv.advance(), 10 * 256);
        assert_eq!(adv.pending(), 10);

        for _ in 0..100 {
            adv.decelerate(&block, 1);
        }
        assert_eq!(adv.advance(), 256);
        assert_eq!(adv.pending(), 1);

        adv.release();
        assert_eq!(adv.pending(), 0);
    }

    #[test]
    fn test_drain_directions() {
        let mut adv = PressureAdvance::new();
        adv.queue_step(false);
        adv.queue_step(true);
        adv.queue_step(true);

        assert_eq!(adv.next_pulse(), Some(true));
        assert_eq!(adv.next_pulse(), None);
    }
}
