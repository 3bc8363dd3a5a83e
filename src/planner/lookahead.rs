//! Look-ahead recalculation.
//!
//! Entry speeds are planned over every queued block in two passes: a reverse
//! pass that makes sure each block can still brake down to the next one (and
//! the newest one to the minimum planner speed), then a forward pass that
//! lowers entries a block cannot accelerate up to. Blocks whose entry or exit
//! changed get a fresh trapezoid.
//!
//! The oldest queued block keeps its entry: it may already be starting. If
//! the interrupt owns it, the block after it is also pinned, to the exit
//! speed the running block was planned with.

use crate::motion::{max_allowable_speed, TrapezoidProfile};

use super::block::Block;
use super::queue::{CriticalSection, Producer, QueuedBlock};

/// Plan entry speeds for `blocks[first..]`; entries before `first` are fixed.
///
/// Returns nothing; `entries` is overwritten in place. `entries[i]` is the
/// current entry speed of `blocks[i]` on input.
pub(crate) fn plan_entries(blocks: &[QueuedBlock], entries: &mut [f32], first: usize, minimum_planner_speed: f32) {
    let len = blocks.len();
    if first >= len {
        return;
    }

    // Reverse pass.
    let mut next_entry = minimum_planner_speed;
    for i in (first..len).rev() {
        let block = &blocks[i].block;
        entries[i] = if block.nominal_length {
            block.max_entry_speed
        } else {
            block
                .max_entry_speed
                .min(max_allowable_speed(-block.acceleration, next_entry, block.millimeters))
        };
        next_entry = entries[i];
    }

    // Forward pass.
    for i in first.max(1)..len {
        let prev = &blocks[i - 1].block;
        let prev_entry = entries[i - 1];
        if !prev.nominal_length && prev_entry < entries[i] {
            entries[i] = entries[i]
                .min(max_allowable_speed(-prev.acceleration, prev_entry, prev.millimeters));
        }
    }
}

/// Trapezoid for a block between `entry` and `exit` (mm/s).
pub(crate) fn block_profile(block: &Block, entry: f32, exit: f32, min_step_rate: u32) -> TrapezoidProfile {
    let (entry_factor, exit_factor) = if block.nominal_speed > 0.0 {
        (entry / block.nominal_speed, exit / block.nominal_speed)
    } else {
        (1.0, 1.0)
    };

    TrapezoidProfile::calculate(
        block.step_event_count,
        block.nominal_rate,
        block.acceleration_steps_per_s2,
        entry_factor,
        exit_factor,
        min_step_rate,
    )
    .with_advance(block.advance, entry_factor, exit_factor)
}

/// Re-plan every queued block and rewrite the trapezoids that changed.
///
/// Running it again on an unchanged queue changes nothing.
pub fn recalculate<C: CriticalSection, const N: usize>(
    producer: &mut Producer<'_, C, N>,
    minimum_planner_speed: f32,
    min_step_rate: u32,
) {
    let window = producer.snapshot();
    let len = window.len();
    if len == 0 {
        return;
    }

    let mut entries: heapless::Vec<f32, N> = window.iter().map(|q| q.block.entry_speed).collect();

    let first = if window[0].block.busy {
        if len > 1 {
            entries[1] = entries[1].min(window[0].block.exit_speed);
        }
        2
    } else {
        1
    };

    plan_entries(&window, &mut entries, first, minimum_planner_speed);

    let start = if window[0].block.busy { 1 } else { 0 };

    for i in start..len {
        let queued = &window[i];
        let is_newest = i + 1 == len;
        let entry = entries[i];
        let exit = if is_newest { minimum_planner_speed } else { entries[i + 1] };

        // The previous newest block also changes exit when a block is appended.
        let dirty = queued.block.recalculate
            || entry != queued.block.entry_speed
            || exit != queued.block.exit_speed;
        if !dirty {
            continue;
        }

        let profile = block_profile(&queued.block, entry, exit, min_step_rate);

        let written = producer.update(queued.slot, |block| {
            block.entry_speed = entry;
            block.exit_speed = exit;
            block.profile = profile;
            block.recalculate = false;
        });

        // Claimed since the snapshot: it runs the profile it had, so the
        // next block must enter at that profile's exit.
        if written.is_none() && !is_newest {
            entries[i + 1] = entries[i + 1].min(queued.block.exit_speed);
        }
    }
}
