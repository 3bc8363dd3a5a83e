//! The motion planner.
//!
//! Turns targets into constrained blocks, keeps the commanded position and
//! re-runs the look-ahead after every accepted move.

use libm::{ceilf, fabsf, roundf, sqrtf};

use crate::config::{FlowPercentage, PlannerSettings, Steps};
use crate::error::{Error, MotionError, Result};
use crate::kinematics::{Axis, AxisVector, Kinematics, MAX_EXTRUDERS, NUM_AXES};
use crate::motion::{estimate_acceleration_distance, max_allowable_speed, TrapezoidProfile};
use crate::motor::PlannerHooks;

use super::block::Block;
use super::leveling::BedMesh;
use super::lookahead;
use super::queue::{CriticalSection, Producer};

const X: usize = 0;
const Y: usize = 1;
const Z: usize = 2;
const E: usize = 3;

/// Background-side motion planner.
///
/// Owns the producer half of the block queue. Every method runs in the
/// background context; nothing here is safe to call from the step interrupt.
pub struct Planner<'q, C, H, const N: usize>
where
    C: CriticalSection,
    H: PlannerHooks,
{
    queue: Producer<'q, C, N>,
    settings: PlannerSettings,
    hooks: H,

    /// Commanded logical position, before bed compensation.
    position_mm: AxisVector,
    /// Logical position of the last accepted move, after compensation.
    position_compensated: AxisVector,
    /// Position-space steps of the last accepted move.
    position: [i32; NUM_AXES],

    /// Tool-head speed of the last accepted move (mm/s).
    previous_speed: [f32; NUM_AXES],
    previous_nominal_speed: f32,

    flow: [FlowPercentage; MAX_EXTRUDERS],
    volumetric_multiplier: [f32; MAX_EXTRUDERS],
    extruder_factor: [f32; MAX_EXTRUDERS],

    mesh: Option<BedMesh>,
}

impl<'q, C, H, const N: usize> Planner<'q, C, H, N>
where
    C: CriticalSection,
    H: PlannerHooks,
{
    /// Create a planner at the origin.
    pub fn new(queue: Producer<'q, C, N>, settings: PlannerSettings, hooks: H) -> Self {
        let flow = [settings.flow; MAX_EXTRUDERS];
        Self {
            queue,
            settings,
            hooks,
            position_mm: AxisVector::ZERO,
            position_compensated: AxisVector::ZERO,
            position: [0; NUM_AXES],
            previous_speed: [0.0; NUM_AXES],
            previous_nominal_speed: 0.0,
            flow,
            volumetric_multiplier: [1.0; MAX_EXTRUDERS],
            extruder_factor: flow.map(FlowPercentage::factor),
            mesh: None,
        }
    }

    /// Active settings snapshot.
    #[inline]
    pub fn settings(&self) -> &PlannerSettings {
        &self.settings
    }

    /// Get the host hooks.
    #[inline]
    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    /// Get the host hooks mutably.
    #[inline]
    pub fn hooks_mut(&mut self) -> &mut H {
        &mut self.hooks
    }

    /// Plan a straight move to `target` at `feed_rate` (mm/s).
    ///
    /// Blocks (calling the idle hook) while the queue is full. Moves below
    /// the step resolution and moves for an unconfigured extruder are
    /// dropped without an error.
    pub fn buffer_line(&mut self, target: AxisVector, feed_rate: f32, extruder: u8) {
        if extruder >= self.settings.extruders {
            warn!("dropping move for unconfigured extruder {}", extruder);
            return;
        }

        if self.queue.is_full() {
            debug!("block queue full, waiting");
            while self.queue.is_full() {
                self.hooks.idle_hook();
            }
        }

        let settings = self.settings;
        let compensated = self.compensate(target);
        let resolved = settings.kinematics.resolve(
            &self.position,
            &self.position_compensated,
            &compensated,
            &settings.steps_per_mm,
        );
        self.position_mm = target;

        let factor = self.extruder_factor[extruder as usize];
        let de = resolved.actuator_steps[E].unsigned_abs();
        let mut steps = [0u32; NUM_AXES];
        for i in X..=Z {
            steps[i] = resolved.actuator_steps[i].unsigned_abs();
        }
        steps[E] = if factor == 1.0 { de } else { (de as f32 * factor + 0.5) as u32 };

        let step_event_count = steps.iter().copied().max().unwrap_or(0);
        let min_steps = settings.min_steps_per_segment.max(1);
        if step_event_count < min_steps {
            debug!("dropping move of {} step events", step_event_count);
            return;
        }

        let direction_bits = Axis::ALL
            .iter()
            .filter(|axis| resolved.actuator_steps[axis.index()] < 0)
            .fold(0u8, |bits, axis| bits | axis.bit());

        let e_mm = resolved.head_mm[E] * factor;
        let significant_xyz = steps[..E].iter().any(|&s| s >= min_steps);
        let millimeters = if significant_xyz {
            let [dx, dy, dz, _] = resolved.head_mm;
            sqrtf(dx * dx + dy * dy + dz * dz)
        } else {
            fabsf(e_mm)
        };

        let floor = if steps[E] != 0 {
            settings.min_feedrate
        } else {
            settings.min_travel_feedrate
        };
        let feed_rate = feed_rate.max(floor);
        if millimeters.is_nan() || millimeters <= 0.0 || feed_rate.is_nan() || feed_rate <= 0.0 {
            debug!("dropping move with no length or feed rate");
            return;
        }

        let mut inverse_second = feed_rate / millimeters;

        // Stretch short segments while the queue is draining so it can refill.
        let moves_queued = self.queue.len();
        if settings.slowdown && moves_queued > 1 && moves_queued < N / 2 {
            let segment_time = roundf(1_000_000.0 / inverse_second) as u32;
            if segment_time < settings.min_segment_time_us {
                let stretch = roundf(
                    2.0 * (settings.min_segment_time_us - segment_time) as f32 / moves_queued as f32,
                ) as u32;
                inverse_second = 1_000_000.0 / (segment_time + stretch) as f32;
            }
        }

        let mut nominal_speed = millimeters * inverse_second;
        let mut nominal_rate = ceilf(step_event_count as f32 * inverse_second) as u32;

        let mut actuator_speed = [0.0f32; NUM_AXES];
        let mut head_speed = [0.0f32; NUM_AXES];
        for i in X..=Z {
            actuator_speed[i] = resolved.actuator_mm[i] * inverse_second;
            head_speed[i] = resolved.head_mm[i] * inverse_second;
        }
        actuator_speed[E] = e_mm * inverse_second;
        head_speed[E] = actuator_speed[E];

        // Feed-rate clamp: scale the whole move by the worst axis.
        let mut speed_factor = 1.0f32;
        for (speed, max) in actuator_speed.iter().zip(settings.max_feedrate.iter()) {
            let speed = fabsf(*speed);
            if speed > *max {
                speed_factor = speed_factor.min(*max / speed);
            }
        }
        if speed_factor < 1.0 {
            for speed in head_speed.iter_mut() {
                *speed *= speed_factor;
            }
            nominal_speed *= speed_factor;
            nominal_rate = (nominal_rate as f32 * speed_factor) as u32;
        }
        nominal_rate = nominal_rate.max(settings.min_step_rate);

        // Acceleration: pick by move type, then clamp per axis.
        let steps_per_mm = step_event_count as f32 / millimeters;
        let moves_xyz = steps[..E].iter().any(|&s| s != 0);
        let base_acceleration = if !moves_xyz {
            settings.retract_acceleration
        } else if steps[E] != 0 {
            settings.acceleration
        } else {
            settings.travel_acceleration
        };
        let mut accel_st = ceilf(base_acceleration * steps_per_mm) as u32;
        let count = step_event_count as u64;
        for (i, &axis_steps) in steps.iter().enumerate() {
            if axis_steps == 0 {
                continue;
            }
            let max = settings.max_acceleration_steps_per_s2[i] as u64;
            if max * count < accel_st as u64 * axis_steps as u64 {
                accel_st = (max * count / axis_steps as u64) as u32;
            }
        }
        let acceleration = accel_st as f32 / steps_per_mm;
        let acceleration_rate = (((accel_st as u64) << 24) / settings.timer_frequency_hz.max(1) as u64)
            .min(u32::MAX as u64) as u32;

        // Junction speed from the jerk limits.
        let mut vmax_junction = settings.max_xy_jerk / 2.0;
        if fabsf(head_speed[Z]) > settings.max_z_jerk / 2.0 {
            vmax_junction = vmax_junction.min(settings.max_z_jerk / 2.0);
        }
        if fabsf(head_speed[E]) > settings.max_e_jerk / 2.0 {
            vmax_junction = vmax_junction.min(settings.max_e_jerk / 2.0);
        }
        vmax_junction = vmax_junction.min(nominal_speed);
        let safe_speed = vmax_junction;

        if moves_queued > 0 && self.previous_nominal_speed > 0.0001 {
            let dx = head_speed[X] - self.previous_speed[X];
            let dy = head_speed[Y] - self.previous_speed[Y];
            let mut factor = 1.0f32;

            let jerk = sqrtf(dx * dx + dy * dy);
            if jerk > settings.max_xy_jerk {
                factor = settings.max_xy_jerk / jerk;
            }
            let jerk = fabsf(head_speed[Z] - self.previous_speed[Z]);
            if jerk > settings.max_z_jerk {
                factor = factor.min(settings.max_z_jerk / jerk);
            }
            let jerk = fabsf(head_speed[E] - self.previous_speed[E]);
            if jerk > settings.max_e_jerk {
                factor = factor.min(settings.max_e_jerk / jerk);
            }

            vmax_junction = self.previous_nominal_speed.min(nominal_speed * factor);
        }

        let v_allowable = max_allowable_speed(-acceleration, settings.minimum_planner_speed, millimeters);
        let entry_speed = vmax_junction.min(v_allowable);

        let (advance, advance_rate) = if settings.advance_k > 0.0 && steps[E] != 0 && moves_xyz {
            let e_rate = fabsf(head_speed[E]) * settings.steps_per_mm[E];
            let advance = settings.advance_k * e_rate * 256.0;
            let ramp = estimate_acceleration_distance(0.0, nominal_rate as f32, accel_st as f32);
            let rate = if ramp >= 1.0 { advance / ramp } else { 0.0 };
            (advance as i32, rate as i32)
        } else {
            (0, 0)
        };

        let mut block = Block {
            steps,
            step_event_count,
            direction_bits,
            active_extruder: extruder,
            millimeters,
            nominal_speed,
            nominal_rate,
            acceleration,
            acceleration_steps_per_s2: accel_st,
            acceleration_rate,
            entry_speed,
            max_entry_speed: vmax_junction,
            exit_speed: safe_speed,
            profile: TrapezoidProfile::EMPTY,
            advance,
            advance_rate,
            nominal_length: nominal_speed <= v_allowable,
            recalculate: true,
            busy: false,
        };
        block.profile = lookahead::block_profile(&block, entry_speed, safe_speed, settings.min_step_rate);

        if self.queue.push(block).is_err() {
            // Only this planner pushes, and it waited for a free slot.
            warn!("block queue full after wait, move dropped");
            return;
        }

        self.position = resolved.target;
        self.position_compensated = compensated;
        self.previous_speed = head_speed;
        self.previous_nominal_speed = nominal_speed;

        self.recalculate();
        self.hooks.arm_timer_interrupt();
    }

    /// Plan a move, split into short segments on non-linear geometries.
    ///
    /// On a delta the segment count is `segments_per_second` times the move
    /// duration at `feed_rate`. Other geometries plan a single line.
    pub fn buffer_segmented_line(&mut self, target: AxisVector, feed_rate: f32, extruder: u8) {
        let Kinematics::Delta(geometry) = self.settings.kinematics else {
            self.buffer_line(target, feed_rate, extruder);
            return;
        };

        let start = self.position_mm;
        let delta = target - start;
        let cartesian_mm = delta.xyz_length();
        let millimeters = if cartesian_mm > 0.0 { cartesian_mm } else { fabsf(delta.e()) };
        if millimeters.is_nan() || millimeters <= 0.0 || feed_rate.is_nan() || feed_rate <= 0.0 {
            self.buffer_line(target, feed_rate, extruder);
            return;
        }

        let segments = ((geometry.segments_per_second * millimeters / feed_rate) as u32).max(1);
        for s in 1..segments {
            let fraction = s as f32 / segments as f32;
            let point = AxisVector(core::array::from_fn(|i| start.0[i] + delta.0[i] * fraction));
            self.buffer_line(point, feed_rate, extruder);
        }
        self.buffer_line(target, feed_rate, extruder);
    }

    /// Re-run the look-ahead over the queue.
    ///
    /// Called by [`Planner::buffer_line`]; running it again on an unchanged
    /// queue changes nothing.
    pub fn recalculate(&mut self) {
        lookahead::recalculate(
            &mut self.queue,
            self.settings.minimum_planner_speed,
            self.settings.min_step_rate,
        );
    }

    /// Commanded logical position (mm). May be ahead of the machine.
    #[inline]
    pub fn position(&self) -> AxisVector {
        self.position_mm
    }

    /// Wait until every queued block has executed.
    pub fn synchronize(&mut self) {
        while !self.queue.is_empty() {
            self.hooks.idle_hook();
        }
    }

    /// Drop every queued move and abort the one executing, without a ramp.
    ///
    /// The commanded position is left at the last planned target; call
    /// [`Planner::synchronize`] then [`Planner::sync_position_from_steppers`]
    /// to pick up where the machine actually stopped.
    pub fn quick_stop(&mut self) {
        self.hooks.disable_timer_interrupt();
        let aborted = self.queue.clear();
        self.hooks.arm_timer_interrupt();

        self.previous_speed = [0.0; NUM_AXES];
        self.previous_nominal_speed = 0.0;
        info!("quick stop, running block aborted: {}", aborted);
    }

    /// Reset the planner position from the executed step counters.
    pub fn sync_position_from_steppers(&mut self) {
        let kinematics = self.settings.kinematics;
        let counters = self.queue.counters().snapshot();

        self.position = kinematics.position_from_actuators(&counters);
        self.position_compensated = kinematics.forward(&counters, &self.settings.steps_per_mm);
        let mut commanded = self.position_compensated;
        if let Some(mesh) = &self.mesh {
            commanded[Axis::Z] -= mesh.z_offset(commanded.x(), commanded.y());
        }
        self.position_mm = commanded;
        self.previous_speed = [0.0; NUM_AXES];
        self.previous_nominal_speed = 0.0;
    }

    /// Set the current position without moving.
    ///
    /// Also overwrites the executor's step counters; call after
    /// [`Planner::synchronize`].
    pub fn set_position_mm(&mut self, position: AxisVector) {
        let kinematics = self.settings.kinematics;
        let compensated = self.compensate(position);

        self.position_mm = position;
        self.position_compensated = compensated;
        self.position = kinematics.position_steps(&compensated, &self.settings.steps_per_mm);
        self.queue.counters().set_all(&kinematics.actuator_steps(&self.position));
        self.previous_speed = [0.0; NUM_AXES];
        self.previous_nominal_speed = 0.0;
    }

    /// Set the extruder position without moving.
    pub fn set_e_position_mm(&mut self, e: f32) {
        let steps = Steps::from_mm(e, self.settings.steps_per_mm[E]).value();
        self.position_mm[Axis::E] = e;
        self.position_compensated[Axis::E] = e;
        self.position[E] = steps;
        self.queue.counters().set(Axis::E, steps);
        self.previous_speed[E] = 0.0;
    }

    /// Executed actuator step counters.
    #[inline]
    pub fn stepper_position(&self) -> [i32; NUM_AXES] {
        self.queue.counters().snapshot()
    }

    /// Executed position in logical mm (including bed compensation).
    pub fn stepper_position_mm(&self) -> AxisVector {
        self.settings
            .kinematics
            .forward(&self.queue.counters().snapshot(), &self.settings.steps_per_mm)
    }

    /// Queued blocks, including one executing.
    #[inline]
    pub fn moves_planned(&self) -> usize {
        self.queue.len()
    }

    /// True when the next `buffer_line` would wait.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.queue.is_full()
    }

    /// Blocks the queue can hold.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.queue.capacity()
    }

    /// True while anything is queued or executing.
    #[inline]
    pub fn has_moves(&self) -> bool {
        !self.queue.is_empty()
    }

    /// True if a queued block moves the actuator of `axis`.
    pub fn axis_active(&self, axis: Axis) -> bool {
        self.queue.snapshot().iter().any(|q| q.block.moves(axis))
    }

    /// Copies of the queued blocks, oldest first.
    pub fn plan_snapshot(&self) -> heapless::Vec<Block, N> {
        self.queue.snapshot().iter().map(|q| q.block).collect()
    }

    /// Wall-clock ticks since the last step pulse.
    #[inline]
    pub fn steppers_idle_for(&self, now: u32) -> u32 {
        now.wrapping_sub(self.queue.last_activity())
    }

    /// Set the flow override of one extruder (percent).
    ///
    /// # Errors
    ///
    /// Returns an error for an unconfigured extruder or a percentage outside 1..=1000.
    pub fn set_flow_percentage(&mut self, extruder: u8, percent: u16) -> Result<()> {
        let index = self.extruder_index(extruder)?;
        self.flow[index] = FlowPercentage::new(percent)?;
        self.update_extruder_factor(index);
        Ok(())
    }

    /// Set the volumetric multiplier of one extruder.
    ///
    /// # Errors
    ///
    /// Returns an error for an unconfigured extruder or a non-positive multiplier.
    pub fn set_volumetric_multiplier(&mut self, extruder: u8, multiplier: f32) -> Result<()> {
        let index = self.extruder_index(extruder)?;
        if multiplier.is_nan() || multiplier <= 0.0 {
            return Err(Error::Motion(MotionError::InvalidVolumetricMultiplier(multiplier)));
        }
        self.volumetric_multiplier[index] = multiplier;
        self.update_extruder_factor(index);
        Ok(())
    }

    /// Flow override of one extruder.
    pub fn flow_percentage(&self, extruder: u8) -> Option<FlowPercentage> {
        self.flow.get(extruder as usize).copied()
    }

    /// Install or remove the bed height map.
    ///
    /// Takes effect from the next move; the commanded position is kept.
    pub fn set_bed_mesh(&mut self, mesh: Option<BedMesh>) {
        self.mesh = mesh;
    }

    /// Active bed height map.
    #[inline]
    pub fn bed_mesh(&self) -> Option<&BedMesh> {
        self.mesh.as_ref()
    }

    /// Swap in a new settings snapshot.
    ///
    /// Waits for the queue to drain, then re-derives the step position from
    /// the commanded one.
    pub fn apply_settings(&mut self, settings: PlannerSettings) {
        self.synchronize();
        self.settings = settings;
        let position = self.position_mm;
        self.set_position_mm(position);
        info!("planner settings applied, {} extruders", settings.extruders);
    }

    fn extruder_index(&self, extruder: u8) -> Result<usize> {
        if extruder >= self.settings.extruders {
            return Err(Error::Motion(MotionError::InvalidExtruder(extruder)));
        }
        Ok(extruder as usize)
    }

    fn update_extruder_factor(&mut self, index: usize) {
        self.extruder_factor[index] = self.flow[index].factor() * self.volumetric_multiplier[index];
    }

    fn compensate(&self, target: AxisVector) -> AxisVector {
        match &self.mesh {
            Some(mesh) => target.with(Axis::Z, target.z() + mesh.z_offset(target.x(), target.y())),
            None => target,
        }
    }
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;
    use crate::config::{MachineConfig, PlannerSettings};
    use crate::motor::NoHooks;
    use crate::planner::{BlockQueue, StdCriticalSection};

    const CONFIG: &str = r#"
[motion]
acceleration_mm_per_sec2 = 1000.0
retract_acceleration_mm_per_sec2 = 500.0
travel_acceleration_mm_per_sec2 = 2000.0
extruders = 2

[axes.x]
steps_per_mm = 80.0
max_feedrate_mm_per_sec = 100.0
max_acceleration_mm_per_sec2 = 3000.0

[axes.y]
steps_per_mm = 80.0
max_feedrate_mm_per_sec = 100.0
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

    fn settings() -> PlannerSettings {
        let config: MachineConfig = crate::config::parse_config(CONFIG).unwrap();
        PlannerSettings::from_config(&config)
    }

    #[test]
    fn test_sub_resolution_move_dropped() {
        let mut queue: BlockQueue<StdCriticalSection, 16> = BlockQueue::new(StdCriticalSection::new());
        let (producer, _consumer) = queue.split();
        let mut planner = Planner::new(producer, settings(), NoHooks);

        // 0.05 mm on X is 4 steps, below the default minimum of 6
        planner.buffer_line(AxisVector::new(0.05, 0.0, 0.0, 0.0), 50.0, 0);
        assert_eq!(planner.moves_planned(), 0);
        assert!((planner.position().x() - 0.05).abs() < 1e-6);

        // the skipped steps are carried into the next move
        planner.buffer_line(AxisVector::new(0.1, 0.0, 0.0, 0.0), 50.0, 0);
        assert_eq!(planner.plan_snapshot()[0].steps[0], 8);
    }

    #[test]
    fn test_unconfigured_extruder_dropped() {
        let mut queue: BlockQueue<StdCriticalSection, 16> = BlockQueue::new(StdCriticalSection::new());
        let (producer, _consumer) = queue.split();
        let mut planner = Planner::new(producer, settings(), NoHooks);

        planner.buffer_line(AxisVector::new(10.0, 0.0, 0.0, 1.0), 50.0, 2);
        assert_eq!(planner.moves_planned(), 0);
        assert_eq!(planner.position(), AxisVector::ZERO);
    }

    #[test]
    fn test_acceleration_selection() {
        let mut queue: BlockQueue<StdCriticalSection, 16> = BlockQueue::new(StdCriticalSection::new());
        let (producer, _consumer) = queue.split();
        let mut planner = Planner::new(producer, settings(), NoHooks);

        planner.buffer_line(AxisVector::new(10.0, 0.0, 0.0, 0.0), 50.0, 0);
        planner.buffer_line(AxisVector::new(20.0, 0.0, 0.0, 1.0), 50.0, 0);
        planner.buffer_line(AxisVector::new(20.0, 0.0, 0.0, 0.0), 20.0, 0);

        let blocks = planner.plan_snapshot();
        assert!((blocks[0].acceleration - 2000.0).abs() < 1.0);
        assert!((blocks[1].acceleration - 1000.0).abs() < 1.0);
        assert!((blocks[2].acceleration - 500.0).abs() < 1.0);
        assert!(blocks[2].is_reverse(Axis::E));
        assert_eq!(blocks[2].steps, [0, 0, 0, 100]);
    }

    #[test]
    fn test_z_acceleration_clamped() {
        let mut queue: BlockQueue<StdCriticalSection, 16> = BlockQueue::new(StdCriticalSection::new());
        let (producer, _consumer) = queue.split();
        let mut planner = Planner::new(producer, settings(), NoHooks);

        planner.buffer_line(AxisVector::new(0.0, 0.0, 2.0, 0.0), 5.0, 0);
        let block = planner.plan_snapshot()[0];
        assert_eq!(block.acceleration_steps_per_s2, 40_000);
        assert!((block.acceleration - 100.0).abs() < 1e-3);
    }

    #[test]
    fn test_flow_scales_e_steps() {
        let mut queue: BlockQueue<StdCriticalSection, 16> = BlockQueue::new(StdCriticalSection::new());
        let (producer, _consumer) = queue.split();
        let mut planner = Planner::new(producer, settings(), NoHooks);

        planner.set_flow_percentage(0, 150).unwrap();
        planner.buffer_line(AxisVector::new(10.0, 0.0, 0.0, 1.0), 50.0, 0);
        assert_eq!(planner.plan_snapshot()[0].steps[E], 150);

        assert!(matches!(
            planner.set_flow_percentage(0, 0),
            Err(Error::Motion(MotionError::InvalidFlowPercentage(0)))
        ));
        assert!(matches!(
            planner.set_flow_percentage(3, 100),
            Err(Error::Motion(MotionError::InvalidExtruder(3)))
        ));
        assert!(planner.set_volumetric_multiplier(1, -1.0).is_err());
    }

    #[test]
    fn test_set_position_writes_counters() {
        let mut queue: BlockQueue<StdCriticalSection, 16> = BlockQueue::new(StdCriticalSection::new());
        let (producer, _consumer) = queue.split();
        let mut planner = Planner::new(producer, settings(), NoHooks);

        planner.set_position_mm(AxisVector::new(10.0, 20.0, 1.0, 5.0));
        assert_eq!(planner.stepper_position(), [800, 1600, 400, 500]);

        planner.set_e_position_mm(0.0);
        assert_eq!(planner.stepper_position()[E], 0);
        assert_eq!(planner.position().e(), 0.0);
    }

    #[test]
    fn test_bed_mesh_offsets_z() {
        let mut queue: BlockQueue<StdCriticalSection, 16> = BlockQueue::new(StdCriticalSection::new());
        let (producer, _consumer) = queue.split();
        let mut planner = Planner::new(producer, settings(), NoHooks);

        let mesh = BedMesh::new((0.0, 0.0), (100.0, 100.0), 2, 2, &[0.1, 0.1, 0.1, 0.1]).unwrap();
        planner.set_bed_mesh(Some(mesh));
        planner.buffer_line(AxisVector::new(10.0, 0.0, 0.0, 0.0), 50.0, 0);

        let block = planner.plan_snapshot()[0];
        // 0.1 mm of Z at 400 steps/mm
        assert_eq!(block.steps[Z], 40);
        assert_eq!(planner.position().z(), 0.0);
    }
}
