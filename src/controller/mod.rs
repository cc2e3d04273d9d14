//! Motion coordination: the mode state machine.
//!
//! [`MotionController`] owns the spindle tracker, the machine axes and the
//! operation state. One periodic [`tick`](MotionController::tick) reads the
//! spindle, computes per-axis targets for the active mode and drives the step
//! engines. Everything the UI and supervisor collaborators touch goes through
//! validating setters and read-only queries.

mod geometry;
mod mode;
mod passes;
mod snapshot;

pub use mode::OperationMode;
pub use passes::PassPhase;
pub use snapshot::{AxisSnapshot, Snapshot};

use core::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::axis::Axis;
use crate::config::units::{Du, Steps, StepsPerSec};
use crate::config::SystemConfig;
use crate::error::{AxisError, ConfigError, Error, OperationError, Result};
use crate::hal::{AxisDriver, Clock, PulseCounter};
use crate::spindle::{Spindle, SpindleSample};

use passes::PassState;

/// Identifies one of the machine axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisId {
    /// Longitudinal axis.
    Z,
    /// Cross axis.
    X,
    /// Auxiliary axis.
    Aux,
}

/// Conditions recorded for the supervisory collaborator to act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// An axis refused a commanded target beyond its travel ceiling.
    TravelLimit(AxisId),
    /// The pitch sign flipped mid-operation.
    PitchSignFlip,
}

/// Bounded wait for command-context access to the operation state.
const COMMAND_LOCK_TIMEOUT: Duration = Duration::from_millis(10);

/// The motion coordinator.
///
/// Generic over the clock, the spindle pulse counter and the axis driver so
/// the whole core runs identically against real peripherals or the simulated
/// set in [`hal::sim`](crate::hal::sim).
pub struct MotionController<K, PC, D>
where
    K: Clock,
    PC: PulseCounter,
    D: AxisDriver,
{
    clock: K,
    spindle: Spindle<PC>,
    z: Axis<D>,
    x: Axis<D>,
    a1: Option<Axis<D>>,
    encoder_steps: i64,
    async_rpm: u32,
    max_pitch_du: i64,
    max_starts: u16,
    max_passes: u16,
    op: Mutex<OpState>,
}

struct OpState {
    mode: OperationMode,
    enabled: bool,
    pitch_du: i64,
    starts: u16,
    cone_ratio: f64,
    turn_passes: u16,
    aux_forward: bool,
    /// Operation (pass × start) counter.
    op_index: u32,
    /// Operator request to skip ahead to the next pass.
    advance_flag: bool,
    /// Pitch sign latched at enable; a flip aborts the operation.
    start_pitch_sign: i8,
    pass: PassState,
    /// Enable instant, the anchor for time-based feed.
    enabled_at_us: u64,
    last_fault: Option<Fault>,
}

impl<K, PC, D> MotionController<K, PC, D>
where
    K: Clock,
    PC: PulseCounter,
    D: AxisDriver,
{
    /// Create a controller from configuration and hardware capabilities.
    ///
    /// `a1_driver` must be provided exactly when the configuration declares
    /// an auxiliary axis.
    pub fn new(
        config: &SystemConfig,
        clock: K,
        counter: PC,
        z_driver: D,
        x_driver: D,
        a1_driver: Option<D>,
    ) -> Result<Self> {
        let spindle = Spindle::new(&config.encoder, counter);
        let z = Axis::new(&config.axes.z, z_driver)?;
        let x = Axis::new(&config.axes.x, x_driver)?;
        let a1 = match (&config.axes.a1, a1_driver) {
            (Some(cfg), Some(driver)) => Some(Axis::new(cfg, driver)?),
            _ => None,
        };

        info!(
            encoder_steps = config.encoder.steps_per_revolution,
            aux = a1.is_some(),
            "motion controller created"
        );

        Ok(Self {
            clock,
            spindle,
            z,
            x,
            a1,
            encoder_steps: config.encoder.steps_per_revolution,
            async_rpm: config.operation.async_rpm,
            max_pitch_du: config.operation.max_pitch_du,
            max_starts: config.operation.max_starts,
            max_passes: config.operation.max_passes,
            op: Mutex::new(OpState {
                mode: OperationMode::Normal,
                enabled: false,
                pitch_du: 0,
                starts: 1,
                cone_ratio: 0.0,
                turn_passes: 3,
                aux_forward: true,
                op_index: 0,
                advance_flag: false,
                start_pitch_sign: 1,
                pass: PassState::new(OperationMode::Normal),
                enabled_at_us: 0,
                last_fault: None,
            }),
        })
    }

    /// One coordinator tick: sample the spindle, retarget axes for the active
    /// mode, and execute at most one step pulse per axis.
    ///
    /// Must run at least as fast as the fastest configured step rate. If the
    /// operation state is momentarily held by a setter the whole tick is
    /// skipped; the next tick self-corrects.
    pub fn tick(&self) {
        let Some(mut op) = self.op.try_lock() else {
            return;
        };

        let now = self.clock.now_us();
        self.spindle.update(now);
        let sample = self.spindle.sample();

        // Synchronized guards: enabled, a pitch to follow, and no phase
        // correction pending. While the sync offset is nonzero all target
        // updates freeze; motion resumes seamlessly when it clears.
        if op.enabled && op.pitch_du != 0 && sample.sync_offset == 0 {
            match op.mode {
                OperationMode::Normal => self.tick_normal(&mut op, &sample),
                OperationMode::Async => self.tick_async(&mut op, now),
                OperationMode::Cone => self.tick_cone(&mut op, &sample),
                OperationMode::Turn
                | OperationMode::Face
                | OperationMode::Cut
                | OperationMode::Thread
                | OperationMode::Ellipse => self.tick_pass_mode(&mut op, &sample),
                // Targets arrive through gcode_move_to.
                OperationMode::GCode => {}
                OperationMode::Aux => self.tick_aux(&mut op, &sample),
            }
        }

        // Axes always update so in-flight motion completes even when the
        // system is disabled or frozen.
        self.z.update(now);
        self.x.update(now);
        if let Some(a1) = &self.a1 {
            a1.update(now);
        }
    }

    // ------------------------------------------------------------------
    // Mode handlers
    // ------------------------------------------------------------------

    /// Spindle-synchronized feed on the longitudinal axis.
    fn tick_normal(&self, op: &mut OpState, sample: &SpindleSample) {
        let target = geometry::spindle_to_axis_steps(
            sample.average_position,
            self.encoder_steps,
            op.pitch_du,
            op.starts,
            self.z.mechanics().steps_per_du,
        );
        let target = self.z.clamp_to_stops(Steps(target));
        if target != self.z.position_steps() {
            self.issue(op, &self.z, AxisId::Z, target, true);
        }
    }

    /// Time-based feed independent of the spindle.
    fn tick_async(&self, op: &mut OpState, now: u64) {
        let elapsed = now.saturating_sub(op.enabled_at_us);
        let virtual_pos =
            geometry::async_virtual_steps(elapsed, self.encoder_steps, self.async_rpm);
        let target = geometry::spindle_to_axis_steps(
            virtual_pos,
            self.encoder_steps,
            op.pitch_du,
            op.starts,
            self.z.mechanics().steps_per_du,
        );
        let target = self.z.clamp_to_stops(Steps(target));
        if target != self.z.position_steps() {
            self.issue(op, &self.z, AxisId::Z, target, true);
        }
    }

    /// Taper turning: Z tracks the spindle, X follows at the cone ratio.
    ///
    /// Both axes must be idle before each retarget, so tracking proceeds in
    /// decelerated chunks.
    fn tick_cone(&self, op: &mut OpState, sample: &SpindleSample) {
        if op.cone_ratio == 0.0 {
            return;
        }
        if !self.z.is_target_reached(0) || !self.x.is_target_reached(0) {
            return;
        }

        let z_target = geometry::spindle_to_axis_steps(
            sample.average_position,
            self.encoder_steps,
            op.pitch_du,
            op.starts,
            self.z.mechanics().steps_per_du,
        );
        let z_target = self.z.clamp_to_stops(Steps(z_target));

        let x_target = geometry::cone_companion_steps(
            z_target.0,
            self.z.mechanics().steps_per_du,
            self.x.mechanics().steps_per_du,
            op.cone_ratio,
            op.aux_forward,
        );
        let x_target = self.x.clamp_to_stops(Steps(x_target));

        if z_target != self.z.position_steps() {
            self.issue(op, &self.z, AxisId::Z, z_target, false);
        }
        if x_target != self.x.position_steps() {
            self.issue(op, &self.x, AxisId::X, x_target, false);
        }
    }

    /// Auxiliary axis coupled to the spindle.
    fn tick_aux(&self, op: &mut OpState, sample: &SpindleSample) {
        let Some(a1) = &self.a1 else {
            return;
        };
        let sign = if op.aux_forward { 1 } else { -1 };
        let target = sign
            * geometry::spindle_to_axis_steps(
                sample.average_position,
                self.encoder_steps,
                op.pitch_du,
                op.starts,
                a1.mechanics().steps_per_du,
            );
        let target = a1.clamp_to_stops(Steps(target));
        if target != a1.position_steps() {
            self.issue(op, a1, AxisId::Aux, target, true);
        }
    }

    /// Shared sequencer for Turn/Face/Cut/Thread/Ellipse.
    fn tick_pass_mode(&self, op: &mut OpState, sample: &SpindleSample) {
        let mode = op.mode;
        let total = passes::total_ops(mode, op.turn_passes, op.starts);

        let (trav, trav_id, infeed): (&Axis<D>, AxisId, Option<(&Axis<D>, AxisId)>) = match mode
        {
            OperationMode::Turn | OperationMode::Thread | OperationMode::Ellipse => {
                (&self.z, AxisId::Z, Some((&self.x, AxisId::X)))
            }
            OperationMode::Face => (&self.x, AxisId::X, Some((&self.z, AxisId::Z))),
            OperationMode::Cut => (&self.x, AxisId::X, None),
            _ => return,
        };

        // Stops may have been cleared mid-operation.
        if !trav.stops_set() || infeed.is_some_and(|(a, _)| !a.stops_set()) {
            warn!("soft limit cleared mid-operation, disabling");
            self.disable_locked(op);
            return;
        }

        // A pitch sign flip mid-operation would retrace the cut backward.
        if op.pitch_du.signum() as i8 * op.start_pitch_sign < 0 {
            warn!("pitch sign flipped mid-operation, disabling");
            op.last_fault = Some(Fault::PitchSignFlip);
            self.disable_locked(op);
            return;
        }

        if op.op_index >= total {
            info!(passes = total, "operation sequence complete");
            self.disable_locked(op);
            return;
        }

        let pass = passes::pass_of(mode, op.op_index, op.starts);
        let start_j = passes::start_of(mode, op.op_index, op.starts);

        // Traverse geometry: the feed direction follows the pitch sign.
        let t_left = trav.left_stop().map(|s| s.0).unwrap_or_default();
        let t_right = trav.right_stop().map(|s| s.0).unwrap_or_default();
        let forward = op.pitch_du > 0;
        let t_start = if forward { t_right } else { t_left };
        let t_far = if forward { t_left } else { t_right };

        // Parting deepens the traverse window itself each pass; the other
        // modes traverse the full span and deepen on the infeed axis.
        let pass_end = if mode == OperationMode::Cut {
            let depth = geometry::pass_depth(t_left - t_right, pass, op.turn_passes as u32);
            if forward {
                t_start + depth
            } else {
                t_start - depth
            }
        } else {
            t_far
        };

        // Infeed geometry: the aux direction selects external or internal
        // work, i.e. which stop the cut starts from.
        let (i_start, i_sign, depth) = match infeed {
            Some((a, _)) => {
                let left = a.left_stop().map(|s| s.0).unwrap_or_default();
                let right = a.right_stop().map(|s| s.0).unwrap_or_default();
                let span = left - right;
                let start = if op.aux_forward { left } else { right };
                let sign = if op.aux_forward { -1 } else { 1 };
                (start, sign, geometry::pass_depth(span, pass, op.turn_passes as u32))
            }
            None => (0, 0, 0),
        };
        let cut_target = match mode {
            // The elliptical infeed happens during the traverse.
            OperationMode::Ellipse => i_start,
            _ => i_start + i_sign * depth,
        };

        match op.pass.phase {
            PassPhase::CutIn => {
                if op.advance_flag {
                    op.advance_flag = false;
                    op.pass.phase = PassPhase::Retract;
                    return;
                }

                let trav_ready =
                    trav.is_target_reached(0) && trav.position_steps().0 == t_start;
                let infeed_ready = infeed.map_or(true, |(a, _)| {
                    a.is_target_reached(0) && a.position_steps().0 == cut_target
                });

                if trav_ready && infeed_ready {
                    op.pass.phase = PassPhase::Traverse;
                    debug!(
                        op_index = op.op_index,
                        pass, start_j, "pass cut-in complete, traversing"
                    );
                    return;
                }

                if !trav_ready && trav.is_target_reached(0) {
                    self.issue(op, trav, trav_id, Steps(t_start), false);
                }
                if let Some((a, id)) = infeed {
                    if a.is_target_reached(0) && a.position_steps().0 != cut_target {
                        self.issue(op, a, id, Steps(cut_target), false);
                    }
                }
            }

            PassPhase::Traverse => {
                if op.advance_flag {
                    op.advance_flag = false;
                    op.pass.phase = PassPhase::Retract;
                    return;
                }

                // Anchor to the next groove-phase crossing on first entry, so
                // every pass re-joins the same helix.
                let anchor = match op.pass.anchor {
                    Some(anchor) => anchor,
                    None => {
                        let offset = if mode == OperationMode::Thread {
                            geometry::start_phase_offset(self.encoder_steps, op.starts, start_j)
                        } else {
                            0
                        };
                        let anchor = geometry::traverse_anchor(
                            sample.average_position,
                            self.encoder_steps,
                            offset,
                        );
                        op.pass.anchor = Some(anchor);
                        anchor
                    }
                };
                let delta = sample.average_position - anchor;
                // The pass waits at the start until the spindle crosses the
                // groove phase.
                if delta < 0 {
                    return;
                }

                let advance = geometry::spindle_to_axis_steps(
                    delta,
                    self.encoder_steps,
                    op.pitch_du,
                    op.starts,
                    trav.mechanics().steps_per_du,
                );
                let mut target = t_start + advance;
                target = if forward {
                    target.min(pass_end)
                } else {
                    target.max(pass_end)
                };

                if target != trav.position_steps().0 {
                    self.issue(op, trav, trav_id, Steps(target), true);
                }

                if mode == OperationMode::Ellipse {
                    if let Some((a, id)) = infeed {
                        let span = (pass_end - t_start).abs();
                        let progress = if span == 0 {
                            1.0
                        } else {
                            (trav.position_steps().0 - t_start).abs() as f64 / span as f64
                        };
                        let x_target =
                            i_start + i_sign * geometry::ellipse_infeed(depth, progress);
                        if x_target != a.position_steps().0 {
                            self.issue(op, a, id, Steps(x_target), true);
                        }
                    }
                }

                if trav.position_steps().0 == pass_end {
                    op.pass.phase = PassPhase::Retract;
                    debug!(op_index = op.op_index, "traverse complete");
                }
            }

            PassPhase::Retract => {
                // Parting retracts along its own traverse axis; the other
                // modes withdraw the infeed axis first.
                let (axis, id, target) = match infeed {
                    Some((a, id)) => (a, id, i_start),
                    None => (trav, trav_id, t_start),
                };
                if axis.is_target_reached(0) && axis.position_steps().0 == target {
                    match passes::next_phase(mode, PassPhase::Retract) {
                        Some(phase) => op.pass.phase = phase,
                        None => self.complete_pass(op),
                    }
                } else if axis.is_target_reached(0) {
                    self.issue(op, axis, id, Steps(target), false);
                }
            }

            PassPhase::Return => {
                if trav.is_target_reached(0) && trav.position_steps().0 == t_start {
                    match passes::next_phase(mode, PassPhase::Return) {
                        Some(phase) => op.pass.phase = phase,
                        None => self.complete_pass(op),
                    }
                } else if trav.is_target_reached(0) {
                    self.issue(op, trav, trav_id, Steps(t_start), false);
                }
            }
        }
    }

    fn complete_pass(&self, op: &mut OpState) {
        op.op_index += 1;
        op.pass = PassState::new(op.mode);
        debug!(op_index = op.op_index, "pass complete");
    }

    /// Issue a target to an axis, recording faults for the supervisor.
    ///
    /// A busy axis is simply retried next tick; a travel-limit refusal is
    /// surfaced through [`MotionController::last_fault`].
    fn issue(&self, op: &mut OpState, axis: &Axis<D>, id: AxisId, target: Steps, continuous: bool) {
        match axis.move_to(target, continuous) {
            Ok(()) => {}
            Err(Error::Axis(AxisError::Busy)) => {}
            Err(Error::Axis(AxisError::TravelLimitExceeded { travel, max })) => {
                warn!(?id, travel, max, "axis refused target beyond travel ceiling");
                op.last_fault = Some(Fault::TravelLimit(id));
            }
            Err(_) => {}
        }
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Enable or disable the system.
    ///
    /// Enabling re-homes the spindle and every active axis first, so motion
    /// starts from the current physical position. Multi-pass modes require
    /// both soft limits on every axis they drive; a missing one refuses the
    /// enable and the system stays disabled. Disabling stops new targets
    /// immediately; axes coast to a stop through normal deceleration.
    pub fn set_enabled(&self, enable: bool) -> Result<()> {
        let mut op = self
            .op
            .try_lock_for(COMMAND_LOCK_TIMEOUT)
            .ok_or(Error::Axis(AxisError::Busy))?;

        if op.enabled == enable {
            return Ok(());
        }

        if !enable {
            self.disable_locked(&mut op);
            info!("system disabled");
            return Ok(());
        }

        if op.mode.is_multi_pass() {
            for id in Self::required_axes(op.mode) {
                let Some(axis) = self.axis(*id) else {
                    continue;
                };
                if !axis.stops_set() {
                    warn!(axis = axis.name(), "enable refused: soft limit missing");
                    return Err(Error::Operation(OperationError::MissingLimits {
                        axis: heapless::String::try_from(axis.name()).unwrap_or_default(),
                    }));
                }
            }
        }

        self.z.set_enabled(true);
        self.x.set_enabled(true);
        if let Some(a1) = &self.a1 {
            a1.set_enabled(true);
        }

        if let Err(e) = self.set_new_origin() {
            // Roll the enables back; the system stays disabled.
            self.z.set_enabled(false);
            self.x.set_enabled(false);
            if let Some(a1) = &self.a1 {
                a1.set_enabled(false);
            }
            return Err(e);
        }

        op.enabled = true;
        op.start_pitch_sign = if op.pitch_du >= 0 { 1 } else { -1 };
        op.op_index = 0;
        op.advance_flag = false;
        op.pass = PassState::new(op.mode);
        op.enabled_at_us = self.clock.now_us();
        op.last_fault = None;

        info!(
            mode = ?op.mode,
            pitch = op.pitch_du,
            starts = op.starts,
            "system enabled"
        );
        Ok(())
    }

    /// Supervisor path: disable and force every axis driver off immediately.
    pub fn emergency_stop(&self) {
        {
            let mut op = self.op.lock();
            op.enabled = false;
            op.op_index = 0;
        }
        self.z.force_disable();
        self.x.force_disable();
        if let Some(a1) = &self.a1 {
            a1.force_disable();
        }
        warn!("emergency stop");
    }

    fn disable_locked(&self, op: &mut OpState) {
        op.enabled = false;
        op.op_index = 0;
        self.z.set_enabled(false);
        self.x.set_enabled(false);
        if let Some(a1) = &self.a1 {
            a1.set_enabled(false);
        }
    }

    /// Zero the spindle and every axis at the current physical position.
    fn set_new_origin(&self) -> Result<()> {
        self.z.set_origin()?;
        self.x.set_origin()?;
        if let Some(a1) = &self.a1 {
            a1.set_origin()?;
        }
        self.spindle.reset_position();
        debug!("new synchronization origin");
        Ok(())
    }

    fn required_axes(mode: OperationMode) -> &'static [AxisId] {
        match mode {
            OperationMode::Cut => &[AxisId::X],
            OperationMode::Turn
            | OperationMode::Face
            | OperationMode::Thread
            | OperationMode::Ellipse => &[AxisId::Z, AxisId::X],
            _ => &[],
        }
    }

    // ------------------------------------------------------------------
    // Operator setters
    // ------------------------------------------------------------------

    /// Select the operating mode. Forces a disable first; a mode switch never
    /// happens while engaged.
    pub fn set_operation_mode(&self, mode: OperationMode) -> Result<()> {
        let mut op = self
            .op
            .try_lock_for(COMMAND_LOCK_TIMEOUT)
            .ok_or(Error::Axis(AxisError::Busy))?;

        if op.mode == mode {
            return Ok(());
        }
        if mode == OperationMode::Aux && self.a1.is_none() {
            return Err(Error::Config(ConfigError::AuxAxisMissing));
        }

        if op.enabled {
            self.disable_locked(&mut op);
        }
        op.mode = mode;
        op.op_index = 0;
        op.pass = PassState::new(mode);
        info!(?mode, "operation mode set");
        Ok(())
    }

    /// Set the pitch in deci-microns per spindle revolution.
    ///
    /// Re-homes the synchronization origin so the axes do not jump to the new
    /// formula's position.
    pub fn set_pitch(&self, pitch: Du) -> Result<()> {
        if pitch.0 < -self.max_pitch_du || pitch.0 > self.max_pitch_du {
            return Err(Error::Config(ConfigError::PitchOutOfRange {
                pitch: pitch.0,
                max: self.max_pitch_du,
            }));
        }

        let mut op = self
            .op
            .try_lock_for(COMMAND_LOCK_TIMEOUT)
            .ok_or(Error::Axis(AxisError::Busy))?;
        op.pitch_du = pitch.0;
        // Re-home while still holding the operation state so no tick can mix
        // the new pitch with the old origin.
        self.set_new_origin()?;
        info!(pitch = pitch.0, "pitch set");
        Ok(())
    }

    /// Set the number of thread starts.
    pub fn set_starts(&self, starts: u16) -> Result<()> {
        if starts < 1 || starts > self.max_starts {
            return Err(Error::Config(ConfigError::StartsOutOfRange {
                starts,
                max: self.max_starts,
            }));
        }

        let mut op = self
            .op
            .try_lock_for(COMMAND_LOCK_TIMEOUT)
            .ok_or(Error::Axis(AxisError::Busy))?;
        op.starts = starts;
        self.set_new_origin()?;
        info!(starts, "starts set");
        Ok(())
    }

    /// Set the cone ratio (diameter change per unit of longitudinal travel).
    pub fn set_cone_ratio(&self, ratio: f64) -> Result<()> {
        let mut op = self
            .op
            .try_lock_for(COMMAND_LOCK_TIMEOUT)
            .ok_or(Error::Axis(AxisError::Busy))?;
        op.cone_ratio = ratio;
        info!(ratio, "cone ratio set");
        Ok(())
    }

    /// Set the number of passes for multi-pass modes.
    pub fn set_turn_passes(&self, passes: u16) -> Result<()> {
        if passes < 1 || passes > self.max_passes {
            return Err(Error::Config(ConfigError::PassesOutOfRange {
                passes,
                max: self.max_passes,
            }));
        }

        let mut op = self
            .op
            .try_lock_for(COMMAND_LOCK_TIMEOUT)
            .ok_or(Error::Axis(AxisError::Busy))?;
        op.turn_passes = passes;
        info!(passes, "turn passes set");
        Ok(())
    }

    /// Set the auxiliary direction (external or internal work).
    pub fn set_aux_direction(&self, forward: bool) -> Result<()> {
        let mut op = self
            .op
            .try_lock_for(COMMAND_LOCK_TIMEOUT)
            .ok_or(Error::Axis(AxisError::Busy))?;
        op.aux_forward = forward;
        info!(forward, "aux direction set");
        Ok(())
    }

    /// Request an early advance to the next pass of a multi-pass operation.
    pub fn advance_operation(&self) -> Result<()> {
        let mut op = self
            .op
            .try_lock_for(COMMAND_LOCK_TIMEOUT)
            .ok_or(Error::Axis(AxisError::Busy))?;
        op.advance_flag = true;
        debug!("operation advance requested");
        Ok(())
    }

    /// Supply one discrete G-code target.
    ///
    /// The G-code interpreter is an external policy; it feeds positions
    /// through the same axis contract every other mode uses. An optional feed
    /// rate applies through the axis speed governor.
    pub fn gcode_move_to(
        &self,
        axis: AxisId,
        target: Du,
        feed: Option<StepsPerSec>,
    ) -> Result<()> {
        let op = self
            .op
            .try_lock_for(COMMAND_LOCK_TIMEOUT)
            .ok_or(Error::Axis(AxisError::Busy))?;
        if op.mode != OperationMode::GCode {
            return Err(Error::Operation(OperationError::WrongMode));
        }
        if !op.enabled {
            return Err(Error::Operation(OperationError::NotEnabled));
        }
        drop(op);

        let ax = self
            .axis(axis)
            .ok_or(Error::Config(ConfigError::AuxAxisMissing))?;
        if let Some(feed) = feed {
            ax.set_max_speed(feed.0);
        }
        let steps = ax.mechanics().du_to_steps(target);
        ax.move_to(steps, false)
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    /// Capture the persistable operator state.
    pub fn snapshot(&self) -> Snapshot {
        let op = self.op.lock();
        let mut axes = Vec::new();
        for (_, axis) in self.axes() {
            axes.push(AxisSnapshot {
                name: heapless::String::try_from(axis.name()).unwrap_or_default(),
                origin: axis.origin_position(),
                left_stop: axis.left_stop(),
                right_stop: axis.right_stop(),
            });
        }
        Snapshot {
            mode: op.mode,
            pitch_du: op.pitch_du,
            starts: op.starts,
            cone_ratio: op.cone_ratio,
            turn_passes: op.turn_passes,
            aux_forward: op.aux_forward,
            axes,
        }
    }

    /// Restore a previously captured snapshot. The system is disabled first;
    /// all values pass the same validation as the live setters.
    pub fn restore(&self, snapshot: &Snapshot) -> Result<()> {
        if snapshot.pitch_du < -self.max_pitch_du || snapshot.pitch_du > self.max_pitch_du {
            return Err(Error::Config(ConfigError::PitchOutOfRange {
                pitch: snapshot.pitch_du,
                max: self.max_pitch_du,
            }));
        }
        if snapshot.starts < 1 || snapshot.starts > self.max_starts {
            return Err(Error::Config(ConfigError::StartsOutOfRange {
                starts: snapshot.starts,
                max: self.max_starts,
            }));
        }
        if snapshot.turn_passes < 1 || snapshot.turn_passes > self.max_passes {
            return Err(Error::Config(ConfigError::PassesOutOfRange {
                passes: snapshot.turn_passes,
                max: self.max_passes,
            }));
        }
        if snapshot.mode == OperationMode::Aux && self.a1.is_none() {
            return Err(Error::Config(ConfigError::AuxAxisMissing));
        }

        let mut op = self
            .op
            .try_lock_for(COMMAND_LOCK_TIMEOUT)
            .ok_or(Error::Axis(AxisError::Busy))?;
        if op.enabled {
            self.disable_locked(&mut op);
        }
        op.mode = snapshot.mode;
        op.pitch_du = snapshot.pitch_du;
        op.starts = snapshot.starts;
        op.cone_ratio = snapshot.cone_ratio;
        op.turn_passes = snapshot.turn_passes;
        op.aux_forward = snapshot.aux_forward;
        op.pass = PassState::new(snapshot.mode);
        drop(op);

        for saved in &snapshot.axes {
            if let Some(axis) = self
                .axes()
                .into_iter()
                .map(|(_, a)| a)
                .find(|a| a.name() == saved.name.as_str())
            {
                axis.restore(saved.origin, saved.left_stop, saved.right_stop)?;
            }
        }

        info!("snapshot restored");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Current operating mode.
    pub fn mode(&self) -> OperationMode {
        self.op.lock().mode
    }

    /// Whether the system is enabled.
    pub fn is_enabled(&self) -> bool {
        self.op.lock().enabled
    }

    /// Pitch in deci-microns per revolution.
    pub fn pitch(&self) -> Du {
        Du(self.op.lock().pitch_du)
    }

    /// Number of thread starts.
    pub fn starts(&self) -> u16 {
        self.op.lock().starts
    }

    /// Cone ratio.
    pub fn cone_ratio(&self) -> f64 {
        self.op.lock().cone_ratio
    }

    /// Passes for multi-pass modes.
    pub fn turn_passes(&self) -> u16 {
        self.op.lock().turn_passes
    }

    /// Auxiliary direction.
    pub fn aux_direction(&self) -> bool {
        self.op.lock().aux_forward
    }

    /// Current operation (pass × start) index.
    pub fn operation_index(&self) -> u32 {
        self.op.lock().op_index
    }

    /// Current sub-phase of a multi-pass operation.
    pub fn operation_phase(&self) -> PassPhase {
        self.op.lock().pass.phase
    }

    /// Latest recorded fault, if any.
    pub fn last_fault(&self) -> Option<Fault> {
        self.op.lock().last_fault
    }

    /// The spindle tracker (read-only use by collaborators).
    pub fn spindle(&self) -> &Spindle<PC> {
        &self.spindle
    }

    /// The longitudinal axis.
    pub fn z(&self) -> &Axis<D> {
        &self.z
    }

    /// The cross axis.
    pub fn x(&self) -> &Axis<D> {
        &self.x
    }

    /// The auxiliary axis, if configured.
    pub fn aux(&self) -> Option<&Axis<D>> {
        self.a1.as_ref()
    }

    /// Look up an axis by identifier.
    pub fn axis(&self, id: AxisId) -> Option<&Axis<D>> {
        match id {
            AxisId::Z => Some(&self.z),
            AxisId::X => Some(&self.x),
            AxisId::Aux => self.a1.as_ref(),
        }
    }

    fn axes(&self) -> Vec<(AxisId, &Axis<D>)> {
        let mut axes = vec![(AxisId::Z, &self.z), (AxisId::X, &self.x)];
        if let Some(a1) = &self.a1 {
            axes.push((AxisId::Aux, a1));
        }
        axes
    }
}
