//! Axis engine: acceleration-limited step generation.

use core::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::config::units::{Du, Steps};
use crate::config::{AxisConfig, AxisMechanics};
use crate::error::{AxisError, Error, Result};
use crate::hal::AxisDriver;

use super::position::PositionTracker;
use super::stops::Stops;

/// Direction of axis motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Positive step direction.
    Forward,
    /// Negative step direction.
    Backward,
}

impl Direction {
    /// Direction implied by a signed pending step count.
    #[inline]
    pub fn from_pending(pending: i64) -> Self {
        if pending > 0 {
            Direction::Forward
        } else {
            Direction::Backward
        }
    }

    /// Sign multiplier.
    #[inline]
    pub fn sign(self) -> i64 {
        match self {
            Direction::Forward => 1,
            Direction::Backward => -1,
        }
    }

    /// Whether this is the forward direction.
    #[inline]
    pub fn is_forward(self) -> bool {
        matches!(self, Direction::Forward)
    }
}

/// Bounded wait for command-context access to the axis state.
const COMMAND_LOCK_TIMEOUT: Duration = Duration::from_millis(10);

/// Margin subtracted from the inter-step gap so scheduling jitter does not
/// systematically lose cadence.
const STEP_GAP_SLACK_US: f32 = 5.0;

/// A step within this window still counts as "moving".
const RECENT_STEP_US: u64 = 50_000;

/// Settling time after the driver enable asserts before the first pulse.
const ENABLE_SETTLE_US: u64 = 5_000;

/// One machine axis: a stepper motor behind an [`AxisDriver`].
///
/// All mutation goes through a single per-axis lock. Command-context
/// operations (`move_to`, `set_origin`, stop setters) wait a bounded time and
/// fail with [`AxisError::Busy`] instead of blocking; the tick-context
/// [`Axis::update`] never waits at all: a contended tick skips one pulse and
/// self-corrects on the next.
pub struct Axis<D: AxisDriver> {
    name: heapless::String<8>,
    needs_rest: bool,
    rotational: bool,
    mech: AxisMechanics,
    inner: Mutex<AxisInner<D>>,
}

struct AxisInner<D> {
    driver: D,
    tracker: PositionTracker,
    stops: Stops,
    /// Signed steps remaining toward the commanded target.
    pending: i64,
    /// Current step rate in steps/sec.
    speed: f32,
    /// Active speed ceiling in steps/sec.
    speed_max: f32,
    direction: Direction,
    direction_initialized: bool,
    /// Time of the last emitted pulse.
    step_start_us: u64,
    /// Driver enable reference count.
    enable_count: u32,
    /// Set on the 0→1 enable transition; `update` arms the settle deadline.
    settle_pending: bool,
    /// No pulse before this instant.
    settle_until_us: u64,
    /// Whether the current target is continuously re-issued.
    continuous: bool,
}

impl<D: AxisDriver> Axis<D> {
    /// Create an axis from configuration and a driver.
    ///
    /// Axes that do not rest assert their driver immediately.
    pub fn new(config: &AxisConfig, mut driver: D) -> Result<Self> {
        let mech = AxisMechanics::from_config(config);

        if !config.needs_rest {
            driver.set_enabled(true)?;
        }

        debug!(
            axis = config.name.as_str(),
            backlash = mech.backlash_steps,
            estop = mech.estop_steps,
            decelerate = mech.decelerate_steps,
            "axis created"
        );

        Ok(Self {
            name: config.name.clone(),
            needs_rest: config.needs_rest,
            rotational: config.rotational,
            inner: Mutex::new(AxisInner {
                driver,
                tracker: PositionTracker::new(mech.backlash_steps),
                stops: Stops::new(),
                pending: 0,
                speed: mech.speed_start,
                speed_max: mech.speed_manual_move,
                direction: Direction::Forward,
                direction_initialized: false,
                step_start_us: 0,
                enable_count: 0,
                settle_pending: false,
                settle_until_us: 0,
                continuous: false,
            }),
            mech,
        })
    }

    /// Command a move to an absolute target position in steps.
    ///
    /// Continuous targets are meant to be re-issued every tick and never
    /// decelerate to a stop on their own; positional targets brake into the
    /// target using the precomputed deceleration lookahead.
    ///
    /// # Errors
    ///
    /// [`AxisError::Busy`] if the axis lock cannot be acquired within the
    /// bounded wait (state unchanged), [`AxisError::TravelLimitExceeded`] if
    /// the commanded travel exceeds the mechanical ceiling (refused, not
    /// clamped).
    pub fn move_to(&self, target: Steps, continuous: bool) -> Result<()> {
        let mut inner = self
            .inner
            .try_lock_for(COMMAND_LOCK_TIMEOUT)
            .ok_or(Error::Axis(AxisError::Busy))?;

        let pos = inner.tracker.tool_position();
        if target.0 == pos {
            inner.continuous = continuous;
            inner.pending = 0;
            return Ok(());
        }

        let travel = (target.0 - pos).abs();
        if travel > self.mech.estop_steps {
            warn!(
                axis = self.name.as_str(),
                travel,
                max = self.mech.estop_steps,
                "travel ceiling exceeded, move refused"
            );
            return Err(Error::Axis(AxisError::TravelLimitExceeded {
                travel,
                max: self.mech.estop_steps,
            }));
        }

        // Front-load backlash on the side about to take up slack: a backward
        // target owes the full backlash before the tool moves.
        let backlash = if target.0 < pos {
            self.mech.backlash_steps
        } else {
            0
        };
        inner.continuous = continuous;
        inner.pending = target.0 - inner.tracker.motor_position() - backlash;
        Ok(())
    }

    /// Execute at most one step pulse.
    ///
    /// Must be invoked at least as often as the fastest configured step rate;
    /// a missed invocation is a lost step. Contention never stalls this path:
    /// if the lock is held the tick is skipped and the pulse lands one tick
    /// late.
    pub fn update(&self, now_us: u64) {
        let Some(mut inner) = self.inner.try_lock() else {
            return;
        };

        if inner.pending == 0 {
            // Idle ramp-down toward the start speed.
            if inner.speed > self.mech.speed_start {
                inner.speed = (inner.speed - 1.0).max(self.mech.speed_start);
            }
            return;
        }

        if inner.settle_pending {
            inner.settle_until_us = now_us + ENABLE_SETTLE_US;
            inner.settle_pending = false;
            return;
        }
        if now_us < inner.settle_until_us {
            return;
        }

        let delay_us = 1_000_000.0 / inner.speed;
        if (now_us.saturating_sub(inner.step_start_us) as f32) < delay_us - STEP_GAP_SLACK_US {
            return;
        }

        let direction = Direction::from_pending(inner.pending);
        if !inner.direction_initialized || inner.direction != direction {
            // A stepper must never reverse at speed.
            inner.speed = self.mech.speed_start;
            inner.direction = direction;
            inner.direction_initialized = true;
            if inner.driver.set_direction(direction.is_forward()).is_err() {
                warn!(axis = self.name.as_str(), "direction pin write failed");
                return;
            }
        }

        if inner.driver.step().is_err() {
            warn!(axis = self.name.as_str(), "step pulse failed");
            return;
        }

        inner.pending -= direction.sign();
        inner.tracker.apply_step(direction.is_forward());

        // Accelerate while continuous or still outside the braking window,
        // decelerate inside it; always within [start, max].
        let accelerate = inner.continuous || inner.pending.abs() >= self.mech.decelerate_steps;
        let sign = if accelerate { 1.0 } else { -1.0 };
        inner.speed += sign * self.mech.acceleration * delay_us / 1_000_000.0;
        inner.speed = inner.speed.clamp(self.mech.speed_start, inner.speed_max);

        inner.step_start_us = now_us;
    }

    /// Assert or release the driver enable line.
    ///
    /// Reference-counted so independent callers can hold the driver enabled;
    /// the line de-asserts only when the count returns to zero. Axes that do
    /// not rest ignore this entirely. The first enable in a sequence arms a
    /// settle delay before any step may be issued.
    pub fn set_enabled(&self, enable: bool) {
        if !self.needs_rest {
            return;
        }

        let mut inner = self.inner.lock();
        if enable {
            inner.enable_count += 1;
            if inner.enable_count == 1 {
                if inner.driver.set_enabled(true).is_err() {
                    warn!(axis = self.name.as_str(), "enable pin write failed");
                }
                inner.settle_pending = true;
            }
        } else if inner.enable_count > 0 {
            inner.enable_count -= 1;
            if inner.enable_count == 0 && inner.driver.set_enabled(false).is_err() {
                warn!(axis = self.name.as_str(), "enable pin write failed");
            }
        }
        debug!(
            axis = self.name.as_str(),
            enable,
            count = inner.enable_count,
            "axis enable"
        );
    }

    /// Supervisor path: zero the enable count, de-assert the driver and drop
    /// any pending motion immediately.
    pub fn force_disable(&self) {
        let mut inner = self.inner.lock();
        inner.enable_count = 0;
        inner.pending = 0;
        if self.needs_rest && inner.driver.set_enabled(false).is_err() {
            warn!(axis = self.name.as_str(), "enable pin write failed");
        }
        info!(axis = self.name.as_str(), "axis force-disabled");
    }

    /// Shift the coordinate system so the current tool position becomes zero.
    ///
    /// Soft limits shift by the same amount so they stay at the same physical
    /// place. Atomic with respect to step execution.
    ///
    /// # Errors
    ///
    /// [`AxisError::Busy`] if the axis lock cannot be acquired in time.
    pub fn set_origin(&self) -> Result<()> {
        let mut inner = self
            .inner
            .try_lock_for(COMMAND_LOCK_TIMEOUT)
            .ok_or(Error::Axis(AxisError::Busy))?;

        let shift = inner.tracker.set_origin();
        inner.stops.shift(-shift);
        inner.pending = 0;
        info!(axis = self.name.as_str(), shift, "origin set");
        Ok(())
    }

    /// Re-base the absolute origin offset on the current position without
    /// shifting the coordinate system.
    pub fn reset_origin(&self) {
        self.inner.lock().tracker.reset_origin();
        info!(axis = self.name.as_str(), "absolute origin reset");
    }

    /// Restore a persisted origin offset and stops.
    pub(crate) fn restore(
        &self,
        origin: Steps,
        left: Option<Steps>,
        right: Option<Steps>,
    ) -> Result<()> {
        let mut inner = self
            .inner
            .try_lock_for(COMMAND_LOCK_TIMEOUT)
            .ok_or(Error::Axis(AxisError::Busy))?;
        inner.tracker.restore_origin(origin);
        let mut stops = Stops::new();
        stops.set_left(left)?;
        stops.set_right(right)?;
        inner.stops = stops;
        Ok(())
    }

    /// Set or clear the left (upper) soft limit.
    pub fn set_left_stop(&self, stop: Option<Steps>) -> Result<()> {
        let mut inner = self
            .inner
            .try_lock_for(COMMAND_LOCK_TIMEOUT)
            .ok_or(Error::Axis(AxisError::Busy))?;
        inner.stops.set_left(stop)?;
        info!(axis = self.name.as_str(), ?stop, "left stop");
        Ok(())
    }

    /// Set or clear the right (lower) soft limit.
    pub fn set_right_stop(&self, stop: Option<Steps>) -> Result<()> {
        let mut inner = self
            .inner
            .try_lock_for(COMMAND_LOCK_TIMEOUT)
            .ok_or(Error::Axis(AxisError::Busy))?;
        inner.stops.set_right(stop)?;
        info!(axis = self.name.as_str(), ?stop, "right stop");
        Ok(())
    }

    /// Left (upper) soft limit.
    pub fn left_stop(&self) -> Option<Steps> {
        self.inner.lock().stops.left()
    }

    /// Right (lower) soft limit.
    pub fn right_stop(&self) -> Option<Steps> {
        self.inner.lock().stops.right()
    }

    /// Whether both soft limits are set.
    pub fn stops_set(&self) -> bool {
        self.inner.lock().stops.both_set()
    }

    /// Clamp a target into the current soft limits.
    pub fn clamp_to_stops(&self, target: Steps) -> Steps {
        Steps(self.inner.lock().stops.clamp(target.0))
    }

    /// Tool position in steps, relative to the origin.
    pub fn position_steps(&self) -> Steps {
        Steps(self.inner.lock().tracker.tool_position())
    }

    /// Tool position in deci-microns.
    pub fn position_du(&self) -> Du {
        self.mech.steps_to_du(self.position_steps())
    }

    /// Physical motor position in steps.
    pub fn motor_position(&self) -> Steps {
        Steps(self.inner.lock().tracker.motor_position())
    }

    /// Motor position never reset by origin changes.
    pub fn global_position(&self) -> Steps {
        Steps(self.inner.lock().tracker.global_position())
    }

    /// Accumulated origin offset in steps.
    pub fn origin_position(&self) -> Steps {
        Steps(self.inner.lock().tracker.origin_position())
    }

    /// Whether the axis has pending steps or stepped very recently.
    pub fn is_moving(&self, now_us: u64) -> bool {
        let inner = self.inner.lock();
        inner.pending != 0
            || (inner.step_start_us != 0
                && now_us.saturating_sub(inner.step_start_us) < RECENT_STEP_US)
    }

    /// Whether the commanded target has been reached within `tolerance`.
    pub fn is_target_reached(&self, tolerance: i64) -> bool {
        self.inner.lock().pending.abs() <= tolerance
    }

    /// Current step rate in steps/sec.
    pub fn speed_sps(&self) -> f32 {
        self.inner.lock().speed
    }

    /// Set the active speed ceiling in steps/sec.
    ///
    /// The ceiling never drops below the start speed.
    pub fn set_max_speed(&self, max: f32) {
        self.inner.lock().speed_max = max.max(self.mech.speed_start);
    }

    /// Restore the default (manual-move) speed ceiling.
    pub fn reset_max_speed(&self) {
        self.inner.lock().speed_max = self.mech.speed_manual_move;
    }

    /// Axis name.
    #[inline]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Whether this is a rotational axis.
    #[inline]
    pub fn is_rotational(&self) -> bool {
        self.rotational
    }

    /// Derived mechanics for this axis.
    #[inline]
    pub fn mechanics(&self) -> &AxisMechanics {
        &self.mech
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::units::{StepsPerSec, StepsPerSecSq};
    use crate::hal::sim::SimDriver;

    fn make_config(backlash_du: i64, needs_rest: bool) -> AxisConfig {
        AxisConfig {
            name: heapless::String::try_from("z").unwrap(),
            motor_steps: 200.0,
            screw_pitch_du: 500.0,
            speed_start: StepsPerSec(1000.0),
            speed_manual_move: StepsPerSec(10000.0),
            acceleration: StepsPerSecSq(100_000.0),
            invert_direction: false,
            needs_rest,
            max_travel_mm: 10,
            backlash_du,
            rotational: false,
        }
    }

    fn make_axis(backlash_du: i64) -> (Axis<SimDriver>, SimDriver) {
        let driver = SimDriver::new();
        let axis = Axis::new(&make_config(backlash_du, false), driver.clone()).unwrap();
        (axis, driver)
    }

    /// Drive the axis until pending is exhausted, stepping time forward.
    fn run_to_completion(axis: &Axis<SimDriver>, start_us: u64) -> u64 {
        let mut now = start_us;
        for _ in 0..2_000_000 {
            if axis.is_target_reached(0) {
                return now;
            }
            axis.update(now);
            now += 20;
        }
        panic!("axis did not reach target");
    }

    #[test]
    fn test_discrete_move_completes() {
        let (axis, driver) = make_axis(0);
        axis.move_to(Steps(100), false).unwrap();
        run_to_completion(&axis, 1000);
        assert_eq!(axis.position_steps(), Steps(100));
        assert_eq!(driver.net_steps(), 100);
    }

    #[test]
    fn test_travel_ceiling_refused() {
        let (axis, _driver) = make_axis(0);
        // 10 mm ceiling = 40_000 steps at 0.4 steps/du
        let result = axis.move_to(Steps(40_001), false);
        assert!(matches!(
            result,
            Err(Error::Axis(AxisError::TravelLimitExceeded { .. }))
        ));
        // Refused move left no pending motion
        assert!(axis.is_target_reached(0));
        axis.update(2000);
        assert_eq!(axis.position_steps(), Steps(0));
    }

    #[test]
    fn test_busy_when_lock_held() {
        let (axis, _driver) = make_axis(0);
        let _guard = axis.inner.lock();
        let result = axis.move_to(Steps(10), false);
        assert_eq!(result, Err(Error::Axis(AxisError::Busy)));
    }

    #[test]
    fn test_update_skips_when_contended() {
        let (axis, driver) = make_axis(0);
        axis.move_to(Steps(10), false).unwrap();
        {
            let _guard = axis.inner.lock();
            axis.update(10_000_000);
        }
        assert_eq!(driver.net_steps(), 0);
        // Next tick proceeds normally.
        axis.update(10_000_010);
        assert_eq!(driver.net_steps(), 1);
    }

    #[test]
    fn test_backlash_front_loaded_on_reversal() {
        let backlash_du = 50; // 20 steps at 0.4 steps/du
        let (axis, driver) = make_axis(backlash_du);

        axis.move_to(Steps(100), false).unwrap();
        let now = run_to_completion(&axis, 1000);
        assert_eq!(driver.net_steps(), 100);

        axis.move_to(Steps(90), false).unwrap();
        run_to_completion(&axis, now);
        // 10 tool steps back plus 20 steps of slack take-up
        assert_eq!(axis.position_steps(), Steps(90));
        assert_eq!(driver.steps_backward(), 30);
    }

    #[test]
    fn test_tool_position_holds_during_takeup() {
        let backlash_du = 50; // 20 steps
        let (axis, _driver) = make_axis(backlash_du);

        axis.move_to(Steps(100), false).unwrap();
        let mut now = run_to_completion(&axis, 1000);

        axis.move_to(Steps(0), false).unwrap();
        // Step one pulse at a time; for the first 20 pulses the tool holds.
        let mut emitted = 0;
        while emitted < 20 {
            let before = axis.motor_position();
            axis.update(now);
            now += 20;
            if axis.motor_position() != before {
                emitted += 1;
                assert_eq!(axis.position_steps(), Steps(100));
            }
        }
        // The 21st pulse moves the tool.
        loop {
            let before = axis.motor_position();
            axis.update(now);
            now += 20;
            if axis.motor_position() != before {
                break;
            }
        }
        assert_eq!(axis.position_steps(), Steps(99));
    }

    #[test]
    fn test_acceleration_shape() {
        let (axis, _driver) = make_axis(0);
        let decel = axis.mechanics().decelerate_steps;
        axis.move_to(Steps(2000), false).unwrap();

        let mut now = 1000u64;
        let mut last_speed = axis.speed_sps();
        let mut last_pending = 2000i64;
        for _ in 0..4_000_000 {
            if axis.is_target_reached(0) {
                break;
            }
            axis.update(now);
            now += 10;

            let speed = axis.speed_sps();
            let pending = 2000 - axis.position_steps().0;
            if pending != last_pending {
                let floor = axis.mechanics().speed_start;
                let ceiling = axis.mechanics().speed_manual_move;
                assert!(speed >= floor - 0.01 && speed <= ceiling + 0.01);
                if pending > decel && speed < ceiling {
                    // Outside the braking window the speed never drops.
                    assert!(speed >= last_speed - 0.01);
                } else if pending < decel {
                    // Inside it the speed never rises.
                    assert!(speed <= last_speed + 0.01);
                }
                last_speed = speed;
                last_pending = pending;
            }
        }
        assert_eq!(axis.position_steps(), Steps(2000));
    }

    #[test]
    fn test_reversal_resets_speed_to_start() {
        let (axis, _driver) = make_axis(0);
        axis.move_to(Steps(500), true).unwrap();
        let mut now = 1000u64;
        while !axis.is_target_reached(0) {
            axis.update(now);
            now += 20;
        }
        assert!(axis.speed_sps() > axis.mechanics().speed_start);

        // Reverse: the very first pulse must go out at the start speed.
        axis.move_to(Steps(400), true).unwrap();
        let before = axis.motor_position();
        while axis.motor_position() == before {
            axis.update(now);
            now += 20;
        }
        let expected = axis.mechanics().speed_start
            + axis.mechanics().acceleration / axis.mechanics().speed_start;
        assert!(axis.speed_sps() <= expected + 0.01);
    }

    #[test]
    fn test_idle_speed_decay() {
        let (axis, _driver) = make_axis(0);
        axis.move_to(Steps(500), true).unwrap();
        let mut now = 1000u64;
        while !axis.is_target_reached(0) {
            axis.update(now);
            now += 20;
        }
        let peak = axis.speed_sps();
        assert!(peak > axis.mechanics().speed_start);
        for _ in 0..1_000_000 {
            axis.update(now);
            now += 20;
            if axis.speed_sps() <= axis.mechanics().speed_start {
                break;
            }
        }
        assert!(axis.speed_sps() <= axis.mechanics().speed_start);
    }

    #[test]
    fn test_enable_refcount() {
        let driver = SimDriver::new();
        let axis = Axis::new(&make_config(0, true), driver.clone()).unwrap();
        assert!(!driver.is_enabled());

        let n = 3;
        for _ in 0..n {
            axis.set_enabled(true);
        }
        assert!(driver.is_enabled());
        for _ in 0..n - 1 {
            axis.set_enabled(false);
        }
        assert!(driver.is_enabled());
        axis.set_enabled(false);
        assert!(!driver.is_enabled());
    }

    #[test]
    fn test_no_rest_axis_ignores_enable() {
        let (axis, driver) = make_axis(0);
        // Asserted at construction and never released.
        assert!(driver.is_enabled());
        axis.set_enabled(false);
        assert!(driver.is_enabled());
    }

    #[test]
    fn test_settle_delay_before_first_step() {
        let driver = SimDriver::new();
        let axis = Axis::new(&make_config(0, true), driver.clone()).unwrap();
        axis.set_enabled(true);
        axis.move_to(Steps(10), false).unwrap();

        // First update arms the deadline, none may pulse before it passes.
        let t0 = 1000u64;
        axis.update(t0);
        axis.update(t0 + 1000);
        assert_eq!(driver.net_steps(), 0);
        axis.update(t0 + ENABLE_SETTLE_US + 1001);
        assert_eq!(driver.net_steps(), 1);
    }

    #[test]
    fn test_set_origin_shifts_stops() {
        let (axis, _driver) = make_axis(0);
        axis.set_left_stop(Some(Steps(300))).unwrap();
        axis.set_right_stop(Some(Steps(-100))).unwrap();

        axis.move_to(Steps(100), false).unwrap();
        run_to_completion(&axis, 1000);

        axis.set_origin().unwrap();
        assert_eq!(axis.position_steps(), Steps(0));
        assert_eq!(axis.left_stop(), Some(Steps(200)));
        assert_eq!(axis.right_stop(), Some(Steps(-200)));
        assert_eq!(axis.origin_position(), Steps(100));
    }

    #[test]
    fn test_force_disable_drops_pending() {
        let driver = SimDriver::new();
        let axis = Axis::new(&make_config(0, true), driver.clone()).unwrap();
        axis.set_enabled(true);
        axis.move_to(Steps(100), false).unwrap();
        axis.force_disable();
        assert!(!driver.is_enabled());
        assert!(axis.is_target_reached(0));
    }

    #[test]
    fn test_position_du_rounds() {
        let (axis, _driver) = make_axis(0);
        axis.move_to(Steps(100), false).unwrap();
        run_to_completion(&axis, 1000);
        // 100 steps / 0.4 steps/du = 250 du
        assert_eq!(axis.position_du(), Du(250));
    }
}
