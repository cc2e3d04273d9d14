//! Position tracking with backlash take-up.
//!
//! Separates the logical tool position from the physical motor position: the
//! motor advances on every step, but the tool only advances once drivetrain
//! slack in the current direction has been consumed.

use crate::config::units::Steps;

/// Per-axis position state.
#[derive(Debug, Clone, Copy)]
pub struct PositionTracker {
    /// Tool position relative to the origin, in steps.
    pos: i64,
    /// Accumulated origin offset in steps (absolute zero).
    origin_pos: i64,
    /// Motor position never reset.
    pos_global: i64,
    /// Physical motor position; differs from `pos` by up to the backlash
    /// depending on direction history.
    motor_pos: i64,
    backlash_steps: i64,
}

impl PositionTracker {
    /// Create a tracker at the origin with the given backlash.
    pub fn new(backlash_steps: i64) -> Self {
        Self {
            pos: 0,
            origin_pos: 0,
            pos_global: 0,
            motor_pos: 0,
            backlash_steps,
        }
    }

    /// Account one emitted motor step in the given direction.
    ///
    /// Moving forward the tool advances once the motor has caught up to it;
    /// moving backward it retreats only once the motor has fallen a full
    /// backlash behind.
    pub fn apply_step(&mut self, forward: bool) {
        if forward && self.motor_pos >= self.pos {
            self.pos += 1;
        } else if !forward && self.motor_pos <= self.pos - self.backlash_steps {
            self.pos -= 1;
        }

        let delta = if forward { 1 } else { -1 };
        self.motor_pos += delta;
        self.pos_global += delta;
    }

    /// Logical tool position in steps, relative to the origin.
    #[inline]
    pub fn tool_position(&self) -> i64 {
        self.pos
    }

    /// Physical motor position in steps.
    #[inline]
    pub fn motor_position(&self) -> i64 {
        self.motor_pos
    }

    /// Motor position never reset by origin changes.
    #[inline]
    pub fn global_position(&self) -> i64 {
        self.pos_global
    }

    /// Accumulated origin offset in steps.
    #[inline]
    pub fn origin_position(&self) -> i64 {
        self.origin_pos
    }

    /// Configured backlash in steps.
    #[inline]
    pub fn backlash_steps(&self) -> i64 {
        self.backlash_steps
    }

    /// Shift the coordinate system so the current tool position becomes zero.
    ///
    /// Returns the shift applied (the previous tool position), so callers can
    /// move soft limits by the same amount.
    pub fn set_origin(&mut self) -> i64 {
        let shift = self.pos;
        self.motor_pos -= shift;
        self.origin_pos += shift;
        self.pos = 0;
        shift
    }

    /// Re-base the absolute origin offset on the current position without
    /// shifting the coordinate system.
    pub fn reset_origin(&mut self) {
        self.origin_pos = -self.pos;
    }

    /// Restore a persisted origin offset.
    pub fn restore_origin(&mut self, origin: Steps) {
        self.origin_pos = origin.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_forward_motion_tracks_immediately() {
        let mut tracker = PositionTracker::new(5);
        for _ in 0..10 {
            tracker.apply_step(true);
        }
        assert_eq!(tracker.tool_position(), 10);
        assert_eq!(tracker.motor_position(), 10);
        assert_eq!(tracker.global_position(), 10);
    }

    #[test]
    fn test_backlash_absorbed_on_reversal() {
        let backlash = 5;
        let mut tracker = PositionTracker::new(backlash);
        for _ in 0..10 {
            tracker.apply_step(true);
        }

        // The first `backlash` backward steps take up slack: the tool holds.
        for _ in 0..backlash {
            tracker.apply_step(false);
            assert_eq!(tracker.tool_position(), 10);
        }

        // The next one moves the tool.
        tracker.apply_step(false);
        assert_eq!(tracker.tool_position(), 9);
        assert_eq!(tracker.motor_position(), 10 - backlash as i64 - 1);
    }

    #[test]
    fn test_set_origin_shifts_coordinates() {
        let mut tracker = PositionTracker::new(0);
        for _ in 0..42 {
            tracker.apply_step(true);
        }

        let shift = tracker.set_origin();
        assert_eq!(shift, 42);
        assert_eq!(tracker.tool_position(), 0);
        assert_eq!(tracker.motor_position(), 0);
        assert_eq!(tracker.origin_position(), 42);
        // Global position is untouched by origin changes.
        assert_eq!(tracker.global_position(), 42);
    }

    #[test]
    fn test_reset_origin_rebases_only_offset() {
        let mut tracker = PositionTracker::new(0);
        for _ in 0..10 {
            tracker.apply_step(true);
        }
        tracker.reset_origin();
        assert_eq!(tracker.origin_position(), -10);
        assert_eq!(tracker.tool_position(), 10);
    }

    proptest! {
        /// Whatever the step history, the motor never leads the tool and
        /// never trails it by more than the backlash.
        #[test]
        fn prop_motor_within_backlash_of_tool(
            backlash in 0i64..20,
            steps in proptest::collection::vec(any::<bool>(), 0..500),
        ) {
            let mut tracker = PositionTracker::new(backlash);
            for forward in steps {
                tracker.apply_step(forward);
                let slack = tracker.motor_position() - tracker.tool_position();
                prop_assert!((-backlash..=0).contains(&slack));
            }
        }
    }
}
