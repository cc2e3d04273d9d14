//! Soft travel limits.

use crate::config::units::Steps;
use crate::error::{AxisError, Error, Result};

/// Operator-settable software travel boundaries for one axis.
///
/// `left` is the upper position bound, `right` the lower; `left >= right`
/// whenever both are set. Unset limits are explicit (`None`) rather than
/// sentinel extremes, so legitimate extreme positions can never collide with
/// "no limit".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stops {
    left: Option<i64>,
    right: Option<i64>,
}

impl Stops {
    /// No limits set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Left (upper) stop, if set.
    #[inline]
    pub fn left(&self) -> Option<Steps> {
        self.left.map(Steps)
    }

    /// Right (lower) stop, if set.
    #[inline]
    pub fn right(&self) -> Option<Steps> {
        self.right.map(Steps)
    }

    /// Whether both stops are set.
    #[inline]
    pub fn both_set(&self) -> bool {
        self.left.is_some() && self.right.is_some()
    }

    /// Set or clear the left stop.
    ///
    /// Refused if it would order below a set right stop.
    pub fn set_left(&mut self, stop: Option<Steps>) -> Result<()> {
        if let (Some(left), Some(right)) = (stop, self.right) {
            if left.0 < right {
                return Err(Error::Axis(AxisError::StopsOutOfOrder {
                    left: left.0,
                    right,
                }));
            }
        }
        self.left = stop.map(|s| s.0);
        Ok(())
    }

    /// Set or clear the right stop.
    ///
    /// Refused if it would order above a set left stop.
    pub fn set_right(&mut self, stop: Option<Steps>) -> Result<()> {
        if let (Some(left), Some(right)) = (self.left, stop) {
            if left < right.0 {
                return Err(Error::Axis(AxisError::StopsOutOfOrder {
                    left,
                    right: right.0,
                }));
            }
        }
        self.right = stop.map(|s| s.0);
        Ok(())
    }

    /// Clamp a target into the stop interval. Unset stops do not constrain.
    pub fn clamp(&self, target: i64) -> i64 {
        let mut clamped = target;
        if let Some(right) = self.right {
            if clamped < right {
                clamped = right;
            }
        }
        if let Some(left) = self.left {
            if clamped > left {
                clamped = left;
            }
        }
        clamped
    }

    /// Shift both set stops by `delta` steps (coordinate system moves).
    pub fn shift(&mut self, delta: i64) {
        if let Some(left) = self.left.as_mut() {
            *left += delta;
        }
        if let Some(right) = self.right.as_mut() {
            *right += delta;
        }
    }
}
