//! Mechanical parameters derived from axis configuration.

use super::axis::AxisConfig;
use super::units::{Du, Steps};

/// Derived per-axis mechanics computed once at initialization.
#[derive(Debug, Clone)]
pub struct AxisMechanics {
    /// Motor steps per deci-micron of travel.
    pub steps_per_du: f64,

    /// Drivetrain backlash in steps, taken up on direction reversal.
    pub backlash_steps: i64,

    /// Mechanical travel ceiling in steps; a single move longer than this is
    /// refused.
    pub estop_steps: i64,

    /// Steps needed to brake from the manual-move ceiling to the start speed.
    /// Used as the braking lookahead for positional moves.
    pub decelerate_steps: i64,

    /// Start/stop speed in steps/sec.
    pub speed_start: f32,

    /// Manual-move speed ceiling in steps/sec.
    pub speed_manual_move: f32,

    /// Acceleration in steps/sec².
    pub acceleration: f32,
}

impl AxisMechanics {
    /// Compute mechanics from an axis configuration.
    pub fn from_config(config: &AxisConfig) -> Self {
        let steps_per_du = config.motor_steps as f64 / config.screw_pitch_du as f64;

        let backlash_steps = (config.backlash_du as f64 * steps_per_du).round() as i64;

        let estop_steps =
            (config.max_travel_mm as f64 * 10_000.0 * steps_per_du).round() as i64;

        // Discrete integration of the braking curve: from the manual ceiling,
        // each step at speed s sheds acceleration/s of speed.
        let mut decelerate_steps = 0i64;
        let mut s = config.speed_manual_move.0;
        while s > config.speed_start.0 {
            decelerate_steps += 1;
            s -= config.acceleration.0 / s;
        }

        Self {
            steps_per_du,
            backlash_steps,
            estop_steps,
            decelerate_steps,
            speed_start: config.speed_start.0,
            speed_manual_move: config.speed_manual_move.0,
            acceleration: config.acceleration.0,
        }
    }

    /// Convert deci-microns to steps (rounded).
    #[inline]
    pub fn du_to_steps(&self, du: Du) -> Steps {
        Steps((du.0 as f64 * self.steps_per_du).round() as i64)
    }

    /// Convert steps to deci-microns (rounded).
    #[inline]
    pub fn steps_to_du(&self, steps: Steps) -> Du {
        Du((steps.0 as f64 / self.steps_per_du).round() as i64)
    }
}
