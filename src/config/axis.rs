//! Axis configuration from TOML.

use heapless::String;
use serde::Deserialize;

use super::units::{StepsPerSec, StepsPerSecSq};

/// Complete configuration for one machine axis.
#[derive(Debug, Clone, Deserialize)]
pub struct AxisConfig {
    /// Human-readable name (max 8 chars, e.g. "z", "x", "a1").
    pub name: String<8>,

    /// Motor steps per revolution, including microstepping.
    pub motor_steps: f32,

    /// Lead screw pitch in deci-microns per revolution. For rotational axes
    /// this is the deci-micron equivalent of one output revolution.
    pub screw_pitch_du: f32,

    /// Speed the axis can start and stop at without ramping, in steps/sec.
    pub speed_start: StepsPerSec,

    /// Maximum manual-move speed in steps/sec; also the default speed ceiling.
    pub speed_manual_move: StepsPerSec,

    /// Acceleration and deceleration rate in steps/sec².
    pub acceleration: StepsPerSecSq,

    /// Invert direction pin logic.
    #[serde(default)]
    pub invert_direction: bool,

    /// Whether the driver must be de-asserted when idle (open-loop drivers
    /// that overheat when left energized). Axes with `false` ignore enable
    /// calls entirely.
    #[serde(default)]
    pub needs_rest: bool,

    /// Mechanical travel ceiling in millimeters. A single commanded move
    /// longer than this is refused.
    pub max_travel_mm: i64,

    /// Drivetrain backlash in deci-microns, compensated on direction reversal.
    #[serde(default)]
    pub backlash_du: i64,

    /// True for rotational axes (e.g. a dividing head).
    #[serde(default)]
    pub rotational: bool,
}
