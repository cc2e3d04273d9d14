//! Persistable controller state.
//!
//! The storage format and location belong to the host; this is the shape of
//! what must survive a restart.

use serde::{Deserialize, Serialize};

use super::mode::OperationMode;
use crate::config::units::Steps;

/// Everything the operator configured that should survive a power cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Operating mode.
    pub mode: OperationMode,
    /// Pitch in deci-microns per revolution.
    pub pitch_du: i64,
    /// Thread starts.
    pub starts: u16,
    /// Cone ratio (diameter per unit length).
    pub cone_ratio: f64,
    /// Passes for multi-pass modes.
    pub turn_passes: u16,
    /// Auxiliary direction (external/internal).
    pub aux_forward: bool,
    /// Per-axis origin offsets and soft limits.
    pub axes: Vec<AxisSnapshot>,
}

/// Persisted per-axis state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisSnapshot {
    /// Axis name, matching the configuration.
    pub name: heapless::String<8>,
    /// Accumulated origin offset in steps.
    pub origin: Steps,
    /// Left (upper) soft limit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left_stop: Option<Steps>,
    /// Right (lower) soft limit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right_stop: Option<Steps>,
}
