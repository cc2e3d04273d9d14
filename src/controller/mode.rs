//! Operating modes.

use serde::{Deserialize, Serialize};

/// Operating mode of the motion controller.
///
/// Switching modes always forces a disable first; a mode change never happens
/// while the system is engaged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationMode {
    /// Spindle-synchronized feed: the longitudinal axis follows spindle phase
    /// at the configured pitch (basic ELS threading/feeding).
    Normal,
    /// Time-based feed independent of the spindle.
    Async,
    /// Two-axis taper turning at a fixed diameter-per-length ratio.
    Cone,
    /// Multi-pass longitudinal turning between stops.
    Turn,
    /// Multi-pass facing (cross feed traverses, longitudinal sets depth).
    Face,
    /// Multi-pass parting/grooving on the cross axis.
    Cut,
    /// Multi-pass threading with multi-start phase offsets.
    Thread,
    /// Multi-pass elliptical turning.
    Ellipse,
    /// Targets supplied by an external G-code interpreter.
    GCode,
    /// Auxiliary axis coupled to the spindle.
    Aux,
}

impl OperationMode {
    /// Whether this mode runs the multi-pass sequencer.
    #[inline]
    pub fn is_multi_pass(self) -> bool {
        matches!(
            self,
            OperationMode::Turn
                | OperationMode::Face
                | OperationMode::Cut
                | OperationMode::Thread
                | OperationMode::Ellipse
        )
    }
}
