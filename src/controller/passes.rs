//! Multi-pass operation sequencing.

use super::mode::OperationMode;

/// Sub-phase of one pass in a multi-pass operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassPhase {
    /// Position the traverse axis at its start stop and the infeed axis at
    /// this pass's cutting depth.
    CutIn,
    /// Spindle-synchronized traverse across the work.
    Traverse,
    /// Withdraw the infeed axis to its start stop.
    Retract,
    /// Bring the traverse axis back to its start stop.
    Return,
}

/// Runtime state of the pass sequencer.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PassState {
    /// Current sub-phase.
    pub phase: PassPhase,
    /// Spindle anchor captured at traverse entry.
    pub anchor: Option<i64>,
}

impl PassState {
    /// Fresh state for the first phase of a pass in `mode`.
    pub fn new(mode: OperationMode) -> Self {
        Self {
            phase: initial_phase(mode),
            anchor: None,
        }
    }
}

/// First phase of a pass.
///
/// Parting has no separate infeed axis; its traverse is the cut itself.
pub(crate) fn initial_phase(mode: OperationMode) -> PassPhase {
    match mode {
        OperationMode::Cut => PassPhase::Traverse,
        _ => PassPhase::CutIn,
    }
}

/// Phase following `phase`, or `None` when the pass is complete.
pub(crate) fn next_phase(mode: OperationMode, phase: PassPhase) -> Option<PassPhase> {
    match (mode, phase) {
        (OperationMode::Cut, PassPhase::Traverse) => Some(PassPhase::Retract),
        (OperationMode::Cut, PassPhase::Retract) => None,
        (_, PassPhase::CutIn) => Some(PassPhase::Traverse),
        (_, PassPhase::Traverse) => Some(PassPhase::Retract),
        (_, PassPhase::Retract) => Some(PassPhase::Return),
        (_, PassPhase::Return) => None,
    }
}

/// Total operations in the sequence.
///
/// Threading cuts every start at every depth, so starts multiply the count.
pub(crate) fn total_ops(mode: OperationMode, passes: u16, starts: u16) -> u32 {
    match mode {
        OperationMode::Thread => passes as u32 * starts.max(1) as u32,
        _ => passes as u32,
    }
}

/// Depth pass index for operation `index`.
pub(crate) fn pass_of(mode: OperationMode, index: u32, starts: u16) -> u32 {
    match mode {
        OperationMode::Thread => index / starts.max(1) as u32,
        _ => index,
    }
}

/// Thread start index for operation `index`.
pub(crate) fn start_of(mode: OperationMode, index: u32, starts: u16) -> u32 {
    match mode {
        OperationMode::Thread => index % starts.max(1) as u32,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turn_phase_cycle() {
        let mode = OperationMode::Turn;
        let mut phase = initial_phase(mode);
        assert_eq!(phase, PassPhase::CutIn);
        let mut seen = vec![phase];
        while let Some(next) = next_phase(mode, phase) {
            phase = next;
            seen.push(phase);
        }
        assert_eq!(
            seen,
            vec![
                PassPhase::CutIn,
                PassPhase::Traverse,
                PassPhase::Retract,
                PassPhase::Return
            ]
        );
    }

    #[test]
    fn test_cut_phase_cycle_skips_infeed_phases() {
        let mode = OperationMode::Cut;
        let mut phase = initial_phase(mode);
        assert_eq!(phase, PassPhase::Traverse);
        let mut seen = vec![phase];
        while let Some(next) = next_phase(mode, phase) {
            phase = next;
            seen.push(phase);
        }
        assert_eq!(seen, vec![PassPhase::Traverse, PassPhase::Retract]);
    }

    #[test]
    fn test_thread_ops_cover_starts_then_deepen() {
        let mode = OperationMode::Thread;
        assert_eq!(total_ops(mode, 3, 2), 6);
        // Operation order: (pass 0, start 0), (pass 0, start 1), (pass 1, ...)
        assert_eq!(pass_of(mode, 0, 2), 0);
        assert_eq!(start_of(mode, 0, 2), 0);
        assert_eq!(pass_of(mode, 1, 2), 0);
        assert_eq!(start_of(mode, 1, 2), 1);
        assert_eq!(pass_of(mode, 2, 2), 1);
        assert_eq!(start_of(mode, 2, 2), 0);
    }

    #[test]
    fn test_turn_ops_ignore_starts() {
        let mode = OperationMode::Turn;
        assert_eq!(total_ops(mode, 3, 2), 3);
        assert_eq!(pass_of(mode, 2, 2), 2);
        assert_eq!(start_of(mode, 2, 2), 0);
    }
}
