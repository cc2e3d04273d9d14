//! Per-mode target geometry.
//!
//! Pure functions relating spindle phase, pass index and configuration to
//! axis target positions. The coordinator's loop is the same for every mode;
//! only these formulas differ.

/// Axis steps corresponding to a spindle displacement at the configured
/// pitch and starts.
///
/// One spindle revolution advances the axis by `pitch_du × starts`
/// deci-microns.
pub fn spindle_to_axis_steps(
    spindle_pos: i64,
    encoder_steps: i64,
    pitch_du: i64,
    starts: u16,
    steps_per_du: f64,
) -> i64 {
    (spindle_pos as f64 / encoder_steps as f64
        * pitch_du as f64
        * starts as f64
        * steps_per_du)
        .round() as i64
}

/// Infeed depth for 0-based pass `pass` of `total`, proportional across the
/// full span.
pub fn pass_depth(span: i64, pass: u32, total: u32) -> i64 {
    if total == 0 {
        return span;
    }
    (span as f64 * (pass + 1) as f64 / total as f64).round() as i64
}

/// Spindle phase offset of thread start `start_index` out of `starts`.
pub fn start_phase_offset(encoder_steps: i64, starts: u16, start_index: u32) -> i64 {
    if starts <= 1 {
        0
    } else {
        encoder_steps * start_index as i64 / starts as i64
    }
}

/// Smallest spindle position `>= position` whose phase within one revolution
/// equals `phase_offset`.
///
/// A traverse anchored here re-joins the same groove on every pass: the pass
/// waits (tool parked at the traverse start) until the spindle crosses the
/// groove phase, then follows.
pub fn traverse_anchor(position: i64, encoder_steps: i64, phase_offset: i64) -> i64 {
    let rem = (position - phase_offset).rem_euclid(encoder_steps);
    if rem == 0 {
        position
    } else {
        position + encoder_steps - rem
    }
}

/// Infeed along a quarter-ellipse arc at traverse progress `t` in `[0, 1]`:
/// zero at the start, `depth` at the end.
pub fn ellipse_infeed(depth: i64, progress: f64) -> i64 {
    let t = progress.clamp(0.0, 1.0);
    (depth as f64 * (1.0 - (1.0 - t * t).sqrt())).round() as i64
}

/// Virtual spindle displacement for the time-based asynchronous feed.
pub fn async_virtual_steps(elapsed_us: u64, encoder_steps: i64, rpm: u32) -> i64 {
    (elapsed_us as f64 * encoder_steps as f64 * rpm as f64 / 60_000_000.0).round() as i64
}

/// Cross-axis companion target for taper turning.
///
/// `ratio` is the diameter change per unit of longitudinal travel; the cross
/// slide moves half of it. `external` selects the taper side.
pub fn cone_companion_steps(
    z_steps: i64,
    z_steps_per_du: f64,
    x_steps_per_du: f64,
    ratio: f64,
    external: bool,
) -> i64 {
    let z_du = z_steps as f64 / z_steps_per_du;
    let x = -(z_du * ratio / 2.0) * x_steps_per_du;
    let sign = if external { 1.0 } else { -1.0 };
    (x * sign).round() as i64
}
