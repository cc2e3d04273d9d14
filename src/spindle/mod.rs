//! Spindle position and velocity tracking.
//!
//! Converts raw quadrature pulse-counter deltas into a tracked position, a
//! backlash-filtered averaged position, a monotonic global position and an
//! RPM estimate. The tracker is the single writer of its own state; every
//! other component reads it.

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::config::EncoderConfig;
use crate::hal::PulseCounter;

/// One consistent reading of the spindle state, taken once per tick and used
/// for every axis target computed in that tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpindleSample {
    /// Tracked position, wrapped into `[0, steps_per_revolution)`.
    pub position: i64,
    /// Backlash-filtered accumulated position.
    pub average_position: i64,
    /// Monotonic position, never reset.
    pub global_position: i64,
    /// Latest RPM estimate (0 until the first full window).
    pub rpm: u32,
    /// Phase correction held while an axis is pinned at a limit.
    pub sync_offset: i64,
}

/// Spindle encoder tracker.
///
/// `update` must be called from the periodic tick; it diffs the hardware
/// counter against the last-seen raw value and clears the counter before it
/// reaches the wrap boundary, preserving delta continuity across clears.
pub struct Spindle<PC: PulseCounter> {
    steps_per_rev: i64,
    backlash_steps: i64,
    clear_threshold: i32,
    inner: Mutex<SpindleInner<PC>>,
}

struct SpindleInner<PC> {
    counter: PC,
    /// Shadow of the last raw counter value.
    counter_value: i32,
    /// Accumulated position since the last origin reset.
    position: i64,
    /// Backlash-filtered position; lags `position` on reversal by up to the
    /// encoder backlash.
    position_avg: i64,
    /// Accumulated position never reset.
    position_global: i64,
    /// Time of the last observed pulse.
    last_pulse_us: u64,
    /// RPM window start time.
    bulk_start_us: u64,
    /// Pulses accumulated in the current RPM window.
    bulk_count: i64,
    rpm: u32,
    sync_offset: i64,
}

impl<PC: PulseCounter> Spindle<PC> {
    /// Create a tracker over a hardware pulse counter.
    pub fn new(config: &EncoderConfig, counter: PC) -> Self {
        Self {
            steps_per_rev: config.steps_per_revolution,
            backlash_steps: config.backlash_steps,
            clear_threshold: config.counter_clear_threshold,
            inner: Mutex::new(SpindleInner {
                counter,
                counter_value: 0,
                position: 0,
                position_avg: 0,
                position_global: 0,
                last_pulse_us: 0,
                bulk_start_us: 0,
                bulk_count: 0,
                rpm: 0,
                sync_offset: 0,
            }),
        }
    }

    /// Read new pulses from the hardware counter and update tracking state.
    ///
    /// A zero delta is a no-op.
    pub fn update(&self, now_us: u64) {
        let mut inner = self.inner.lock();

        let count = inner.counter.read();
        let delta = (count - inner.counter_value) as i64;
        if delta == 0 {
            return;
        }

        if count >= self.clear_threshold || count <= -self.clear_threshold {
            // Clear before the hardware wrap; the delta above already
            // captured everything up to this reading.
            inner.counter.clear();
            inner.counter_value = 0;
            debug!(count, "spindle counter cleared near wrap boundary");
        } else {
            inner.counter_value = count;
        }

        self.process_pulses(&mut inner, delta, now_us);
    }

    fn process_pulses(&self, inner: &mut SpindleInner<PC>, delta: i64, now_us: u64) {
        // RPM over a window of one revolution's worth of pulses. The check
        // precedes accumulation, so the estimate lands on the update after
        // the window fills.
        if inner.bulk_count >= self.steps_per_rev {
            let elapsed = now_us.saturating_sub(inner.bulk_start_us);
            if elapsed > 0 {
                inner.rpm = (60_000_000 / elapsed) as u32;
            }
            inner.bulk_start_us = now_us;
            inner.bulk_count = 0;
        }
        inner.bulk_count += delta.abs();

        inner.position += delta;
        inner.position_global += delta;

        // Encoder coupling backlash: the averaged position tracks upward
        // immediately but only follows downward once the dead zone is
        // exhausted.
        if inner.position > inner.position_avg {
            inner.position_avg = inner.position;
        } else if inner.position < inner.position_avg - self.backlash_steps {
            inner.position_avg = inner.position + self.backlash_steps;
        }

        inner.last_pulse_us = now_us;
    }

    /// Tracked position wrapped into `[0, steps_per_revolution)`.
    pub fn position(&self) -> i64 {
        self.normalize(self.inner.lock().position)
    }

    /// Backlash-filtered accumulated position (what synchronized modes
    /// integrate over).
    pub fn average_position(&self) -> i64 {
        self.inner.lock().position_avg
    }

    /// Accumulated position that is never reset.
    pub fn global_position(&self) -> i64 {
        self.inner.lock().position_global
    }

    /// Latest RPM estimate; 0 until one full window has been observed.
    pub fn rpm(&self) -> u32 {
        self.inner.lock().rpm
    }

    /// Phase correction held while an axis is pinned at a limit.
    pub fn sync_offset(&self) -> i64 {
        self.inner.lock().sync_offset
    }

    /// Set the phase correction. Written by the external limit-handling
    /// policy; while nonzero the coordinator freezes target updates.
    pub fn set_sync_offset(&self, offset: i64) {
        self.inner.lock().sync_offset = offset;
        debug!(offset, "spindle sync offset set");
    }

    /// Zero the tracked and averaged positions and the sync offset.
    ///
    /// The global position and the RPM window are unaffected.
    pub fn reset_position(&self) {
        let mut inner = self.inner.lock();
        inner.position = 0;
        inner.position_avg = 0;
        inner.sync_offset = 0;
        info!("spindle position reset");
    }

    /// Whether a pulse was observed within `timeout_ms` of `now_us`.
    pub fn is_spinning(&self, now_us: u64, timeout_ms: u64) -> bool {
        let inner = self.inner.lock();
        now_us.saturating_sub(inner.last_pulse_us) < timeout_ms * 1000
    }

    /// One consistent reading of the whole spindle state.
    pub fn sample(&self) -> SpindleSample {
        let inner = self.inner.lock();
        SpindleSample {
            position: self.normalize(inner.position),
            average_position: inner.position_avg,
            global_position: inner.position_global,
            rpm: inner.rpm,
            sync_offset: inner.sync_offset,
        }
    }

    /// Counted steps per spindle revolution.
    #[inline]
    pub fn steps_per_revolution(&self) -> i64 {
        self.steps_per_rev
    }

    fn normalize(&self, pos: i64) -> i64 {
        let wrapped = pos % self.steps_per_rev;
        if wrapped < 0 {
            wrapped + self.steps_per_rev
        } else {
            wrapped
        }
    }
}
