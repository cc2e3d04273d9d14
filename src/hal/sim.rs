//! Simulated hardware for host-side testing.
//!
//! Deterministic implementations of the [`Clock`](super::Clock),
//! [`PulseCounter`](super::PulseCounter) and [`AxisDriver`](super::AxisDriver)
//! capabilities, backed by shared atomics so a test harness can advance time
//! and feed encoder pulses while the core runs.

use std::sync::atomic::{AtomicBool, AtomicI32, AtomicI64, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

use super::{AxisDriver, Clock, PulseCounter};
use crate::error::Result;

/// Simulated microsecond clock advanced explicitly by the test harness.
#[derive(Debug, Clone, Default)]
pub struct SimClock {
    now: Arc<AtomicU64>,
}

impl SimClock {
    /// Create a clock at time zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the clock by `us` microseconds.
    pub fn advance(&self, us: u64) {
        self.now.fetch_add(us, Ordering::SeqCst);
    }

    /// Set the absolute time in microseconds.
    pub fn set(&self, us: u64) {
        self.now.store(us, Ordering::SeqCst);
    }
}

impl Clock for SimClock {
    fn now_us(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Simulated hardware pulse counter.
///
/// The harness adds encoder pulses with [`SimCounter::add_pulses`]; the
/// spindle tracker reads and clears it like the real peripheral.
#[derive(Debug, Clone, Default)]
pub struct SimCounter {
    count: Arc<AtomicI32>,
}

impl SimCounter {
    /// Create a counter at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed `delta` encoder pulses (signed).
    pub fn add_pulses(&self, delta: i32) {
        self.count.fetch_add(delta, Ordering::SeqCst);
    }
}

impl PulseCounter for SimCounter {
    fn read(&mut self) -> i32 {
        self.count.load(Ordering::SeqCst)
    }

    fn clear(&mut self) {
        self.count.store(0, Ordering::SeqCst);
    }
}

/// Simulated axis driver recording everything the engine commands.
///
/// Cloning shares the underlying recording, so a harness can keep a handle
/// while the axis owns the driver.
#[derive(Debug, Clone, Default)]
pub struct SimDriver {
    steps_forward: Arc<AtomicI64>,
    steps_backward: Arc<AtomicI64>,
    direction_forward: Arc<AtomicBool>,
    direction_changes: Arc<AtomicU32>,
    enabled: Arc<AtomicBool>,
    enable_edges: Arc<AtomicU32>,
}

impl SimDriver {
    /// Create a driver with an empty recording.
    pub fn new() -> Self {
        Self::default()
    }

    /// Steps emitted in the forward direction.
    pub fn steps_forward(&self) -> i64 {
        self.steps_forward.load(Ordering::SeqCst)
    }

    /// Steps emitted in the backward direction.
    pub fn steps_backward(&self) -> i64 {
        self.steps_backward.load(Ordering::SeqCst)
    }

    /// Net signed steps emitted.
    pub fn net_steps(&self) -> i64 {
        self.steps_forward() - self.steps_backward()
    }

    /// Number of direction transitions commanded.
    pub fn direction_changes(&self) -> u32 {
        self.direction_changes.load(Ordering::SeqCst)
    }

    /// Whether the enable output is currently asserted.
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Number of enable-line edges (assert or de-assert).
    pub fn enable_edges(&self) -> u32 {
        self.enable_edges.load(Ordering::SeqCst)
    }
}

impl AxisDriver for SimDriver {
    fn set_direction(&mut self, forward: bool) -> Result<()> {
        if self.direction_forward.swap(forward, Ordering::SeqCst) != forward {
            self.direction_changes.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    fn step(&mut self) -> Result<()> {
        if self.direction_forward.load(Ordering::SeqCst) {
            self.steps_forward.fetch_add(1, Ordering::SeqCst);
        } else {
            self.steps_backward.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    fn set_enabled(&mut self, enabled: bool) -> Result<()> {
        if self.enabled.swap(enabled, Ordering::SeqCst) != enabled {
            self.enable_edges.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}
