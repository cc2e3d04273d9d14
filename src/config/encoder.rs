//! Spindle encoder configuration from TOML.

use serde::Deserialize;

/// Spindle encoder and pulse-counter configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct EncoderConfig {
    /// Counted encoder steps per spindle revolution (after quadrature).
    pub steps_per_revolution: i64,

    /// Encoder coupling backlash in counted steps; the averaged position lags
    /// the raw position by up to this much on reversal.
    #[serde(default)]
    pub backlash_steps: i64,

    /// Magnitude at which the hardware counter is cleared to avoid overflow.
    /// Must leave margin below the counter's wrap limit.
    pub counter_clear_threshold: i32,
}

impl EncoderConfig {
    /// Counted steps for `n` revolutions.
    #[inline]
    pub fn revolutions(&self, n: i64) -> i64 {
        self.steps_per_revolution * n
    }
}
