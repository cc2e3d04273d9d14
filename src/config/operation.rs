//! Operation parameter bounds from TOML.

use serde::Deserialize;

/// Bounds and defaults for operator-settable operation parameters.
///
/// Setters on the controller reject values outside these bounds, retaining
/// the previous value.
#[derive(Debug, Clone, Deserialize)]
pub struct OperationConfig {
    /// Maximum pitch magnitude in deci-microns per revolution.
    #[serde(default = "default_max_pitch_du")]
    pub max_pitch_du: i64,

    /// Maximum number of thread starts.
    #[serde(default = "default_max_starts")]
    pub max_starts: u16,

    /// Maximum number of passes in multi-pass modes.
    #[serde(default = "default_max_passes")]
    pub max_passes: u16,

    /// Virtual spindle speed for the asynchronous feed mode, in RPM.
    #[serde(default = "default_async_rpm")]
    pub async_rpm: u32,
}

fn default_max_pitch_du() -> i64 {
    254_000
}

fn default_max_starts() -> u16 {
    124
}

fn default_max_passes() -> u16 {
    500
}

fn default_async_rpm() -> u32 {
    120
}

impl Default for OperationConfig {
    fn default() -> Self {
        Self {
            max_pitch_du: default_max_pitch_du(),
            max_starts: default_max_starts(),
            max_passes: default_max_passes(),
            async_rpm: default_async_rpm(),
        }
    }
}
