//! System configuration - root configuration structure.

use serde::Deserialize;

use super::axis::AxisConfig;
use super::encoder::EncoderConfig;
use super::operation::OperationConfig;

/// Root configuration structure from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct SystemConfig {
    /// Spindle encoder configuration.
    pub encoder: EncoderConfig,

    /// Machine axes.
    pub axes: AxesConfig,

    /// Operation parameter bounds.
    #[serde(default)]
    pub operation: OperationConfig,
}

/// The machine's axis set: longitudinal, cross, and optional auxiliary.
#[derive(Debug, Clone, Deserialize)]
pub struct AxesConfig {
    /// Longitudinal axis (carriage, along the spindle).
    pub z: AxisConfig,

    /// Cross axis (cross-slide, perpendicular to the spindle).
    pub x: AxisConfig,

    /// Optional auxiliary axis (dividing head, rotary table).
    #[serde(default)]
    pub a1: Option<AxisConfig>,
}

impl SystemConfig {
    /// Get an axis configuration by name.
    pub fn axis(&self, name: &str) -> Option<&AxisConfig> {
        self.iter_axes().find(|a| a.name.as_str() == name)
    }

    /// Iterate all configured axes.
    pub fn iter_axes(&self) -> impl Iterator<Item = &AxisConfig> {
        [Some(&self.axes.z), Some(&self.axes.x), self.axes.a1.as_ref()]
            .into_iter()
            .flatten()
    }
}
