//! Configuration module for lathe-motion.
//!
//! Provides types for loading and validating encoder, axis and operation
//! configurations from TOML files or pre-parsed data.

mod axis;
mod encoder;
mod loader;
mod mechanical;
mod operation;
mod system;
pub mod units;
mod validation;

pub use axis::AxisConfig;
pub use encoder::EncoderConfig;
pub use loader::{load_config, parse_config};
pub use mechanical::AxisMechanics;
pub use operation::OperationConfig;
pub use system::{AxesConfig, SystemConfig};
pub use validation::validate_config;

// Re-export unit types at config level
pub use units::{Du, Steps, StepsPerSec, StepsPerSecSq};
