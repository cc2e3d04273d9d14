//! Axis module for lathe-motion.
//!
//! Provides the per-axis step engine with backlash compensation, soft travel
//! limits and position tracking.

mod builder;
mod engine;
mod position;
mod stops;

pub use builder::AxisBuilder;
pub use engine::{Axis, Direction};
pub use position::PositionTracker;
pub use stops::Stops;
