//! # lathe-motion
//!
//! Motion core for an electronic leadscrew / lathe controller.
//!
//! The crate synchronizes stepper-driven machine axes to a spindle encoder to
//! produce threading, turning, facing and related operations, and generates
//! the acceleration-limited step pulses that realize that synchronization.
//!
//! ## Architecture
//!
//! - [`Spindle`]: tracks the spindle encoder through a hardware pulse counter
//!   and estimates RPM
//! - [`Axis`]: one per machine axis; owns position state and emits
//!   acceleration-limited step pulses with backlash compensation
//! - [`MotionController`]: the mode state machine; reads the spindle each
//!   tick, computes per-axis targets for the active operation and issues them
//!
//! Everything is driven by a single periodic tick
//! ([`MotionController::tick`]) which must be invoked at least as often as the
//! fastest configured step rate; a missed tick is a lost step.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use lathe_motion::{load_config, Du, MotionController};
//! use lathe_motion::hal::{StdClock, StepDirPins};
//!
//! let config = load_config("lathe.toml")?;
//! let controller = MotionController::new(
//!     &config,
//!     StdClock::new(),
//!     counter,
//!     StepDirPins::new(z_step, z_dir, z_ena, delay_z, false),
//!     StepDirPins::new(x_step, x_dir, x_ena, delay_x, false),
//!     None,
//! )?;
//!
//! controller.set_pitch(Du(2000))?; // 0.2 mm per spindle revolution
//! controller.set_enabled(true)?;
//! loop {
//!     controller.tick();
//! }
//! ```
//!
//! ## Hardware abstraction
//!
//! The core never touches peripherals directly. It consumes three capability
//! traits ([`hal::Clock`], [`hal::PulseCounter`], [`hal::AxisDriver`])
//! implemented once per target platform; [`hal::StepDirPins`] adapts any
//! `embedded-hal 1.0` STEP/DIR/ENA pin set, and [`hal::sim`] provides
//! deterministic simulated implementations for host-side testing.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]
// Allow large error types - necessary with heapless payload strings
#![allow(clippy::result_large_err)]

// Core modules
pub mod axis;
pub mod config;
pub mod controller;
pub mod error;
pub mod hal;
pub mod spindle;

// Re-exports for ergonomic API
pub use axis::{Axis, AxisBuilder, Direction, Stops};
pub use config::{load_config, parse_config, validate_config};
pub use config::{AxisConfig, AxisMechanics, EncoderConfig, OperationConfig, SystemConfig};
pub use controller::{AxisId, Fault, MotionController, OperationMode, PassPhase, Snapshot};
pub use error::{AxisError, ConfigError, Error, OperationError, Result};
pub use spindle::Spindle;

// Unit types
pub use config::units::{Du, Steps, StepsPerSec, StepsPerSecSq};
