//! Configuration validation.

use crate::error::{ConfigError, Error, Result};

use super::axis::AxisConfig;
use super::SystemConfig;

/// Validate a system configuration.
///
/// Checks:
/// - Axis motor/screw/speed/acceleration values are physically meaningful
/// - Travel ceiling and backlash are in range
/// - Encoder resolution and counter clear threshold are consistent
pub fn validate_config(config: &SystemConfig) -> Result<()> {
    for axis in config.iter_axes() {
        validate_axis(axis)?;
    }

    if config.encoder.steps_per_revolution <= 0 {
        return Err(Error::Config(ConfigError::InvalidEncoderSteps(
            config.encoder.steps_per_revolution,
        )));
    }

    // The shadowed counter must be cleared well before the hardware wrap;
    // a non-positive threshold can never trigger.
    if config.encoder.counter_clear_threshold <= 0 {
        return Err(Error::Config(ConfigError::InvalidCounterThreshold(
            config.encoder.counter_clear_threshold,
        )));
    }

    Ok(())
}

fn validate_axis(config: &AxisConfig) -> Result<()> {
    if config.motor_steps <= 0.0 {
        return Err(Error::Config(ConfigError::InvalidMotorSteps(
            config.motor_steps,
        )));
    }

    if config.screw_pitch_du == 0.0 {
        return Err(Error::Config(ConfigError::InvalidScrewPitch(
            config.screw_pitch_du,
        )));
    }

    if config.speed_start.0 <= 0.0
        || config.speed_manual_move.0 <= 0.0
        || config.speed_start.0 > config.speed_manual_move.0
    {
        return Err(Error::Config(ConfigError::InvalidSpeed {
            start: config.speed_start.0,
            manual: config.speed_manual_move.0,
        }));
    }

    if config.acceleration.0 <= 0.0 {
        return Err(Error::Config(ConfigError::InvalidAcceleration(
            config.acceleration.0,
        )));
    }

    if config.max_travel_mm <= 0 {
        return Err(Error::Config(ConfigError::InvalidMaxTravel(
            config.max_travel_mm,
        )));
    }

    if config.backlash_du < 0 {
        return Err(Error::Config(ConfigError::InvalidBacklash(
            config.backlash_du,
        )));
    }

    Ok(())
}
