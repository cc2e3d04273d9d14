//! Validation tests for the system configuration.

use lathe_motion::error::{ConfigError, Error};
use lathe_motion::parse_config;

const BASE: &str = r#"
[encoder]
steps_per_revolution = 2880
counter_clear_threshold = 30000

[axes.z]
name = "z"
motor_steps = 800.0
screw_pitch_du = 20000.0
speed_start = 600.0
speed_manual_move = 6000.0
acceleration = 12000.0
max_travel_mm = 300

[axes.x]
name = "x"
motor_steps = 800.0
screw_pitch_du = 12700.0
speed_start = 400.0
speed_manual_move = 4000.0
acceleration = 10000.0
max_travel_mm = 100
"#;

#[test]
fn base_config_is_valid() {
    assert!(parse_config(BASE).is_ok());
}

#[test]
fn zero_screw_pitch_rejected() {
    let broken = BASE.replace("screw_pitch_du = 20000.0", "screw_pitch_du = 0.0");
    let result = parse_config(&broken);
    assert!(matches!(
        result,
        Err(Error::Config(ConfigError::InvalidScrewPitch(_)))
    ));
}

#[test]
fn zero_acceleration_rejected() {
    let broken = BASE.replace("acceleration = 12000.0", "acceleration = 0.0");
    let result = parse_config(&broken);
    assert!(matches!(
        result,
        Err(Error::Config(ConfigError::InvalidAcceleration(_)))
    ));
}

#[test]
fn start_speed_above_manual_rejected() {
    let broken = BASE.replace("speed_start = 600.0", "speed_start = 60000.0");
    let result = parse_config(&broken);
    assert!(matches!(
        result,
        Err(Error::Config(ConfigError::InvalidSpeed { .. }))
    ));
}

#[test]
fn zero_encoder_steps_rejected() {
    let broken = BASE.replace(
        "steps_per_revolution = 2880",
        "steps_per_revolution = 0",
    );
    let result = parse_config(&broken);
    assert!(matches!(
        result,
        Err(Error::Config(ConfigError::InvalidEncoderSteps(_)))
    ));
}

#[test]
fn negative_counter_threshold_rejected() {
    let broken = BASE.replace(
        "counter_clear_threshold = 30000",
        "counter_clear_threshold = -5",
    );
    let result = parse_config(&broken);
    assert!(matches!(
        result,
        Err(Error::Config(ConfigError::InvalidCounterThreshold(_)))
    ));
}

#[test]
fn malformed_toml_reported_as_parse_error() {
    let result = parse_config("[encoder\nsteps_per_revolution = 2880");
    assert!(matches!(
        result,
        Err(Error::Config(ConfigError::ParseError(_)))
    ));
}
