//! TOML parsing tests for the system configuration.

use lathe_motion::{parse_config, Du};

const FULL_CONFIG: &str = r#"
[encoder]
steps_per_revolution = 2880
backlash_steps = 3
counter_clear_threshold = 30000

[operation]
max_pitch_du = 100000
max_starts = 60
max_passes = 200
async_rpm = 90

[axes.z]
name = "z"
motor_steps = 800.0
screw_pitch_du = 20000.0
speed_start = 600.0
speed_manual_move = 6000.0
acceleration = 12000.0
invert_direction = true
needs_rest = true
max_travel_mm = 300
backlash_du = 100

[axes.x]
name = "x"
motor_steps = 800.0
screw_pitch_du = 12700.0
speed_start = 400.0
speed_manual_move = 4000.0
acceleration = 10000.0
max_travel_mm = 100

[axes.a1]
name = "a1"
motor_steps = 3200.0
screw_pitch_du = 3600.0
speed_start = 200.0
speed_manual_move = 2000.0
acceleration = 8000.0
max_travel_mm = 100
rotational = true
"#;

#[test]
fn parse_full_config() {
    let config = parse_config(FULL_CONFIG).expect("full config should parse");

    assert_eq!(config.encoder.steps_per_revolution, 2880);
    assert_eq!(config.encoder.backlash_steps, 3);

    let z = config.axis("z").expect("z axis should exist");
    assert!(z.invert_direction);
    assert!(z.needs_rest);
    assert_eq!(z.backlash_du, 100);

    let a1 = config.axis("a1").expect("a1 axis should exist");
    assert!(a1.rotational);

    assert_eq!(config.operation.max_pitch_du, 100_000);
    assert_eq!(config.operation.max_starts, 60);
    assert_eq!(config.operation.async_rpm, 90);
}

#[test]
fn operation_section_is_optional() {
    let minimal = FULL_CONFIG
        .replace("[operation]", "")
        .replace("max_pitch_du = 100000", "")
        .replace("max_starts = 60", "")
        .replace("max_passes = 200", "")
        .replace("async_rpm = 90", "");

    let config = parse_config(&minimal).expect("config without [operation] should parse");
    assert_eq!(config.operation.max_pitch_du, 254_000);
    assert_eq!(config.operation.max_starts, 124);
}

#[test]
fn aux_axis_is_optional() {
    let without_aux: String = FULL_CONFIG
        .lines()
        .take_while(|line| !line.contains("[axes.a1]"))
        .collect::<Vec<_>>()
        .join("\n");

    let config = parse_config(&without_aux).expect("config without a1 should parse");
    assert!(config.axes.a1.is_none());
}

#[test]
fn derived_mechanics_from_parsed_config() {
    let config = parse_config(FULL_CONFIG).unwrap();
    let mech = lathe_motion::AxisMechanics::from_config(config.axis("z").unwrap());

    // 800 steps / 20000 du = 0.04 steps/du
    assert!((mech.steps_per_du - 0.04).abs() < 1e-9);
    // 100 du of backlash = 4 steps
    assert_eq!(mech.backlash_steps, 4);
    assert_eq!(mech.du_to_steps(Du(20_000)).0, 800);
}
