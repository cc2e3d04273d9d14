//! Hardware capability traits.
//!
//! The motion core never touches peripherals directly. Each target platform
//! implements these traits once; [`sim`] implements them against plain memory
//! so the whole core runs deterministically on a host.

pub mod sim;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use crate::error::{AxisError, Error, Result};

/// Microsecond clock.
///
/// The same clock instance must be used for every tick; the core only ever
/// diffs values, so the epoch is arbitrary.
pub trait Clock {
    /// Current time in microseconds.
    fn now_us(&self) -> u64;
}

/// Hardware quadrature pulse counter for the spindle encoder.
///
/// The counter is free-running and wraps at a hardware limit; the spindle
/// tracker shadows the last raw value and clears the counter before it
/// reaches the wrap boundary.
pub trait PulseCounter {
    /// Read the current raw counter value.
    fn read(&mut self) -> i32;

    /// Clear the counter to zero.
    fn clear(&mut self);
}

/// Step/direction/enable driver for one stepper axis.
///
/// Implementations own electrical details: pulse width, direction setup time
/// and signal polarity. One call to [`AxisDriver::step`] is one full step
/// pulse.
pub trait AxisDriver {
    /// Set the direction output. `forward` is the positive step direction.
    fn set_direction(&mut self, forward: bool) -> Result<()>;

    /// Emit one step pulse.
    fn step(&mut self) -> Result<()>;

    /// Assert or de-assert the driver enable output.
    fn set_enabled(&mut self, enabled: bool) -> Result<()>;
}

/// Wall clock backed by `std::time::Instant`.
#[derive(Debug, Clone)]
pub struct StdClock {
    created_at: std::time::Instant,
}

impl StdClock {
    /// Create a clock with its epoch at the call instant.
    pub fn new() -> Self {
        Self {
            created_at: std::time::Instant::now(),
        }
    }
}

impl Default for StdClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for StdClock {
    fn now_us(&self) -> u64 {
        self.created_at.elapsed().as_micros() as u64
    }
}

/// Step pulse width in microseconds.
const STEP_PULSE_US: u32 = 2;

/// Settling time between a direction change and the next step pulse.
const DIRECTION_SETUP_US: u32 = 5;

/// [`AxisDriver`] over embedded-hal 1.0 STEP/DIR/ENA output pins.
///
/// STEP idles high and pulses low, matching common opto-isolated driver
/// inputs. Direction polarity is selectable for mirrored installations.
pub struct StepDirPins<STEP, DIR, ENA, DELAY>
where
    STEP: OutputPin,
    DIR: OutputPin,
    ENA: OutputPin,
    DELAY: DelayNs,
{
    step_pin: STEP,
    dir_pin: DIR,
    ena_pin: ENA,
    delay: DELAY,
    invert_direction: bool,
}

impl<STEP, DIR, ENA, DELAY> StepDirPins<STEP, DIR, ENA, DELAY>
where
    STEP: OutputPin,
    DIR: OutputPin,
    ENA: OutputPin,
    DELAY: DelayNs,
{
    /// Create a pin adapter. The STEP pin is driven to its idle (high) level.
    pub fn new(
        mut step_pin: STEP,
        dir_pin: DIR,
        ena_pin: ENA,
        delay: DELAY,
        invert_direction: bool,
    ) -> Self {
        let _ = step_pin.set_high();
        Self {
            step_pin,
            dir_pin,
            ena_pin,
            delay,
            invert_direction,
        }
    }

    /// Release the pins.
    pub fn into_parts(self) -> (STEP, DIR, ENA, DELAY) {
        (self.step_pin, self.dir_pin, self.ena_pin, self.delay)
    }
}

impl<STEP, DIR, ENA, DELAY> AxisDriver for StepDirPins<STEP, DIR, ENA, DELAY>
where
    STEP: OutputPin,
    DIR: OutputPin,
    ENA: OutputPin,
    DELAY: DelayNs,
{
    fn set_direction(&mut self, forward: bool) -> Result<()> {
        let pin_high = forward ^ self.invert_direction;
        if pin_high {
            self.dir_pin.set_high().map_err(|_| Error::Axis(AxisError::Pin))?;
        } else {
            self.dir_pin.set_low().map_err(|_| Error::Axis(AxisError::Pin))?;
        }
        // Let the direction signal settle in the driver before stepping.
        self.delay.delay_us(DIRECTION_SETUP_US);
        Ok(())
    }

    fn step(&mut self) -> Result<()> {
        self.step_pin.set_low().map_err(|_| Error::Axis(AxisError::Pin))?;
        self.delay.delay_us(STEP_PULSE_US);
        self.step_pin.set_high().map_err(|_| Error::Axis(AxisError::Pin))?;
        Ok(())
    }

    fn set_enabled(&mut self, enabled: bool) -> Result<()> {
        if enabled {
            self.ena_pin.set_high().map_err(|_| Error::Axis(AxisError::Pin))?;
        } else {
            self.ena_pin.set_low().map_err(|_| Error::Axis(AxisError::Pin))?;
        }
        Ok(())
    }
}
