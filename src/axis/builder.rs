//! Builder pattern for Axis.

use crate::config::units::Steps;
use crate::config::AxisConfig;
use crate::error::Result;
use crate::hal::AxisDriver;

use super::engine::Axis;

/// Builder for creating [`Axis`] instances from configuration plus a driver,
/// with optional initial soft limits.
pub struct AxisBuilder<'a, D>
where
    D: AxisDriver,
{
    config: &'a AxisConfig,
    driver: Option<D>,
    left_stop: Option<Steps>,
    right_stop: Option<Steps>,
}

impl<'a, D> AxisBuilder<'a, D>
where
    D: AxisDriver,
{
    /// Create a builder over an axis configuration.
    pub fn from_config(config: &'a AxisConfig) -> Self {
        Self {
            config,
            driver: None,
            left_stop: None,
            right_stop: None,
        }
    }

    /// Set the axis driver.
    pub fn driver(mut self, driver: D) -> Self {
        self.driver = Some(driver);
        self
    }

    /// Set an initial left (upper) soft limit.
    pub fn left_stop(mut self, stop: Steps) -> Self {
        self.left_stop = Some(stop);
        self
    }

    /// Set an initial right (lower) soft limit.
    pub fn right_stop(mut self, stop: Steps) -> Self {
        self.right_stop = Some(stop);
        self
    }

    /// Build the axis.
    ///
    /// # Panics
    ///
    /// Panics if no driver was provided; the driver is the one mandatory
    /// input a configuration cannot supply.
    pub fn build(self) -> Result<Axis<D>> {
        let driver = self.driver.expect("AxisBuilder requires a driver");
        let axis = Axis::new(self.config, driver)?;
        if let Some(stop) = self.left_stop {
            axis.set_left_stop(Some(stop))?;
        }
        if let Some(stop) = self.right_stop {
            axis.set_right_stop(Some(stop))?;
        }
        Ok(axis)
    }
}
