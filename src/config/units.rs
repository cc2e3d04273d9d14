//! Unit types for physical quantities.
//!
//! Provides type-safe representations of positions, speeds and accelerations
//! to prevent unit confusion at compile time. The integer position unit used
//! throughout is the deci-micron (du, 0.0001 mm).

use core::ops::{Add, Neg, Sub};

use serde::{Deserialize, Serialize};

/// Linear position or distance in deci-microns (0.0001 mm).
///
/// Used for configuration and the user-facing API. Internally converted to
/// [`Steps`] through an axis's mechanics.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Du(pub i64);

impl Du {
    /// Create a new Du value.
    #[inline]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Get the raw value.
    #[inline]
    pub const fn value(self) -> i64 {
        self.0
    }

    /// Convert to millimeters (lossy, for display).
    #[inline]
    pub fn to_mm(self) -> f64 {
        self.0 as f64 / 10_000.0
    }

    /// Create from whole millimeters.
    #[inline]
    pub const fn from_mm(mm: i64) -> Self {
        Self(mm * 10_000)
    }
}

impl Add for Du {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Du {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl Neg for Du {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self(-self.0)
    }
}

/// Axis position in motor steps (absolute from origin).
///
/// Uses i64 for unlimited range in either direction.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Steps(pub i64);

impl Steps {
    /// Create a new Steps value.
    #[inline]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Get the raw value.
    #[inline]
    pub const fn value(self) -> i64 {
        self.0
    }

    /// Get absolute value as u64.
    #[inline]
    pub fn abs(self) -> u64 {
        self.0.unsigned_abs()
    }
}

impl Add for Steps {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Steps {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl Neg for Steps {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self(-self.0)
    }
}

/// Step rate in steps per second.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Deserialize)]
#[serde(transparent)]
pub struct StepsPerSec(pub f32);

impl StepsPerSec {
    /// Create a new StepsPerSec value.
    #[inline]
    pub const fn new(value: f32) -> Self {
        Self(value)
    }

    /// Get the raw value.
    #[inline]
    pub const fn value(self) -> f32 {
        self.0
    }

    /// Inter-step interval in microseconds at this rate.
    #[inline]
    pub fn interval_us(self) -> f32 {
        if self.0 > 0.0 {
            1_000_000.0 / self.0
        } else {
            f32::MAX
        }
    }
}

/// Step acceleration in steps per second squared.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Deserialize)]
#[serde(transparent)]
pub struct StepsPerSecSq(pub f32);

impl StepsPerSecSq {
    /// Create a new StepsPerSecSq value.
    #[inline]
    pub const fn new(value: f32) -> Self {
        Self(value)
    }

    /// Get the raw value.
    #[inline]
    pub const fn value(self) -> f32 {
        self.0
    }
}
