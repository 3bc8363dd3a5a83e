//! Unit types for physical quantities.
//!
//! Provides type-safe representations of lengths, feed rates, accelerations
//! and step resolutions to prevent unit confusion in configuration.

use serde::Deserialize;

use crate::error::MotionError;

/// Linear speed in millimeters per second.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Deserialize)]
#[serde(transparent)]
pub struct MmPerSec(pub f32);

impl MmPerSec {
    /// Get the raw value.
    #[inline]
    pub const fn value(self) -> f32 {
        self.0
    }
}

/// Linear acceleration in millimeters per second squared.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Deserialize)]
#[serde(transparent)]
pub struct MmPerSecSquared(pub f32);

impl MmPerSecSquared {
    /// Get the raw value.
    #[inline]
    pub const fn value(self) -> f32 {
        self.0
    }
}

/// Actuator resolution in steps per millimeter of travel.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Deserialize)]
#[serde(transparent)]
pub struct StepsPerMm(pub f32);

impl StepsPerMm {
    /// Get the raw value.
    #[inline]
    pub const fn value(self) -> f32 {
        self.0
    }
}

/// Actuator position in steps.
///
/// 32-bit to match the width of the executor's step counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Steps(pub i32);

impl Steps {
    /// Get the raw value.
    #[inline]
    pub const fn value(self) -> i32 {
        self.0
    }

    /// Create from millimeters, rounding half away from zero.
    #[inline]
    pub fn from_mm(mm: f32, steps_per_mm: f32) -> Self {
        Self(libm::roundf(mm * steps_per_mm) as i32)
    }
}

/// Extrusion flow override in percent (1..=1000).
///
/// Validated at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowPercentage(u16);

impl FlowPercentage {
    /// Nominal flow.
    pub const NOMINAL: Self = Self(100);

    /// Largest accepted override.
    const MAX: u16 = 1000;

    /// Create a new FlowPercentage with validation.
    ///
    /// # Errors
    ///
    /// Returns `MotionError::InvalidFlowPercentage` outside 1..=1000.
    pub fn new(value: u16) -> Result<Self, MotionError> {
        if (1..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(MotionError::InvalidFlowPercentage(value))
        }
    }

    /// Get the raw percentage.
    #[inline]
    pub const fn value(self) -> u16 {
        self.0
    }

    /// Get the multiplier applied to E steps.
    #[inline]
    pub fn factor(self) -> f32 {
        self.0 as f32 * 0.01
    }
}

impl Default for FlowPercentage {
    fn default() -> Self {
        Self::NOMINAL
    }
}

impl<'de> Deserialize<'de> for FlowPercentage {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use core::fmt::Write;
        let value = u16::deserialize(deserializer)?;
        FlowPercentage::new(value).map_err(|e| {
            let mut buf = heapless::String::<128>::new();
            let _ = write!(buf, "{}", e);
            serde::de::Error::custom(buf.as_str())
        })
    }
}
