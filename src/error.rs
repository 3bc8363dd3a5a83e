//! Error types for motion-kernel.
//!
//! Motion submission has no error channel: degenerate moves are dropped and a
//! full queue blocks the caller. These types cover configuration loading,
//! runtime setters and pin faults raised inside the stepper interrupt.

use core::fmt;

use crate::kinematics::Axis;

/// Result type alias using the library's Error type.
pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for all motion-kernel operations.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Configuration parsing or validation error
    Config(ConfigError),
    /// Pin or hardware operation error
    Motor(MotorError),
    /// Runtime motion setting error
    Motion(MotionError),
}

/// Configuration-related errors.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Failed to parse TOML configuration
    ParseError(heapless::String<128>),
    /// Steps per mm must be > 0
    InvalidStepsPerMm {
        /// Offending axis
        axis: Axis,
        /// Configured value
        value: f32,
    },
    /// Max feed rate must be > 0
    InvalidMaxFeedrate {
        /// Offending axis
        axis: Axis,
        /// Configured value
        value: f32,
    },
    /// Max acceleration must be > 0
    InvalidMaxAcceleration {
        /// Offending axis
        axis: Axis,
        /// Configured value
        value: f32,
    },
    /// Default acceleration (print, retract or travel) must be > 0
    InvalidAcceleration(f32),
    /// Jerk limits must be >= 0
    InvalidJerk(f32),
    /// Minimum planner speed must be > 0
    InvalidMinimumPlannerSpeed(f32),
    /// Extruder count must be 1..=MAX_EXTRUDERS
    InvalidExtruderCount(u8),
    /// Timer frequency cannot represent the configured step rates
    InvalidTimerFrequency(u32),
    /// Step rate range is empty (min must be < max)
    InvalidStepRates {
        /// Minimum step rate
        min: u32,
        /// Maximum step rate
        max: u32,
    },
    /// Delta geometry is not physically possible
    InvalidDeltaGeometry {
        /// Diagonal rod length in mm
        diagonal_rod: f32,
        /// Tower radius in mm
        radius: f32,
    },
    /// Bed mesh grid is too small, too large or has a non-positive spacing
    InvalidMeshGrid {
        /// Points along X
        points_x: usize,
        /// Points along Y
        points_y: usize,
    },
    /// File I/O error (std only)
    #[cfg(feature = "std")]
    IoError(heapless::String<128>),
}

/// Pin and hardware errors.
#[derive(Debug, Clone, PartialEq)]
pub enum MotorError {
    /// Pin operation failed
    PinError,
    /// Actuator has no pins bound in the driver
    UnboundActuator(u8),
}

/// Runtime motion setting errors.
#[derive(Debug, Clone, PartialEq)]
pub enum MotionError {
    /// Extruder index is outside the configured extruder count
    InvalidExtruder(u8),
    /// Flow percentage must be 1..=1000
    InvalidFlowPercentage(u16),
    /// Volumetric multiplier must be > 0
    InvalidVolumetricMultiplier(f32),
    /// Bed mesh Z value count does not match its grid
    MeshSizeMismatch {
        /// Points required by the grid
        expected: usize,
        /// Points supplied
        got: usize,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(e) => write!(f, "Configuration error: {}", e),
            Error::Motor(e) => write!(f, "Motor error: {}", e),
            Error::Motion(e) => write!(f, "Motion error: {}", e),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            ConfigError::InvalidStepsPerMm { axis, value } => {
                write!(f, "Invalid steps/mm for {:?}: {}. Must be > 0", axis, value)
            }
            ConfigError::InvalidMaxFeedrate { axis, value } => {
                write!(f, "Invalid max feed rate for {:?}: {}. Must be > 0", axis, value)
            }
            ConfigError::InvalidMaxAcceleration { axis, value } => {
                write!(f, "Invalid max acceleration for {:?}: {}. Must be > 0", axis, value)
            }
            ConfigError::InvalidAcceleration(v) => write!(f, "Invalid acceleration: {}. Must be > 0", v),
            ConfigError::InvalidJerk(v) => write!(f, "Invalid jerk limit: {}. Must be >= 0", v),
            ConfigError::InvalidMinimumPlannerSpeed(v) => {
                write!(f, "Invalid minimum planner speed: {}. Must be > 0", v)
            }
            ConfigError::InvalidExtruderCount(v) => write!(f, "Invalid extruder count: {}", v),
            ConfigError::InvalidTimerFrequency(v) => write!(f, "Invalid timer frequency: {} Hz", v),
            ConfigError::InvalidStepRates { min, max } => {
                write!(f, "Invalid step rates: min ({}) must be < max ({})", min, max)
            }
            ConfigError::InvalidDeltaGeometry { diagonal_rod, radius } => write!(
                f,
                "Invalid delta geometry: diagonal rod {} must exceed radius {}",
                diagonal_rod, radius
            ),
            ConfigError::InvalidMeshGrid { points_x, points_y } => {
                write!(f, "Invalid bed mesh grid: {}x{}", points_x, points_y)
            }
            #[cfg(feature = "std")]
            ConfigError::IoError(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl fmt::Display for MotorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MotorError::PinError => write!(f, "GPIO pin operation failed"),
            MotorError::UnboundActuator(index) => write!(f, "No pins bound for actuator {}", index),
        }
    }
}

impl fmt::Display for MotionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MotionError::InvalidExtruder(e) => write!(f, "Extruder {} is not configured", e),
            MotionError::InvalidFlowPercentage(v) => {
                write!(f, "Invalid flow percentage: {}. Must be 1-1000", v)
            }
            MotionError::InvalidVolumetricMultiplier(v) => {
                write!(f, "Invalid volumetric multiplier: {}. Must be > 0", v)
            }
            MotionError::MeshSizeMismatch { expected, got } => {
                write!(f, "Bed mesh expects {} points, got {}", expected, got)
            }
        }
    }
}

// Conversion impls
impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl From<MotorError> for Error {
    fn from(e: MotorError) -> Self {
        Error::Motor(e)
    }
}

impl From<MotionError> for Error {
    fn from(e: MotionError) -> Self {
        Error::Motion(e)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

#[cfg(feature = "std")]
impl std::error::Error for MotorError {}

#[cfg(feature = "std")]
impl std::error::Error for MotionError {}
