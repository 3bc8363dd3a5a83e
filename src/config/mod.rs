//! Configuration module for motion-kernel.
//!
//! Provides types for loading and validating the machine configuration from
//! TOML files (with `std` feature) or pre-built values, and the immutable
//! runtime snapshots derived from it.

mod axis;
mod machine;
mod settings;
pub mod units;
#[cfg(feature = "std")]
mod loader;
mod validation;

pub use axis::{AxesConfig, AxisConfig};
pub use machine::{AdvanceConfig, MachineConfig, MotionConfig, StepperConfig};
pub use settings::{PlannerSettings, StepperSettings};
pub use validation::validate_config;

#[cfg(feature = "std")]
pub use loader::{load_config, parse_config};

// Re-export unit types at config level
pub use units::{FlowPercentage, MmPerSec, MmPerSecSquared, Steps, StepsPerMm};
