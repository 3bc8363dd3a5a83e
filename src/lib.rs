//! # motion-kernel
//!
//! Look-ahead motion planner and interrupt-driven stepper executor for 3D
//! printers and CNC machines.
//!
//! ## Features
//!
//! - **Look-ahead planning**: Junction speeds from jerk limits, re-planned over the whole queue on every move
//! - **Trapezoid execution**: Bresenham multi-axis stepping with 1x/2x/4x step batching
//! - **Lock-free queue**: Fixed-capacity single-producer single-consumer ring shared with the interrupt
//! - **Kinematics**: Cartesian, CoreXY/XZ/YZ and linear delta
//! - **Pressure advance**: Optional extra extruder steps proportional to E speed
//! - **no_std compatible**: Core library works without standard library
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use motion_kernel::{
//!     AxisVector, BlockQueue, Planner, PlannerSettings, StdCriticalSection,
//!     StepperExecutor, StepperSettings,
//! };
//!
//! let config = motion_kernel::load_config("machine.toml")?;
//!
//! let mut queue: BlockQueue<StdCriticalSection, 16> = BlockQueue::new(StdCriticalSection::new());
//! let (producer, consumer) = queue.split();
//!
//! let mut planner = Planner::new(producer, PlannerSettings::from_config(&config), hooks);
//! let mut executor = StepperExecutor::new(consumer, hal, StepperSettings::from_config(&config));
//!
//! planner.buffer_line(AxisVector::new(10.0, 0.0, 0.0, 0.0), 50.0, 0);
//!
//! // From the step timer interrupt:
//! executor.on_tick()?;
//! ```
//!
//! ## Feature Flags
//!
//! - `std` (default): Enables file I/O, TOML parsing and [`StdCriticalSection`]
//! - `alloc`: Enables heap allocation for no_std with allocator
//! - `defmt`: Enables defmt logging for embedded targets

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]
// Allow large error types - necessary for no_std with heapless strings
#![allow(clippy::result_large_err)]

#[cfg(feature = "alloc")]
extern crate alloc;

// Must come first so the logging macros are visible everywhere.
#[macro_use]
mod fmt;

// Core modules
pub mod config;
pub mod error;
pub mod kinematics;
pub mod motion;
pub mod motor;
pub mod planner;

// Re-exports for ergonomic API
pub use config::{validate_config, MachineConfig, PlannerSettings, StepperSettings};
pub use error::{Error, Result};
pub use kinematics::{Axis, AxisVector, DeltaGeometry, Kinematics};
pub use motion::{MotionPhase, StepperExecutor, TrapezoidProfile};
pub use motor::{Actuator, NoHooks, PinDriver, PlannerHooks, StepperHal};
pub use planner::{BedMesh, Block, BlockQueue, CriticalSection, Planner};

#[cfg(feature = "std")]
pub use planner::StdCriticalSection;

// Configuration loading (std only)
#[cfg(feature = "std")]
pub use config::{load_config, parse_config};

// Unit types
pub use config::units::{FlowPercentage, Steps};
