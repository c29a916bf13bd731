//! Configuration types for geometry_supervisor.
//!
//! This module provides Burn-style configuration structs for the supervisors.

mod supervisor;

pub use supervisor::{GeometrySupervisorConfig, ReconstructionSupervisorConfig};
