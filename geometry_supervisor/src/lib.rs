//! # geometry_supervisor
//!
//! Geometry regularization for neural SDF radiance fields, built on Burn.
//!
//! A supervisor turns one forward pass into a training loss. This crate
//! provides a color reconstruction supervisor and a geometry supervisor that
//! layers SDF regularizers on top of it.
//!
//! ## Features
//!
//! - **Eikonal loss**: keeps |∇SDF| close to 1
//! - **Curvature loss**: finite-difference smoothness from offset SDF samples
//! - **Zip proposal loss**: anti-aliased interlevel loss for proposal sampling
//! - **Statistics**: per-term scalar statistics for logging
//!
//! ## Quick Start
//!
//! ```ignore
//! use geometry_supervisor::prelude::*;
//! use burn::backend::{Autodiff, NdArray};
//!
//! type MyBackend = Autodiff<NdArray>;
//!
//! let config = GeometrySupervisorConfig::default()
//!     .with_eikonal_loss_weight(0.1)
//!     .with_curvature_loss_weight(5e-4);
//! let supervisor = GeometrySupervisor::new(&config)?;
//!
//! let output: RenderOutput<MyBackend> = network.render(&batch);
//! let step = supervisor.supervise(&network_state, &output, &batch, &device)?;
//! step.scalar_stats.log("train");
//! let grads = step.loss.backward();
//! ```
//!
//! ## Feature Flags
//!
//! - `std` (default): Standard library support
//! - `ndarray` (default): CPU backend using ndarray
//! - `wgpu`: GPU acceleration via WebGPU

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod loss;
pub mod network;
pub mod render;
pub mod stats;
pub mod supervisor;

// Re-export key types for convenience
pub use config::{GeometrySupervisorConfig, ReconstructionSupervisorConfig};
pub use error::{Result, SupervisorError};
pub use network::{FiniteDiffState, SdfNetwork};
pub use render::{Batch, RenderOutput};
pub use stats::{ImageStats, ScalarStats, StatsSummary, StatsTracker, SupervisorOutput};
pub use supervisor::{GeometrySupervisor, ReconstructionSupervisor, Supervisor};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::config::{GeometrySupervisorConfig, ReconstructionSupervisorConfig};
    pub use crate::error::{Result, SupervisorError};
    pub use crate::loss::{
        blur_stepfun, curvature_loss, eikonal, lossfun_zip_outer, pulse_widths,
        sorted_interp_quad, PULSE_WIDTHS,
    };
    pub use crate::network::{FiniteDiffState, SdfNetwork};
    pub use crate::render::{Batch, RenderOutput};
    pub use crate::stats::{ImageStats, ScalarStats, StatsSummary, StatsTracker, SupervisorOutput};
    pub use crate::supervisor::{GeometrySupervisor, ReconstructionSupervisor, Supervisor};
}
