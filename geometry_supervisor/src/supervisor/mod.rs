//! Supervisors turn a forward pass into a training loss.
//!
//! This module provides:
//! - `Supervisor`: the per-step loss contract
//! - `ReconstructionSupervisor`: primary color reconstruction loss
//! - `GeometrySupervisor`: SDF regularization layered on another supervisor

mod geometry;
mod reconstruction;

pub use geometry::GeometrySupervisor;
pub use reconstruction::ReconstructionSupervisor;

use burn::prelude::*;

use crate::error::Result;
use crate::network::SdfNetwork;
use crate::render::{Batch, RenderOutput};
use crate::stats::{ImageStats, ScalarStats, SupervisorOutput};

/// A loss contributor invoked once per training step after the forward pass.
pub trait Supervisor<B: Backend> {
    /// Add this supervisor's terms to `loss`.
    ///
    /// Implementations record one entry in `scalar_stats` per term they add
    /// and never modify `batch`.
    fn compute_loss(
        &self,
        network: &dyn SdfNetwork,
        output: &RenderOutput<B>,
        batch: &Batch<B>,
        loss: Tensor<B, 1>,
        scalar_stats: &mut ScalarStats<B>,
        image_stats: &mut ImageStats<B>,
    ) -> Result<Tensor<B, 1>>;

    /// Run a full supervision step starting from a zero loss.
    ///
    /// The final total is also recorded as the `loss` statistic.
    fn supervise(
        &self,
        network: &dyn SdfNetwork,
        output: &RenderOutput<B>,
        batch: &Batch<B>,
        device: &B::Device,
    ) -> Result<SupervisorOutput<B>> {
        let mut scalar_stats = ScalarStats::new();
        let mut image_stats = ImageStats::new();

        let loss = self.compute_loss(
            network,
            output,
            batch,
            Tensor::zeros([1], device),
            &mut scalar_stats,
            &mut image_stats,
        )?;
        scalar_stats.insert("loss", loss.clone());

        Ok(SupervisorOutput {
            loss,
            scalar_stats,
            image_stats,
        })
    }
}
