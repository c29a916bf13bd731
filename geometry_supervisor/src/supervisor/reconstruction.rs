//! Primary color reconstruction loss.

use burn::prelude::*;

use crate::config::ReconstructionSupervisorConfig;
use crate::error::{Result, SupervisorError};
use crate::loss::{mse, mse_to_psnr};
use crate::network::SdfNetwork;
use crate::render::{Batch, RenderOutput};
use crate::stats::{ImageStats, ScalarStats};

use super::Supervisor;

/// Supervises rendered colors against the ground-truth batch.
///
/// Records `img_loss` and `psnr` when both `rgb_map` and the target colors
/// are present and the weight is positive.
#[derive(Debug, Clone)]
pub struct ReconstructionSupervisor {
    img_loss_weight: f32,
}

impl ReconstructionSupervisor {
    /// Create a new reconstruction supervisor.
    pub fn new(config: &ReconstructionSupervisorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            img_loss_weight: config.img_loss_weight,
        })
    }

    /// Weight of the color term.
    pub fn img_loss_weight(&self) -> f32 {
        self.img_loss_weight
    }
}

impl<B: Backend> Supervisor<B> for ReconstructionSupervisor {
    fn compute_loss(
        &self,
        _network: &dyn SdfNetwork,
        output: &RenderOutput<B>,
        batch: &Batch<B>,
        loss: Tensor<B, 1>,
        scalar_stats: &mut ScalarStats<B>,
        _image_stats: &mut ImageStats<B>,
    ) -> Result<Tensor<B, 1>> {
        let mut loss = loss;

        if self.img_loss_weight <= 0.0 {
            return Ok(loss);
        }

        if let (Some(rgb_map), Some(rgb)) = (&output.rgb_map, &batch.rgb) {
            if rgb_map.dims() != rgb.dims() {
                return Err(SupervisorError::shape("rgb_map", &rgb.dims(), &rgb_map.dims()));
            }

            let img_loss = mse(rgb_map.clone(), rgb.clone());
            scalar_stats.insert("psnr", mse_to_psnr(img_loss.clone().detach()));
            scalar_stats.insert("img_loss", img_loss.clone());
            loss = loss + img_loss.mul_scalar(self.img_loss_weight);
        }

        Ok(loss)
    }
}
