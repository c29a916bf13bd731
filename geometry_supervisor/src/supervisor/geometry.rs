//! SDF geometry regularization on top of a base supervisor.

use burn::prelude::*;
use burn::tensor::ElementConversion;

use crate::config::GeometrySupervisorConfig;
use crate::error::{Result, SupervisorError};
use crate::loss::{curvature_loss, eikonal, lossfun_zip_outer, pulse_widths};
use crate::network::SdfNetwork;
use crate::render::{Batch, RenderOutput};
use crate::stats::{ImageStats, ScalarStats};

use super::{ReconstructionSupervisor, Supervisor};

/// Adds Eikonal, curvature and zip proposal terms to a base supervisor's loss.
///
/// Each term is gated independently: it runs only when its weight is
/// positive and the render output carries its inputs. An active term adds
/// `weight * value` to the loss and records the unweighted value in the
/// scalar statistics under `eikonal_loss`, `curvature_loss` or
/// `zip_prop_loss`.
#[derive(Debug, Clone)]
pub struct GeometrySupervisor<S> {
    base: S,
    eikonal_loss_weight: f32,
    zip_prop_loss_weight: f32,
    curvature_loss_weight: f32,
}

impl GeometrySupervisor<ReconstructionSupervisor> {
    /// Create a geometry supervisor over the default reconstruction loss.
    pub fn new(config: &GeometrySupervisorConfig) -> Result<Self> {
        let base = ReconstructionSupervisor::new(&config.base)?;
        Self::with_base(base, config)
    }
}

impl<S> GeometrySupervisor<S> {
    /// Wrap an existing supervisor. `config.base` is ignored.
    pub fn with_base(base: S, config: &GeometrySupervisorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            base,
            eikonal_loss_weight: config.eikonal_loss_weight,
            zip_prop_loss_weight: config.zip_prop_loss_weight,
            curvature_loss_weight: config.curvature_loss_weight,
        })
    }

    /// The wrapped supervisor.
    pub fn base(&self) -> &S {
        &self.base
    }

    /// Weight of the Eikonal term.
    pub fn eikonal_loss_weight(&self) -> f32 {
        self.eikonal_loss_weight
    }

    /// Weight of the zip proposal term.
    pub fn zip_prop_loss_weight(&self) -> f32 {
        self.zip_prop_loss_weight
    }

    /// Weight of the curvature term.
    pub fn curvature_loss_weight(&self) -> f32 {
        self.curvature_loss_weight
    }

    /// Eikonal term, if active.
    pub fn eikonal_term<B: Backend>(&self, output: &RenderOutput<B>) -> Option<Tensor<B, 1>> {
        if self.eikonal_loss_weight <= 0.0 {
            return None;
        }
        let gradients = output.gradients.as_ref()?;
        Some(eikonal(gradients.clone(), 1.0))
    }

    /// Curvature term, if active.
    pub fn curvature_term<B: Backend>(
        &self,
        network: &dyn SdfNetwork,
        output: &RenderOutput<B>,
    ) -> Result<Option<Tensor<B, 1>>> {
        if self.curvature_loss_weight <= 0.0 {
            return Ok(None);
        }
        let Some(sampled_sdf) = &output.sampled_sdf else {
            return Ok(None);
        };
        let sdf = output
            .sdf
            .as_ref()
            .ok_or(SupervisorError::MissingField { field: "sdf" })?;

        curvature_loss(
            sdf.clone(),
            sampled_sdf.clone(),
            network.finite_diff_delta(),
            network.curvature_loss_multi_factor(),
        )
        .map(Some)
    }

    /// Zip proposal term summed over proposal levels, if active.
    ///
    /// The final `s_vals`/`weights` are detached so the term only trains
    /// the proposal networks.
    pub fn zip_prop_term<B: Backend>(
        &self,
        output: &RenderOutput<B>,
    ) -> Result<Option<Tensor<B, 1>>> {
        if self.zip_prop_loss_weight <= 0.0
            || output.s_vals_prop.is_empty()
            || output.weights_prop.is_empty()
        {
            return Ok(None);
        }
        let (Some(s_vals), Some(weights)) = (&output.s_vals, &output.weights) else {
            return Ok(None);
        };

        let levels = output.s_vals_prop.len();
        if output.weights_prop.len() != levels {
            return Err(SupervisorError::ProposalLevelMismatch {
                s_vals: levels,
                weights: output.weights_prop.len(),
            });
        }
        let widths = pulse_widths(levels)?;

        let t = flatten_rays(s_vals.clone().detach());
        let w = flatten_rays(weights.clone().detach());

        let mut total: Option<Tensor<B, 1>> = None;
        for ((s_prop, w_prop), &pulse_width) in output
            .s_vals_prop
            .iter()
            .zip(&output.weights_prop)
            .zip(widths)
        {
            let level = lossfun_zip_outer(
                t.clone(),
                w.clone(),
                flatten_rays(s_prop.clone()),
                flatten_rays(w_prop.clone()),
                pulse_width,
            )?;
            total = Some(match total {
                Some(acc) => acc + level,
                None => level,
            });
        }

        Ok(total)
    }
}

/// Merge the batch and ray axes: `[batch, rays, n]` -> `[batch * rays, n]`.
fn flatten_rays<B: Backend>(x: Tensor<B, 3>) -> Tensor<B, 2> {
    let [batch, rays, n] = x.dims();
    x.reshape([batch * rays, n])
}

/// Record a term and add it to the loss with its weight.
fn accumulate<B: Backend>(
    loss: Tensor<B, 1>,
    name: &'static str,
    value: Tensor<B, 1>,
    weight: f32,
    scalar_stats: &mut ScalarStats<B>,
) -> Tensor<B, 1> {
    if log::log_enabled!(log::Level::Debug) {
        log::debug!(
            "{} = {:.6} (weight {})",
            name,
            value.clone().into_scalar().elem::<f32>(),
            weight
        );
    }
    scalar_stats.insert(name, value.clone());
    loss + value.mul_scalar(weight)
}

impl<B: Backend, S: Supervisor<B>> Supervisor<B> for GeometrySupervisor<S> {
    fn compute_loss(
        &self,
        network: &dyn SdfNetwork,
        output: &RenderOutput<B>,
        batch: &Batch<B>,
        loss: Tensor<B, 1>,
        scalar_stats: &mut ScalarStats<B>,
        image_stats: &mut ImageStats<B>,
    ) -> Result<Tensor<B, 1>> {
        let mut loss = self
            .base
            .compute_loss(network, output, batch, loss, scalar_stats, image_stats)?;

        match self.eikonal_term(output) {
            Some(value) => {
                loss = accumulate(loss, "eikonal_loss", value, self.eikonal_loss_weight, scalar_stats);
            }
            None => log::trace!("eikonal term skipped"),
        }

        match self.curvature_term(network, output)? {
            Some(value) => {
                loss = accumulate(
                    loss,
                    "curvature_loss",
                    value,
                    self.curvature_loss_weight,
                    scalar_stats,
                );
            }
            None => log::trace!("curvature term skipped"),
        }

        match self.zip_prop_term(output)? {
            Some(value) => {
                loss = accumulate(
                    loss,
                    "zip_prop_loss",
                    value,
                    self.zip_prop_loss_weight,
                    scalar_stats,
                );
            }
            None => log::trace!("zip proposal term skipped"),
        }

        Ok(loss)
    }
}
