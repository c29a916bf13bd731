//! Loss functions for geometry supervision.
//!
//! This module provides the numeric terms used on top of the primary
//! reconstruction loss:
//! - Eikonal loss: |∇SDF| should equal 1 everywhere
//! - Curvature loss: finite-difference second derivatives of the SDF
//! - Zip proposal loss: proposal distributions should bound the final weights
//! - Step-function helpers used by the proposal loss

mod curvature;
mod eikonal;
mod stepfun;
mod zip;

pub use curvature::{curvature_loss, SAMPLES_PER_POINT};
pub use eikonal::eikonal;
pub use stepfun::{blur_stepfun, cumsum, cumsum_with, diff, prefix_sum_matrix, sorted_interp_quad};
pub use zip::{lossfun_zip_outer, pulse_widths, PULSE_WIDTHS};

use burn::prelude::*;

/// Mean squared error between two tensors of the same shape.
pub fn mse<B: Backend, const D: usize>(pred: Tensor<B, D>, target: Tensor<B, D>) -> Tensor<B, 1> {
    let diff = pred - target;
    (diff.clone() * diff).mean()
}

/// Peak signal-to-noise ratio for signals in [0, 1], from an MSE value.
pub fn mse_to_psnr<B: Backend>(mse: Tensor<B, 1>) -> Tensor<B, 1> {
    mse.log().mul_scalar(-10.0 / std::f32::consts::LN_10)
}
