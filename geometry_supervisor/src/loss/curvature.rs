//! Finite-difference curvature regularization.

use burn::prelude::*;

use crate::error::{Result, SupervisorError};

/// Number of offset samples taken around each point (±delta on x, y, z).
pub const SAMPLES_PER_POINT: usize = 6;

/// Compute curvature loss from precomputed SDF samples.
///
/// For each axis the second derivative is approximated by
/// `(f(x+δ) + f(x-δ) - 2f(x)) / δ²` and the loss is the mean absolute value
/// over axes and points, scaled by `multi_factor`.
///
/// Inputs:
/// - sdf: [batch, points, 1] - SDF at the sample points
/// - sampled_sdf: `batch * points * 6` values, ordered (axis, sign) per point
/// - delta: offset used to take the samples
///
/// Output: scalar loss
pub fn curvature_loss<B: Backend>(
    sdf: Tensor<B, 3>,
    sampled_sdf: Tensor<B, 3>,
    delta: f32,
    multi_factor: f32,
) -> Result<Tensor<B, 1>> {
    let [batch, points, channels] = sdf.dims();
    if channels != 1 {
        return Err(SupervisorError::shape("sdf", &[batch, points, 1], &sdf.dims()));
    }
    if sampled_sdf.shape().num_elements() != batch * points * SAMPLES_PER_POINT {
        return Err(SupervisorError::shape(
            "sampled_sdf",
            &[batch, points, SAMPLES_PER_POINT],
            &sampled_sdf.dims(),
        ));
    }
    if delta <= 0.0 || !delta.is_finite() {
        return Err(SupervisorError::InvalidConfig {
            message: format!("finite_diff_delta must be positive, got {}", delta),
        });
    }

    let surrounding: Tensor<B, 4> = sampled_sdf.reshape([batch, points, 3, 2]);
    let pair_sum: Tensor<B, 3> = surrounding.sum_dim(3).reshape([batch, points, 3]);
    let center = sdf.repeat_dim(2, 3);

    let inv_delta2 = 1.0 / (delta * delta);
    let curvature = (pair_sum - center.mul_scalar(2.0)).mul_scalar(inv_delta2);

    Ok(curvature.abs().mean().mul_scalar(multi_factor))
}
