//! Eikonal regularization.

use burn::prelude::*;

/// Compute Eikonal loss.
///
/// L_eikonal = mean((|∇sdf| - threshold)²)
///
/// This regularizes the SDF to have unit gradient magnitude, which is a
/// necessary property of a valid signed distance function. The norm is taken
/// over the last axis, so `gradients` can be `[points, 3]` or
/// `[batch, points, 3]`.
///
/// Zero-length gradients get a norm of exactly 0 and no gradient through
/// the norm, so a single degenerate sample cannot turn the update into NaN.
///
/// Output: scalar loss
pub fn eikonal<B: Backend, const D: usize>(gradients: Tensor<B, D>, threshold: f32) -> Tensor<B, 1> {
    let grad_sq = gradients.clone() * gradients;
    let grad_mag = safe_norm(grad_sq.sum_dim(D - 1));

    let deviation = grad_mag.sub_scalar(threshold);
    let deviation_sq = deviation.clone() * deviation;

    deviation_sq.mean()
}

/// Square root of a squared norm with a zero derivative at 0.
fn safe_norm<B: Backend, const D: usize>(norm_sq: Tensor<B, D>) -> Tensor<B, D> {
    let zero = norm_sq.clone().equal_elem(0.0);
    norm_sq.clamp_min(f32::MIN_POSITIVE).sqrt().mask_fill(zero, 0.0)
}
