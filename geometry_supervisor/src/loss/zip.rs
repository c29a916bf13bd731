//! Anti-aliased interlevel loss between proposal and final distributions.

use burn::prelude::*;

use crate::error::{Result, SupervisorError};

use super::stepfun::{
    blur_stepfun_with, cumsum_with, diff, drop_first, drop_last, prefix_sum_matrix,
    sorted_interp_quad,
};

/// Pulse width used for each proposal level, coarsest first.
pub const PULSE_WIDTHS: [f32; 3] = [0.03, 0.003, 0.0003];

const EPS: f32 = 1e-6;

/// Pulse widths for `levels` proposal levels.
///
/// Fails with `TooManyProposalLevels` when there are more levels than
/// entries in [`PULSE_WIDTHS`].
pub fn pulse_widths(levels: usize) -> Result<&'static [f32]> {
    PULSE_WIDTHS
        .get(..levels)
        .ok_or(SupervisorError::TooManyProposalLevels {
            levels,
            max: PULSE_WIDTHS.len(),
        })
}

/// Check that `edges` and `values` describe a batch of step functions.
fn check_stepfun<B: Backend>(
    context: &'static str,
    edges: &Tensor<B, 2>,
    values: &Tensor<B, 2>,
) -> Result<()> {
    let [rays, num_edges] = edges.dims();
    if num_edges < 2 || values.dims() != [rays, num_edges - 1] {
        return Err(SupervisorError::shape(
            context,
            &[rays, num_edges.saturating_sub(1)],
            &values.dims(),
        ));
    }
    Ok(())
}

/// Compute the zip interlevel loss of one proposal level.
///
/// The target step function `(t, w)` is turned into a density, blurred with
/// a box of half-width `pulse_width`, and integrated into a piecewise
/// quadratic CDF. Resampling that CDF at the proposal edges gives the mass
/// the target puts in each proposal interval; proposal weights that fall
/// short of it are penalized:
///
/// L = mean(max(0, w_s - w_env)² / (w_env + eps))
///
/// Gradient only flows to the proposal; callers pass detached targets.
///
/// Inputs:
/// - t, w: [rays, n + 1], [rays, n] - final interval edges and weights
/// - t_env, w_env: [rays, m + 1], [rays, m] - proposal edges and weights
///
/// Output: scalar loss
pub fn lossfun_zip_outer<B: Backend>(
    t: Tensor<B, 2>,
    w: Tensor<B, 2>,
    t_env: Tensor<B, 2>,
    w_env: Tensor<B, 2>,
    pulse_width: f32,
) -> Result<Tensor<B, 1>> {
    check_stepfun("weights", &t, &w)?;
    check_stepfun("weights_prop", &t_env, &w_env)?;
    if t_env.dims()[0] != t.dims()[0] {
        return Err(SupervisorError::shape(
            "s_vals_prop",
            &[t.dims()[0], t_env.dims()[1]],
            &t_env.dims(),
        ));
    }
    if pulse_width <= 0.0 {
        return Err(SupervisorError::InvalidConfig {
            message: format!("pulse_width must be positive, got {}", pulse_width),
        });
    }

    let density = w / diff(t.clone()).clamp_min(EPS);

    // The blur and the cdf all sum over the 2n + 1 gaps between knots
    let [_, edges] = t.dims();
    let upper = prefix_sum_matrix(2 * edges - 1, &t.device());

    let (knots, pdf) = blur_stepfun_with(t, density, pulse_width, &upper);
    let pdf = pdf.clamp_min(0.0);

    // Piecewise linear pdf -> piecewise quadratic cdf
    let area = (drop_first(pdf.clone()) + drop_last(pdf.clone())).mul_scalar(0.5)
        * diff(knots.clone());
    let [rays, _] = area.dims();
    let cdf = Tensor::cat(
        vec![Tensor::zeros([rays, 1], &area.device()), cumsum_with(area, &upper)],
        1,
    );

    let cdf_env = sorted_interp_quad(t_env, knots, pdf, cdf);
    let w_s = diff(cdf_env);

    let excess = (w_s - w_env.clone()).clamp_min(0.0);
    Ok((excess.clone() * excess / w_env.add_scalar(EPS)).mean())
}
