//! Step-function utilities for proposal sampling distributions.
//!
//! A step function is stored as interval edges `t` of shape `[rays, n + 1]`
//! and per-interval values `w` of shape `[rays, n]`. Edges are sorted along
//! the last axis.

use burn::prelude::*;

/// Upper-triangular ones matrix `[n, n]`, built on the device.
///
/// `upper[k, j] = 1` for `k <= j`, so `x @ upper` is the inclusive prefix
/// sum of each row of `x`. Memory and matmul cost are O(n²) in the number of
/// columns; callers summing several tensors of the same width should build
/// it once and use [`cumsum_with`].
pub fn prefix_sum_matrix<B: Backend>(n: usize, device: &B::Device) -> Tensor<B, 2> {
    let index = Tensor::<B, 1, Int>::arange(0..n as i64, device);
    let rows = index.clone().reshape([n, 1]).repeat_dim(1, n);
    let cols = index.reshape([1, n]).repeat_dim(0, n);

    rows.lower_equal(cols).float()
}

/// Inclusive prefix sum along the last axis using a prebuilt
/// [`prefix_sum_matrix`] of matching width.
pub fn cumsum_with<B: Backend>(x: Tensor<B, 2>, upper: &Tensor<B, 2>) -> Tensor<B, 2> {
    x.matmul(upper.clone())
}

/// Inclusive prefix sum along the last axis.
pub fn cumsum<B: Backend>(x: Tensor<B, 2>) -> Tensor<B, 2> {
    let [_, n] = x.dims();
    let upper = prefix_sum_matrix(n, &x.device());
    cumsum_with(x, &upper)
}

/// All but the first column.
pub fn drop_first<B: Backend>(x: Tensor<B, 2>) -> Tensor<B, 2> {
    let [rows, cols] = x.dims();
    x.slice([0..rows, 1..cols])
}

/// All but the last column.
pub fn drop_last<B: Backend>(x: Tensor<B, 2>) -> Tensor<B, 2> {
    let [rows, cols] = x.dims();
    x.slice([0..rows, 0..cols - 1])
}

/// Forward difference along the last axis: `x[:, 1:] - x[:, :-1]`.
pub fn diff<B: Backend>(x: Tensor<B, 2>) -> Tensor<B, 2> {
    drop_first(x.clone()) - drop_last(x)
}

/// Prepend a column of zeros.
fn pad_zero_front<B: Backend>(x: Tensor<B, 2>) -> Tensor<B, 2> {
    let [rows, _] = x.dims();
    let zeros = Tensor::zeros([rows, 1], &x.device());
    Tensor::cat(vec![zeros, x], 1)
}

/// Append a column of zeros.
fn pad_zero_back<B: Backend>(x: Tensor<B, 2>) -> Tensor<B, 2> {
    let [rows, _] = x.dims();
    let zeros = Tensor::zeros([rows, 1], &x.device());
    Tensor::cat(vec![x, zeros], 1)
}

/// Convolve a step function with a box filter of half-width `radius`.
///
/// Each jump of the step function becomes a linear ramp spanning
/// `[edge - radius, edge + radius]`, so the result is piecewise linear with
/// knots at the sorted `t ± radius`.
///
/// Inputs:
/// - t: [rays, n + 1] - interval edges
/// - w: [rays, n] - densities on each interval
///
/// Output: (knots [rays, 2n + 2], values [rays, 2n + 2])
pub fn blur_stepfun<B: Backend>(
    t: Tensor<B, 2>,
    w: Tensor<B, 2>,
    radius: f32,
) -> (Tensor<B, 2>, Tensor<B, 2>) {
    let [_, edges] = t.dims();
    let upper = prefix_sum_matrix(2 * edges - 1, &t.device());
    blur_stepfun_with(t, w, radius, &upper)
}

/// [`blur_stepfun`] with a caller-provided prefix-sum matrix of width
/// `2n + 1`, the number of intervals between the blurred knots.
pub(crate) fn blur_stepfun_with<B: Backend>(
    t: Tensor<B, 2>,
    w: Tensor<B, 2>,
    radius: f32,
    upper: &Tensor<B, 2>,
) -> (Tensor<B, 2>, Tensor<B, 2>) {
    let [rays, edges] = t.dims();

    let knots = Tensor::cat(vec![t.clone().sub_scalar(radius), t.add_scalar(radius)], 1);
    let (knots, order) = knots.sort_with_indices(1);

    // Slope change contributed by each jump, positive at the ramp start
    let jumps = (pad_zero_back(w.clone()) - pad_zero_front(w)).div_scalar(2.0 * radius);
    let slope_changes = Tensor::cat(vec![jumps.clone(), jumps.neg()], 1)
        .gather(1, order.slice([0..rays, 0..2 * edges - 1]));

    let slopes = cumsum_with(slope_changes, upper);
    let values = cumsum_with(diff(knots.clone()) * slopes, upper).clamp_min(0.0);

    (knots, pad_zero_front(values))
}

/// Integrate a piecewise-linear pdf at sorted query points.
///
/// `fpdf` holds the pdf at the knots `xp` and `fcdf` its running integral.
/// Queries outside `[xp[0], xp[-1]]` extend the first/last interval with the
/// pdf held constant.
///
/// Inputs:
/// - x: [rays, m] - query points
/// - xp, fpdf, fcdf: [rays, k]
///
/// Output: [rays, m]
pub fn sorted_interp_quad<B: Backend>(
    x: Tensor<B, 2>,
    xp: Tensor<B, 2>,
    fpdf: Tensor<B, 2>,
    fcdf: Tensor<B, 2>,
) -> Tensor<B, 2> {
    let [rays, queries] = x.dims();
    let [_, knots] = xp.dims();

    // Number of knots at or below each query
    let knots_exp = xp.clone().unsqueeze_dim::<3>(2).repeat_dim(2, queries);
    let queries_exp = x.clone().unsqueeze_dim::<3>(1).repeat_dim(1, knots);
    let below: Tensor<B, 2, Int> = knots_exp
        .lower_equal(queries_exp)
        .int()
        .sum_dim(1)
        .reshape([rays, queries]);

    let left = below.clone().sub_scalar(1).clamp_min(0);
    let right = below.clamp_max(knots as i64 - 1);

    let xp0 = xp.clone().gather(1, left.clone());
    let xp1 = xp.gather(1, right.clone());
    let fpdf0 = fpdf.clone().gather(1, left.clone());
    let fpdf1 = fpdf.gather(1, right);
    let fcdf0 = fcdf.gather(1, left);

    let span = xp1 - xp0.clone();
    let degenerate = span.clone().equal_elem(0.0);
    let offset = ((x.clone() - xp0.clone()) / span.mask_fill(degenerate.clone(), 1.0))
        .mask_fill(degenerate, 0.0)
        .clamp(0.0, 1.0);

    // Trapezoid between the left knot and the query
    let pdf_at_x = fpdf1 * offset.clone() + fpdf0.clone() * offset.neg().add_scalar(1.0);
    fcdf0 + (x - xp0) * (fpdf0 + pdf_at_x).div_scalar(2.0)
}
