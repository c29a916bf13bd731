//! Forward-pass output bundle and ground-truth batch.

use burn::prelude::*;

/// Tensors produced by one forward pass of the volumetric renderer.
///
/// Every field is optional: which ones are filled depends on the network
/// and renderer configuration. Supervisors skip the terms whose inputs are
/// absent.
#[derive(Debug, Clone)]
pub struct RenderOutput<B: Backend> {
    /// Rendered colors, `[batch, rays, 3]`.
    pub rgb_map: Option<Tensor<B, 3>>,
    /// SDF gradients at the sample points, `[batch, points, 3]`.
    pub gradients: Option<Tensor<B, 3>>,
    /// SDF at the sample points, `[batch, points, 1]`.
    pub sdf: Option<Tensor<B, 3>>,
    /// SDF at the six axis-aligned offsets around each point,
    /// `batch * points * 6` values ordered `(axis, sign)`.
    pub sampled_sdf: Option<Tensor<B, 3>>,
    /// Final sample interval edges, `[batch, rays, samples + 1]`.
    pub s_vals: Option<Tensor<B, 3>>,
    /// Final volume rendering weights, `[batch, rays, samples]`.
    pub weights: Option<Tensor<B, 3>>,
    /// Interval edges of each proposal level.
    pub s_vals_prop: Vec<Tensor<B, 3>>,
    /// Weights of each proposal level.
    pub weights_prop: Vec<Tensor<B, 3>>,
}

impl<B: Backend> Default for RenderOutput<B> {
    fn default() -> Self {
        Self {
            rgb_map: None,
            gradients: None,
            sdf: None,
            sampled_sdf: None,
            s_vals: None,
            weights: None,
            s_vals_prop: Vec::new(),
            weights_prop: Vec::new(),
        }
    }
}

impl<B: Backend> RenderOutput<B> {
    /// Create an empty output bundle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the rendered colors.
    pub fn with_rgb_map(mut self, rgb_map: Tensor<B, 3>) -> Self {
        self.rgb_map = Some(rgb_map);
        self
    }

    /// Set the SDF gradients.
    pub fn with_gradients(mut self, gradients: Tensor<B, 3>) -> Self {
        self.gradients = Some(gradients);
        self
    }

    /// Set the center SDF values and their finite-difference neighbours.
    pub fn with_sdf_samples(mut self, sdf: Tensor<B, 3>, sampled_sdf: Tensor<B, 3>) -> Self {
        self.sdf = Some(sdf);
        self.sampled_sdf = Some(sampled_sdf);
        self
    }

    /// Set the final sampling distribution.
    pub fn with_samples(mut self, s_vals: Tensor<B, 3>, weights: Tensor<B, 3>) -> Self {
        self.s_vals = Some(s_vals);
        self.weights = Some(weights);
        self
    }

    /// Append one proposal level.
    pub fn with_proposal(mut self, s_vals: Tensor<B, 3>, weights: Tensor<B, 3>) -> Self {
        self.s_vals_prop.push(s_vals);
        self.weights_prop.push(weights);
        self
    }

    /// Number of proposal levels (by interval edges).
    pub fn num_proposal_levels(&self) -> usize {
        self.s_vals_prop.len()
    }
}

/// Ground-truth data for one training step.
#[derive(Debug, Clone)]
pub struct Batch<B: Backend> {
    /// Target colors, `[batch, rays, 3]`.
    pub rgb: Option<Tensor<B, 3>>,
}

impl<B: Backend> Default for Batch<B> {
    fn default() -> Self {
        Self { rgb: None }
    }
}

impl<B: Backend> Batch<B> {
    /// Create a batch with target colors.
    pub fn new(rgb: Tensor<B, 3>) -> Self {
        Self { rgb: Some(rgb) }
    }

    /// Create a batch without color supervision.
    pub fn empty() -> Self {
        Self::default()
    }
}
