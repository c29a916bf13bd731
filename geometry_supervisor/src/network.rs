//! Network-side state read by the curvature term.

/// Finite-difference settings exposed by an SDF network.
///
/// Networks that estimate curvature from offset SDF samples anneal the
/// sampling offset during training; the supervisor only reads the current
/// values.
pub trait SdfNetwork {
    /// Offset used to sample the SDF around each point (world units).
    fn finite_diff_delta(&self) -> f32;

    /// Extra multiplier applied to the mean absolute curvature.
    fn curvature_loss_multi_factor(&self) -> f32;
}

/// Plain snapshot of a network's finite-difference state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FiniteDiffState {
    /// Current finite-difference offset.
    pub finite_diff_delta: f32,
    /// Current curvature loss multiplier.
    pub curvature_loss_multi_factor: f32,
}

impl Default for FiniteDiffState {
    fn default() -> Self {
        Self {
            finite_diff_delta: 0.005,
            curvature_loss_multi_factor: 1.0,
        }
    }
}

impl FiniteDiffState {
    /// Create a new state.
    pub fn new(finite_diff_delta: f32, curvature_loss_multi_factor: f32) -> Self {
        Self {
            finite_diff_delta,
            curvature_loss_multi_factor,
        }
    }

    /// Set the finite-difference offset.
    pub fn with_delta(mut self, finite_diff_delta: f32) -> Self {
        self.finite_diff_delta = finite_diff_delta;
        self
    }

    /// Set the curvature multiplier.
    pub fn with_multi_factor(mut self, curvature_loss_multi_factor: f32) -> Self {
        self.curvature_loss_multi_factor = curvature_loss_multi_factor;
        self
    }
}

impl SdfNetwork for FiniteDiffState {
    fn finite_diff_delta(&self) -> f32 {
        self.finite_diff_delta
    }

    fn curvature_loss_multi_factor(&self) -> f32 {
        self.curvature_loss_multi_factor
    }
}
