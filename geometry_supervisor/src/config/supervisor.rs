//! Supervisor configuration types.

use burn::config::Config;

use crate::error::SupervisorError;

fn check_weight(name: &str, value: f32) -> crate::error::Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(SupervisorError::InvalidConfig {
            message: format!("{} must be a non-negative finite number, got {}", name, value),
        });
    }
    Ok(())
}

/// Configuration for the primary reconstruction loss.
#[derive(Config, Debug)]
pub struct ReconstructionSupervisorConfig {
    /// Weight for the rendered color MSE.
    #[config(default = 1.0)]
    pub img_loss_weight: f32,
}

impl Default for ReconstructionSupervisorConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ReconstructionSupervisorConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> crate::error::Result<()> {
        check_weight("img_loss_weight", self.img_loss_weight)
    }
}

/// Configuration for the geometry regularization terms.
///
/// A weight of zero disables its term.
#[derive(Config, Debug)]
pub struct GeometrySupervisorConfig {
    /// Configuration of the wrapped reconstruction supervisor.
    pub base: ReconstructionSupervisorConfig,

    /// Weight for Eikonal regularization (|∇SDF| = 1).
    #[config(default = 0.0)]
    pub eikonal_loss_weight: f32,

    /// Weight for the zip proposal loss.
    #[config(default = 0.0)]
    pub zip_prop_loss_weight: f32,

    /// Weight for finite-difference curvature regularization.
    #[config(default = 0.0)]
    pub curvature_loss_weight: f32,
}

impl Default for GeometrySupervisorConfig {
    fn default() -> Self {
        Self::new(ReconstructionSupervisorConfig::default())
    }
}

impl GeometrySupervisorConfig {
    /// Weights commonly used for SDF fields trained with proposal sampling.
    pub fn neus() -> Self {
        Self::default()
            .with_eikonal_loss_weight(0.1)
            .with_zip_prop_loss_weight(1.0)
            .with_curvature_loss_weight(5e-4)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> crate::error::Result<()> {
        self.base.validate()?;
        check_weight("eikonal_loss_weight", self.eikonal_loss_weight)?;
        check_weight("zip_prop_loss_weight", self.zip_prop_loss_weight)?;
        check_weight("curvature_loss_weight", self.curvature_loss_weight)?;
        Ok(())
    }
}
