//! Error types for geometry_supervisor.

use thiserror::Error;

/// Errors that can occur while computing supervision losses.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SupervisorError {
    /// Invalid configuration.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the configuration error.
        message: String,
    },

    /// Tensor shape mismatch.
    #[error("tensor shape mismatch for {context}: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        /// Which tensor or term the check belongs to.
        context: &'static str,
        /// Expected shape.
        expected: Vec<usize>,
        /// Actual shape.
        got: Vec<usize>,
    },

    /// A render output field needed by an active term is missing.
    #[error("render output is missing `{field}`")]
    MissingField {
        /// Name of the missing field.
        field: &'static str,
    },

    /// Proposal sample and weight lists have different lengths.
    #[error("proposal level mismatch: {s_vals} s_vals levels but {weights} weights levels")]
    ProposalLevelMismatch {
        /// Number of proposal sample levels.
        s_vals: usize,
        /// Number of proposal weight levels.
        weights: usize,
    },

    /// More proposal levels than there are pulse widths.
    #[error("{levels} proposal levels given but only {max} pulse widths are defined")]
    TooManyProposalLevels {
        /// Number of proposal levels in the output.
        levels: usize,
        /// Number of supported levels.
        max: usize,
    },
}

impl SupervisorError {
    /// Build a shape mismatch error from two shapes.
    pub(crate) fn shape(context: &'static str, expected: &[usize], got: &[usize]) -> Self {
        Self::ShapeMismatch {
            context,
            expected: expected.to_vec(),
            got: got.to_vec(),
        }
    }
}

/// Result type for geometry_supervisor operations.
pub type Result<T> = std::result::Result<T, SupervisorError>;
