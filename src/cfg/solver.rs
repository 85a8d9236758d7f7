//! Trilateration solver options

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

const fn default_max_iterations() -> usize {
    1000
}

const fn default_cost_tolerance() -> f64 {
    1.0E-10
}

const fn default_parameter_tolerance() -> f64 {
    1.0E-10
}

const fn default_initial_damping() -> f64 {
    1.0E-3
}

const fn default_singularity_threshold() -> f64 {
    1.0E-12
}

/// Levenberg-Marquardt solver options
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SolverOpts {
    /// Maximal number of iterations, the attempt fails past this point.
    #[cfg_attr(feature = "serde", serde(default = "default_max_iterations"))]
    pub max_iterations: usize,
    /// Convergence is declared once the relative reduction of the cost
    /// falls below this value.
    #[cfg_attr(feature = "serde", serde(default = "default_cost_tolerance"))]
    pub cost_tolerance: f64,
    /// Convergence is declared once the relative update of the estimate
    /// falls below this value.
    #[cfg_attr(feature = "serde", serde(default = "default_parameter_tolerance"))]
    pub parameter_tolerance: f64,
    /// Initial damping factor
    #[cfg_attr(feature = "serde", serde(default = "default_initial_damping"))]
    pub initial_damping: f64,
    /// Geometry is declared singular when the ratio of the smallest to largest
    /// singular values of the normal matrix falls below this value.
    #[cfg_attr(feature = "serde", serde(default = "default_singularity_threshold"))]
    pub singularity_threshold: f64,
}

impl Default for SolverOpts {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            cost_tolerance: default_cost_tolerance(),
            parameter_tolerance: default_parameter_tolerance(),
            initial_damping: default_initial_damping(),
            singularity_threshold: default_singularity_threshold(),
        }
    }
}

impl SolverOpts {
    /// Copies and returns [SolverOpts] with updated iteration limit
    pub fn with_max_iterations(&self, max_iterations: usize) -> Self {
        let mut s = *self;
        s.max_iterations = max_iterations;
        s
    }
}
