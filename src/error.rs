use thiserror::Error;

use crate::solutions::validator::SolutionInvalidation;

/// Outcome of a failed resolution attempt. None of these are fatal: they are expected
/// and frequent. The [Estimator](crate::prelude::Estimator) tries other hypotheses
/// when it runs into one of them and eventually reports "no estimate".
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// No measurement at all: nothing to estimate.
    #[error("insufficient data: no measurements")]
    InsufficientData,

    /// Trilateration requires at least 2 measurements.
    #[error("not enough measurements ({0}) to trilaterate")]
    NotEnoughMeasurements(usize),

    /// A measurement does not lead to a finite distance, or to a positive variance.
    #[error("invalid measurement: non finite distance or variance")]
    InvalidMeasurement,

    /// The optimizer did not converge within the iteration limit.
    #[error("solver did not converge within {0} iterations")]
    NoConvergence(usize),

    /// The optimizer wandered off to an invalid (non finite) state.
    #[error("solver diverged to an invalid state")]
    Divergence,

    /// Degenerate geometry (for example collinear emitters):
    /// the covariance cannot be obtained.
    #[error("singular geometry: covariance cannot be determined")]
    SingularGeometry,

    /// Solution was resolved but did not pass validation.
    #[error("invalidated solution: {0}")]
    InvalidSolution(SolutionInvalidation),

    /// No sample gathered the minimal number of inliers.
    #[error("no consensus: best sample gathered {0} inliers")]
    NoConsensus(usize),

    /// Every path loss exponent hypothesis failed.
    #[error("no viable hypothesis")]
    NoViableHypothesis,

    /// The estimation was cancelled by the caller.
    #[error("cancelled")]
    Cancelled,
}
