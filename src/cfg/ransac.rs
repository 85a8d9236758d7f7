//! Robust fit (RANSAC) options
use crate::constants::MAX_MEASUREMENTS_FOR_EXHAUSTIVE_RANSAC;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

const fn default_sample_size() -> usize {
    3
}

const fn default_inlier_threshold() -> f64 {
    2.0
}

const fn default_early_exit_ratio() -> f64 {
    0.8
}

const fn default_max_exhaustive() -> usize {
    MAX_MEASUREMENTS_FOR_EXHAUSTIVE_RANSAC
}

const fn default_random_iterations() -> usize {
    100
}

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RansacOpts {
    /// Number of measurements per sample. Smaller sets are sampled at once.
    #[cfg_attr(feature = "serde", serde(default = "default_sample_size"))]
    pub sample_size: usize,
    /// A measurement is an inlier when its standardized residual
    /// is lower or equal to this value (number of standard deviations).
    #[cfg_attr(feature = "serde", serde(default = "default_inlier_threshold"))]
    pub inlier_threshold: f64,
    /// Sampling stops once the best inlier set exceeds this ratio of the set.
    #[cfg_attr(feature = "serde", serde(default = "default_early_exit_ratio"))]
    pub early_exit_ratio: f64,
    /// Every combination is tried up to this number of measurements.
    /// Larger sets are randomly sampled.
    #[cfg_attr(feature = "serde", serde(default = "default_max_exhaustive"))]
    pub max_exhaustive: usize,
    /// Number of samples drawn when randomly sampling
    #[cfg_attr(feature = "serde", serde(default = "default_random_iterations"))]
    pub random_iterations: usize,
}

impl Default for RansacOpts {
    fn default() -> Self {
        Self {
            sample_size: default_sample_size(),
            inlier_threshold: default_inlier_threshold(),
            early_exit_ratio: default_early_exit_ratio(),
            max_exhaustive: default_max_exhaustive(),
            random_iterations: default_random_iterations(),
        }
    }
}

impl RansacOpts {
    /// Copies and returns [RansacOpts] with updated inlier threshold
    pub fn with_inlier_threshold(&self, threshold: f64) -> Self {
        let mut s = *self;
        s.inlier_threshold = threshold;
        s
    }

    /// Copies and returns [RansacOpts] with updated early exit ratio
    pub fn with_early_exit_ratio(&self, ratio: f64) -> Self {
        let mut s = *self;
        s.early_exit_ratio = ratio;
        s
    }

    /// Copies and returns [RansacOpts] with updated exhaustive sampling limit
    pub fn with_max_exhaustive(&self, size: usize) -> Self {
        let mut s = *self;
        s.max_exhaustive = size;
        s
    }

    /// Copies and returns [RansacOpts] with updated number of random samples
    pub fn with_random_iterations(&self, iterations: usize) -> Self {
        let mut s = *self;
        s.random_iterations = iterations;
        s
    }
}
