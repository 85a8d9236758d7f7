#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::model::PathLossModel;

mod ransac;
mod solver;

pub use ransac::RansacOpts;
pub use solver::SolverOpts;

/// Path loss exponents we test, from free space (2.0)
/// to dense urban and indoor obstructions (5.9).
fn default_path_loss_exponents() -> Vec<f64> {
    (20..60).step_by(3).map(|n| n as f64 / 10.0).collect()
}

/// A single measurement cannot tell one path loss exponent from another,
/// we settle for an average environment.
const fn default_single_measurement_exponent() -> f64 {
    3.0
}

const fn default_seed() -> u64 {
    0
}

/// [Config] of the position [Estimator](crate::prelude::Estimator).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Config {
    /// [PathLossModel] converting RSSI to distances
    #[cfg_attr(feature = "serde", serde(default))]
    pub model: PathLossModel,
    /// Trilateration [SolverOpts]
    #[cfg_attr(feature = "serde", serde(default))]
    pub solver: SolverOpts,
    /// Robust fit [RansacOpts]
    #[cfg_attr(feature = "serde", serde(default))]
    pub ransac: RansacOpts,
    /// Path loss exponent hypotheses, in canonical order.
    /// Each hypothesis is resolved independently, in parallel.
    /// When two hypotheses are equally good, the first one wins.
    #[cfg_attr(feature = "serde", serde(default = "default_path_loss_exponents"))]
    pub path_loss_exponents: Vec<f64>,
    /// Path loss exponent used when a single measurement exists
    #[cfg_attr(feature = "serde", serde(default = "default_single_measurement_exponent"))]
    pub single_measurement_exponent: f64,
    /// Seed of the random sampling, that only applies to large measurement sets.
    /// Identical seeds reproduce identical results.
    #[cfg_attr(feature = "serde", serde(default = "default_seed"))]
    pub seed: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: PathLossModel::default(),
            solver: SolverOpts::default(),
            ransac: RansacOpts::default(),
            path_loss_exponents: default_path_loss_exponents(),
            single_measurement_exponent: default_single_measurement_exponent(),
            seed: default_seed(),
        }
    }
}

impl Config {
    /// Copies and returns [Config] with updated [PathLossModel]
    pub fn with_model(&self, model: PathLossModel) -> Self {
        let mut s = self.clone();
        s.model = model;
        s
    }

    /// Copies and returns [Config] with updated [SolverOpts]
    pub fn with_solver_opts(&self, opts: SolverOpts) -> Self {
        let mut s = self.clone();
        s.solver = opts;
        s
    }

    /// Copies and returns [Config] with updated [RansacOpts]
    pub fn with_ransac_opts(&self, opts: RansacOpts) -> Self {
        let mut s = self.clone();
        s.ransac = opts;
        s
    }

    /// Copies and returns [Config] with a unique path loss exponent hypothesis
    pub fn with_path_loss_exponent(&self, exponent: f64) -> Self {
        let mut s = self.clone();
        s.path_loss_exponents = vec![exponent];
        s
    }

    /// Copies and returns [Config] with updated path loss exponent hypotheses
    pub fn with_path_loss_exponents(&self, exponents: &[f64]) -> Self {
        let mut s = self.clone();
        s.path_loss_exponents = exponents.to_vec();
        s
    }

    /// Copies and returns [Config] with updated random seed
    pub fn with_seed(&self, seed: u64) -> Self {
        let mut s = self.clone();
        s.seed = seed;
        s
    }
}

#[cfg(test)]
mod test {
    use super::Config;

    #[test]
    fn default_exponents() {
        let cfg = Config::default();
        assert_eq!(cfg.path_loss_exponents.len(), 14);
        assert_eq!(cfg.path_loss_exponents[0], 2.0);
        assert_eq!(cfg.path_loss_exponents[1], 2.3);
        assert_eq!(cfg.path_loss_exponents[13], 5.9);
        assert_eq!(cfg.single_measurement_exponent, 3.0);
    }

    #[test]
    #[cfg(feature = "serde")]
    fn deserialize() {
        let cfg: Config = serde_json::from_str(
            r#"{
                "model": { "rssi_at_1m_dbm": -45.0 },
                "path_loss_exponents": [2.0, 3.0],
                "seed": 7
            }"#,
        )
        .unwrap();

        assert_eq!(cfg.model.rssi_at_1m_dbm, -45.0);
        assert_eq!(cfg.model.rssi_variance_dbm2, 4.0);
        assert_eq!(cfg.path_loss_exponents, vec![2.0, 3.0]);
        assert_eq!(cfg.seed, 7);
        assert_eq!(cfg.solver.max_iterations, 1000);
        assert_eq!(cfg.ransac.sample_size, 3);
    }
}
