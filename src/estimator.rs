//! Position [Estimator]
use std::sync::atomic::AtomicBool;

use log::debug;
use rand::{rngs::StdRng, SeedableRng};
use rayon::prelude::*;

use crate::{
    candidate::{Candidate, Measurement, Observation},
    cfg::Config,
    error::Error,
    position::GeoPoint,
    ransac::Ransac,
    solutions::{validator::SolutionValidator, EstimatedPosition, RansacResult, TrilaterationResult},
    stats::chi_squared_quantile,
};

/// [Estimator] resolves a position from a set of emitter [Observation]s.
///
/// It gracefully downgrades with the number of measurements:
/// - a single measurement resolves to the emitter position itself,
///   with an accuracy radius that reflects the distance uncertainty
/// - two measurements or more are resolved by a robust fit, for every
///   path loss exponent hypothesis, and the best hypothesis is retained.
///
/// Hypotheses are resolved in parallel but the selection is deterministic:
/// identical inputs (and seeds) always resolve to the identical result.
#[derive(Debug, Clone, Default)]
pub struct Estimator {
    cfg: Config,
}

fn assert_confidence_level(confidence_level: f64) {
    assert!(
        confidence_level > 0.0 && confidence_level < 1.0,
        "confidence level must be within ]0, 1["
    );
}

impl Estimator {
    /// Builds new [Estimator] from this [Config]
    pub fn new(cfg: Config) -> Self {
        Self { cfg }
    }

    /// [Config] in use
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Estimates a position from a set of [Observation]s.
    /// ## Input
    /// - observations: geocoded emitter [Observation]s
    /// - confidence_level: confidence level of the accuracy radii, within ]0, 1[.
    ///   Panics outside of this range.
    /// ## Returns
    /// - None when no position could be determined
    pub fn estimate(
        &self,
        observations: &[Observation],
        confidence_level: f64,
    ) -> Option<EstimatedPosition> {
        self.try_estimate(observations, confidence_level, None).ok()
    }

    /// Estimates a position from a set of [Measurement]s in local coordinates.
    /// ## Returns
    /// - None when no position could be determined
    pub fn estimate_local(
        &self,
        measurements: &[Measurement],
        confidence_level: f64,
    ) -> Option<TrilaterationResult> {
        self.try_estimate_local(measurements, confidence_level, None)
            .ok()
            .map(|result| result.solution)
    }

    /// [Self::estimate] that may be cancelled at any point, by raising
    /// the `cancel` flag. A cancelled estimation resolves to None.
    pub fn estimate_cancellable(
        &self,
        observations: &[Observation],
        confidence_level: f64,
        cancel: &AtomicBool,
    ) -> Option<EstimatedPosition> {
        self.try_estimate(observations, confidence_level, Some(cancel))
            .ok()
    }

    /// Estimates a position from a set of [Observation]s, reporting why
    /// it could not be determined.
    pub fn try_estimate(
        &self,
        observations: &[Observation],
        confidence_level: f64,
        cancel: Option<&AtomicBool>,
    ) -> Result<EstimatedPosition, Error> {
        assert_confidence_level(confidence_level);

        let positions = observations
            .iter()
            .map(|obs| obs.position)
            .collect::<Vec<_>>();

        let reference = GeoPoint::reference(&positions).ok_or(Error::InsufficientData)?;

        let measurements = observations
            .iter()
            .map(|obs| obs.to_measurement(&reference))
            .collect::<Vec<_>>();

        let result = self.try_estimate_local(&measurements, confidence_level, cancel)?;

        Ok(EstimatedPosition::from_local(&result.solution, &reference))
    }

    /// Estimates a position from a set of [Measurement]s in local coordinates,
    /// reporting why it could not be determined.
    /// ## Returns
    /// - [RansacResult] that describes the retained hypothesis
    /// - [Error::InsufficientData] without measurements
    /// - [Error::NoViableHypothesis] when every hypothesis failed
    /// - [Error::Cancelled] when `cancel` was raised
    pub fn try_estimate_local(
        &self,
        measurements: &[Measurement],
        confidence_level: f64,
        cancel: Option<&AtomicBool>,
    ) -> Result<RansacResult, Error> {
        assert_confidence_level(confidence_level);

        match measurements.len() {
            0 => Err(Error::InsufficientData),
            1 => self.single_measurement(&measurements[0], confidence_level),
            _ => self.multilateration(measurements, confidence_level, cancel),
        }
    }

    /// A single measurement resolves to the emitter itself
    fn single_measurement(
        &self,
        measurement: &Measurement,
        confidence_level: f64,
    ) -> Result<RansacResult, Error> {
        let path_loss_exponent = self.cfg.single_measurement_exponent;
        let variance = measurement.total_variance(&self.cfg.model, path_loss_exponent, false);

        let horizontal_accuracy_m = (variance * chi_squared_quantile(confidence_level, 2)).sqrt();

        let vertical_accuracy_m = if measurement.has_vertical() {
            measurement
                .z_variance_m2
                .map(|variance| (variance * chi_squared_quantile(confidence_level, 1)).sqrt())
        } else {
            None
        };

        let solution = TrilaterationResult {
            position: measurement.position,
            horizontal_accuracy_m,
            vertical_accuracy_m,
        };

        SolutionValidator::validate(&solution).map_err(Error::InvalidSolution)?;

        Ok(RansacResult {
            solution,
            inliers: 1,
            path_loss_exponent,
        })
    }

    /// Resolves every hypothesis in parallel, then retains the best one.
    fn multilateration(
        &self,
        measurements: &[Measurement],
        confidence_level: f64,
        cancel: Option<&AtomicBool>,
    ) -> Result<RansacResult, Error> {
        let min_inliers = Ransac::minimum_inliers(measurements.len());

        let outcomes = self
            .cfg
            .path_loss_exponents
            .par_iter()
            .enumerate()
            .map(|(index, exponent)| {
                let candidates = Candidate::hypothesis(measurements, *exponent);
                let mut rng = StdRng::seed_from_u64(self.cfg.seed.wrapping_add(index as u64));

                let ransac = match cancel {
                    Some(flag) => Ransac::new(&self.cfg).with_cancel_flag(flag),
                    None => Ransac::new(&self.cfg),
                };

                ransac.resolve(&candidates, min_inliers, confidence_level, &mut rng)
            })
            .collect::<Vec<_>>();

        // ordered reduction: on equality, the earliest hypothesis wins
        let mut best = Option::<RansacResult>::None;

        for (exponent, outcome) in self.cfg.path_loss_exponents.iter().zip(outcomes) {
            match outcome {
                Ok(result) => {
                    let retained = match &best {
                        Some(best) => result.better_than(best),
                        None => true,
                    };
                    if retained {
                        best = Some(result);
                    }
                },
                Err(Error::Cancelled) => return Err(Error::Cancelled),
                Err(e) => {
                    debug!("n={:.1} hypothesis rejected: {}", exponent, e);
                },
            }
        }

        match best {
            Some(best) => {
                debug!(
                    "retained n={:.1}: {} inliers ±{:.2}m",
                    best.path_loss_exponent, best.inliers, best.solution.horizontal_accuracy_m
                );
                Ok(best)
            },
            None => {
                debug!("no viable hypothesis ({} measurements)", measurements.len());
                Err(Error::NoViableHypothesis)
            },
        }
    }
}

#[cfg(test)]
mod test {
    use super::Estimator;
    use crate::{
        candidate::Measurement,
        error::Error,
        position::LocalPoint,
    };

    #[test]
    fn no_measurements() {
        let estimator = Estimator::default();
        assert!(estimator.estimate_local(&[], 0.68).is_none());
        assert!(estimator.estimate(&[], 0.95).is_none());
        assert_eq!(
            estimator.try_estimate_local(&[], 0.5, None),
            Err(Error::InsufficientData)
        );
    }

    #[test]
    #[should_panic]
    fn confidence_level_out_of_range() {
        let estimator = Estimator::default();
        let _ = estimator.estimate_local(&[], 1.0);
    }

    #[test]
    fn single_measurement() {
        let estimator = Estimator::default();
        let m = Measurement::new(LocalPoint::new_3d(3.0, 4.0, 5.0), 25.0, -60.0).with_z_variance(9.0);

        let result = estimator.try_estimate_local(&[m], 0.68, None).unwrap();
        assert_eq!(result.inliers, 1);
        assert_eq!(result.path_loss_exponent, 3.0);
        assert_eq!(result.solution.position, m.position);
        assert!(result.solution.horizontal_accuracy_m > 0.0);
        assert!(result.solution.vertical_accuracy_m.unwrap() > 0.0);

        let m = Measurement::new(LocalPoint::new(3.0, 4.0), 25.0, -60.0);
        let solution = estimator.estimate_local(&[m], 0.68).unwrap();
        assert!(solution.vertical_accuracy_m.is_none());
    }
}
