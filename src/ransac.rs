//! Robust fit: random sample consensus over one path loss exponent hypothesis
use std::sync::atomic::{AtomicBool, Ordering};

use itertools::Itertools;
use log::{debug, trace};
use rand::{seq::index, Rng};

use crate::{
    candidate::Candidate,
    cfg::{Config, RansacOpts, SolverOpts},
    error::Error,
    median::GeometricMedian,
    model::PathLossModel,
    position::LocalPoint,
    solutions::{RansacResult, TrilaterationResult},
    solver::Trilateration,
};

/// Best sample so far
#[derive(Debug)]
struct Consensus<'a> {
    sample: Vec<usize>,
    solution: TrilaterationResult,
    inliers: Vec<Candidate<'a>>,
}

/// Outcome of the sampling stage
#[derive(Debug, Default)]
struct Search<'a> {
    /// Retained sample, if any gathered the minimal consensus
    best: Option<Consensus<'a>>,
    /// Largest inlier set any sample gathered, even below the minimal consensus
    most_inliers: usize,
    /// Number of samples that were evaluated
    evaluated: usize,
}

/// [Ransac] driver. One driver resolves one hypothesis at a time,
/// several drivers may run concurrently.
pub(crate) struct Ransac<'a> {
    model: &'a PathLossModel,
    solver: &'a SolverOpts,
    opts: &'a RansacOpts,
    cancel: Option<&'a AtomicBool>,
}

impl<'a> Ransac<'a> {
    pub fn new(cfg: &'a Config) -> Self {
        Self {
            model: &cfg.model,
            solver: &cfg.solver,
            opts: &cfg.ransac,
            cancel: None,
        }
    }

    /// Returns [Ransac] that polls this cancellation flag before every sample
    pub fn with_cancel_flag(mut self, flag: &'a AtomicBool) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Minimal number of inliers a consensus requires, for this set size
    pub fn minimum_inliers(size: usize) -> usize {
        if size == 2 {
            2
        } else {
            3
        }
    }

    fn cancelled(&self) -> bool {
        self.cancel
            .map(|flag| flag.load(Ordering::Relaxed))
            .unwrap_or(false)
    }

    /// Index samples to be tried: every combination for small sets,
    /// random draws otherwise.
    fn samples<R: Rng>(&self, size: usize, rng: &mut R) -> Vec<Vec<usize>> {
        let sample_size = self.opts.sample_size.max(2).min(size);

        if size <= self.opts.max_exhaustive {
            (0..size).combinations(sample_size).collect()
        } else {
            (0..self.opts.random_iterations)
                .map(|_| {
                    let mut sample = index::sample(rng, size, sample_size).into_vec();
                    sample.sort_unstable();
                    sample
                })
                .collect()
        }
    }

    /// Resolves the sample, starting from the geometric median of its emitters
    fn fit(
        &self,
        sample: &[Candidate],
        confidence_level: f64,
    ) -> Result<TrilaterationResult, Error> {
        let positions = sample
            .iter()
            .map(|cd| cd.measurement.position)
            .collect::<Vec<_>>();

        let initial = GeometricMedian::default()
            .resolve(&positions)
            .ok_or(Error::InsufficientData)?;

        Trilateration::new(self.model, sample)?.resolve(self.solver, &initial, confidence_level)
    }

    /// Candidates that agree with this position estimate
    fn inliers(
        &self,
        candidates: &[Candidate<'a>],
        position: &LocalPoint,
        vertical: bool,
    ) -> Vec<Candidate<'a>> {
        candidates
            .iter()
            .filter(|cd| {
                cd.standardized_residual(self.model, position, vertical) <= self.opts.inlier_threshold
            })
            .copied()
            .collect()
    }

    /// Tries every sample until one gathers a large enough consensus.
    /// Only fails when the cancellation flag was raised.
    fn search<R: Rng>(
        &self,
        candidates: &[Candidate<'a>],
        min_inliers: usize,
        confidence_level: f64,
        rng: &mut R,
    ) -> Result<Search<'a>, Error> {
        let size = candidates.len();
        let path_loss_exponent = candidates[0].path_loss_exponent;
        let mut search = Search::default();

        for indices in self.samples(size, rng) {
            if self.cancelled() {
                debug!("n={:.1} cancelled", path_loss_exponent);
                return Err(Error::Cancelled);
            }

            search.evaluated += 1;

            let sample = indices.iter().map(|i| candidates[*i]).collect::<Vec<_>>();

            let solution = match self.fit(&sample, confidence_level) {
                Ok(solution) => solution,
                Err(e) => {
                    trace!("n={:.1} sample {:?}: {}", path_loss_exponent, indices, e);
                    continue;
                },
            };

            let vertical = sample.iter().all(|cd| cd.measurement.has_vertical());
            let inliers = self.inliers(candidates, &solution.position, vertical);

            search.most_inliers = search.most_inliers.max(inliers.len());

            let retained = inliers.len() >= min_inliers
                && match &search.best {
                    None => true,
                    Some(best) => {
                        inliers.len() > best.inliers.len()
                            || (inliers.len() == best.inliers.len()
                                && solution.horizontal_accuracy_m
                                    < best.solution.horizontal_accuracy_m)
                    },
                };

            if retained {
                trace!(
                    "n={:.1} sample {:?}: {} inliers",
                    path_loss_exponent,
                    indices,
                    inliers.len()
                );
                search.best = Some(Consensus {
                    sample: indices,
                    solution,
                    inliers,
                });
            }

            if let Some(best) = &search.best {
                if best.inliers.len() as f64 > self.opts.early_exit_ratio * size as f64 {
                    break;
                }
            }
        }

        Ok(search)
    }

    /// Resolves one hypothesis.
    /// ## Input
    /// - candidates: all [Candidate]s of this hypothesis
    /// - min_inliers: minimal size of the consensus
    /// - confidence_level: within ]0, 1[
    /// - rng: random source, only used when the set is too large
    ///   to try every combination.
    /// ## Returns
    /// - [RansacResult] refined over the consensus
    /// - [Error::NoConsensus] when no sample gathered enough inliers
    /// - [Error::Cancelled] when the cancellation flag was raised
    pub fn resolve<R: Rng>(
        &self,
        candidates: &[Candidate<'a>],
        min_inliers: usize,
        confidence_level: f64,
        rng: &mut R,
    ) -> Result<RansacResult, Error> {
        let size = candidates.len();
        if size < 2 || size < min_inliers {
            return Err(Error::NotEnoughMeasurements(size));
        }

        let path_loss_exponent = candidates[0].path_loss_exponent;
        let search = self.search(candidates, min_inliers, confidence_level, rng)?;

        let best = match search.best {
            Some(best) => best,
            None => {
                debug!(
                    "n={:.1} no consensus: {} inliers at best",
                    path_loss_exponent, search.most_inliers
                );
                return Err(Error::NoConsensus(search.most_inliers));
            },
        };

        // refine over the consensus, from the best sample estimate
        let solution = Trilateration::new(self.model, &best.inliers)?.resolve(
            self.solver,
            &best.solution.position,
            confidence_level,
        )?;

        debug!(
            "n={:.1} consensus: {} inliers (sample {:?} of {}), {:?} ±{:.2}m",
            path_loss_exponent,
            best.inliers.len(),
            best.sample,
            search.evaluated,
            solution.position,
            solution.horizontal_accuracy_m
        );

        Ok(RansacResult {
            solution,
            inliers: best.inliers.len(),
            path_loss_exponent,
        })
    }
}
