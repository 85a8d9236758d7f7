//! Weighted nonlinear least squares trilateration
use log::{debug, trace};
use nalgebra::{DMatrix, DVector};

use crate::{
    candidate::Candidate,
    cfg::SolverOpts,
    constants::DISTANCE_EPSILON_M,
    error::Error,
    model::PathLossModel,
    position::LocalPoint,
    solutions::{validator::SolutionValidator, TrilaterationResult},
    stats::chi_squared_quantile,
};

/// Lower bound of the normal matrix diagonal, when it is used to scale the damping.
const DIAGONAL_FLOOR: f64 = 1.0E-12;

/// Damping growth and shrink factor
const DAMPING_FACTOR: f64 = 10.0;

const MAX_DAMPING: f64 = 1.0E32;

/// [Trilateration] problem, formed for one set of [Candidate]s.
/// The position that minimizes the weighted squared differences between
/// the modeled and observed distances is searched with a Levenberg-Marquardt
/// (damped Gauss-Newton) iteration.
#[derive(Debug, Clone)]
pub(crate) struct Trilateration {
    /// Emitter positions, one row per candidate
    emitters: DMatrix<f64>,
    /// Observed distances (meters)
    observed: DVector<f64>,
    /// Square root of the observation weights (inverse variances)
    sqrt_weights: DVector<f64>,
    /// Resolving the vertical component (3 DOF) or not (2 DOF)
    vertical: bool,
}

impl Trilateration {
    /// Forms the [Trilateration] problem. The vertical component is only
    /// resolved if every [Candidate] exhibits one.
    /// ## Returns
    /// - [Error::NotEnoughMeasurements] with less than 2 [Candidate]s
    /// - [Error::InvalidMeasurement] when a [Candidate] has no finite distance,
    ///   or no finite positive variance
    pub fn new(model: &PathLossModel, candidates: &[Candidate]) -> Result<Self, Error> {
        let size = candidates.len();
        if size < 2 {
            return Err(Error::NotEnoughMeasurements(size));
        }

        let vertical = candidates.iter().all(|cd| cd.measurement.has_vertical());
        let dim = if vertical { 3 } else { 2 };

        let mut emitters = DMatrix::<f64>::zeros(size, dim);
        let mut observed = DVector::<f64>::zeros(size);
        let mut sqrt_weights = DVector::<f64>::zeros(size);

        for (i, cd) in candidates.iter().enumerate() {
            let position = &cd.measurement.position;
            emitters[(i, 0)] = position.x;
            emitters[(i, 1)] = position.y;
            if vertical {
                emitters[(i, 2)] = position.z.unwrap_or_default();
            }

            let variance = cd.variance(model, vertical);
            let distance = cd.observed_distance(model);

            if !(variance > 0.0 && variance.is_finite() && distance.is_finite()) {
                return Err(Error::InvalidMeasurement);
            }

            observed[i] = distance;
            sqrt_weights[i] = variance.recip().sqrt();
        }

        Ok(Self {
            emitters,
            observed,
            sqrt_weights,
            vertical,
        })
    }

    /// Number of degrees of freedom being resolved
    pub fn dim(&self) -> usize {
        self.emitters.ncols()
    }

    /// Evaluates weighted residuals and weighted jacobian of the modeled distances
    /// at this state.
    fn evaluate(&self, state: &DVector<f64>) -> (DVector<f64>, DMatrix<f64>) {
        let (size, dim) = (self.emitters.nrows(), self.dim());

        let mut residuals = DVector::<f64>::zeros(size);
        let mut jacobian = DMatrix::<f64>::zeros(size, dim);

        for i in 0..size {
            let mut distance = 0.0;
            for j in 0..dim {
                distance += (state[j] - self.emitters[(i, j)]).powi(2);
            }
            let distance = distance.sqrt() + DISTANCE_EPSILON_M;

            residuals[i] = self.sqrt_weights[i] * (self.observed[i] - distance);

            for j in 0..dim {
                jacobian[(i, j)] = self.sqrt_weights[i] * (state[j] - self.emitters[(i, j)]) / distance;
            }
        }

        (residuals, jacobian)
    }

    fn cost(&self, state: &DVector<f64>) -> f64 {
        let (residuals, _) = self.evaluate(state);
        residuals.norm_squared()
    }

    /// Initial state, from the initial guess. The vertical component
    /// is initialized to the mean altitude of the emitters, if need be.
    fn initial_state(&self, initial: &LocalPoint) -> DVector<f64> {
        let mut state = DVector::<f64>::zeros(self.dim());
        state[0] = initial.x;
        state[1] = initial.y;
        if self.vertical {
            state[2] = initial.z.unwrap_or_else(|| self.emitters.column(2).mean());
        }
        state
    }

    /// Levenberg-Marquardt iteration.
    fn optimize(&self, opts: &SolverOpts, initial: &LocalPoint) -> Result<DVector<f64>, Error> {
        let mut state = self.initial_state(initial);
        let mut cost = self.cost(&state);
        let mut damping = opts.initial_damping;

        for iter in 0..opts.max_iterations {
            let (residuals, jacobian) = self.evaluate(&state);
            let jt = jacobian.transpose();
            let normal = &jt * &jacobian;
            let gradient = &jt * &residuals;

            let mut damped = normal.clone();
            for j in 0..self.dim() {
                damped[(j, j)] += damping * normal[(j, j)].max(DIAGONAL_FLOOR);
            }

            let step = match damped.lu().solve(&gradient) {
                Some(step) => step,
                None => {
                    damping *= DAMPING_FACTOR;
                    if damping > MAX_DAMPING {
                        return Err(Error::SingularGeometry);
                    }
                    continue;
                },
            };

            let step_norm = step.norm();
            if !step_norm.is_finite() {
                return Err(Error::Divergence);
            }

            if step_norm <= opts.parameter_tolerance * (state.norm() + opts.parameter_tolerance) {
                trace!("lm iter={} converged: |dx|={:.3E}", iter, step_norm);
                return Ok(state);
            }

            let candidate = &state + &step;
            let candidate_cost = self.cost(&candidate);

            if candidate_cost.is_finite() && candidate_cost < cost {
                let reduction = (cost - candidate_cost) / cost;
                trace!(
                    "lm iter={} cost={:.6E} damping={:.1E} |dx|={:.3E}",
                    iter,
                    candidate_cost,
                    damping,
                    step_norm
                );

                state = candidate;
                cost = candidate_cost;
                damping = (damping / DAMPING_FACTOR).max(f64::EPSILON);

                if reduction <= opts.cost_tolerance || cost == 0.0 {
                    return Ok(state);
                }
            } else {
                damping *= DAMPING_FACTOR;
                if damping > MAX_DAMPING {
                    return Err(Error::NoConvergence(iter + 1));
                }
            }
        }

        Err(Error::NoConvergence(opts.max_iterations))
    }

    /// Resolves this [Trilateration] problem.
    /// ## Input
    /// - opts: [SolverOpts]
    /// - initial: initial guess
    /// - confidence_level: confidence level of the accuracy radii,
    ///   within ]0, 1[ (panics otherwise).
    /// ## Returns
    /// - [TrilaterationResult] on success
    /// - [Error::NoConvergence] when the optimizer did not converge within the iteration limit
    /// - [Error::SingularGeometry] when the covariance cannot be determined
    pub fn resolve(
        &self,
        opts: &SolverOpts,
        initial: &LocalPoint,
        confidence_level: f64,
    ) -> Result<TrilaterationResult, Error> {
        let state = self.optimize(opts, initial)?;

        if state.iter().any(|x| !x.is_finite()) {
            return Err(Error::Divergence);
        }

        let (_, jacobian) = self.evaluate(&state);
        let normal = jacobian.transpose() * &jacobian;

        let singular_values = normal.singular_values();
        let (min_sv, max_sv) = (singular_values.min(), singular_values.max());

        if max_sv <= 0.0 || !max_sv.is_finite() || min_sv / max_sv < opts.singularity_threshold {
            debug!("singular geometry: sv ratio={:.3E}", min_sv / max_sv);
            return Err(Error::SingularGeometry);
        }

        let covariance = normal.try_inverse().ok_or(Error::SingularGeometry)?;

        let (sigma_x2, sigma_y2) = (covariance[(0, 0)], covariance[(1, 1)]);

        let horizontal_accuracy_m =
            ((sigma_x2 + sigma_y2) * chi_squared_quantile(confidence_level, 2)).sqrt();

        let vertical_accuracy_m = if self.vertical {
            Some((covariance[(2, 2)] * chi_squared_quantile(confidence_level, 1)).sqrt())
        } else {
            None
        };

        let solution = TrilaterationResult {
            position: LocalPoint {
                x: state[0],
                y: state[1],
                z: if self.vertical { Some(state[2]) } else { None },
            },
            horizontal_accuracy_m,
            vertical_accuracy_m,
        };

        SolutionValidator::validate(&solution).map_err(Error::InvalidSolution)?;
        Ok(solution)
    }
}
