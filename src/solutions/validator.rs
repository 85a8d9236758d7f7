use log::debug;
use thiserror::Error;

use crate::solutions::TrilaterationResult;

#[derive(Clone, Debug, PartialEq, Error)]
pub enum SolutionInvalidation {
    #[error("non finite position")]
    NonFinitePosition,
    #[error("invalid horizontal accuracy {0}")]
    HorizontalAccuracy(f64),
    #[error("invalid vertical accuracy {0}")]
    VerticalAccuracy(f64),
}

/// Accuracy radii must be strictly positive and finite,
/// so must be the position itself.
pub(crate) struct SolutionValidator;

impl SolutionValidator {
    fn valid_radius(radius: f64) -> bool {
        radius.is_finite() && radius > 0.0
    }

    pub fn validate(solution: &TrilaterationResult) -> Result<(), SolutionInvalidation> {
        let position = &solution.position;

        let finite = position.x.is_finite()
            && position.y.is_finite()
            && position.z.map(|z| z.is_finite()).unwrap_or(true);

        if !finite {
            debug!("rejected solution: non finite position {:?}", position);
            return Err(SolutionInvalidation::NonFinitePosition);
        }

        if !Self::valid_radius(solution.horizontal_accuracy_m) {
            return Err(SolutionInvalidation::HorizontalAccuracy(
                solution.horizontal_accuracy_m,
            ));
        }

        if let Some(vertical) = solution.vertical_accuracy_m {
            if !Self::valid_radius(vertical) {
                return Err(SolutionInvalidation::VerticalAccuracy(vertical));
            }
        }

        Ok(())
    }
}
