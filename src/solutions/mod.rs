//! Position solutions
use crate::position::{GeoPoint, LocalPoint};

#[cfg(feature = "serde")]
use serde::Serialize;

pub(crate) mod validator;

/// [TrilaterationResult] expressed in local coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct TrilaterationResult {
    /// Estimated position
    pub position: LocalPoint,
    /// Horizontal confidence radius (meters), at the requested confidence level
    pub horizontal_accuracy_m: f64,
    /// Vertical confidence radius (meters), at the requested confidence level.
    /// Only exists when the vertical component was resolved.
    pub vertical_accuracy_m: Option<f64>,
}

/// [RansacResult] is a [TrilaterationResult] that
/// was obtained by consensus over a hypothesis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RansacResult {
    /// Refined [TrilaterationResult]
    pub solution: TrilaterationResult,
    /// Number of measurements that agreed with this solution
    pub inliers: usize,
    /// Path loss exponent hypothesis
    pub path_loss_exponent: f64,
}

impl RansacResult {
    /// Returns true if [Self] is strictly better than `rhs`: more inliers,
    /// then smaller horizontal radius, then smaller vertical radius
    /// (resolving the vertical component being preferred). Two results that
    /// compare equal are not better than one another.
    pub(crate) fn better_than(&self, rhs: &Self) -> bool {
        if self.inliers != rhs.inliers {
            return self.inliers > rhs.inliers;
        }

        let (h, rhs_h) = (
            self.solution.horizontal_accuracy_m,
            rhs.solution.horizontal_accuracy_m,
        );
        if h != rhs_h {
            return h < rhs_h;
        }

        match (
            self.solution.vertical_accuracy_m,
            rhs.solution.vertical_accuracy_m,
        ) {
            (Some(v), Some(rhs_v)) => v < rhs_v,
            (Some(_), None) => true,
            _ => false,
        }
    }
}

/// [EstimatedPosition] is the final solution, in geographic coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct EstimatedPosition {
    /// Estimated position
    pub position: GeoPoint,
    /// Horizontal confidence radius (meters)
    pub horizontal_accuracy_m: f64,
    /// Vertical confidence radius (meters), if altitude was resolved
    pub vertical_accuracy_m: Option<f64>,
}

impl EstimatedPosition {
    /// Converts a local [TrilaterationResult] to [EstimatedPosition],
    /// `reference` being the origin of the local coordinates.
    pub fn from_local(solution: &TrilaterationResult, reference: &GeoPoint) -> Self {
        let position = solution.position.to_geo(reference);
        Self {
            vertical_accuracy_m: match position.altitude_m {
                Some(_) => solution.vertical_accuracy_m,
                None => None,
            },
            horizontal_accuracy_m: solution.horizontal_accuracy_m,
            position,
        }
    }
}

#[cfg(test)]
mod test {
    use super::{RansacResult, TrilaterationResult};
    use crate::position::LocalPoint;

    fn result(inliers: usize, h: f64, v: Option<f64>) -> RansacResult {
        RansacResult {
            inliers,
            path_loss_exponent: 2.0,
            solution: TrilaterationResult {
                position: LocalPoint::new(0.0, 0.0),
                horizontal_accuracy_m: h,
                vertical_accuracy_m: v,
            },
        }
    }

    #[test]
    fn ransac_result_ordering() {
        // inliers first
        assert!(result(4, 50.0, None).better_than(&result(3, 1.0, None)));
        assert!(!result(3, 1.0, None).better_than(&result(4, 50.0, None)));

        // horizontal radius
        assert!(result(3, 1.0, None).better_than(&result(3, 2.0, Some(1.0))));
        assert!(!result(3, 2.0, Some(1.0)).better_than(&result(3, 1.0, None)));

        // vertical radius
        assert!(result(3, 1.0, Some(1.0)).better_than(&result(3, 1.0, Some(2.0))));
        assert!(result(3, 1.0, Some(1.0)).better_than(&result(3, 1.0, None)));
        assert!(!result(3, 1.0, None).better_than(&result(3, 1.0, Some(1.0))));

        // equal: not better
        assert!(!result(3, 1.0, None).better_than(&result(3, 1.0, None)));
        assert!(!result(3, 1.0, Some(1.0)).better_than(&result(3, 1.0, Some(1.0))));
    }
}
