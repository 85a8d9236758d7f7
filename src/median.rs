//! Median estimators
use crate::position::LocalPoint;

/// Median of a list of values. Even lists resolve to the mean of both central values.
/// Returns None on empty list.
pub fn median<I: IntoIterator<Item = f64>>(values: I) -> Option<f64> {
    let mut sorted = values.into_iter().collect::<Vec<_>>();
    if sorted.is_empty() {
        return None;
    }

    sorted.sort_by(|a, b| a.total_cmp(b));

    let size = sorted.len();
    if size % 2 == 0 {
        Some((sorted[size / 2 - 1] + sorted[size / 2]) / 2.0)
    } else {
        Some(sorted[size / 2])
    }
}

/// [GeometricMedian] solver, using the Weiszfeld algorithm.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometricMedian {
    /// Maximal number of iterations
    pub max_iterations: usize,
    /// Iteration stops once the estimate moves by less than this (meters).
    /// Also the lower bound of distances, so that a point will not make
    /// the weights diverge.
    pub tolerance_m: f64,
}

impl Default for GeometricMedian {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            tolerance_m: 1.0E-6,
        }
    }
}

impl GeometricMedian {
    /// Resolves the geometric median of provided [LocalPoint]s, starting from the first point.
    /// The vertical component is only resolved when all points have one.
    /// ## Returns
    /// - None on empty list
    pub fn resolve(&self, points: &[LocalPoint]) -> Option<LocalPoint> {
        let first = points.first()?;
        let with_z = points.iter().all(|p| p.z.is_some());

        let (mut x, mut y) = (first.x, first.y);
        let mut z = if with_z { first.z.unwrap_or(0.0) } else { 0.0 };

        for _ in 0..self.max_iterations {
            let (mut num_x, mut num_y, mut num_z, mut den) = (0.0, 0.0, 0.0, 0.0);

            for point in points.iter() {
                let pz = if with_z { point.z.unwrap_or(0.0) } else { 0.0 };

                let dist = ((x - point.x).powi(2) + (y - point.y).powi(2) + (z - pz).powi(2)).sqrt();
                let weight = 1.0 / dist.max(self.tolerance_m);

                num_x += point.x * weight;
                num_y += point.y * weight;
                num_z += pz * weight;
                den += weight;
            }

            let (x_new, y_new, z_new) = (num_x / den, num_y / den, num_z / den);
            let shift = ((x - x_new).powi(2) + (y - y_new).powi(2) + (z - z_new).powi(2)).sqrt();

            x = x_new;
            y = y_new;
            z = z_new;

            if shift < self.tolerance_m {
                break;
            }
        }

        Some(LocalPoint {
            x,
            y,
            z: if with_z { Some(z) } else { None },
        })
    }
}

#[cfg(test)]
mod test {
    use super::{median, GeometricMedian};
    use crate::position::LocalPoint;

    #[test]
    fn scalar_median() {
        assert_eq!(median(Vec::<f64>::new()), None);
        assert_eq!(median([3.0]), Some(3.0));
        assert_eq!(median([3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median([4.0, 1.0, 3.0, 2.0]), Some(2.5));
    }

    #[test]
    fn weiszfeld_square() {
        let points = [
            LocalPoint::new(0.0, 0.0),
            LocalPoint::new(10.0, 0.0),
            LocalPoint::new(10.0, 10.0),
            LocalPoint::new(0.0, 10.0),
        ];

        let gm = GeometricMedian::default().resolve(&points).unwrap();
        assert!((gm.x - 5.0).abs() < 1.0E-2, "x={}", gm.x);
        assert!((gm.y - 5.0).abs() < 1.0E-2, "y={}", gm.y);
        assert!(gm.z.is_none());
    }

    #[test]
    fn weiszfeld_resists_outlier() {
        let points = [
            LocalPoint::new(0.0, 0.0),
            LocalPoint::new(1.0, 0.0),
            LocalPoint::new(0.0, 1.0),
            LocalPoint::new(1.0, 1.0),
            LocalPoint::new(10_000.0, 10_000.0),
        ];

        let gm = GeometricMedian::default().resolve(&points).unwrap();
        assert!(gm.x < 2.0 && gm.y < 2.0, "geometric median dragged away: {:?}", gm);
    }

    #[test]
    fn weiszfeld_vertical() {
        let points = [
            LocalPoint::new_3d(0.0, 0.0, 0.0),
            LocalPoint::new_3d(2.0, 0.0, 2.0),
            LocalPoint::new_3d(1.0, 2.0, 4.0),
        ];
        let gm = GeometricMedian::default().resolve(&points).unwrap();
        assert!(gm.z.is_some());

        let points = [
            LocalPoint::new_3d(0.0, 0.0, 0.0),
            LocalPoint::new(2.0, 0.0),
            LocalPoint::new_3d(1.0, 2.0, 4.0),
        ];
        let gm = GeometricMedian::default().resolve(&points).unwrap();
        assert!(gm.z.is_none());
    }

    #[test]
    fn weiszfeld_single_point() {
        let points = [LocalPoint::new(3.0, -4.0)];
        let gm = GeometricMedian::default().resolve(&points).unwrap();
        assert_eq!(gm, LocalPoint::new(3.0, -4.0));
        assert!(GeometricMedian::default().resolve(&[]).is_none());
    }
}
