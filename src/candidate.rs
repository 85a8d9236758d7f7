//! Observations, measurements and hypotheses
use crate::{
    model::PathLossModel,
    position::{GeoPoint, LocalPoint},
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// [Observation] of a geocoded emitter, in geographic coordinates.
/// [Observation]s are what the positioning process starts from.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Observation {
    /// Emitter known position
    pub position: GeoPoint,
    /// Accuracy of the emitter horizontal position (meters, 1 sigma)
    pub horizontal_accuracy_m: f64,
    /// Accuracy of the emitter altitude (meters, 1 sigma), when known
    pub vertical_accuracy_m: Option<f64>,
    /// Received signal strength (dBm)
    pub rssi_dbm: f64,
}

impl Observation {
    /// Builds new [Observation]
    pub fn new(position: GeoPoint, horizontal_accuracy_m: f64, rssi_dbm: f64) -> Self {
        Self {
            position,
            horizontal_accuracy_m,
            vertical_accuracy_m: None,
            rssi_dbm,
        }
    }

    /// Copies and returns [Observation] with vertical accuracy (meters)
    pub fn with_vertical_accuracy(&self, accuracy_m: f64) -> Self {
        let mut s = *self;
        s.vertical_accuracy_m = Some(accuracy_m);
        s
    }

    /// Converts this [Observation] to a [Measurement] expressed
    /// relative to `reference`.
    pub fn to_measurement(&self, reference: &GeoPoint) -> Measurement {
        let position = self.position.to_local(reference);
        Measurement {
            position,
            xy_variance_m2: self.horizontal_accuracy_m.powi(2),
            // vertical variance is only meaningful if we have a vertical component
            z_variance_m2: match position.z {
                Some(_) => self.vertical_accuracy_m.map(|acc| acc.powi(2)),
                None => None,
            },
            rssi_dbm: self.rssi_dbm,
        }
    }
}

/// [Measurement] of an emitter in local coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Measurement {
    /// Emitter position
    pub position: LocalPoint,
    /// Variance of the emitter horizontal position (m²)
    pub xy_variance_m2: f64,
    /// Variance of the emitter vertical position (m²)
    pub z_variance_m2: Option<f64>,
    /// Received signal strength (dBm)
    pub rssi_dbm: f64,
}

impl Measurement {
    /// Builds new horizontal [Measurement]
    pub fn new(position: LocalPoint, xy_variance_m2: f64, rssi_dbm: f64) -> Self {
        Self {
            position,
            xy_variance_m2,
            z_variance_m2: None,
            rssi_dbm,
        }
    }

    /// Copies and returns [Measurement] with vertical variance (m²)
    pub fn with_z_variance(&self, variance_m2: f64) -> Self {
        let mut s = *self;
        s.z_variance_m2 = Some(variance_m2);
        s
    }

    /// True if this [Measurement] may contribute to a vertical solution
    pub fn has_vertical(&self) -> bool {
        self.position.z.is_some() && self.z_variance_m2.is_some()
    }

    /// Total variance of this [Measurement] (m²), once RSSI has been converted
    /// to a distance with this path loss exponent. Vertical variance only contributes
    /// when `vertical` is requested.
    pub fn total_variance(&self, model: &PathLossModel, path_loss_exponent: f64, vertical: bool) -> f64 {
        let distance_variance = model.distance_variance(self.rssi_dbm, path_loss_exponent);
        let z_variance = if vertical {
            self.z_variance_m2.unwrap_or(0.0)
        } else {
            0.0
        };
        distance_variance + self.xy_variance_m2 + z_variance
    }
}

/// [Candidate] is one [Measurement] associated to one
/// path loss exponent hypothesis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Candidate<'a> {
    pub measurement: &'a Measurement,
    pub path_loss_exponent: f64,
}

impl<'a> Candidate<'a> {
    pub fn new(measurement: &'a Measurement, path_loss_exponent: f64) -> Self {
        Self {
            measurement,
            path_loss_exponent,
        }
    }

    /// Builds all [Candidate]s of a single hypothesis
    pub fn hypothesis(measurements: &'a [Measurement], path_loss_exponent: f64) -> Vec<Self> {
        measurements
            .iter()
            .map(|m| Self::new(m, path_loss_exponent))
            .collect()
    }

    /// Observed distance (meters)
    pub fn observed_distance(&self, model: &PathLossModel) -> f64 {
        model.distance(self.measurement.rssi_dbm, self.path_loss_exponent)
    }

    /// Total variance of this [Candidate] (m²)
    pub fn variance(&self, model: &PathLossModel, vertical: bool) -> f64 {
        self.measurement
            .total_variance(model, self.path_loss_exponent, vertical)
    }

    /// Distance from `point` to this emitter, taking the vertical component
    /// into account when requested and available.
    pub fn distance_from(&self, point: &LocalPoint, vertical: bool) -> f64 {
        let position = &self.measurement.position;
        let dz = if vertical {
            match (point.z, position.z) {
                (Some(z), Some(pz)) => z - pz,
                _ => 0.0,
            }
        } else {
            0.0
        };
        ((point.x - position.x).powi(2) + (point.y - position.y).powi(2) + dz.powi(2)).sqrt()
    }

    /// Standardized residual of this [Candidate], for this position estimate.
    pub fn standardized_residual(&self, model: &PathLossModel, point: &LocalPoint, vertical: bool) -> f64 {
        let residual = (self.distance_from(point, vertical) - self.observed_distance(model)).abs();
        residual / self.variance(model, vertical).sqrt()
    }
}

#[cfg(test)]
mod test {
    use super::{Candidate, Measurement, Observation};
    use crate::{
        model::PathLossModel,
        position::{GeoPoint, LocalPoint},
    };

    #[test]
    fn observation_to_measurement() {
        let reference = GeoPoint::new(45.0, 5.0).with_altitude(100.0);

        let obs = Observation::new(GeoPoint::new(45.0, 5.0).with_altitude(110.0), 5.0, -60.0)
            .with_vertical_accuracy(3.0);

        let m = obs.to_measurement(&reference);
        assert_eq!(m.xy_variance_m2, 25.0);
        assert_eq!(m.z_variance_m2, Some(9.0));
        assert_eq!(m.position.z, Some(10.0));
        assert!(m.has_vertical());

        // vertical accuracy without altitude
        let obs = Observation::new(GeoPoint::new(45.0, 5.0), 5.0, -60.0).with_vertical_accuracy(3.0);
        let m = obs.to_measurement(&reference);
        assert!(m.z_variance_m2.is_none());
        assert!(!m.has_vertical());
    }

    #[test]
    fn candidate_variance() {
        let model = PathLossModel::default();
        let m = Measurement::new(LocalPoint::new(0.0, 0.0), 25.0, -60.0).with_z_variance(16.0);

        let cd = Candidate::new(&m, 2.0);
        let distance_variance = model.distance_variance(-60.0, 2.0);

        assert!((cd.variance(&model, false) - (distance_variance + 25.0)).abs() < 1.0E-12);
        assert!((cd.variance(&model, true) - (distance_variance + 41.0)).abs() < 1.0E-12);
        assert!((cd.observed_distance(&model) - 10.0).abs() < 1.0E-9);
    }

    #[test]
    fn candidate_residual() {
        let model = PathLossModel::default();
        let m = Measurement::new(LocalPoint::new(0.0, 0.0), 25.0, -60.0);
        let cd = Candidate::new(&m, 2.0);

        // exactly at the modeled distance
        let residual = cd.standardized_residual(&model, &LocalPoint::new(6.0, 8.0), false);
        assert!(residual < 1.0E-9);

        let residual = cd.standardized_residual(&model, &LocalPoint::new(100.0, 0.0), false);
        assert!(residual > 2.0);
    }
}
