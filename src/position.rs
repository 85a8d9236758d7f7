//! Geographic and local (ENU) coordinates
use crate::{constants::EARTH_SEMI_MAJOR_AXIS_WGS84, median::median};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Geographic coordinates.
#[derive(Default, Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GeoPoint {
    /// Latitude in decimal degrees
    pub latitude_deg: f64,
    /// Longitude in decimal degrees
    pub longitude_deg: f64,
    /// Altitude in meters, when known
    pub altitude_m: Option<f64>,
}

/// East-North-Up (ENU) coordinates, in meters, relative to a reference [GeoPoint]
/// that is implied by the context.
#[derive(Default, Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LocalPoint {
    /// East (meters)
    pub x: f64,
    /// North (meters)
    pub y: f64,
    /// Up (meters), when known
    pub z: Option<f64>,
}

impl GeoPoint {
    /// Builds new [GeoPoint] from coordinates in decimal degrees.
    pub fn new(latitude_deg: f64, longitude_deg: f64) -> Self {
        Self {
            latitude_deg,
            longitude_deg,
            altitude_m: None,
        }
    }

    /// Copies and returns [GeoPoint] with updated altitude (meters)
    pub fn with_altitude(&self, altitude_m: f64) -> Self {
        let mut s = *self;
        s.altitude_m = Some(altitude_m);
        s
    }

    /// Forms the reference point of a set of [GeoPoint]s: per-axis median.
    /// The median resists up to half of the points being wildly off,
    /// which the mean would not. Altitude is the median of the points that
    /// carry one, and absent if none does.
    pub fn reference(points: &[GeoPoint]) -> Option<GeoPoint> {
        let latitude_deg = median(points.iter().map(|p| p.latitude_deg))?;
        let longitude_deg = median(points.iter().map(|p| p.longitude_deg))?;
        let altitude_m = median(points.iter().filter_map(|p| p.altitude_m));
        Some(Self {
            latitude_deg,
            longitude_deg,
            altitude_m,
        })
    }

    /// Converts [GeoPoint] to ENU [LocalPoint] relative to `reference`.
    ///
    /// This uses a simple equirectangular approximation, which assumes the Earth is
    /// flat in the vicinity of the reference point. It works reasonably well
    /// over a few kilometers, accuracy diminishes as the separation grows.
    ///
    /// Longitudes are not wrapped: a point across the antimeridian
    /// from the reference lands on the other side of the planet (in local coordinates).
    /// [LocalPoint::to_geo] reverses that exactly.
    pub fn to_local(&self, reference: &GeoPoint) -> LocalPoint {
        let d_lat = (self.latitude_deg - reference.latitude_deg).to_radians();
        let d_lon = (self.longitude_deg - reference.longitude_deg).to_radians();
        let lat_rad = reference.latitude_deg.to_radians();

        let x = EARTH_SEMI_MAJOR_AXIS_WGS84 * d_lon * lat_rad.cos();
        let y = EARTH_SEMI_MAJOR_AXIS_WGS84 * d_lat;
        let z = match (self.altitude_m, reference.altitude_m) {
            (Some(alt), Some(ref_alt)) => Some(alt - ref_alt),
            _ => None,
        };

        LocalPoint { x, y, z }
    }
}

impl LocalPoint {
    /// Builds new horizontal [LocalPoint]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y, z: None }
    }

    /// Builds new [LocalPoint] with vertical component
    pub fn new_3d(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z: Some(z) }
    }

    /// Converts [LocalPoint] back to [GeoPoint], `reference` being the
    /// [GeoPoint] this [LocalPoint] is relative to. Reverses [GeoPoint::to_local].
    pub fn to_geo(&self, reference: &GeoPoint) -> GeoPoint {
        let lat_rad = reference.latitude_deg.to_radians();
        let d_lat = self.y / EARTH_SEMI_MAJOR_AXIS_WGS84;
        let d_lon = self.x / (EARTH_SEMI_MAJOR_AXIS_WGS84 * lat_rad.cos());

        let altitude_m = match (self.z, reference.altitude_m) {
            (Some(z), Some(ref_alt)) => Some(ref_alt + z),
            _ => None,
        };

        GeoPoint {
            latitude_deg: reference.latitude_deg + d_lat.to_degrees(),
            longitude_deg: reference.longitude_deg + d_lon.to_degrees(),
            altitude_m,
        }
    }

    /// Horizontal distance to other [LocalPoint] (meters)
    pub fn horizontal_distance(&self, rhs: &LocalPoint) -> f64 {
        ((self.x - rhs.x).powi(2) + (self.y - rhs.y).powi(2)).sqrt()
    }
}

#[cfg(test)]
mod test {
    use super::{GeoPoint, LocalPoint};
    use rstest::rstest;

    #[rstest]
    #[case(48.8566, 2.3522)]
    #[case(0.0, 0.0)]
    #[case(-33.8688, 151.2093)]
    #[case(89.9, 45.0)]
    #[case(-89.9, -120.0)]
    #[case(10.0, 179.999)]
    #[case(-10.0, -179.999)]
    fn local_geo_round_trip(#[case] lat: f64, #[case] lon: f64) {
        let reference = GeoPoint::new(lat, lon).with_altitude(35.0);

        for (x, y, z) in [
            (0.0, 0.0, 0.0),
            (120.0, -45.0, 3.0),
            (-2500.0, 1800.0, -12.5),
            (750.5, 3000.25, 100.0),
        ] {
            let local = LocalPoint::new_3d(x, y, z);
            let geo = local.to_geo(&reference);
            let back = geo.to_local(&reference);

            assert!((back.x - x).abs() < 1.0E-6, "x: {} != {}", back.x, x);
            assert!((back.y - y).abs() < 1.0E-6, "y: {} != {}", back.y, y);
            assert!((back.z.unwrap() - z).abs() < 1.0E-9);
        }
    }

    #[test]
    fn antimeridian_is_not_wrapped() {
        let reference = GeoPoint::new(0.0, 179.999);
        let local = LocalPoint::new(500.0, 0.0);

        let geo = local.to_geo(&reference);
        assert!(geo.longitude_deg > 180.0, "longitude should not be wrapped");

        let back = geo.to_local(&reference);
        assert!((back.x - 500.0).abs() < 1.0E-6);

        // a point just across the antimeridian lands far away
        let across = GeoPoint::new(0.0, -179.999).to_local(&reference);
        assert!(across.x < -39_000_000.0);
    }

    #[test]
    fn altitude_only_when_both_known() {
        let reference = GeoPoint::new(45.0, 5.0);
        let point = GeoPoint::new(45.001, 5.001).with_altitude(250.0);
        assert!(point.to_local(&reference).z.is_none());

        let reference = reference.with_altitude(200.0);
        assert_eq!(point.to_local(&reference).z, Some(50.0));
        assert!(GeoPoint::new(45.0, 5.0).to_local(&reference).z.is_none());
    }

    #[test]
    fn known_offsets() {
        let reference = GeoPoint::new(0.0, 0.0);
        let east = GeoPoint::new(0.0, 1.0).to_local(&reference);
        let north = GeoPoint::new(1.0, 0.0).to_local(&reference);

        let one_degree_m = 6378137.0 * 1.0_f64.to_radians();
        assert!((east.x - one_degree_m).abs() < 1.0E-6);
        assert!(east.y.abs() < 1.0E-9);
        assert!((north.y - one_degree_m).abs() < 1.0E-6);
        assert!(north.x.abs() < 1.0E-9);
    }

    #[test]
    fn reference_point() {
        assert!(GeoPoint::reference(&[]).is_none());

        let points = [
            GeoPoint::new(45.0, 5.0).with_altitude(10.0),
            GeoPoint::new(45.2, 5.1),
            GeoPoint::new(-70.0, 120.0).with_altitude(30.0),
        ];

        let reference = GeoPoint::reference(&points).unwrap();
        assert_eq!(reference.latitude_deg, 45.0);
        assert_eq!(reference.longitude_deg, 5.1);
        assert_eq!(reference.altitude_m, Some(20.0));
    }
}
