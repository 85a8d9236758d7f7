/// WGS84 Earth Frame Ellipsoid semi-major axis (meters),
/// which is the Earth's equatorial radius.
pub const EARTH_SEMI_MAJOR_AXIS_WGS84: f64 = 6378137.0_f64;

/// Number of measurements up to which RANSAC visits every sample:
/// 84 distinct samples at 3 measurements per sample.
pub const MAX_MEASUREMENTS_FOR_EXHAUSTIVE_RANSAC: usize = 9;

/// Confidence level at which reported fixes express their accuracy (68th percentile).
pub const REPORTING_CONFIDENCE_LEVEL: f64 = 0.68;

/// Minimal distance (meters), avoids singular derivatives when the estimate
/// sits right on top of an emitter.
pub const DISTANCE_EPSILON_M: f64 = 1.0E-12;
