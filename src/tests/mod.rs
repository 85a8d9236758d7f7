mod geographic;
mod trilateration;

use log::LevelFilter;
use std::sync::Once;

use crate::{candidate::Measurement, model::PathLossModel, position::LocalPoint};

static INIT: Once = Once::new();

pub fn init_logger() {
    INIT.call_once(|| {
        env_logger::builder()
            .is_test(true)
            .filter_level(LevelFilter::Debug)
            .init();
    });
}

/// Position every test scenario resolves
pub const TRUTH: LocalPoint = LocalPoint {
    x: 12.0,
    y: -7.0,
    z: None,
};

/// Path loss exponent of the synthetic environment
pub const EXPONENT: f64 = 2.9;

/// Emitters spiraling away from [TRUTH], closest first.
pub fn emitters() -> Vec<LocalPoint> {
    [
        (26.8, -4.4),
        (26.6, 5.2),
        (19.9, 14.6),
        (7.3, 19.6),
        (-7.9, 16.7),
        (-20.9, 5.0),
        (-26.4, -13.8),
        (-20.9, -34.6),
        (-4.1, -51.2),
        (20.9, -57.2),
        (47.4, -49.1),
        (67.4, -27.2),
    ]
    .iter()
    .map(|(x, y)| LocalPoint::new(*x, *y))
    .collect()
}

/// RSSI that models this distance exactly, in default environment
pub fn rssi_at(distance: f64, exponent: f64) -> f64 {
    PathLossModel::default().rssi_at_1m_dbm - 10.0 * exponent * distance.log10()
}

/// Noise free [Measurement]s of these emitters, seen from `truth`
pub fn noise_free(truth: &LocalPoint, emitters: &[LocalPoint], exponent: f64) -> Vec<Measurement> {
    emitters
        .iter()
        .map(|e| Measurement::new(*e, 1.0, rssi_at(e.horizontal_distance(truth), exponent)))
        .collect()
}
