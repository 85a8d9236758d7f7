use crate::{
    candidate::Observation,
    cfg::Config,
    estimator::Estimator,
    position::{GeoPoint, LocalPoint},
    tests::{emitters, init_logger, rssi_at, EXPONENT, TRUTH},
};

/// Where we actually are
fn truth() -> GeoPoint {
    GeoPoint::new(45.0, 5.0)
}

/// Horizontal observations of the synthetic emitters, around [truth]
fn observations(count: usize) -> Vec<Observation> {
    let truth = truth();
    emitters()
        .iter()
        .take(count)
        .map(|e| {
            let offset = LocalPoint::new(e.x - TRUTH.x, e.y - TRUTH.y);
            let rssi = rssi_at(e.horizontal_distance(&TRUTH), EXPONENT);
            Observation::new(offset.to_geo(&truth), 1.0, rssi)
        })
        .collect()
}

#[test]
fn horizontal_estimate() {
    init_logger();

    let estimate = Estimator::default()
        .estimate(&observations(9), 0.68)
        .unwrap();

    // 1E-6° is about 10cm
    assert!((estimate.position.latitude_deg - 45.0).abs() < 1.0E-6, "{:?}", estimate);
    assert!((estimate.position.longitude_deg - 5.0).abs() < 1.0E-6, "{:?}", estimate);
    assert!(estimate.position.altitude_m.is_none());
    assert!(estimate.vertical_accuracy_m.is_none());
    assert!(estimate.horizontal_accuracy_m > 0.0);
}

#[test]
fn partially_known_altitudes() {
    init_logger();

    let observations = observations(9)
        .iter()
        .enumerate()
        .map(|(i, obs)| {
            if i < 4 {
                let mut obs = *obs;
                obs.position.altitude_m = Some(250.0 + i as f64);
                obs.with_vertical_accuracy(2.0)
            } else {
                *obs
            }
        })
        .collect::<Vec<_>>();

    let estimate = Estimator::default().estimate(&observations, 0.68).unwrap();

    assert!((estimate.position.latitude_deg - 45.0).abs() < 1.0E-6);
    assert!((estimate.position.longitude_deg - 5.0).abs() < 1.0E-6);
    assert!(estimate.position.altitude_m.is_none());
    assert!(estimate.vertical_accuracy_m.is_none());
}

#[test]
fn vertical_estimate() {
    init_logger();

    let truth = truth().with_altitude(100.0);
    let exponent = 2.6;

    // emitters, relative to where we are
    let emitters: [(f64, f64, f64); 5] = [
        (-5.0, -5.0, -3.0),
        (15.0, -5.0, 7.0),
        (-5.0, 15.0, 2.0),
        (15.0, 15.0, -7.0),
        (5.0, -15.0, 5.0),
    ];

    let observations = emitters
        .iter()
        .map(|(x, y, z)| {
            let distance = (x * x + y * y + z * z).sqrt();
            let position = LocalPoint::new_3d(*x, *y, *z).to_geo(&truth);
            Observation::new(position, 1.0, rssi_at(distance, exponent)).with_vertical_accuracy(1.0)
        })
        .collect::<Vec<_>>();

    let estimator = Estimator::new(Config::default().with_path_loss_exponent(exponent));
    let estimate = estimator.estimate(&observations, 0.68).unwrap();

    assert!((estimate.position.latitude_deg - 45.0).abs() < 1.0E-6, "{:?}", estimate);
    assert!((estimate.position.longitude_deg - 5.0).abs() < 1.0E-6, "{:?}", estimate);

    let altitude_m = estimate.position.altitude_m.unwrap();
    assert!((altitude_m - 100.0).abs() < 1.0E-3, "{:?}", estimate);
    assert!(estimate.vertical_accuracy_m.unwrap() > 0.0);
}

#[test]
fn single_observation() {
    let position = GeoPoint::new(48.85, 2.35).with_altitude(35.0);
    let obs = Observation::new(position, 20.0, -70.0).with_vertical_accuracy(5.0);

    let estimate = Estimator::default().estimate(&[obs], 0.68).unwrap();

    assert!((estimate.position.latitude_deg - 48.85).abs() < 1.0E-12);
    assert!((estimate.position.longitude_deg - 2.35).abs() < 1.0E-12);
    assert_eq!(estimate.position.altitude_m, Some(35.0));
    assert!(estimate.horizontal_accuracy_m > 20.0);
    assert!(estimate.vertical_accuracy_m.unwrap() > 0.0);
}
