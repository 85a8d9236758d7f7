use rstest::*;

use crate::{
    candidate::{Candidate, Measurement},
    cfg::SolverOpts,
    error::Error,
    estimator::Estimator,
    median::GeometricMedian,
    model::PathLossModel,
    position::LocalPoint,
    solver::Trilateration,
    tests::init_logger,
};

/// Three emitters, received at identical strength
#[fixture]
fn corner() -> Vec<Measurement> {
    vec![
        Measurement::new(LocalPoint::new(0.0, 0.0), 25.0, -60.0),
        Measurement::new(LocalPoint::new(100.0, 0.0), 25.0, -60.0),
        Measurement::new(LocalPoint::new(0.0, 100.0), 25.0, -60.0),
    ]
}

#[rstest]
#[case(2.0, 34.27617884722145, 9.821528790641606)]
#[case(3.0, 33.75111083737707, 8.996585576834557)]
#[case(4.0, 33.61446793895086, 8.92647603684557)]
fn equidistant_point(
    corner: Vec<Measurement>,
    #[case] exponent: f64,
    #[case] expected: f64,
    #[case] radius: f64,
) {
    init_logger();

    let model = PathLossModel::default();
    let candidates = Candidate::hypothesis(&corner, exponent);

    let positions = corner.iter().map(|m| m.position).collect::<Vec<_>>();
    let initial = GeometricMedian::default().resolve(&positions).unwrap();

    let solution = Trilateration::new(&model, &candidates)
        .unwrap()
        .resolve(&SolverOpts::default(), &initial, 0.68)
        .unwrap();

    // symmetrical problem: solution lies on the diagonal
    let position = solution.position;
    assert!((position.x - position.y).abs() < 1.0E-6, "{:?}", position);
    assert!((position.x - expected).abs() < 1.0E-4, "{:?}", position);

    // equidistant to both far emitters
    let d1 = position.horizontal_distance(&LocalPoint::new(100.0, 0.0));
    let d2 = position.horizontal_distance(&LocalPoint::new(0.0, 100.0));
    assert!((d1 - d2).abs() < 1.0E-6);

    assert!((solution.horizontal_accuracy_m - radius).abs() < 1.0E-3);
    assert!(solution.vertical_accuracy_m.is_none());
}

#[rstest]
fn corner_through_estimator(corner: Vec<Measurement>) {
    init_logger();

    // every emitter lies too far from the equidistant point to form a consensus
    let estimator = Estimator::default();
    assert_eq!(
        estimator.try_estimate_local(&corner, 0.68, None),
        Err(Error::NoViableHypothesis)
    );
    assert!(estimator.estimate_local(&corner, 0.68).is_none());
}
