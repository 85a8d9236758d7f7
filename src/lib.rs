#![doc = include_str!("../README.md")]
#![cfg_attr(docrs, feature(doc_cfg))]

// private modules
mod candidate;
mod cfg;
mod constants;
mod error;
mod estimator;
mod median;
mod model;
mod position;
mod ransac;
mod solutions;
mod solver;
mod stats;

// collaborators
mod backoff;
mod cache;
mod reporting;
mod source;

#[cfg(test)]
mod tests;

// prelude
pub mod prelude {
    pub use crate::backoff::ExponentialBackOff;
    pub use crate::cache::{CacheOpts, PositioningCache};
    pub use crate::candidate::{Measurement, Observation};
    pub use crate::cfg::{Config, RansacOpts, SolverOpts};
    pub use crate::constants::{MAX_MEASUREMENTS_FOR_EXHAUSTIVE_RANSAC, REPORTING_CONFIDENCE_LEVEL};
    pub use crate::estimator::Estimator;
    pub use crate::median::{median, GeometricMedian};
    pub use crate::model::PathLossModel;
    pub use crate::position::{GeoPoint, LocalPoint};
    pub use crate::reporting::{Fix, LocationReporter, ReportError, ReportingOpts};
    pub use crate::solutions::{
        validator::SolutionInvalidation, EstimatedPosition, RansacResult, TrilaterationResult,
    };
    pub use crate::source::{
        EmitterId, FetchError, LocationHost, PositioningData, PositioningDataSource, RadioScanner,
        ScanError, ScanResult,
    };
    pub use crate::stats::{chi_squared_cdf, chi_squared_quantile};
    // re-export
    pub use hifitime::{Duration, Epoch};
}

// pub export
pub use error::Error;
