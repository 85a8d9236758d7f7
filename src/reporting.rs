//! Location reporting: scan, look emitters up, estimate and report
use hifitime::{Duration, Epoch};
use log::{debug, info};
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    backoff::ExponentialBackOff,
    cache::PositioningCache,
    constants::{MAX_MEASUREMENTS_FOR_EXHAUSTIVE_RANSAC, REPORTING_CONFIDENCE_LEVEL},
    estimator::Estimator,
    source::{LocationHost, PositioningData, PositioningDataSource, RadioScanner, ScanError, ScanResult},
};

const fn default_confidence_level() -> f64 {
    REPORTING_CONFIDENCE_LEVEL
}

const fn default_fetch_limit() -> usize {
    5
}

const fn default_max_measurements() -> usize {
    MAX_MEASUREMENTS_FOR_EXHAUSTIVE_RANSAC
}

/// [LocationReporter] options
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ReportingOpts {
    /// Confidence level of the reported accuracies
    #[cfg_attr(feature = "serde", serde(default = "default_confidence_level"))]
    pub confidence_level: f64,
    /// Once this many emitters were positioned, the remaining ones
    /// are only looked up in cache.
    #[cfg_attr(feature = "serde", serde(default = "default_fetch_limit"))]
    pub fetch_limit: usize,
    /// Maximal number of emitters contributing to a fix
    #[cfg_attr(feature = "serde", serde(default = "default_max_measurements"))]
    pub max_measurements: usize,
}

impl Default for ReportingOpts {
    fn default() -> Self {
        Self {
            confidence_level: default_confidence_level(),
            fetch_limit: default_fetch_limit(),
            max_measurements: default_max_measurements(),
        }
    }
}

/// Position [Fix], as reported to the [LocationHost].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Fix {
    /// Latitude in decimal degrees
    pub latitude_deg: f64,
    /// Longitude in decimal degrees
    pub longitude_deg: f64,
    /// Horizontal accuracy radius (meters)
    pub accuracy_m: f64,
    /// Altitude (meters), when resolved
    pub altitude_m: Option<f64>,
    /// Vertical accuracy radius (meters), when resolved
    pub vertical_accuracy_m: Option<f64>,
    /// Oldest scan that contributed to this [Fix]
    pub epoch: Epoch,
}

impl std::fmt::Display for Fix {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "{} {:.7},{:.7}±{:.1}m",
            self.epoch, self.latitude_deg, self.longitude_deg, self.accuracy_m
        )?;
        if let Some(altitude_m) = self.altitude_m {
            write!(f, " altitude:{:.1}", altitude_m)?;
            if let Some(accuracy_m) = self.vertical_accuracy_m {
                write!(f, "±{:.1}", accuracy_m)?;
            }
            write!(f, "m")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReportError {
    #[error("scan error: {0}")]
    Scan(#[from] ScanError),
}

/// [LocationReporter] turns radio scans into position [Fix]es.
/// Each [LocationReporter::step] scans the radio environment, looks the strongest
/// emitters up, estimates a position and reports it to the [LocationHost].
/// Scheduling consecutive steps is up to the user, who should wait for
/// [LocationReporter::backoff] after a failure.
pub struct LocationReporter<R: RadioScanner, S: PositioningDataSource, H: LocationHost> {
    scanner: R,
    cache: PositioningCache<S>,
    estimator: Estimator,
    host: H,
    scope: String,
    opts: ReportingOpts,
    backoff: ExponentialBackOff,
}

impl<R: RadioScanner, S: PositioningDataSource, H: LocationHost> LocationReporter<R, S, H> {
    /// Builds new [LocationReporter]
    /// ## Input
    /// - scanner: [RadioScanner]
    /// - cache: [PositioningCache] of the [PositioningDataSource]
    /// - estimator: position [Estimator]
    /// - host: [LocationHost] that consumes the [Fix]es
    /// - scope: identifies the requester, on whose behalf we scan
    pub fn new(
        scanner: R,
        cache: PositioningCache<S>,
        estimator: Estimator,
        host: H,
        scope: &str,
    ) -> Self {
        Self {
            scanner,
            cache,
            estimator,
            host,
            scope: scope.to_string(),
            opts: ReportingOpts::default(),
            backoff: ExponentialBackOff::default(),
        }
    }

    /// Returns [LocationReporter] with updated [ReportingOpts]
    pub fn with_opts(mut self, opts: ReportingOpts) -> Self {
        self.opts = opts;
        self
    }

    /// Returns [LocationReporter] with updated [ExponentialBackOff]
    pub fn with_backoff(mut self, backoff: ExponentialBackOff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Delay before the next step
    pub fn backoff(&self) -> Duration {
        self.backoff.current()
    }

    /// [PositioningCache] in use
    pub fn cache(&self) -> &PositioningCache<S> {
        &self.cache
    }

    /// [LocationHost] fixes are reported to
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Looks the strongest emitters up
    fn positioned(&self, mut scan: Vec<ScanResult>, now: Epoch) -> Vec<(ScanResult, PositioningData)> {
        scan.sort_by(|a, b| b.rssi_dbm.total_cmp(&a.rssi_dbm));

        let mut positioned = Vec::with_capacity(self.opts.max_measurements);

        for result in scan {
            if positioned.len() >= self.opts.max_measurements {
                break;
            }

            let only_cached = positioned.len() >= self.opts.fetch_limit;

            match self.cache.get(&result.id, only_cached, now) {
                Ok(Some(data)) => positioned.push((result, data)),
                Ok(None) => {},
                Err(e) => {
                    debug!("{}: unable to obtain positioning data: {}", result.id, e);
                },
            }
        }

        positioned
    }

    /// Performs one reporting step.
    /// ## Returns
    /// - Ok(Some([Fix])) when a position was reported
    /// - Ok(None) when no position could be determined
    /// - [ReportError] when the radio environment could not be scanned
    pub fn step(&mut self, now: Epoch) -> Result<Option<Fix>, ReportError> {
        let scan = match self.scanner.scan(&self.scope) {
            Ok(scan) => scan,
            Err(e) => {
                self.backoff.advance();
                debug!("{} (next attempt in {})", e, self.backoff.current());
                return Err(e.into());
            },
        };

        let positioned = self.positioned(scan, now);

        let mut epoch = match positioned.first() {
            Some((result, _)) => result.timestamp,
            None => {
                debug!("no positioned emitter");
                return Ok(None);
            },
        };

        let observations = positioned
            .iter()
            .map(|(result, data)| {
                if result.timestamp < epoch {
                    epoch = result.timestamp;
                }
                data.to_observation(result.rssi_dbm)
            })
            .collect::<Vec<_>>();

        let estimate = match self
            .estimator
            .estimate(&observations, self.opts.confidence_level)
        {
            Some(estimate) => estimate,
            None => {
                debug!("no estimate from {} emitters", observations.len());
                return Ok(None);
            },
        };

        let fix = Fix {
            latitude_deg: estimate.position.latitude_deg,
            longitude_deg: estimate.position.longitude_deg,
            accuracy_m: estimate.horizontal_accuracy_m,
            altitude_m: estimate.position.altitude_m,
            vertical_accuracy_m: estimate.vertical_accuracy_m,
            epoch,
        };

        info!("{} emitters: {}", observations.len(), fix);

        self.host.report(fix);
        self.backoff.reset();

        Ok(Some(fix))
    }
}
